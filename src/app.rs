//! Render-loop composition: parameters in, RGBA frames out.
//!
//! [`Studio`] is the headless engine (also what the tests drive); [`run`]
//! wraps it in the interactive terminal loop.

use crate::color::{self, Rgb};
use crate::config::{Config, GradientChoice, RenderStrategy, SystemChoice, ToneChoice};
use crate::density::compute_density;
use crate::dynamics::{AttractorParams, EscapeSampling, PixelFractal, State, System, SystemKind};
use crate::features::{Animator, AudioFeatures, ParamDeltas};
use crate::particles::{ParticlePool, RiderPool};
use crate::render::{Frame, HalfBlockRenderer, Renderer};
use crate::terminal::TerminalGuard;
use crate::worker::FractalWorker;
use anyhow::Context;
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use std::io::BufWriter;
use std::time::{Duration, Instant};

const PARTICLE_FADE: f64 = 0.82;
const VAPOR_FADE: f64 = 0.93;

pub struct Studio {
    system: System,
    strategy: RenderStrategy,
    tone: ToneChoice,
    gradient: GradientChoice,
    color_a: Rgb,
    color_b: Rgb,
    background: Rgb,
    budget: u64,
    exponent: f64,
    noise_seed: u64,
    particle_count: usize,

    worker: Option<FractalWorker>,
    pool: Option<ParticlePool>,
    riders: Option<RiderPool>,
    animator: Option<Animator>,

    frame: Vec<u8>,
    w: usize,
    h: usize,
}

impl Studio {
    pub fn new(cfg: &Config, w: usize, h: usize) -> Self {
        let params = params_from_config(cfg);
        let mut studio = Self {
            system: System::new(params, cfg.noise_seed),
            strategy: cfg.render,
            tone: cfg.tone,
            gradient: cfg.gradient,
            color_a: Rgb::from_tuple(cfg.color_a),
            color_b: Rgb::from_tuple(cfg.color_b),
            background: Rgb::from_tuple(cfg.background),
            budget: cfg.iteration_budget(),
            exponent: cfg.exponent,
            noise_seed: cfg.noise_seed,
            particle_count: cfg.particles,
            worker: None,
            pool: None,
            riders: None,
            animator: None,
            frame: Vec::new(),
            w: 0,
            h: 0,
        };
        studio.resize(w, h);
        studio.rebuild_overlay_state();
        studio
    }

    pub fn kind(&self) -> SystemKind {
        self.system.kind()
    }

    pub fn params(&self) -> &AttractorParams {
        &self.system.params
    }

    pub fn strategy(&self) -> RenderStrategy {
        self.strategy
    }

    pub fn budget(&self) -> u64 {
        self.budget
    }

    pub fn tone(&self) -> ToneChoice {
        self.tone
    }

    pub fn size(&self) -> (usize, usize) {
        (self.w, self.h)
    }

    pub fn set_animator(&mut self, animator: Animator) {
        self.animator = Some(animator);
    }

    pub fn resize(&mut self, w: usize, h: usize) {
        self.w = w;
        self.h = h;
        self.frame.clear();
        self.frame.resize(w.saturating_mul(h).saturating_mul(4), 0);
        color::paint_background(self.background, &mut self.frame);
        self.rebuild_overlay_state();
    }

    pub fn set_system(&mut self, kind: SystemKind) {
        let seed = self.noise_seed;
        self.system = System::new(AttractorParams::preset(kind), seed);
        self.worker = None;
        color::paint_background(self.background, &mut self.frame);
        self.rebuild_overlay_state();
    }

    pub fn cycle_strategy(&mut self) {
        self.strategy = self.strategy.next();
        color::paint_background(self.background, &mut self.frame);
        self.rebuild_overlay_state();
    }

    pub fn cycle_gradient(&mut self) {
        self.gradient = match self.gradient {
            GradientChoice::Single => GradientChoice::Dual,
            GradientChoice::Dual => GradientChoice::Spectral,
            GradientChoice::Spectral => GradientChoice::Vivid,
            GradientChoice::Vivid => GradientChoice::Single,
        };
    }

    pub fn cycle_tone(&mut self) {
        self.tone = match self.tone {
            ToneChoice::Linear => ToneChoice::Sqrt,
            ToneChoice::Sqrt => ToneChoice::Log,
            ToneChoice::Log => ToneChoice::Linear,
        };
    }

    pub fn nudge_exponent(&mut self, delta: f64) {
        self.exponent = (self.exponent + delta).clamp(1.0, 8.0);
        self.budget = 10f64.powf(self.exponent).round() as u64;
    }

    /// Particle pools are rebuilt wholesale on any system/count/size change;
    /// the riders only exist for escape-time systems and vice versa.
    fn rebuild_overlay_state(&mut self) {
        if self.w == 0 || self.h == 0 {
            return;
        }
        if self.strategy == RenderStrategy::Density {
            self.pool = None;
            self.riders = None;
            return;
        }
        if self.kind().is_escape_time() {
            self.pool = None;
            self.riders = Some(RiderPool::new(&self.system.params, self.particle_count));
        } else {
            self.riders = None;
            self.pool = Some(ParticlePool::new(
                &self.system,
                self.particle_count,
                self.w,
                self.h,
            ));
        }
    }

    /// Produce one frame. `t` is the animation clock in seconds.
    pub fn tick(&mut self, t: f64, audio: &AudioFeatures) -> &[u8] {
        if let Some(animator) = self.animator.as_mut() {
            if let Some(deltas) = animator(t, audio) {
                self.system.params.apply_deltas(&deltas);
            }
        }

        match self.strategy {
            RenderStrategy::Density => self.render_density(t),
            RenderStrategy::Particles => self.render_overlay(t, PARTICLE_FADE, 1.0),
            RenderStrategy::Vapor => self.render_overlay(t, VAPOR_FADE, 0.28),
        }
        &self.frame
    }

    /// Apply an animator delta directly (test/headless entry point).
    pub fn apply_deltas(&mut self, deltas: &ParamDeltas) {
        self.system.params.apply_deltas(deltas);
    }

    fn render_density(&mut self, t: f64) {
        if self.kind().uses_worker() {
            let p = match self.system.params {
                AttractorParams::Mandelbrot(p) => p,
                _ => unreachable!(),
            };
            let worker = self.worker.get_or_insert_with(FractalWorker::spawn);
            worker.update(&p, self.w, self.h);
            worker.poll();
            match worker.cached(self.w, self.h) {
                Some(buf) => color::paint(
                    buf,
                    self.tone,
                    self.gradient,
                    self.color_a,
                    self.color_b,
                    self.background,
                    &mut self.frame,
                ),
                // No finished buffer yet: flat background this frame.
                None => color::paint_background(self.background, &mut self.frame),
            }
        } else {
            let buf = compute_density(&self.system, self.w, self.h, self.budget, t);
            color::paint(
                &buf,
                self.tone,
                self.gradient,
                self.color_a,
                self.color_b,
                self.background,
                &mut self.frame,
            );
        }
    }

    fn render_overlay(&mut self, t: f64, fade: f64, alpha: f64) {
        fade_toward(&mut self.frame, self.background, fade);

        let (w, h) = (self.w, self.h);
        let count = self.pool.as_ref().map(|p| p.len()).unwrap_or(0).max(
            self.riders.as_ref().map(|r| r.len()).unwrap_or(0),
        );

        if let Some(pool) = self.pool.as_mut() {
            pool.step(&self.system, w, h, t);
            for (i, p) in pool.particles().iter().enumerate() {
                let shade_t = if count > 1 { i as f64 / (count - 1) as f64 } else { 0.5 };
                let c = color::shade(
                    0.25 + 0.75 * shade_t,
                    self.gradient,
                    self.color_a,
                    self.color_b,
                    self.background,
                );
                stroke(&mut self.frame, w, h, p.prev_sx, p.prev_sy, p.sx, p.sy, c, alpha);
            }
        } else if let Some(riders) = self.riders.as_mut() {
            riders.advance(&self.system.params);
            for (i, r) in riders.riders().iter().enumerate() {
                let Some((re, im)) = r.position() else { continue };
                let (sx, sy) = self.system.project(State::new(re, im, 0.0), w, h);
                let shade_t = if count > 1 { i as f64 / (count - 1) as f64 } else { 0.5 };
                let c = color::shade(
                    0.25 + 0.75 * shade_t,
                    self.gradient,
                    self.color_a,
                    self.color_b,
                    self.background,
                );
                splat(&mut self.frame, w, h, sx, sy, c, alpha);
            }
        }
    }
}

fn params_from_config(cfg: &Config) -> AttractorParams {
    match cfg.system {
        SystemChoice::DeJong => AttractorParams::preset(SystemKind::DeJong),
        SystemChoice::Clifford => AttractorParams::preset(SystemKind::Clifford),
        SystemChoice::Lorenz => AttractorParams::preset(SystemKind::Lorenz),
        SystemChoice::Aizawa => AttractorParams::preset(SystemKind::Aizawa),
        SystemChoice::Buddhabrot => AttractorParams::Buddhabrot(sampling_from_config(cfg)),
        SystemChoice::BurningShip => AttractorParams::BurningShip(sampling_from_config(cfg)),
        SystemChoice::Mandelbrot => AttractorParams::Mandelbrot(PixelFractal {
            max_iter: cfg.max_iter,
            center_x: if cfg.julia { cfg.center_x } else { cfg.center_x - 0.5 },
            center_y: cfg.center_y,
            zoom: cfg.zoom.max(1e-9),
            julia: cfg.julia,
            julia_r: cfg.julia_r,
            julia_i: cfg.julia_i,
        }),
        SystemChoice::CurlNoise => AttractorParams::preset(SystemKind::CurlNoise),
    }
}

fn sampling_from_config(cfg: &Config) -> EscapeSampling {
    EscapeSampling {
        max_iter: cfg.max_iter,
        samples: cfg.samples,
        anti: cfg.anti,
        center_x: cfg.center_x - 0.5,
        center_y: cfg.center_y,
        zoom: cfg.zoom.max(1e-9),
        sample_seed: cfg.sample_seed,
    }
}

/// Pull every pixel toward the background by `fade` (persistence trails).
fn fade_toward(frame: &mut [u8], bg: Rgb, fade: f64) {
    let keep = fade.clamp(0.0, 1.0);
    for px in frame.chunks_exact_mut(4) {
        px[0] = (px[0] as f64 * keep + bg.r as f64 * (1.0 - keep)) as u8;
        px[1] = (px[1] as f64 * keep + bg.g as f64 * (1.0 - keep)) as u8;
        px[2] = (px[2] as f64 * keep + bg.b as f64 * (1.0 - keep)) as u8;
        px[3] = 255;
    }
}

fn blend_px(frame: &mut [u8], w: usize, h: usize, x: i64, y: i64, c: Rgb, alpha: f64) {
    if x < 0 || y < 0 || x as usize >= w || y as usize >= h {
        return;
    }
    let o = (y as usize * w + x as usize) * 4;
    let a = alpha.clamp(0.0, 1.0);
    frame[o] = (frame[o] as f64 * (1.0 - a) + c.r as f64 * a) as u8;
    frame[o + 1] = (frame[o + 1] as f64 * (1.0 - a) + c.g as f64 * a) as u8;
    frame[o + 2] = (frame[o + 2] as f64 * (1.0 - a) + c.b as f64 * a) as u8;
    frame[o + 3] = 255;
}

/// Velocity stroke from the previous to the current screen position.
fn stroke(
    frame: &mut [u8],
    w: usize,
    h: usize,
    x0: f64,
    y0: f64,
    x1: f64,
    y1: f64,
    c: Rgb,
    alpha: f64,
) {
    if !(x0.is_finite() && y0.is_finite() && x1.is_finite() && y1.is_finite()) {
        return;
    }
    let dx = x1 - x0;
    let dy = y1 - y0;
    let len = dx.hypot(dy);
    // Long jumps are chaotic-map teleports, not motion; draw a dot.
    if len > (w.max(h) as f64) * 0.5 {
        blend_px(frame, w, h, x1 as i64, y1 as i64, c, alpha);
        return;
    }
    let steps = (len.ceil() as usize).clamp(1, 64);
    for i in 0..=steps {
        let f = i as f64 / steps as f64;
        blend_px(
            frame,
            w,
            h,
            (x0 + dx * f) as i64,
            (y0 + dy * f) as i64,
            c,
            alpha,
        );
    }
}

/// Soft 3x3 splat for the diffuse vapor look.
fn splat(frame: &mut [u8], w: usize, h: usize, x: f64, y: f64, c: Rgb, alpha: f64) {
    if !(x.is_finite() && y.is_finite()) {
        return;
    }
    let (cx, cy) = (x as i64, y as i64);
    for dy in -1i64..=1 {
        for dx in -1i64..=1 {
            let a = if dx == 0 && dy == 0 { alpha } else { alpha * 0.35 };
            blend_px(frame, w, h, cx + dx, cy + dy, c, a);
        }
    }
}

pub fn run(cfg: Config) -> anyhow::Result<()> {
    let _term = TerminalGuard::new()?;
    let mut out = BufWriter::new(TerminalGuard::stdout());
    let mut renderer = HalfBlockRenderer::new();

    let mut size = crossterm::terminal::size().context("get terminal size")?;
    if size.0 < 4 || size.1 < 3 {
        return Err(anyhow::anyhow!(
            "terminal too small (need at least 4x3, got {}x{})",
            size.0,
            size.1
        ));
    }

    let (mut pw, mut ph) = pixel_size(size);
    let mut studio = Studio::new(&cfg, pw, ph);

    let frame_budget = Duration::from_secs_f64(1.0 / cfg.fps.max(1) as f64);
    let start = Instant::now();
    let audio = AudioFeatures::default();
    let mut rendered = 0u64;

    loop {
        let tick_start = Instant::now();

        while event::poll(Duration::from_millis(0))? {
            match event::read()? {
                Event::Key(k) if k.kind != KeyEventKind::Release => match k.code {
                    KeyCode::Char('q') | KeyCode::Esc => return Ok(()),
                    KeyCode::Char('n') | KeyCode::Right => studio.set_system(studio.kind().next()),
                    KeyCode::Char('p') | KeyCode::Left => studio.set_system(studio.kind().prev()),
                    KeyCode::Char('r') => studio.cycle_strategy(),
                    KeyCode::Char('g') => studio.cycle_gradient(),
                    KeyCode::Char('t') => studio.cycle_tone(),
                    KeyCode::Char('+') | KeyCode::Char('=') => studio.nudge_exponent(0.25),
                    KeyCode::Char('-') => studio.nudge_exponent(-0.25),
                    _ => {}
                },
                Event::Resize(c, r) => {
                    size = (c, r);
                    let (w, h) = pixel_size(size);
                    pw = w;
                    ph = h;
                    studio.resize(pw, ph);
                }
                _ => {}
            }
        }

        let t = start.elapsed().as_secs_f64();
        let hud = format!(
            "{} | {} | tone {:?} | budget 10^{:.2} | q quit  n/p system  r mode  g gradient  t tone  +/- budget",
            studio.kind().label(),
            studio.strategy().label(),
            studio.tone(),
            (studio.budget() as f64).log10(),
        );
        let pixels = studio.tick(t, &audio);
        let frame = Frame {
            term_cols: size.0,
            visual_rows: size.1.saturating_sub(1),
            pixel_width: pw,
            pixel_height: ph,
            pixels_rgba: pixels,
            hud: &hud,
            sync_updates: true,
        };
        renderer.render(&frame, &mut out)?;

        rendered += 1;
        if cfg.frames > 0 && rendered >= cfg.frames {
            return Ok(());
        }

        let spent = tick_start.elapsed();
        if spent < frame_budget {
            std::thread::sleep(frame_budget - spent);
        }
    }
}

fn pixel_size(size: (u16, u16)) -> (usize, usize) {
    // One row reserved for the HUD; two pixel rows per half-block cell.
    (size.0 as usize, size.1.saturating_sub(1) as usize * 2)
}

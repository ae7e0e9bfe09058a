//! Density histogram accumulation.
//!
//! Trajectory systems walk a long orbit and count pixel visits; the sampled
//! escape-time systems (Buddhabrot, Burning Ship) rasterize escaping orbits
//! from random seeds; Mandelbrot/Julia fills one smooth escape value per
//! pixel directly. All paths produce a [`DensityBuffer`] the color pipeline
//! consumes exactly once.

use crate::dynamics::{
    AttractorParams, EscapeSampling, Lcg31, MAP_WARMUP, ODE_WARMUP, PixelFractal, SAMPLE_IM,
    SAMPLE_RE, State, System, SystemKind, plane_to_screen, screen_to_plane,
};

const CURL_PARTICLES: u64 = 5000;
const SMOOTH_STEPS: f64 = 1000.0;

/// Width x height grid of visit counts (trajectory systems) or smooth escape
/// values in 0..=1000 (escape-time systems). The producing call owns the
/// buffer exclusively while filling it; it is not mutated after return.
#[derive(Clone, Debug)]
pub struct DensityBuffer {
    width: usize,
    height: usize,
    cells: Vec<u32>,
}

impl DensityBuffer {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cells: vec![0; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn cells(&self) -> &[u32] {
        &self.cells
    }

    pub fn get(&self, x: usize, y: usize) -> u32 {
        self.cells[y * self.width + x]
    }

    pub fn max(&self) -> u32 {
        self.cells.iter().copied().max().unwrap_or(0)
    }

    pub fn sum(&self) -> u64 {
        self.cells.iter().map(|&c| c as u64).sum()
    }

    /// Count a visit at fractional screen coordinates. Non-finite and
    /// out-of-bounds points are dropped; a diverged trajectory must never
    /// corrupt the index math.
    pub fn bump(&mut self, sx: f64, sy: f64) -> bool {
        if !(sx.is_finite() && sy.is_finite()) {
            return false;
        }
        if sx < 0.0 || sy < 0.0 {
            return false;
        }
        let (x, y) = (sx as usize, sy as usize);
        if x >= self.width || y >= self.height {
            return false;
        }
        self.cells[y * self.width + x] += 1;
        true
    }

    fn set(&mut self, x: usize, y: usize, v: u32) {
        self.cells[y * self.width + x] = v;
    }
}

/// Compute the density buffer for the active system.
///
/// `budget` governs trajectory systems only; escape-time systems take their
/// iteration/sample counts from their own parameters. `t` is the animation
/// clock the curl field flows against.
pub fn compute_density(system: &System, w: usize, h: usize, budget: u64, t: f64) -> DensityBuffer {
    let mut buf = DensityBuffer::new(w, h);
    match system.params {
        AttractorParams::Buddhabrot(p) => accumulate_sampled(&p, false, &mut buf),
        AttractorParams::BurningShip(p) => accumulate_sampled(&p, true, &mut buf),
        AttractorParams::Mandelbrot(p) => fill_pixel_fractal(&p, &mut buf),
        AttractorParams::CurlNoise { .. } => accumulate_curl(system, budget, t, &mut buf),
        _ => accumulate_trajectory(system, budget, t, &mut buf),
    }
    buf
}

/// Warm up from a fixed internal state, then record `budget` projected steps.
fn accumulate_trajectory(system: &System, budget: u64, t: f64, buf: &mut DensityBuffer) {
    let warmup = match system.kind() {
        SystemKind::Lorenz | SystemKind::Aizawa => ODE_WARMUP,
        _ => MAP_WARMUP,
    };
    let mut s = State::new(0.1, 0.0, 0.0);
    for _ in 0..warmup {
        s = system.step(s, t);
    }
    for _ in 0..budget {
        s = system.step(s, t);
        let (sx, sy) = system.project(s, buf.width, buf.height);
        buf.bump(sx, sy);
    }
}

/// The curl field has no attracting trajectory, so the budget is spread over
/// many short independently seeded particle runs.
fn accumulate_curl(system: &System, budget: u64, t: f64, buf: &mut DensityBuffer) {
    let steps_per = budget / CURL_PARTICLES;
    let mut rng = Lcg31::new(1);
    for _ in 0..CURL_PARTICLES {
        let mut s = State::new(rng.next_f64(), rng.next_f64(), 0.0);
        for _ in 0..steps_per {
            s = system.step(s, t);
            let (sx, sy) = system.project(s, buf.width, buf.height);
            buf.bump(sx, sy);
        }
    }
}

/// Main-cardioid / period-2-bulb containment: such seeds provably never
/// escape, so sampling skips them outright.
pub fn in_cardioid_or_bulb(cr: f64, ci: f64) -> bool {
    let q = (cr - 0.25) * (cr - 0.25) + ci * ci;
    if q * (q + (cr - 0.25)) < 0.25 * ci * ci {
        return true;
    }
    (cr + 1.0) * (cr + 1.0) + ci * ci < 0.0625
}

/// Buddhabrot / Burning Ship: rasterize every point of accepted orbits into
/// the shared histogram. `anti` inverts the accept condition (non-escaping
/// orbits instead of escaping ones).
fn accumulate_sampled(p: &EscapeSampling, ship: bool, buf: &mut DensityBuffer) {
    let mut rng = Lcg31::new(p.sample_seed);
    let mut orbit: Vec<(f64, f64)> = Vec::with_capacity(p.max_iter as usize);

    for _ in 0..p.samples {
        let cr = rng.next_range(SAMPLE_RE.0, SAMPLE_RE.1);
        let ci = rng.next_range(SAMPLE_IM.0, SAMPLE_IM.1);
        if in_cardioid_or_bulb(cr, ci) {
            continue;
        }

        orbit.clear();
        let mut zr = 0.0f64;
        let mut zi = 0.0f64;
        let mut escaped = false;
        for _ in 0..p.max_iter {
            let (ar, ai) = if ship { (zr.abs(), zi.abs()) } else { (zr, zi) };
            let nr = ar * ar - ai * ai + cr;
            let ni = 2.0 * ar * ai + ci;
            zr = nr;
            zi = ni;
            orbit.push((zr, zi));
            if zr * zr + zi * zi > 4.0 {
                escaped = true;
                break;
            }
        }

        if escaped != p.anti {
            for &(re, im) in &orbit {
                let (sx, sy) = plane_to_screen(
                    re,
                    im,
                    p.center_x,
                    p.center_y,
                    p.zoom,
                    buf.width,
                    buf.height,
                );
                buf.bump(sx, sy);
            }
        }
    }
}

/// Direct per-pixel Mandelbrot/Julia fill: 0 for interior points, otherwise
/// a smooth iteration count quantized to 1..=1000.
pub fn fill_pixel_fractal(p: &PixelFractal, buf: &mut DensityBuffer) {
    let (w, h) = (buf.width, buf.height);
    for py in 0..h {
        for px in 0..w {
            let (re, im) = screen_to_plane(
                px as f64 + 0.5,
                py as f64 + 0.5,
                p.center_x,
                p.center_y,
                p.zoom,
                w,
                h,
            );
            let (mut zr, mut zi, cr, ci) = if p.julia {
                (re, im, p.julia_r, p.julia_i)
            } else {
                (0.0, 0.0, re, im)
            };

            let mut value = 0u32;
            let mut iter = 0u32;
            while iter < p.max_iter {
                let nr = zr * zr - zi * zi + cr;
                let ni = 2.0 * zr * zi + ci;
                zr = nr;
                zi = ni;
                let m2 = zr * zr + zi * zi;
                if m2 > 4.0 {
                    value = smooth_value(iter, m2, p.max_iter);
                    break;
                }
                iter += 1;
            }
            buf.set(px, py, value);
        }
    }
}

/// Quantized smooth iteration count; continuous in the escape magnitude so
/// gradients do not band.
fn smooth_value(iter: u32, m2: f64, max_iter: u32) -> u32 {
    let ln2 = std::f64::consts::LN_2;
    let log_zn = m2.ln() / 2.0;
    let nu = iter as f64 + 1.0 - (log_zn / ln2).ln() / ln2;
    let scaled = (nu / max_iter as f64 * SMOOTH_STEPS).floor() + 1.0;
    scaled.clamp(1.0, SMOOTH_STEPS) as u32
}

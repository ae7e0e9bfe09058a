//! Dynamical system library: step functions, projections, and initial-state
//! sampling for the seven supported systems.
//!
//! Discrete 2D maps (de Jong, Clifford) and the RK4-integrated ODEs (Lorenz,
//! Aizawa) are advanced point by point through [`System::step`]. Escape-time
//! systems (Buddhabrot, Burning Ship, Mandelbrot/Julia) iterate per orbit or
//! per pixel instead; their math lives in `density` and `orbit`, keyed off
//! the same parameter variants defined here.

pub mod noise;

use crate::features::ParamDeltas;
use noise::NoiseField;

pub const LORENZ_DT: f64 = 0.005;
pub const AIZAWA_DT: f64 = 0.01;
pub const ODE_WARMUP: u32 = 500;
pub const MAP_WARMUP: u32 = 100;

/// Sampling rectangle for Buddhabrot/Burning Ship seeds.
pub const SAMPLE_RE: (f64, f64) = (-2.5, 1.5);
pub const SAMPLE_IM: (f64, f64) = (-2.0, 2.0);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SystemKind {
    DeJong,
    Clifford,
    Lorenz,
    Aizawa,
    Buddhabrot,
    BurningShip,
    Mandelbrot,
    CurlNoise,
}

impl SystemKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::DeJong => "de Jong",
            Self::Clifford => "Clifford",
            Self::Lorenz => "Lorenz",
            Self::Aizawa => "Aizawa",
            Self::Buddhabrot => "Buddhabrot",
            Self::BurningShip => "Burning Ship",
            Self::Mandelbrot => "Mandelbrot/Julia",
            Self::CurlNoise => "Curl Noise",
        }
    }

    /// Escape-time systems compute per pixel or per sampled orbit rather
    /// than by walking one long trajectory.
    pub fn is_escape_time(self) -> bool {
        matches!(self, Self::Buddhabrot | Self::BurningShip | Self::Mandelbrot)
    }

    /// Only the direct per-pixel fractal is expensive enough to offload.
    pub fn uses_worker(self) -> bool {
        self == Self::Mandelbrot
    }

    pub const fn all() -> [Self; 8] {
        [
            Self::DeJong,
            Self::Clifford,
            Self::Lorenz,
            Self::Aizawa,
            Self::Buddhabrot,
            Self::BurningShip,
            Self::Mandelbrot,
            Self::CurlNoise,
        ]
    }

    pub fn next(self) -> Self {
        let all = Self::all();
        let mut idx = 0usize;
        while idx < all.len() {
            if all[idx] == self {
                return all[(idx + 1) % all.len()];
            }
            idx += 1;
        }
        Self::DeJong
    }

    pub fn prev(self) -> Self {
        let all = Self::all();
        let mut idx = 0usize;
        while idx < all.len() {
            if all[idx] == self {
                return all[(idx + all.len() - 1) % all.len()];
            }
            idx += 1;
        }
        Self::DeJong
    }
}

/// Parameters for the Buddhabrot/Burning Ship histogram path.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EscapeSampling {
    pub max_iter: u32,
    pub samples: u32,
    pub anti: bool,
    pub center_x: f64,
    pub center_y: f64,
    pub zoom: f64,
    pub sample_seed: u32,
}

/// Parameters for the direct per-pixel Mandelbrot/Julia path.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PixelFractal {
    pub max_iter: u32,
    pub center_x: f64,
    pub center_y: f64,
    pub zoom: f64,
    pub julia: bool,
    pub julia_r: f64,
    pub julia_i: f64,
}

/// Tagged parameter union; the variant *is* the system selector, so the tag
/// and its parameters cannot disagree.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum AttractorParams {
    DeJong { a: f64, b: f64, c: f64, d: f64 },
    Clifford { a: f64, b: f64, c: f64, d: f64 },
    Lorenz { sigma: f64, rho: f64, beta: f64 },
    Aizawa { a: f64, b: f64, c: f64, d: f64, e: f64, f: f64 },
    Buddhabrot(EscapeSampling),
    BurningShip(EscapeSampling),
    Mandelbrot(PixelFractal),
    CurlNoise { scale: f64, octaves: u32, lacunarity: f64, gain: f64, speed: f64 },
}

impl AttractorParams {
    pub fn kind(&self) -> SystemKind {
        match self {
            Self::DeJong { .. } => SystemKind::DeJong,
            Self::Clifford { .. } => SystemKind::Clifford,
            Self::Lorenz { .. } => SystemKind::Lorenz,
            Self::Aizawa { .. } => SystemKind::Aizawa,
            Self::Buddhabrot(_) => SystemKind::Buddhabrot,
            Self::BurningShip(_) => SystemKind::BurningShip,
            Self::Mandelbrot(_) => SystemKind::Mandelbrot,
            Self::CurlNoise { .. } => SystemKind::CurlNoise,
        }
    }

    /// Classic preset per system; the interactive defaults.
    pub fn preset(kind: SystemKind) -> Self {
        match kind {
            SystemKind::DeJong => Self::DeJong { a: -2.24, b: 0.43, c: -0.65, d: -2.43 },
            SystemKind::Clifford => Self::Clifford { a: -1.4, b: 1.6, c: 1.0, d: 0.7 },
            SystemKind::Lorenz => Self::Lorenz { sigma: 10.0, rho: 28.0, beta: 8.0 / 3.0 },
            SystemKind::Aizawa => Self::Aizawa {
                a: 0.95,
                b: 0.7,
                c: 0.6,
                d: 3.5,
                e: 0.25,
                f: 0.1,
            },
            SystemKind::Buddhabrot => Self::Buddhabrot(EscapeSampling {
                max_iter: 200,
                samples: 100_000,
                anti: false,
                center_x: -0.5,
                center_y: 0.0,
                zoom: 1.0,
                sample_seed: 12345,
            }),
            SystemKind::BurningShip => Self::BurningShip(EscapeSampling {
                max_iter: 200,
                samples: 100_000,
                anti: false,
                center_x: -0.5,
                center_y: -0.4,
                zoom: 1.0,
                sample_seed: 12345,
            }),
            SystemKind::Mandelbrot => Self::Mandelbrot(PixelFractal {
                max_iter: 200,
                center_x: -0.5,
                center_y: 0.0,
                zoom: 1.0,
                julia: false,
                julia_r: -0.8,
                julia_i: 0.156,
            }),
            SystemKind::CurlNoise => Self::CurlNoise {
                scale: 3.0,
                octaves: 4,
                lacunarity: 2.0,
                gain: 0.5,
                speed: 1.0,
            },
        }
    }

    /// Add animator/audio deltas positionally to the active variant's
    /// coefficients. The core does not interpret the mapping.
    pub fn apply_deltas(&mut self, d: &ParamDeltas) {
        let s = &d.slots;
        match self {
            Self::DeJong { a, b, c, d } | Self::Clifford { a, b, c, d } => {
                *a += s[0];
                *b += s[1];
                *c += s[2];
                *d += s[3];
            }
            Self::Lorenz { sigma, rho, beta } => {
                *sigma += s[0];
                *rho += s[1];
                *beta += s[2];
            }
            Self::Aizawa { a, b, c, d, e, f } => {
                *a += s[0];
                *b += s[1];
                *c += s[2];
                *d += s[3];
                *e += s[4];
                *f += s[5];
            }
            Self::Buddhabrot(p) | Self::BurningShip(p) => {
                p.center_x += s[0];
                p.center_y += s[1];
                p.zoom = (p.zoom + s[2]).max(1e-9);
            }
            Self::Mandelbrot(p) => {
                p.center_x += s[0];
                p.center_y += s[1];
                p.zoom = (p.zoom + s[2]).max(1e-9);
                p.julia_r += s[3];
                p.julia_i += s[4];
            }
            Self::CurlNoise { scale, speed, gain, .. } => {
                *scale += s[0];
                *speed += s[1];
                *gain += s[2];
            }
        }
    }
}

/// Simulation state. 2D maps use (x, y); ODEs use all three; curl-noise
/// particles keep (x, y) in normalized [0, 1] canvas space.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct State {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl State {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

/// A selected system: parameters plus the noise field the curl system flows
/// through. Built once per system switch, not re-dispatched per call.
pub struct System {
    pub params: AttractorParams,
    noise: NoiseField,
}

impl System {
    pub fn new(params: AttractorParams, noise_seed: u64) -> Self {
        Self {
            params,
            noise: NoiseField::new(noise_seed),
        }
    }

    pub fn kind(&self) -> SystemKind {
        self.params.kind()
    }

    pub fn noise(&self) -> &NoiseField {
        &self.noise
    }

    /// Advance one step. Pure: escape-time variants are advanced per orbit
    /// by the density/orbit paths and pass through unchanged here.
    pub fn step(&self, s: State, t: f64) -> State {
        step_params(&self.params, &self.noise, s, t)
    }

    /// Project a state to screen-space pixel coordinates.
    pub fn project(&self, s: State, w: usize, h: usize) -> (f64, f64) {
        project_params(&self.params, s, w, h)
    }

    /// Randomized starting state for a fresh particle.
    pub fn initial_state(&self) -> State {
        match self.params.kind() {
            SystemKind::DeJong | SystemKind::Clifford => State::new(
                fastrand::f64() * 2.0 - 1.0,
                fastrand::f64() * 2.0 - 1.0,
                0.0,
            ),
            SystemKind::Lorenz => State::new(
                0.1 + fastrand::f64() * 0.2,
                fastrand::f64() * 0.2,
                fastrand::f64() * 0.2,
            ),
            SystemKind::Aizawa => State::new(
                0.1 + fastrand::f64() * 0.1,
                fastrand::f64() * 0.1,
                fastrand::f64() * 0.1,
            ),
            SystemKind::CurlNoise => State::new(fastrand::f64(), fastrand::f64(), 0.0),
            // Escape-time particles ride traced orbits instead.
            _ => State::default(),
        }
    }
}

pub fn step_params(params: &AttractorParams, noise: &NoiseField, s: State, t: f64) -> State {
    match *params {
        AttractorParams::DeJong { a, b, c, d } => State::new(
            (a * s.y).sin() - (b * s.x).cos(),
            (c * s.x).sin() - (d * s.y).cos(),
            0.0,
        ),
        AttractorParams::Clifford { a, b, c, d } => State::new(
            (a * s.y).sin() + c * (a * s.x).cos(),
            (b * s.x).sin() + d * (b * s.y).cos(),
            0.0,
        ),
        AttractorParams::Lorenz { sigma, rho, beta } => rk4(
            |p| {
                State::new(
                    sigma * (p.y - p.x),
                    p.x * (rho - p.z) - p.y,
                    p.x * p.y - beta * p.z,
                )
            },
            s,
            LORENZ_DT,
        ),
        AttractorParams::Aizawa { a, b, c, d, e, f } => rk4(
            |p| {
                State::new(
                    (p.z - b) * p.x - d * p.y,
                    d * p.x + (p.z - b) * p.y,
                    c + a * p.z - p.z.powi(3) / 3.0
                        - (p.x * p.x + p.y * p.y) * (1.0 + e * p.z)
                        + f * p.z * p.x.powi(3),
                )
            },
            s,
            AIZAWA_DT,
        ),
        AttractorParams::CurlNoise { scale, octaves, lacunarity, gain, speed } => {
            let (cx, cy) = noise.curl(s.x * scale, s.y * scale, t, octaves, lacunarity, gain);
            State::new(s.x + cx * speed * 0.02, s.y + cy * speed * 0.02, 0.0)
        }
        AttractorParams::Buddhabrot(_)
        | AttractorParams::BurningShip(_)
        | AttractorParams::Mandelbrot(_) => s,
    }
}

pub fn project_params(params: &AttractorParams, s: State, w: usize, h: usize) -> (f64, f64) {
    let wf = w as f64;
    let hf = h as f64;
    let min = wf.min(hf);
    match params.kind() {
        SystemKind::DeJong | SystemKind::Clifford => {
            let scale = min / 4.2;
            (wf * 0.5 + s.x * scale, hf * 0.5 + s.y * scale)
        }
        SystemKind::Lorenz => {
            let (rx, _) = rotate_xy(s.x, s.y, 0.3);
            let scale = min / 55.0;
            (wf * 0.5 + rx * scale, hf * 0.5 - (s.z - 25.0) * scale)
        }
        SystemKind::Aizawa => {
            let (rx, _) = rotate_xy(s.x, s.y, 0.5);
            let scale = min / 3.5;
            (wf * 0.5 + rx * scale, hf * 0.5 - (s.z - 0.55) * scale)
        }
        SystemKind::CurlNoise => (s.x * wf, s.y * hf),
        // Escape-time states are complex-plane points; map through the view.
        SystemKind::Buddhabrot | SystemKind::BurningShip | SystemKind::Mandelbrot => {
            let (cx, cy, zoom) = match *params {
                AttractorParams::Buddhabrot(p) | AttractorParams::BurningShip(p) => {
                    (p.center_x, p.center_y, p.zoom)
                }
                AttractorParams::Mandelbrot(p) => (p.center_x, p.center_y, p.zoom),
                _ => unreachable!(),
            };
            plane_to_screen(s.x, s.y, cx, cy, zoom, w, h)
        }
    }
}

fn rotate_xy(x: f64, y: f64, angle: f64) -> (f64, f64) {
    let (sa, ca) = angle.sin_cos();
    (x * ca - y * sa, x * sa + y * ca)
}

/// Affine view map from complex-plane coordinates to pixels. The visible
/// span is 4/zoom units across the smaller canvas axis.
pub fn plane_to_screen(
    re: f64,
    im: f64,
    center_x: f64,
    center_y: f64,
    zoom: f64,
    w: usize,
    h: usize,
) -> (f64, f64) {
    let min = (w as f64).min(h as f64);
    let scale = min * zoom / 4.0;
    (
        w as f64 * 0.5 + (re - center_x) * scale,
        h as f64 * 0.5 + (im - center_y) * scale,
    )
}

/// Inverse of [`plane_to_screen`], used by the per-pixel fractal path.
pub fn screen_to_plane(
    px: f64,
    py: f64,
    center_x: f64,
    center_y: f64,
    zoom: f64,
    w: usize,
    h: usize,
) -> (f64, f64) {
    let min = (w as f64).min(h as f64);
    let scale = min * zoom / 4.0;
    (
        center_x + (px - w as f64 * 0.5) / scale,
        center_y + (py - h as f64 * 0.5) / scale,
    )
}

/// Classic 4-stage Runge-Kutta step.
fn rk4(deriv: impl Fn(State) -> State, s: State, dt: f64) -> State {
    let k1 = deriv(s);
    let k2 = deriv(State::new(
        s.x + k1.x * dt * 0.5,
        s.y + k1.y * dt * 0.5,
        s.z + k1.z * dt * 0.5,
    ));
    let k3 = deriv(State::new(
        s.x + k2.x * dt * 0.5,
        s.y + k2.y * dt * 0.5,
        s.z + k2.z * dt * 0.5,
    ));
    let k4 = deriv(State::new(s.x + k3.x * dt, s.y + k3.y * dt, s.z + k3.z * dt));
    State::new(
        s.x + dt / 6.0 * (k1.x + 2.0 * k2.x + 2.0 * k3.x + k4.x),
        s.y + dt / 6.0 * (k1.y + 2.0 * k2.y + 2.0 * k3.y + k4.y),
        s.z + dt / 6.0 * (k1.z + 2.0 * k2.z + 2.0 * k3.z + k4.z),
    )
}

/// 31-bit linear congruential generator. Deterministic and cheap; the
/// Buddhabrot sampling path depends on reproducible streams per seed.
#[derive(Clone, Debug)]
pub struct Lcg31 {
    state: u32,
}

impl Lcg31 {
    pub fn new(seed: u32) -> Self {
        Self {
            state: seed & 0x7fff_ffff,
        }
    }

    pub fn next_u31(&mut self) -> u32 {
        self.state = self
            .state
            .wrapping_mul(1_103_515_245)
            .wrapping_add(12_345)
            & 0x7fff_ffff;
        self.state
    }

    /// Uniform in [0, 1).
    pub fn next_f64(&mut self) -> f64 {
        self.next_u31() as f64 / 0x8000_0000u32 as f64
    }

    pub fn next_range(&mut self, lo: f64, hi: f64) -> f64 {
        lo + self.next_f64() * (hi - lo)
    }
}

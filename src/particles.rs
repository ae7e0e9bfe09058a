//! Persistent per-particle state for the particle and vapor renderers.
//!
//! Trajectory systems keep a pool of independently stepped particles with
//! their previous screen positions (for velocity-stretched strokes).
//! Escape-time systems keep a pool of riders walking pre-traced orbits,
//! retracing when one runs out and reusing the stale orbit on failure.

use crate::dynamics::{AttractorParams, Lcg31, State, System};
use crate::orbit::{Orbit, trace_orbit};

pub struct TrailParticle {
    pub state: State,
    pub prev_sx: f64,
    pub prev_sy: f64,
    pub sx: f64,
    pub sy: f64,
}

pub struct ParticlePool {
    particles: Vec<TrailParticle>,
}

impl ParticlePool {
    /// Fresh pool; also the wholesale reinit path when the particle count or
    /// the system changes.
    pub fn new(system: &System, count: usize, w: usize, h: usize) -> Self {
        let particles = (0..count)
            .map(|_| {
                let state = system.initial_state();
                let (sx, sy) = system.project(state, w, h);
                TrailParticle {
                    state,
                    prev_sx: sx,
                    prev_sy: sy,
                    sx,
                    sy,
                }
            })
            .collect();
        Self { particles }
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn particles(&self) -> &[TrailParticle] {
        &self.particles
    }

    /// Step every particle once and reproject. Diverged particles respawn
    /// from a fresh initial state instead of carrying NaNs forward.
    pub fn step(&mut self, system: &System, w: usize, h: usize, t: f64) {
        for p in &mut self.particles {
            p.prev_sx = p.sx;
            p.prev_sy = p.sy;
            p.state = system.step(p.state, t);
            if !p.state.is_finite() {
                p.state = system.initial_state();
            }
            let (sx, sy) = system.project(p.state, w, h);
            p.sx = sx;
            p.sy = sy;
        }
    }
}

pub struct OrbitRider {
    orbit: Orbit,
    float_index: f64,
    speed: f64,
}

impl OrbitRider {
    fn new(params: &AttractorParams, rng: &mut Lcg31) -> Self {
        Self {
            orbit: trace_orbit(params, rng),
            float_index: 0.0,
            speed: 0.35 + rng.next_f64() * 1.4,
        }
    }

    /// Advance along the orbit; when exhausted, trace a new one. A failed
    /// trace rewinds onto the same stale orbit rather than wedging.
    fn advance(&mut self, params: &AttractorParams, rng: &mut Lcg31) {
        self.float_index += self.speed;
        if self.float_index >= self.orbit.len() as f64 {
            let fresh = trace_orbit(params, rng);
            if !fresh.is_empty() {
                self.orbit = fresh;
            }
            self.float_index = 0.0;
        }
    }

    /// Current complex-plane position, interpolated between orbit points.
    /// `None` while no orbit is available ("no trail this frame").
    pub fn position(&self) -> Option<(f64, f64)> {
        if self.orbit.is_empty() {
            return None;
        }
        let idx = self.float_index.floor() as usize;
        let a = self.orbit[idx.min(self.orbit.len() - 1)];
        let b = self.orbit[(idx + 1).min(self.orbit.len() - 1)];
        let frac = self.float_index - idx as f64;
        Some((a.0 + (b.0 - a.0) * frac, a.1 + (b.1 - a.1) * frac))
    }

    #[cfg(test)]
    pub fn with_orbit(orbit: Orbit, speed: f64) -> Self {
        Self {
            orbit,
            float_index: 0.0,
            speed,
        }
    }

    #[cfg(test)]
    pub fn orbit_len(&self) -> usize {
        self.orbit.len()
    }
}

pub struct RiderPool {
    riders: Vec<OrbitRider>,
    rng: Lcg31,
}

impl RiderPool {
    pub fn new(params: &AttractorParams, count: usize) -> Self {
        let mut rng = Lcg31::new(fastrand::u32(..) | 1);
        let riders = (0..count).map(|_| OrbitRider::new(params, &mut rng)).collect();
        Self { riders, rng }
    }

    pub fn len(&self) -> usize {
        self.riders.len()
    }

    pub fn advance(&mut self, params: &AttractorParams) {
        for r in &mut self.riders {
            r.advance(params, &mut self.rng);
        }
    }

    pub fn riders(&self) -> &[OrbitRider] {
        &self.riders
    }
}

//! One-shot orbit tracing for escape-time systems.
//!
//! Particle and vapor renderers ride these traced orbits as trails. An empty
//! result is a defined outcome ("no trail this frame"), not an error; the
//! rider keeps its previous orbit and tries again later.

use crate::dynamics::{AttractorParams, Lcg31, SAMPLE_IM, SAMPLE_RE};

const MAX_ATTEMPTS: u32 = 200;
const MIN_ORBIT_LEN: usize = 6;

/// An escaping trajectory through the complex plane, oldest point first.
pub type Orbit = Vec<(f64, f64)>;

/// Rejection-sample seeds until one produces an escaping orbit longer than
/// five points, or the attempt budget runs out (empty orbit).
pub fn trace_orbit(params: &AttractorParams, rng: &mut Lcg31) -> Orbit {
    let (max_iter, ship, julia, jc) = match *params {
        AttractorParams::Buddhabrot(p) => (p.max_iter, false, false, (0.0, 0.0)),
        AttractorParams::BurningShip(p) => (p.max_iter, true, false, (0.0, 0.0)),
        AttractorParams::Mandelbrot(p) => (p.max_iter, false, p.julia, (p.julia_r, p.julia_i)),
        _ => return Vec::new(),
    };

    for _ in 0..MAX_ATTEMPTS {
        let sr = rng.next_range(SAMPLE_RE.0, SAMPLE_RE.1);
        let si = rng.next_range(SAMPLE_IM.0, SAMPLE_IM.1);
        let (mut zr, mut zi, cr, ci) = if julia {
            (sr, si, jc.0, jc.1)
        } else {
            (0.0, 0.0, sr, si)
        };

        let mut orbit = Vec::new();
        let mut escaped = false;
        for _ in 0..max_iter {
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

        if escaped && orbit.len() >= MIN_ORBIT_LEN {
            return orbit;
        }
    }
    Vec::new()
}

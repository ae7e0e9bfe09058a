//! Seeded gradient noise for the curl-noise flow field.
//!
//! A `NoiseField` owns its permutation table, so two fields with the same
//! seed agree exactly and fields with different seeds are independent. No
//! module-level state.

use super::Lcg31;

const EPS: f64 = 1e-3;

pub struct NoiseField {
    perm: [u8; 512],
}

impl NoiseField {
    pub fn new(seed: u64) -> Self {
        let mut table = [0u8; 256];
        for (i, v) in table.iter_mut().enumerate() {
            *v = i as u8;
        }
        // Fisher-Yates driven by the same LCG family as orbit sampling.
        let mut rng = Lcg31::new((seed as u32) ^ ((seed >> 32) as u32) | 1);
        for i in (1..256usize).rev() {
            let j = (rng.next_u31() as usize) % (i + 1);
            table.swap(i, j);
        }
        let mut perm = [0u8; 512];
        for i in 0..512 {
            perm[i] = table[i & 255];
        }
        Self { perm }
    }

    fn hash(&self, x: usize, y: usize, z: usize) -> u8 {
        let a = self.perm[x & 255] as usize;
        let b = self.perm[(a + y) & 255] as usize;
        self.perm[(b + z) & 255]
    }

    /// Perlin-style gradient noise over (x, y, t), roughly in [-1, 1].
    pub fn noise(&self, x: f64, y: f64, t: f64) -> f64 {
        let xi = x.floor();
        let yi = y.floor();
        let ti = t.floor();
        let xf = x - xi;
        let yf = y - yi;
        let tf = t - ti;
        let (xi, yi, ti) = (
            xi.rem_euclid(256.0) as usize,
            yi.rem_euclid(256.0) as usize,
            ti.rem_euclid(256.0) as usize,
        );

        let u = fade(xf);
        let v = fade(yf);
        let w = fade(tf);

        let corner = |dx: usize, dy: usize, dt: usize| {
            grad(
                self.hash(xi + dx, yi + dy, ti + dt),
                xf - dx as f64,
                yf - dy as f64,
                tf - dt as f64,
            )
        };

        let x00 = lerp(corner(0, 0, 0), corner(1, 0, 0), u);
        let x10 = lerp(corner(0, 1, 0), corner(1, 1, 0), u);
        let x01 = lerp(corner(0, 0, 1), corner(1, 0, 1), u);
        let x11 = lerp(corner(0, 1, 1), corner(1, 1, 1), u);
        lerp(lerp(x00, x10, v), lerp(x01, x11, v), w)
    }

    /// Fractal Brownian motion: `octaves` layers at `lacunarity` frequency
    /// growth and `gain` amplitude decay, normalized to roughly [-1, 1].
    pub fn fbm(&self, x: f64, y: f64, t: f64, octaves: u32, lacunarity: f64, gain: f64) -> f64 {
        let octaves = octaves.max(1);
        let mut sum = 0.0;
        let mut amp = 1.0;
        let mut freq = 1.0;
        let mut norm = 0.0;
        for _ in 0..octaves {
            sum += self.noise(x * freq, y * freq, t) * amp;
            norm += amp;
            amp *= gain;
            freq *= lacunarity;
        }
        if norm > 0.0 { sum / norm } else { 0.0 }
    }

    /// Divergence-free 2D velocity from the scalar FBM field:
    /// `curl = (dN/dy, -dN/dx)`, via central differences.
    pub fn curl(
        &self,
        x: f64,
        y: f64,
        t: f64,
        octaves: u32,
        lacunarity: f64,
        gain: f64,
    ) -> (f64, f64) {
        let dy = (self.fbm(x, y + EPS, t, octaves, lacunarity, gain)
            - self.fbm(x, y - EPS, t, octaves, lacunarity, gain))
            / (2.0 * EPS);
        let dx = (self.fbm(x + EPS, y, t, octaves, lacunarity, gain)
            - self.fbm(x - EPS, y, t, octaves, lacunarity, gain))
            / (2.0 * EPS);
        (dy, -dx)
    }
}

#[inline]
fn fade(t: f64) -> f64 {
    t * t * t * (t * (t * 6.0 - 15.0) + 10.0)
}

#[inline]
fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

#[inline]
fn grad(hash: u8, x: f64, y: f64, z: f64) -> f64 {
    // 12 gradient directions selected by the low hash bits.
    match hash & 15 {
        0 => x + y,
        1 => -x + y,
        2 => x - y,
        3 => -x - y,
        4 => x + z,
        5 => -x + z,
        6 => x - z,
        7 => -x - z,
        8 => y + z,
        9 => -y + z,
        10 => y - z,
        11 => -y - z,
        12 => x + y,
        13 => -y + z,
        14 => -x + y,
        _ => -y - z,
    }
}

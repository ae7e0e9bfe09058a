//! Tone mapping and the density-to-color pipeline.
//!
//! A raw density/iteration value plus the buffer's running maximum becomes a
//! normalized brightness via the selected curve, then RGB via one of four
//! gradient strategies. Zero-density cells always paint flat background.

use crate::config::{GradientChoice, ToneChoice};
use crate::density::DensityBuffer;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn from_tuple((r, g, b): (u8, u8, u8)) -> Self {
        Self { r, g, b }
    }
}

pub fn lerp_rgb(a: Rgb, b: Rgb, t: f64) -> Rgb {
    let t = t.clamp(0.0, 1.0);
    Rgb::new(
        (a.r as f64 + (b.r as f64 - a.r as f64) * t).round() as u8,
        (a.g as f64 + (b.g as f64 - a.g as f64) * t).round() as u8,
        (a.b as f64 + (b.b as f64 - a.b as f64) * t).round() as u8,
    )
}

/// Normalize a raw cell value against the running maximum. An all-zero
/// buffer (`max == 0`) maps everything to 0.
pub fn tone_map(value: f64, max: f64, curve: ToneChoice) -> f64 {
    if max <= 0.0 {
        return 0.0;
    }
    let v = (value / max).clamp(0.0, 1.0);
    match curve {
        ToneChoice::Linear => v,
        ToneChoice::Sqrt => v.sqrt(),
        ToneChoice::Log => (1.0 + 9.0 * v).log10(),
    }
}

/// Piecewise-linear interpolation across consecutive stop pairs, clamped at
/// the ends. Endpoints are hit exactly at t=0 and t=1.
pub fn multi_stop_gradient(stops: &[Rgb], t: f64) -> Rgb {
    match stops.len() {
        0 => Rgb::new(0, 0, 0),
        1 => stops[0],
        n => {
            let pos = t.clamp(0.0, 1.0) * (n - 1) as f64;
            let idx = (pos.floor() as usize).min(n - 2);
            lerp_rgb(stops[idx], stops[idx + 1], pos - idx as f64)
        }
    }
}

/// HSL to RGB; h in degrees, s and l in [0, 1].
pub fn hsl_to_rgb(h: f64, s: f64, l: f64) -> Rgb {
    let h = h.rem_euclid(360.0);
    let c = (1.0 - (2.0 * l - 1.0).abs()) * s;
    let x = c * (1.0 - ((h / 60.0) % 2.0 - 1.0).abs());
    let m = l - c / 2.0;
    let (r, g, b) = match (h / 60.0) as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    Rgb::new(
        ((r + m) * 255.0).round() as u8,
        ((g + m) * 255.0).round() as u8,
        ((b + m) * 255.0).round() as u8,
    )
}

fn rgb_to_hsl(c: Rgb) -> (f64, f64, f64) {
    let r = c.r as f64 / 255.0;
    let g = c.g as f64 / 255.0;
    let b = c.b as f64 / 255.0;
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let l = (max + min) / 2.0;
    if max == min {
        return (0.0, 0.0, l);
    }
    let d = max - min;
    let s = if l > 0.5 { d / (2.0 - max - min) } else { d / (max + min) };
    let h = if max == r {
        60.0 * (((g - b) / d).rem_euclid(6.0))
    } else if max == g {
        60.0 * ((b - r) / d + 2.0)
    } else {
        60.0 * ((r - g) / d + 4.0)
    };
    (h, s, l)
}

/// Rotate a color's hue by `degrees`, keeping saturation and lightness.
pub fn hue_shift(c: Rgb, degrees: f64) -> Rgb {
    let (h, s, l) = rgb_to_hsl(c);
    hsl_to_rgb(h + degrees, s, l)
}

/// The five stops backing the `vivid` gradient: hue-shifted endpoints around
/// the two user colors with a boosted bright midpoint.
pub fn vivid_stops(a: Rgb, b: Rgb) -> [Rgb; 5] {
    let mid = Rgb::new(
        ((a.r as u16 + b.r as u16) / 2 + 80).min(255) as u8,
        ((a.g as u16 + b.g as u16) / 2 + 80).min(255) as u8,
        ((a.b as u16 + b.b as u16) / 2 + 80).min(255) as u8,
    );
    [hue_shift(a, -30.0), a, mid, b, hue_shift(b, 30.0)]
}

/// Resolve the color for a tone-mapped brightness `t`. Low densities bleed
/// toward the background in every mode except `spectral`.
pub fn shade(t: f64, mode: GradientChoice, a: Rgb, b: Rgb, bg: Rgb) -> Rgb {
    match mode {
        GradientChoice::Single => lerp_rgb(bg, a, t),
        GradientChoice::Dual => lerp_rgb(bg, lerp_rgb(a, b, t), t),
        GradientChoice::Spectral => {
            hsl_to_rgb((t * 300.0 + 200.0) % 360.0, 0.9, 0.20 + t * 0.60)
        }
        GradientChoice::Vivid => {
            let g = multi_stop_gradient(&vivid_stops(a, b), t);
            lerp_rgb(bg, g, t)
        }
    }
}

/// Paint a density buffer into an RGBA frame. The sole consumer of a
/// produced buffer; called exactly once per buffer.
pub fn paint(
    buf: &DensityBuffer,
    curve: ToneChoice,
    mode: GradientChoice,
    a: Rgb,
    b: Rgb,
    bg: Rgb,
    out_rgba: &mut [u8],
) {
    let max = buf.max() as f64;
    let cells = buf.cells();
    for (i, &v) in cells.iter().enumerate() {
        let o = i * 4;
        if o + 3 >= out_rgba.len() {
            break;
        }
        let c = if v == 0 {
            bg
        } else {
            shade(tone_map(v as f64, max, curve), mode, a, b, bg)
        };
        out_rgba[o] = c.r;
        out_rgba[o + 1] = c.g;
        out_rgba[o + 2] = c.b;
        out_rgba[o + 3] = 255;
    }
}

/// Fill a frame with flat background (no-cache fallback for the worker path).
pub fn paint_background(bg: Rgb, out_rgba: &mut [u8]) {
    for px in out_rgba.chunks_exact_mut(4) {
        px[0] = bg.r;
        px[1] = bg.g;
        px[2] = bg.b;
        px[3] = 255;
    }
}

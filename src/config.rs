use clap::{Parser, ValueEnum};

#[derive(Parser, Debug, Clone)]
#[command(name = "attractor-studio", version, about = "Interactive strange-attractor and escape-time fractal visualizer")]
pub struct Config {
    #[arg(long, value_enum, default_value_t = SystemChoice::DeJong)]
    pub system: SystemChoice,

    #[arg(long, value_enum, default_value_t = RenderStrategy::Density)]
    pub render: RenderStrategy,

    #[arg(long, value_enum, default_value_t = ToneChoice::Sqrt)]
    pub tone: ToneChoice,

    #[arg(long, value_enum, default_value_t = GradientChoice::Dual)]
    pub gradient: GradientChoice,

    /// Iteration budget exponent: budget = round(10^p).
    #[arg(long, default_value_t = 5.0)]
    pub exponent: f64,

    #[arg(long, default_value_t = 60)]
    pub fps: u32,

    #[arg(long, default_value_t = 400)]
    pub particles: usize,

    /// Primary gradient color as RRGGBB hex.
    #[arg(long, default_value = "ff7a18", value_parser = parse_hex_color)]
    pub color_a: (u8, u8, u8),

    /// Secondary gradient color as RRGGBB hex.
    #[arg(long, default_value = "21d4fd", value_parser = parse_hex_color)]
    pub color_b: (u8, u8, u8),

    /// Background color as RRGGBB hex.
    #[arg(long, default_value = "05060a", value_parser = parse_hex_color)]
    pub background: (u8, u8, u8),

    #[arg(long, default_value_t = 200)]
    pub max_iter: u32,

    #[arg(long, default_value_t = 100_000)]
    pub samples: u32,

    /// Accumulate non-escaping orbits instead of escaping ones (Buddhabrot/Burning Ship).
    #[arg(long, default_value_t = false)]
    pub anti: bool,

    #[arg(long, default_value_t = 0.0)]
    pub center_x: f64,

    #[arg(long, default_value_t = 0.0)]
    pub center_y: f64,

    #[arg(long, default_value_t = 1.0)]
    pub zoom: f64,

    /// Render the Julia set for --julia-r/--julia-i instead of the Mandelbrot set.
    #[arg(long, default_value_t = false)]
    pub julia: bool,

    #[arg(long, default_value_t = -0.8)]
    pub julia_r: f64,

    #[arg(long, default_value_t = 0.156)]
    pub julia_i: f64,

    /// Seed for the Buddhabrot/Burning Ship sampling generator.
    #[arg(long, default_value_t = 12345)]
    pub sample_seed: u32,

    /// Seed for the curl-noise gradient field.
    #[arg(long, default_value_t = 42)]
    pub noise_seed: u64,

    /// Render this many frames and exit (0 = run until quit).
    #[arg(long, default_value_t = 0)]
    pub frames: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SystemChoice {
    #[value(name = "dejong", alias = "de-jong")]
    DeJong,
    Clifford,
    Lorenz,
    Aizawa,
    Buddhabrot,
    #[value(name = "burning-ship", alias = "burningship", alias = "ship")]
    BurningShip,
    #[value(alias = "julia")]
    Mandelbrot,
    #[value(name = "curl-noise", alias = "curl")]
    CurlNoise,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RenderStrategy {
    Density,
    Particles,
    Vapor,
}

impl RenderStrategy {
    pub fn next(self) -> Self {
        match self {
            Self::Density => Self::Particles,
            Self::Particles => Self::Vapor,
            Self::Vapor => Self::Density,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Density => "density",
            Self::Particles => "particles",
            Self::Vapor => "vapor",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ToneChoice {
    Linear,
    Sqrt,
    Log,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum GradientChoice {
    Single,
    Dual,
    #[value(alias = "spectrum")]
    Spectral,
    Vivid,
}

impl Config {
    /// Iteration budget derived from the exponent slider (10^3 .. 10^6+ range).
    pub fn iteration_budget(&self) -> u64 {
        let p = self.exponent.clamp(1.0, 8.0);
        10f64.powf(p).round() as u64
    }
}

pub fn parse_hex_color(s: &str) -> Result<(u8, u8, u8), String> {
    let s = s.trim_start_matches('#');
    if s.len() != 6 || !s.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(format!("expected RRGGBB hex color, got {s:?}"));
    }
    let r = u8::from_str_radix(&s[0..2], 16).map_err(|e| e.to_string())?;
    let g = u8::from_str_radix(&s[2..4], 16).map_err(|e| e.to_string())?;
    let b = u8::from_str_radix(&s[4..6], 16).map_err(|e| e.to_string())?;
    Ok((r, g, b))
}

//! Color schemes and multi-stop interpolation engine.

/// RGB color as (r, g, b) with values in 0..=255.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

/// A color stop: position in [0, 1] mapped to an RGB color.
#[derive(Debug, Clone, Copy)]
pub struct ColorStop {
    pub t: f64,
    pub color: Rgb,
}

impl ColorStop {
    pub const fn new(t: f64, r: u8, g: u8, b: u8) -> Self {
        Self {
            t,
            color: Rgb::new(r, g, b),
        }
    }
}

/// Available color schemes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColorScheme {
    /// Red -> White -> Blue (signed change: loss red, gain blue)
    RdBu,
    /// Black -> Red -> Yellow -> White (change magnitude)
    Hot,
    /// Black -> White
    Grayscale,
}

impl ColorScheme {
    pub const ALL: &[ColorScheme] = &[Self::RdBu, Self::Hot, Self::Grayscale];

    /// Human-readable name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::RdBu => "RdBu",
            Self::Hot => "Hot",
            Self::Grayscale => "Grayscale",
        }
    }
}

// ─── Color stop definitions ────────────────────────────────────────────

const RDBU_STOPS: &[ColorStop] = &[
    ColorStop::new(0.0, 103, 0, 31),
    ColorStop::new(0.1, 178, 24, 43),
    ColorStop::new(0.2, 214, 96, 77),
    ColorStop::new(0.3, 244, 165, 130),
    ColorStop::new(0.4, 253, 219, 199),
    ColorStop::new(0.5, 247, 247, 247),
    ColorStop::new(0.6, 209, 229, 240),
    ColorStop::new(0.7, 146, 197, 222),
    ColorStop::new(0.8, 67, 147, 195),
    ColorStop::new(0.9, 33, 102, 172),
    ColorStop::new(1.0, 5, 48, 97),
];

const HOT_STOPS: &[ColorStop] = &[
    ColorStop::new(0.000, 10, 0, 0),
    ColorStop::new(0.365, 255, 0, 0),
    ColorStop::new(0.746, 255, 255, 0),
    ColorStop::new(1.000, 255, 255, 255),
];

// ─── Interpolation engine ──────────────────────────────────────────────

fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

fn lerp_color(c1: Rgb, c2: Rgb, t: f64) -> Rgb {
    Rgb::new(
        lerp(c1.r as f64, c2.r as f64, t).round() as u8,
        lerp(c1.g as f64, c2.g as f64, t).round() as u8,
        lerp(c1.b as f64, c2.b as f64, t).round() as u8,
    )
}

fn multi_stop(stops: &[ColorStop], t: f64) -> Rgb {
    if t <= 0.0 {
        return stops[0].color;
    }
    if t >= 1.0 {
        return stops[stops.len() - 1].color;
    }
    for i in 1..stops.len() {
        if t <= stops[i].t {
            let ratio = (t - stops[i - 1].t) / (stops[i].t - stops[i - 1].t);
            return lerp_color(stops[i - 1].color, stops[i].color, ratio);
        }
    }
    stops[stops.len() - 1].color
}

/// Evaluate a color scheme at normalized position `t` ∈ [0, 1].
///
/// Positions outside the unit interval are clamped to the end colors.
pub fn evaluate(scheme: ColorScheme, t: f64) -> Rgb {
    match scheme {
        ColorScheme::RdBu => multi_stop(RDBU_STOPS, t),
        ColorScheme::Hot => multi_stop(HOT_STOPS, t),
        ColorScheme::Grayscale => {
            let v = (t.clamp(0.0, 1.0) * 255.0).round() as u8;
            Rgb::new(v, v, v)
        }
    }
}

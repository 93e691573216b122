//! Hex color handling for heat grids and change charts

use std::fmt;
use std::str::FromStr;
use tsuite_common::{Result, TsuiteError};

/// Bar color for a test that got slower
pub const REGRESSED_COLOR: &str = "#A45A52";
/// Bar color for a test that got faster
pub const IMPROVED_COLOR: &str = "#00703C";
/// Bar color for a change inside the threshold
pub const NEUTRAL_COLOR: &str = "#0F4D92";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const WHITE: Rgb = Rgb { r: 255, g: 255, b: 255 };
    pub const BLACK: Rgb = Rgb { r: 0, g: 0, b: 0 };

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Move each channel toward white (`fraction > 0`) or black (`fraction < 0`).
    ///
    /// `|fraction|` is clamped to 1, so `1.0` yields white and `-1.0` black.
    pub fn shade(self, fraction: f64) -> Rgb {
        if fraction == 0.0 || fraction.is_nan() {
            return self;
        }
        let target = if fraction < 0.0 { Rgb::BLACK } else { Rgb::WHITE };
        self.lerp(target, fraction.abs().min(1.0))
    }

    /// Channel-wise linear interpolation; `t` is clamped to [0,1].
    pub fn lerp(self, other: Rgb, t: f64) -> Rgb {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        let mix = |from: u8, to: u8| -> u8 {
            let from = from as f64;
            (from + (to as f64 - from) * t).round().clamp(0.0, 255.0) as u8
        };
        Rgb::new(mix(self.r, other.r), mix(self.g, other.g), mix(self.b, other.b))
    }
}

impl FromStr for Rgb {
    type Err = TsuiteError;

    /// Parses `#rgb` and `#rrggbb`
    fn from_str(s: &str) -> Result<Self> {
        let invalid = || TsuiteError::InvalidColor(s.to_string());
        let hex = s.strip_prefix('#').ok_or_else(invalid)?;
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(invalid());
        }

        match hex.len() {
            3 => {
                let digit = |i: usize| u8::from_str_radix(&hex[i..i + 1], 16).map(|d| d * 17);
                Ok(Rgb::new(
                    digit(0).map_err(|_| invalid())?,
                    digit(1).map_err(|_| invalid())?,
                    digit(2).map_err(|_| invalid())?,
                ))
            }
            6 => {
                let value = u32::from_str_radix(hex, 16).map_err(|_| invalid())?;
                Ok(Rgb::new((value >> 16) as u8, (value >> 8) as u8, value as u8))
            }
            _ => Err(invalid()),
        }
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// Shade a hex color toward white or black, see [`Rgb::shade`].
///
/// The result is always in lowercase `#rrggbb` form.
pub fn color_shade(base: &str, fraction: f64) -> Result<String> {
    Ok(base.parse::<Rgb>()?.shade(fraction).to_string())
}

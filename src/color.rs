use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

use crate::config::ConfigError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Offsets every channel by an independent integer in [-15, 15),
    /// saturating at the channel bounds.
    pub fn jitter(self, rng: &mut fastrand::Rng) -> Self {
        let mut shift = |c: u8| (c as i32 + rng.i32(-15..15)).clamp(0, 255) as u8;
        Self {
            r: shift(self.r),
            g: shift(self.g),
            b: shift(self.b),
        }
    }

    pub fn parse_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim_start_matches('#');
        if hex.len() != 6 {
            return None;
        }

        let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
        let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
        let b = u8::from_str_radix(&hex[4..6], 16).ok()?;

        Some(Self { r, g, b })
    }
}

// Show palette, indexed by LaunchPatternEntry::color_index
pub const PALETTE: [Rgb; 8] = [
    Rgb::new(255, 50, 50),   // red
    Rgb::new(50, 50, 255),   // blue
    Rgb::new(255, 255, 50),  // yellow
    Rgb::new(255, 150, 50),  // orange
    Rgb::new(255, 50, 255),  // pink
    Rgb::new(50, 255, 50),   // green
    Rgb::new(255, 255, 255), // white
    Rgb::new(255, 200, 100), // gold
];

pub const RED: Rgb = Rgb::new(255, 50, 50);
pub const BLUE: Rgb = Rgb::new(50, 50, 255);
pub const GREEN: Rgb = Rgb::new(50, 255, 50);
pub const GOLD: Rgb = Rgb::new(255, 215, 0);

pub fn random_palette_index(rng: &mut fastrand::Rng) -> usize {
    rng.usize(0..PALETTE.len())
}

/// The color control: either a fixed named color or a fresh palette pick per launch.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorChoice {
    #[default]
    Random,
    Red,
    Blue,
    Green,
    Gold,
}

impl ColorChoice {
    pub const ALL: [ColorChoice; 5] = [
        ColorChoice::Random,
        ColorChoice::Red,
        ColorChoice::Blue,
        ColorChoice::Green,
        ColorChoice::Gold,
    ];

    pub fn resolve(self, rng: &mut fastrand::Rng) -> Rgb {
        match self {
            ColorChoice::Random => PALETTE[random_palette_index(rng)],
            ColorChoice::Red => RED,
            ColorChoice::Blue => BLUE,
            ColorChoice::Green => GREEN,
            ColorChoice::Gold => GOLD,
        }
    }

    pub fn next(self) -> Self {
        let idx = Self::ALL.iter().position(|c| *c == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }

    pub fn name(self) -> &'static str {
        match self {
            ColorChoice::Random => "random",
            ColorChoice::Red => "red",
            ColorChoice::Blue => "blue",
            ColorChoice::Green => "green",
            ColorChoice::Gold => "gold",
        }
    }
}

impl fmt::Display for ColorChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ColorChoice {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| ConfigError::UnknownColor(s.to_string()))
    }
}

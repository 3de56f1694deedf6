//! Colours as stored on drawing objects.

use serde::{Deserialize, Serialize};

use crate::error::{DesignError, DesignResult};

/// Straight (non-premultiplied) 8-bit RGBA.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const BLACK: Rgba = Rgba::new(0, 0, 0, 255);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Parse any CSS colour: `#rgb`, `#rrggbbaa`, `rgb(...)`, named colours.
    pub fn parse(s: &str) -> DesignResult<Self> {
        let parsed = csscolorparser::parse(s.trim())
            .map_err(|e| DesignError::InvalidColor(format!("{s}: {e}")))?;
        let [r, g, b, a] = parsed.to_rgba8();
        Ok(Self { r, g, b, a })
    }

    pub fn to_hex(self) -> String {
        if self.a == 255 {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }

    /// Largest per-channel difference.
    pub fn distance(self, other: Rgba) -> u8 {
        [
            self.r.abs_diff(other.r),
            self.g.abs_diff(other.g),
            self.b.abs_diff(other.b),
            self.a.abs_diff(other.a),
        ]
        .into_iter()
        .max()
        .unwrap_or(0)
    }

    pub(crate) fn to_skia(self) -> tiny_skia::Color {
        tiny_skia::Color::from_rgba8(self.r, self.g, self.b, self.a)
    }

    pub(crate) fn from_skia(c: tiny_skia::ColorU8) -> Self {
        Self::new(c.red(), c.green(), c.blue(), c.alpha())
    }

    pub(crate) fn to_premultiplied(self) -> tiny_skia::PremultipliedColorU8 {
        tiny_skia::ColorU8::from_rgba(self.r, self.g, self.b, self.a).premultiply()
    }
}

impl std::str::FromStr for Rgba {
    type Err = DesignError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Rgba::parse(s)
    }
}

impl std::fmt::Display for Rgba {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

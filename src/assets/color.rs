use std::fmt;
use std::str::FromStr;

use vello_cpu::peniko::color::{Srgb, parse_color};

/// Straight-alpha sRGB color parsed from a CSS color string.
///
/// Accepts everything a browser canvas accepts for `fill`/`stroke`: hex (`#rgb`, `#rgba`,
/// `#rrggbb`, `#rrggbbaa`), `rgb()`/`rgba()`, `hsl()`/`hsla()`, named colors and
/// `transparent`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
    /// Alpha channel (straight, not premultiplied).
    pub a: u8,
}

impl Color {
    /// Opaque black, the default text fill.
    pub const BLACK: Self = Self::rgba(0, 0, 0, 255);
    /// Opaque white, the default canvas background.
    pub const WHITE: Self = Self::rgba(255, 255, 255, 255);
    /// Fully transparent, the default shape fill.
    pub const TRANSPARENT: Self = Self::rgba(0, 0, 0, 0);
    /// Fill used for image placeholders (`#cccccc`).
    pub const PLACEHOLDER_FILL: Self = Self::rgba(0xcc, 0xcc, 0xcc, 255);
    /// Stroke used for image placeholders (`#999999`).
    pub const PLACEHOLDER_STROKE: Self = Self::rgba(0x99, 0x99, 0x99, 255);

    /// Build a color from straight-alpha channels.
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Parse a CSS color string.
    pub fn parse(s: &str) -> Result<Self, String> {
        let s = s.trim();
        if s.is_empty() {
            return Err("color must be non-empty".to_owned());
        }
        let dynamic = parse_color(s).map_err(|e| format!("invalid color \"{s}\": {e}"))?;
        let rgba = dynamic.to_alpha_color::<Srgb>().to_rgba8();
        Ok(Self::rgba(rgba.r, rgba.g, rgba.b, rgba.a))
    }

    /// Return `true` when nothing would be painted with this color.
    pub fn is_transparent(self) -> bool {
        self.a == 0
    }

    pub(crate) fn to_peniko(self) -> vello_cpu::peniko::Color {
        vello_cpu::peniko::Color::from_rgba8(self.r, self.g, self.b, self.a)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.a == 255 {
            write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            write!(
                f,
                "#{:02x}{:02x}{:02x}{:02x}",
                self.r, self.g, self.b, self.a
            )
        }
    }
}

impl FromStr for Color {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/color.rs"]
mod tests;

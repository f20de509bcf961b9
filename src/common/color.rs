use serde::{Deserialize, Serialize};
use std::fmt;

/// RGB color representation.
///
/// Drawing records store colors as little-endian `0x00BBGGRR` words, so the
/// constructors here mirror that layout.
///
/// # Examples
///
/// ```rust
/// use dff_import::common::RgbColor;
///
/// let red = RgbColor::from_colorref(0x0000_00FF);
/// assert_eq!(red, RgbColor::new(255, 0, 0));
/// assert_eq!(RgbColor::from_hex("#0000FF"), Some(RgbColor::new(0, 0, 255)));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct RgbColor {
    /// Red component (0-255)
    pub r: u8,
    /// Green component (0-255)
    pub g: u8,
    /// Blue component (0-255)
    pub b: u8,
}

impl RgbColor {
    pub const BLACK: Self = Self::new(0, 0, 0);
    pub const WHITE: Self = Self::new(0xFF, 0xFF, 0xFF);

    #[inline]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Build from the low three bytes of a `0x00BBGGRR` word.
    #[inline]
    pub const fn from_colorref(value: u32) -> Self {
        Self::new(value as u8, (value >> 8) as u8, (value >> 16) as u8)
    }

    #[inline]
    pub const fn to_colorref(self) -> u32 {
        self.r as u32 | (self.g as u32) << 8 | (self.b as u32) << 16
    }

    /// Create an RGB color from a hex string (e.g., "FF0000" or "#FF0000").
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim_start_matches('#');
        if hex.len() != 6 {
            return None;
        }

        let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
        let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
        let b = u8::from_str_radix(&hex[4..6], 16).ok()?;

        Some(Self::new(r, g, b))
    }

    /// Convert to hex string (without # prefix).
    pub fn to_hex(&self) -> String {
        format!("{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }

    /// Luminance using the integer weights of the classic gray conversion.
    #[inline]
    pub fn luminance(self) -> u8 {
        ((self.r as u32 * 77 + self.g as u32 * 151 + self.b as u32 * 28) >> 8) as u8
    }

    #[inline]
    pub fn to_gray(self) -> Self {
        let l = self.luminance();
        Self::new(l, l, l)
    }

    /// Scale every channel towards black by `factor / 255`.
    pub fn darken(self, factor: u8) -> Self {
        let f = factor as u32;
        Self::new(
            (self.r as u32 * f / 255) as u8,
            (self.g as u32 * f / 255) as u8,
            (self.b as u32 * f / 255) as u8,
        )
    }

    /// Move every channel towards white; `factor` is the share of the
    /// original color kept.
    pub fn lighten(self, factor: u8) -> Self {
        let f = factor as u32;
        let mix = |c: u8| ((c as u32 * f + 0xFF * (0xFF - f)) / 0xFF) as u8;
        Self::new(mix(self.r), mix(self.g), mix(self.b))
    }

    /// Add `delta` to every channel, clamping to the byte range.
    pub fn offset(self, delta: i32) -> Self {
        let c = |v: u8| (v as i32 + delta).clamp(0, 255) as u8;
        Self::new(c(self.r), c(self.g), c(self.b))
    }

    #[inline]
    pub fn invert(self) -> Self {
        Self::new(!self.r, !self.g, !self.b)
    }

    /// Flip only the top bit of each channel.
    #[inline]
    pub fn invert_top_bit(self) -> Self {
        Self::new(self.r ^ 0x80, self.g ^ 0x80, self.b ^ 0x80)
    }

    /// Linear blend; `t` of 0.0 yields `self`, 1.0 yields `other`.
    pub fn lerp(self, other: Self, t: f64) -> Self {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * t).round() as u8;
        Self::new(
            mix(self.r, other.r),
            mix(self.g, other.g),
            mix(self.b, other.b),
        )
    }
}

impl fmt::Display for RgbColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.to_hex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_colorref_layout() {
        let c = RgbColor::from_colorref(0x0080_4020);
        assert_eq!(c, RgbColor::new(0x20, 0x40, 0x80));
        assert_eq!(c.to_colorref(), 0x0080_4020);
        assert_eq!(c.to_string(), "#204080");
    }

    #[test]
    fn test_darken_lighten_extremes() {
        let c = RgbColor::new(200, 100, 50);
        assert_eq!(c.darken(0), RgbColor::BLACK);
        assert_eq!(c.darken(255), c);
        assert_eq!(c.lighten(0), RgbColor::WHITE);
        assert_eq!(c.lighten(255), c);
    }

    #[test]
    fn test_lerp_midpoint() {
        let mid = RgbColor::BLACK.lerp(RgbColor::WHITE, 0.5);
        assert_eq!(mid, RgbColor::new(128, 128, 128));
    }
}

//! Packed color codes.
//!
//! A color property is a 32-bit word. The top byte selects how the low bytes
//! are read:
//!
//! | top byte | meaning |
//! |---|---|
//! | `0x08` set | scheme color, index in the low 16 bits |
//! | `0x01` set, no `0x10` | palette color, index is the top byte itself |
//! | `0x10` set | system color, optionally derived from another property |
//! | otherwise | literal `0x00BBGGRR` |
//!
//! System colors carry a modifier: bits 16-23 are a parameter, bits 8-11
//! select an adjustment function and bits 13-15 request gray, top-bit invert
//! and full invert.

use crate::common::RgbColor;
use crate::escher::properties::{PropertyId, PropertySet, bits};
use log::trace;

/// Scheme color indices.
pub mod scheme {
    pub const BACKGROUND: u16 = 0;
    pub const TEXT: u16 = 1;
    pub const SHADOW: u16 = 2;
    pub const TITLE_TEXT: u16 = 3;
    pub const FILL: u16 = 4;
    pub const ACCENT: u16 = 5;
    pub const ACCENT_HYPERLINK: u16 = 6;
    pub const ACCENT_FOLLOWED: u16 = 7;
}

/// System color indices that refer to other properties of the same shape.
pub mod derived {
    pub const FILL: u8 = 0xF0;
    pub const LINE_OR_FILL: u8 = 0xF1;
    pub const LINE: u8 = 0xF2;
    pub const SHADOW: u8 = 0xF3;
    pub const THIS: u8 = 0xF4;
    pub const FILL_BACK: u8 = 0xF5;
    pub const LINE_BACK: u8 = 0xF6;
    pub const FILL_THEN_LINE: u8 = 0xF7;
    pub const INDEX_MASK: u8 = 0xFF;
}

const DERIVED_GUARD: u32 = 0x1000_0000;

/// Host palette and UI colors used by scheme and system color codes.
pub trait ColorPalette {
    /// Color of scheme slot `index`, `None` when the slot is undefined.
    fn scheme_color(&self, index: u16) -> Option<RgbColor>;

    /// Current UI color for a system color index.
    fn system_color(&self, index: u8) -> Option<RgbColor> {
        let rgb = match index {
            0x00 | 0x0F | 0x16 => 0xC0C0C0, // button face, 3D face, menu bar
            0x01 | 0x09 | 0x0E | 0x12 | 0x13 => 0x000000,
            0x02 | 0x04 | 0x07 | 0x11 | 0x15 => 0xFFFFFF,
            0x03 | 0x06 => 0x800000,
            0x05 => 0xFFFFFF,
            0x08 | 0x0A => 0x808080,
            0x0B => 0x808080,
            0x0C => 0xC0C0C0,
            0x0D => 0xFFFFE1,
            0x10 => 0xC0C0C0,
            0x14 => 0xE0E0E0,
            _ => return None,
        };
        Some(RgbColor::new((rgb >> 16) as u8, (rgb >> 8) as u8, rgb as u8))
    }
}

/// Eight-slot scheme used when the host does not supply one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefaultPalette {
    pub scheme: [RgbColor; 8],
}

impl Default for DefaultPalette {
    fn default() -> Self {
        Self {
            scheme: [
                RgbColor::WHITE,
                RgbColor::BLACK,
                RgbColor::new(0x80, 0x80, 0x80),
                RgbColor::BLACK,
                RgbColor::new(0xBB, 0xE0, 0xE3),
                RgbColor::new(0x33, 0x33, 0x99),
                RgbColor::new(0x00, 0x99, 0x99),
                RgbColor::new(0x99, 0xCC, 0x00),
            ],
        }
    }
}

impl ColorPalette for DefaultPalette {
    fn scheme_color(&self, index: u16) -> Option<RgbColor> {
        self.scheme.get(index as usize).copied()
    }
}

/// Resolves packed color codes against a palette and a shape's properties.
#[derive(Clone, Copy)]
pub struct ColorResolver<'p> {
    palette: &'p dyn ColorPalette,
}

impl<'p> ColorResolver<'p> {
    pub fn new(palette: &'p dyn ColorPalette) -> Self {
        Self { palette }
    }

    /// Resolve `code` read from property `context` of `props`.
    pub fn resolve(&self, code: u32, context: PropertyId, props: &PropertySet<'_>) -> RgbColor {
        self.resolve_at(code, context, props, 0)
    }

    /// Resolve a text color, which uses `0xFE` for literal RGB and stores
    /// scheme indices in the top byte.
    pub fn resolve_text(&self, code: u32, props: &PropertySet<'_>) -> RgbColor {
        let code = if code & 0xFE00_0000 == 0xFE00_0000 {
            code & 0x00FF_FFFF
        } else if code & 0xF800_0000 == 0 {
            (code >> 24) | 0x0800_0000
        } else {
            code
        };
        self.resolve_at(code, PropertyId::FillColor, props, 0)
    }

    /// Color used when a code cannot be resolved.
    pub fn fallback(context: PropertyId) -> RgbColor {
        match context {
            PropertyId::LineColor => RgbColor::BLACK,
            _ => RgbColor::WHITE,
        }
    }

    fn resolve_at(&self, code: u32, context: PropertyId, props: &PropertySet<'_>, depth: u8) -> RgbColor {
        let code = if code & 0xFE00_0000 == 0xFE00_0000 {
            code & 0x00FF_FFFF
        } else {
            code
        };
        let upper = (code >> 24) as u8;

        if upper & 0x19 == 0 {
            return RgbColor::from_colorref(code);
        }

        if upper & 0x08 != 0 || upper & 0x10 == 0 {
            let index = if upper & 0x08 != 0 {
                code as u16
            } else {
                upper as u16
            };
            return self
                .palette
                .scheme_color(index)
                .unwrap_or_else(|| Self::fallback(context));
        }

        let parameter = ((code >> 16) & 0xFF) as u8;
        let function = ((code >> 8) & 0x0F) as u8;
        let extra = ((code >> 8) & 0xF0) as u8;
        let index = code as u8;

        let mut color = match derived_source(index, props) {
            Some((source, default)) => {
                let value = props.get(source, default);
                if value & DERIVED_GUARD != 0 || depth > 0 {
                    trace!("derived color {code:#010x} refers to another derived color");
                    Self::fallback(context)
                } else {
                    self.resolve_at(value, source, props, depth + 1)
                }
            },
            None => self
                .palette
                .system_color(index)
                .unwrap_or_else(|| Self::fallback(context)),
        };

        if extra & 0x80 != 0 {
            color = color.to_gray();
        }
        color = apply_function(color, function, parameter);
        if extra & 0x40 != 0 {
            color = color.invert_top_bit();
        }
        if extra & 0x20 != 0 {
            color = color.invert();
        }
        color
    }
}

/// Property a derived system color reads, with the default for that property.
fn derived_source(index: u8, props: &PropertySet<'_>) -> Option<(PropertyId, u32)> {
    let source = match index {
        derived::FILL | derived::THIS | derived::FILL_THEN_LINE | derived::INDEX_MASK => {
            (PropertyId::FillColor, 0xFF_FFFF)
        },
        derived::LINE => (PropertyId::LineColor, 0),
        derived::LINE_OR_FILL => {
            if props.flag_or(PropertyId::LineStyleBooleans, bits::LINE, true) {
                (PropertyId::LineColor, 0)
            } else {
                (PropertyId::FillColor, 0xFF_FFFF)
            }
        },
        derived::SHADOW => (PropertyId::ShadowColor, 0x80_8080),
        derived::FILL_BACK => (PropertyId::FillBackColor, 0xFF_FFFF),
        derived::LINE_BACK => (PropertyId::LineBackColor, 0xFF_FFFF),
        _ => return None,
    };
    Some(source)
}

fn apply_function(color: RgbColor, function: u8, p: u8) -> RgbColor {
    let p16 = p as u16;
    let each = |f: &dyn Fn(u8) -> u8| RgbColor::new(f(color.r), f(color.g), f(color.b));
    match function {
        0x01 => each(&|c| ((p16 * c as u16) >> 8) as u8),
        0x02 => {
            let inv = (0xFF - p16) * 0xFF;
            each(&|c| ((inv + p16 * c as u16) >> 8) as u8)
        },
        0x03 => color.offset(p as i32),
        0x04 => color.offset(-(p as i32)),
        0x05 => each(&|c| (p as i16 - c as i16).max(0) as u8),
        0x06 => each(&|c| if c < p { 0x00 } else { 0xFF }),
        _ => color,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::escher::writer::{PropertyBuilder, RecordBuilder};

    fn props_from(builder: PropertyBuilder) -> Vec<u8> {
        let mut b = RecordBuilder::new();
        b.properties(&builder);
        b.into_bytes()
    }

    fn decode(bytes: &[u8]) -> PropertySet<'_> {
        let instance = u16::from_le_bytes([bytes[0], bytes[1]]) >> 4;
        PropertySet::decode(&bytes[8..], instance)
    }

    #[test]
    fn test_literal_and_scheme() {
        let palette = DefaultPalette::default();
        let resolver = ColorResolver::new(&palette);
        let props = PropertySet::new();
        assert_eq!(
            resolver.resolve(0x0000_80FF, PropertyId::FillColor, &props),
            RgbColor::new(0xFF, 0x80, 0x00)
        );
        assert_eq!(
            resolver.resolve(0x0800_0004, PropertyId::FillColor, &props),
            RgbColor::new(0xBB, 0xE0, 0xE3)
        );
        // Undefined scheme slot: white for fills, black for lines.
        assert_eq!(resolver.resolve(0x0800_0040, PropertyId::FillColor, &props), RgbColor::WHITE);
        assert_eq!(resolver.resolve(0x0800_0040, PropertyId::LineColor, &props), RgbColor::BLACK);
    }

    #[test]
    fn test_derived_darken_of_fill() {
        let bytes = props_from(PropertyBuilder::new().simple(PropertyId::FillColor, 0x0064_C8FF));
        let props = decode(&bytes);
        let palette = DefaultPalette::default();
        let resolver = ColorResolver::new(&palette);
        // fill color darkened by 0x80
        let shade = resolver.resolve(0x1080_01F0, PropertyId::FillBackColor, &props);
        assert_eq!(shade, RgbColor::new(0x7F, 0x64, 0x32));
        // lightened by 0x80
        let tint = resolver.resolve(0x1080_02F0, PropertyId::FillBackColor, &props);
        assert_eq!(tint, RgbColor::new(0xFE, 0xE2, 0xB0));
    }

    #[test]
    fn test_self_reference_terminates() {
        let bytes = props_from(PropertyBuilder::new().simple(PropertyId::FillColor, 0x1000_00F0));
        let props = decode(&bytes);
        let palette = DefaultPalette::default();
        let resolver = ColorResolver::new(&palette);
        let c = resolver.resolve(0x1000_00F0, PropertyId::FillColor, &props);
        assert_eq!(c, RgbColor::WHITE);
    }

    #[test]
    fn test_modifier_order() {
        let palette = DefaultPalette::default();
        let resolver = ColorResolver::new(&palette);
        let props = PropertySet::new();
        // gray, then full invert of the white button highlight
        let c = resolver.resolve(0x1000_A007, PropertyId::FillColor, &props);
        assert_eq!(c, RgbColor::new(0, 0, 0));
        // threshold at 0x90 of the 0x80 gray button shadow
        let t = resolver.resolve(0x1090_0608, PropertyId::FillColor, &props);
        assert_eq!(t, RgbColor::BLACK);
    }

    #[test]
    fn test_text_variant() {
        let palette = DefaultPalette::default();
        let resolver = ColorResolver::new(&palette);
        let props = PropertySet::new();
        assert_eq!(
            resolver.resolve_text(0xFE00_00FF, &props),
            RgbColor::new(0xFF, 0, 0)
        );
        assert_eq!(
            resolver.resolve_text(0x0500_0000, &props),
            palette.scheme[5]
        );
    }
}

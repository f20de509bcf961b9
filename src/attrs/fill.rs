//! Area fill attributes.

use super::StyleContext;
use super::gradient::{self, FILL_SHADE_CENTER, Gradient};
use super::line::transparency;
use crate::common::RgbColor;
use crate::escher::properties::{PropertyId, bits};
use crate::images::{BlipSource, Graphic, GraphicKind, decode_blip};
use image::Rgba;
use log::{debug, warn};
use std::sync::Arc;

const FILL_SOLID: u32 = 0;
const FILL_PATTERN: u32 = 1;
const FILL_TEXTURE: u32 = 2;
const FILL_PICTURE: u32 = 3;
const FILL_BACKGROUND: u32 = 9;
const OPAQUE: u32 = 0x1_0000;

/// How a picture covers the shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BitmapMode {
    /// Repeated; the tile size in logical units, or the picture's own size.
    Tile(Option<(i32, i32)>),
    Stretch,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BitmapFill {
    pub graphic: Arc<Graphic>,
    pub mode: BitmapMode,
    pub transparency: u8,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum FillStyle {
    #[default]
    None,
    /// Shows the page background through the shape.
    Background,
    Solid {
        color: RgbColor,
        transparency: u8,
    },
    Gradient(Gradient),
    Bitmap(BitmapFill),
}

/// Whether the shape fills its interior.
pub fn is_filled(ctx: &StyleContext<'_, '_>) -> bool {
    let props = ctx.props;
    if props.is_flag_hard_set(PropertyId::FillStyleBooleans, bits::FILLED) || ctx.shape_type.is_filled_by_default() {
        props.flag_or(PropertyId::FillStyleBooleans, bits::FILLED, true)
    } else {
        false
    }
}

pub fn build(ctx: &StyleContext<'_, '_>, blips: &mut dyn BlipSource) -> FillStyle {
    if !is_filled(ctx) {
        return FillStyle::None;
    }
    let props = ctx.props;
    let raw_opacity = props.get(PropertyId::FillOpacity, OPAQUE);
    let opacity = raw_opacity as f64 / OPAQUE as f64;
    let back_opacity = props.get(PropertyId::FillBackOpacity, OPAQUE) as f64 / OPAQUE as f64;
    let fill_type = props.get(PropertyId::FillType, FILL_SOLID);

    match fill_type {
        FILL_PATTERN | FILL_TEXTURE | FILL_PICTURE => match picture(ctx, blips) {
            Some(graphic) => FillStyle::Bitmap(BitmapFill {
                graphic: if fill_type == FILL_PATTERN {
                    recolor_pattern(ctx, graphic)
                } else {
                    graphic
                },
                mode: match fill_type {
                    FILL_PICTURE => BitmapMode::Stretch,
                    FILL_TEXTURE => BitmapMode::Tile(texture_size(ctx)),
                    _ => BitmapMode::Tile(None),
                },
                transparency: transparency(raw_opacity),
            }),
            None => {
                debug!("fill picture missing, using the fill color");
                solid(ctx, raw_opacity)
            },
        },
        FILL_SHADE_CENTER => {
            let shades = gradient::shade_colors(ctx);
            match gradient::rasterize_rect(ctx, &shades) {
                Some(img) => FillStyle::Bitmap(BitmapFill {
                    graphic: Arc::new(Graphic::bitmap(img)),
                    mode: BitmapMode::Stretch,
                    transparency: transparency(raw_opacity),
                }),
                None => FillStyle::Gradient(gradient::build(ctx, fill_type, opacity, back_opacity)),
            }
        },
        gradient::FILL_SHADE..=gradient::FILL_SHADE_TITLE => {
            FillStyle::Gradient(gradient::build(ctx, fill_type, opacity, back_opacity))
        },
        FILL_BACKGROUND => FillStyle::Background,
        _ => solid(ctx, raw_opacity),
    }
}

fn solid(ctx: &StyleContext<'_, '_>, raw_opacity: u32) -> FillStyle {
    FillStyle::Solid {
        color: ctx.color(PropertyId::FillColor, 0xFF_FFFF),
        transparency: transparency(raw_opacity),
    }
}

/// The fill picture, from the blip store or embedded in the property.
fn picture(ctx: &StyleContext<'_, '_>, blips: &mut dyn BlipSource) -> Option<Arc<Graphic>> {
    if let Some(index) = ctx.props.blip_index(PropertyId::FillBlip) {
        return blips.blip(index);
    }
    let blob = ctx.props.complex(PropertyId::FillBlip)?;
    match decode_blip(blob) {
        Ok(graphic) => Some(Arc::new(graphic)),
        Err(err) => {
            warn!("embedded fill picture: {err}");
            None
        },
    }
}

fn texture_size(ctx: &StyleContext<'_, '_>) -> Option<(i32, i32)> {
    let w = ctx.props.value(PropertyId::FillWidth)?;
    let h = ctx.props.value(PropertyId::FillHeight)?;
    Some((ctx.scaler.scale_emu(w as i32), ctx.scaler.scale_emu(h as i32)))
}

/// Paint an 8x8 pattern in the fill colors: black pixels take the back
/// color, all others the fore color.
fn recolor_pattern(ctx: &StyleContext<'_, '_>, graphic: Arc<Graphic>) -> Arc<Graphic> {
    let GraphicKind::Bitmap(img) = &graphic.kind else {
        return graphic;
    };
    if img.dimensions() != (8, 8) {
        return graphic;
    }
    let fore = ctx.color(PropertyId::FillColor, 0xFF_FFFF);
    let back = ctx.color(PropertyId::FillBackColor, 0xFF_FFFF);
    let mut out = img.clone();
    for px in out.pixels_mut() {
        let c = if px.0[..3] == [0, 0, 0] { back } else { fore };
        *px = Rgba([c.r, c.g, c.b, 0xFF]);
    }
    Arc::new(Graphic {
        kind: GraphicKind::Bitmap(out),
        pref_size: graphic.pref_size,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attrs::GradientStyle;
    use crate::attrs::test_support::{with_context, with_context_in};
    use crate::common::Rect;
    use crate::escher::shape_type::ShapeType;
    use crate::escher::writer::PropertyBuilder;
    use crate::images::NoBlips;
    use image::RgbaImage;

    struct OnePicture(Arc<Graphic>);

    impl BlipSource for OnePicture {
        fn blip(&mut self, index: u32) -> Option<Arc<Graphic>> {
            (index == 1).then(|| Arc::clone(&self.0))
        }
    }

    fn checker() -> Arc<Graphic> {
        let img = RgbaImage::from_fn(8, 8, |x, y| {
            if (x + y) % 2 == 0 { Rgba([0, 0, 0, 0xFF]) } else { Rgba([0xFF, 0xFF, 0xFF, 0xFF]) }
        });
        Arc::new(Graphic::bitmap(img))
    }

    #[test]
    fn test_solid_with_opacity() {
        let props = PropertyBuilder::new()
            .simple(PropertyId::FillColor, 0x0000_FF00)
            .simple(PropertyId::FillOpacity, 0x8000);
        with_context(props, ShapeType::RECTANGLE, |ctx| {
            assert_eq!(
                build(ctx, &mut NoBlips),
                FillStyle::Solid {
                    color: RgbColor::new(0, 0xFF, 0),
                    transparency: 50
                }
            );
        });
    }

    #[test]
    fn test_explicit_fill_on_a_line() {
        let props = PropertyBuilder::new().simple(PropertyId::FillStyleBooleans, 0x0010_0010);
        with_context(props, ShapeType::LINE, |ctx| {
            assert!(matches!(build(ctx, &mut NoBlips), FillStyle::Solid { .. }));
        });
    }

    #[test]
    fn test_pattern_is_recolored() {
        let props = PropertyBuilder::new()
            .simple(PropertyId::FillType, FILL_PATTERN)
            .simple(PropertyId::FillColor, 0x0000_00FF)
            .simple(PropertyId::FillBackColor, 0x00FF_0000)
            .blip(PropertyId::FillBlip, 1);
        with_context(props, ShapeType::RECTANGLE, |ctx| {
            let FillStyle::Bitmap(fill) = build(ctx, &mut OnePicture(checker())) else {
                panic!("pattern fills are bitmaps");
            };
            assert_eq!(fill.mode, BitmapMode::Tile(None));
            let img = fill.graphic.as_bitmap().unwrap();
            assert_eq!(img.get_pixel(0, 0).0, [0, 0, 0xFF, 0xFF]);
            assert_eq!(img.get_pixel(1, 0).0, [0xFF, 0, 0, 0xFF]);
        });
    }

    #[test]
    fn test_picture_and_texture_modes() {
        let picture = PropertyBuilder::new()
            .simple(PropertyId::FillType, FILL_PICTURE)
            .blip(PropertyId::FillBlip, 1);
        with_context(picture, ShapeType::RECTANGLE, |ctx| {
            let FillStyle::Bitmap(fill) = build(ctx, &mut OnePicture(checker())) else {
                panic!("picture fills are bitmaps");
            };
            assert_eq!(fill.mode, BitmapMode::Stretch);
            // the checker keeps its own colors
            assert_eq!(fill.graphic.as_bitmap().unwrap().get_pixel(1, 0).0[0], 0xFF);
        });

        let texture = PropertyBuilder::new()
            .simple(PropertyId::FillType, FILL_TEXTURE)
            .simple(PropertyId::FillWidth, 360_000)
            .simple(PropertyId::FillHeight, 180_000)
            .blip(PropertyId::FillBlip, 1);
        with_context(texture, ShapeType::RECTANGLE, |ctx| {
            let FillStyle::Bitmap(fill) = build(ctx, &mut OnePicture(checker())) else {
                panic!("texture fills are bitmaps");
            };
            assert_eq!(fill.mode, BitmapMode::Tile(Some((360_000, 180_000))));
        });
    }

    #[test]
    fn test_missing_picture_falls_back_to_color() {
        let props = PropertyBuilder::new()
            .simple(PropertyId::FillType, FILL_PICTURE)
            .blip(PropertyId::FillBlip, 4);
        with_context(props, ShapeType::RECTANGLE, |ctx| {
            assert!(matches!(build(ctx, &mut NoBlips), FillStyle::Solid { .. }));
        });
    }

    #[test]
    fn test_shade_kinds() {
        let center = PropertyBuilder::new().simple(PropertyId::FillType, FILL_SHADE_CENTER);
        with_context_in(center.clone(), ShapeType::RECTANGLE, Rect::new(0, 0, 914_400, 457_200), |ctx| {
            assert!(matches!(build(ctx, &mut NoBlips), FillStyle::Bitmap(_)));
        });
        with_context_in(center, ShapeType::RECTANGLE, Rect::default(), |ctx| {
            let FillStyle::Gradient(g) = build(ctx, &mut NoBlips) else {
                panic!("empty shapes keep a native gradient");
            };
            assert_eq!(g.style, GradientStyle::Rect);
        });

        let title = PropertyBuilder::new().simple(PropertyId::FillType, gradient::FILL_SHADE_TITLE);
        with_context(title, ShapeType::RECTANGLE, |ctx| {
            assert!(matches!(build(ctx, &mut NoBlips), FillStyle::Gradient(_)));
        });

        let background = PropertyBuilder::new().simple(PropertyId::FillType, FILL_BACKGROUND);
        with_context(background, ShapeType::RECTANGLE, |ctx| {
            assert_eq!(build(ctx, &mut NoBlips), FillStyle::Background);
        });
    }
}

//! Line, fill, shadow and text-frame attributes built from shape properties.
//!
//! Every builder reads the shape's `PropertySet` through a `StyleContext`,
//! which also carries the color resolver, the unit scaler and the few facts
//! about the shape itself (kind, rotation, bounds, flips) that change how a
//! property is read. The result is an `AttributeSet` the host applies to the
//! node in one call.
//!
//! # Architecture
//!
//! - `line`: outline width, cap, join, dash presets, opacity
//! - `arrow`: arrowhead outlines
//! - `fill`: fill kinds, pattern recoloring, picture fills
//! - `gradient`: gradient stops and angles, rectangular gradient raster
//! - `shadow`: offset shadow

pub mod arrow;
pub mod fill;
pub mod gradient;
pub mod line;
pub mod shadow;

pub use arrow::{ArrowKind, ArrowShape, Arrowhead};
pub use fill::{BitmapFill, BitmapMode, FillStyle};
pub use gradient::{Gradient, GradientStop, GradientStyle};
pub use line::{DashPattern, LineAttributes, LineCap, LineJoin, LineStyle};
pub use shadow::Shadow;

use crate::color::ColorResolver;
use crate::common::{Rect, RgbColor};
use crate::escher::properties::{PropertyId, PropertySet, bits};
use crate::escher::shape_type::ShapeType;
use crate::geometry::CustomShapeGeometry;
use crate::images::{BlipSource, PictureAdjustments};
use crate::scale::UnitScaler;
use serde::{Deserialize, Serialize};

/// What the attribute builders need to know about one shape.
#[derive(Clone, Copy)]
pub struct StyleContext<'a, 'data> {
    pub props: &'a PropertySet<'data>,
    /// Secondary ("user defined") table, when the shape carries one.
    pub secondary: Option<&'a PropertySet<'data>>,
    pub colors: ColorResolver<'a>,
    pub scaler: &'a UnitScaler,
    pub shape_type: ShapeType,
    /// Counter-clockwise rotation in hundredths of a degree.
    pub rotation: i32,
    /// Logical bounds of the shape.
    pub bounds: Rect,
    pub flip_h: bool,
    pub flip_v: bool,
}

impl<'a, 'data> StyleContext<'a, 'data> {
    pub fn new(
        props: &'a PropertySet<'data>,
        colors: ColorResolver<'a>,
        scaler: &'a UnitScaler,
        shape_type: ShapeType,
    ) -> Self {
        Self {
            props,
            secondary: None,
            colors,
            scaler,
            shape_type,
            rotation: 0,
            bounds: Rect::default(),
            flip_h: false,
            flip_v: false,
        }
    }

    /// Resolved color of property `id`, with `default` as the raw code when
    /// the property is absent.
    pub fn color(&self, id: PropertyId, default: u32) -> RgbColor {
        self.colors.resolve(self.props.get(id, default), id, self.props)
    }

    /// Whether the fill turns with the shape. Only the secondary table says
    /// otherwise.
    pub fn fill_rotates_with_shape(&self) -> bool {
        self.secondary.is_none_or(|sec| {
            sec.flag_or(PropertyId::FillStyleBooleans, bits::FILL_USE_SHAPE_ANCHOR, true)
        })
    }
}

/// Where text sits vertically and horizontally inside its frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TextAnchor {
    #[default]
    Top,
    Middle,
    Bottom,
    TopCentered,
    MiddleCentered,
    BottomCentered,
    TopBaseline,
    BottomBaseline,
    TopCenteredBaseline,
    BottomCenteredBaseline,
}

impl TextAnchor {
    pub fn from_raw(raw: u32) -> Self {
        match raw {
            1 => Self::Middle,
            2 => Self::Bottom,
            3 => Self::TopCentered,
            4 => Self::MiddleCentered,
            5 => Self::BottomCentered,
            6 => Self::TopBaseline,
            7 => Self::BottomBaseline,
            8 => Self::TopCenteredBaseline,
            9 => Self::BottomCenteredBaseline,
            _ => Self::Top,
        }
    }
}

/// Text frame insets and layout flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextFrame {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
    pub anchor: TextAnchor,
    pub wrap: bool,
    /// The shape grows to fit its text.
    pub auto_grow_height: bool,
    /// Text turns with the shape. Cleared by the spreadsheet upright flag.
    pub rotate_with_shape: bool,
}

impl TextFrame {
    pub fn build(ctx: &StyleContext<'_, '_>) -> Self {
        let props = ctx.props;
        let inset = |id, default: u32| ctx.scaler.scale_emu(props.get(id, default) as i32);
        Self {
            left: inset(PropertyId::TextLeft, 91_440),
            top: inset(PropertyId::TextTop, 45_720),
            right: inset(PropertyId::TextRight, 91_440),
            bottom: inset(PropertyId::TextBottom, 45_720),
            anchor: TextAnchor::from_raw(props.get(PropertyId::AnchorText, 0)),
            // 2 is "no wrap"
            wrap: props.get(PropertyId::WrapText, 0) != 2,
            auto_grow_height: props.flag_or(PropertyId::TextBooleans, bits::FIT_SHAPE_TO_TEXT, false),
            rotate_with_shape: true,
        }
    }
}

/// All attributes the importer sets on one node.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeSet {
    pub line: LineStyle,
    pub fill: FillStyle,
    pub shadow: Option<Shadow>,
    pub text_frame: Option<TextFrame>,
    /// Present for custom shapes.
    pub geometry: Option<CustomShapeGeometry>,
    /// Present for picture shapes.
    pub picture: Option<PictureAdjustments>,
}

impl Default for AttributeSet {
    fn default() -> Self {
        Self {
            line: LineStyle::None,
            fill: FillStyle::None,
            shadow: None,
            text_frame: None,
            geometry: None,
            picture: None,
        }
    }
}

impl AttributeSet {
    /// Line, fill, shadow and text frame of a shape.
    pub fn build(ctx: &StyleContext<'_, '_>, blips: &mut dyn BlipSource) -> Self {
        Self {
            line: line::build(ctx),
            fill: fill::build(ctx, blips),
            shadow: shadow::build(ctx),
            text_frame: Some(TextFrame::build(ctx)),
            geometry: None,
            picture: None,
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::color::DefaultPalette;
    use crate::escher::writer::{PropertyBuilder, RecordBuilder};

    /// Run `f` with a context over the properties of `builder`, an identity
    /// scaler and the default palette.
    pub fn with_context(builder: PropertyBuilder, shape_type: ShapeType, f: impl FnOnce(&StyleContext<'_, '_>)) {
        with_context_in(builder, shape_type, Rect::new(0, 0, 914_400, 457_200), f)
    }

    pub fn with_context_in(
        builder: PropertyBuilder,
        shape_type: ShapeType,
        bounds: Rect,
        f: impl FnOnce(&StyleContext<'_, '_>),
    ) {
        let count = builder.len() as u16;
        let mut b = RecordBuilder::new();
        b.properties(&builder);
        let bytes = b.into_bytes();
        let props = PropertySet::decode(&bytes[8..], count);
        let palette = DefaultPalette::default();
        let scaler = UnitScaler::identity();
        let mut ctx = StyleContext::new(&props, ColorResolver::new(&palette), &scaler, shape_type);
        ctx.bounds = bounds;
        f(&ctx);
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::with_context;
    use super::*;
    use crate::escher::writer::PropertyBuilder;
    use crate::images::NoBlips;

    #[test]
    fn test_text_frame_defaults() {
        with_context(PropertyBuilder::new(), ShapeType::RECTANGLE, |ctx| {
            let frame = TextFrame::build(ctx);
            assert_eq!((frame.left, frame.top), (91_440, 45_720));
            assert!(frame.wrap);
            assert_eq!(frame.anchor, TextAnchor::Top);
            assert!(!frame.auto_grow_height);
        });
    }

    #[test]
    fn test_empty_table_gives_typed_defaults() {
        with_context(PropertyBuilder::new(), ShapeType::RECTANGLE, |ctx| {
            let attrs = AttributeSet::build(ctx, &mut NoBlips);
            assert!(!attrs.line.is_none());
            assert!(matches!(attrs.fill, FillStyle::Solid { color, .. } if color == RgbColor::WHITE));
            assert!(attrs.shadow.is_none());
        });
        with_context(PropertyBuilder::new(), ShapeType::LINE, |ctx| {
            let attrs = AttributeSet::build(ctx, &mut NoBlips);
            assert_eq!(attrs.fill, FillStyle::None);
        });
    }
}

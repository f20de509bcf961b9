//! Custom-shape geometry.
//!
//! Turns the geometry properties of a shape (view box, guides, handles,
//! path data, adjustment values, 3-D and text-path settings) into a
//! [`CustomShapeGeometry`] record the host's geometry engine renders.

pub mod arc;
pub mod equation;
pub mod extrusion;
pub mod handle;
pub mod path;

pub use arc::{ArcCorrection, correct_arc};
pub use equation::{Equation, EquationFormatter, EquationOp, FormulaFormatter};
pub use extrusion::{Extrusion, ProjectionMode, ShadeMode};
pub use handle::{Handle, ParamPair};
pub use path::{Segment, SegmentCommand, ShapePath, TextFrameRect};

use crate::attrs::StyleContext;
use crate::escher::properties::{PropertyId, bits};
use crate::escher::shape_type::ShapeType;
use serde::{Deserialize, Serialize};

/// Default edge length of the internal coordinate system.
pub const DEFAULT_VIEW_SIZE: i32 = 21_600;
const ADJUST_COUNT: u16 = 10;

/// Operand of a coordinate, handle or text frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Param {
    Normal(i32),
    /// Result of guide `n`.
    Equation(u16),
    /// Adjustment value `n`.
    Adjustment(u8),
    Left,
    Top,
    Right,
    Bottom,
}

impl Param {
    pub fn as_normal(self) -> Option<i32> {
        match self {
            Self::Normal(v) => Some(v),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewBox {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Default for ViewBox {
    fn default() -> Self {
        Self {
            x: 0,
            y: 0,
            width: DEFAULT_VIEW_SIZE,
            height: DEFAULT_VIEW_SIZE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum AdjustValue {
    Int(i32),
    /// 16.16 value converted for a polar handle.
    Fixed(f64),
}

impl AdjustValue {
    pub fn as_f64(self) -> f64 {
        match self {
            Self::Int(v) => v as f64,
            Self::Fixed(v) => v,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AdjustmentValue {
    pub value: AdjustValue,
    /// Set in the file rather than defaulted.
    pub explicit: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TextPathMode {
    Normal,
    /// Text follows the path.
    Path,
    /// Text is stretched over the whole shape.
    Shape,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextPath {
    pub mode: TextPathMode,
    pub scale_x: bool,
    pub same_letter_heights: bool,
}

impl TextPath {
    /// Text-path settings, `None` unless the text effect is on.
    pub fn build(ctx: &StyleContext<'_, '_>) -> Option<Self> {
        let props = ctx.props;
        let flag = |bit| props.flag_or(PropertyId::GeoTextBooleans, bit, false);
        if !flag(bits::GT_ON) {
            return None;
        }
        let fit_shape = props
            .flag(PropertyId::GeoTextBooleans, bits::GT_STRETCH)
            .unwrap_or_else(|| ctx.shape_type.is_fontwork());
        let mut mode = TextPathMode::Normal;
        if flag(bits::GT_BEST_FIT) {
            mode = TextPathMode::Path;
        }
        if fit_shape {
            mode = TextPathMode::Shape;
        }
        Some(Self {
            mode,
            scale_x: flag(bits::GT_DX_MEASURE),
            same_letter_heights: flag(bits::GT_NORMALIZE),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomShapeGeometry {
    /// Preset name of the shape kind.
    pub shape_type: String,
    /// Set when the file overrides the default view box.
    pub view_box: Option<ViewBox>,
    /// Extra text rotation in degrees.
    pub text_rotate_angle: Option<f64>,
    pub extrusion: Option<Extrusion>,
    pub equations: Vec<String>,
    pub handles: Vec<Handle>,
    pub path: ShapePath,
    pub text_path: Option<TextPath>,
    pub adjustment_values: Vec<AdjustmentValue>,
}

impl CustomShapeGeometry {
    /// The effective view box.
    pub fn view_box(&self) -> ViewBox {
        self.view_box.unwrap_or_default()
    }

    /// Geometry record of the shape in `ctx`, or `None` when the kind has no
    /// preset geometry and the file supplies no vertices.
    pub fn build(ctx: &StyleContext<'_, '_>, formatter: &dyn EquationFormatter) -> Option<Self> {
        let props = ctx.props;
        let shape_type = ctx.shape_type;
        if !shape_type.is_custom_shape() && !props.contains(PropertyId::Vertices) {
            return None;
        }

        let view_box = build_view_box(ctx);
        let effective = view_box.unwrap_or_default();
        let (handles, converted) = match props.array(PropertyId::Handles) {
            Some(array) => handle::build(&array, effective.width, effective.height),
            None => (Vec::new(), 0),
        };
        let mut converted = converted;
        if shape_type == ShapeType::ARC {
            // start and end angle
            converted |= 0b11;
        }

        Some(Self {
            shape_type: shape_type.name().into_owned(),
            view_box,
            text_rotate_angle: text_rotate_angle(ctx),
            extrusion: extrusion::build(ctx),
            equations: props
                .array(PropertyId::Guides)
                .map(|a| equation::build(&a, formatter))
                .unwrap_or_default(),
            handles,
            path: path::build(props, shape_type == ShapeType::ARC),
            text_path: TextPath::build(ctx),
            adjustment_values: adjustment_values(ctx, converted),
        })
    }
}

fn build_view_box(ctx: &StyleContext<'_, '_>) -> Option<ViewBox> {
    let props = ctx.props;
    let ids = [PropertyId::GeoLeft, PropertyId::GeoTop, PropertyId::GeoRight, PropertyId::GeoBottom];
    if !ids.iter().any(|&id| props.contains(id)) {
        return None;
    }
    let x = props.get_i32(PropertyId::GeoLeft, 0);
    let y = props.get_i32(PropertyId::GeoTop, 0);
    Some(ViewBox {
        x,
        y,
        width: props.get_i32(PropertyId::GeoRight, DEFAULT_VIEW_SIZE).saturating_sub(x),
        height: props.get_i32(PropertyId::GeoBottom, DEFAULT_VIEW_SIZE).saturating_sub(y),
    })
}

/// Text flow and font direction folded into one text rotation.
fn text_rotate_angle(ctx: &StyleContext<'_, '_>) -> Option<f64> {
    const FLOW_TOP_TO_BOTTOM_ASIAN: u32 = 1;
    const FLOW_BOTTOM_TO_TOP: u32 = 2;

    let props = ctx.props;
    let flow = props.get(PropertyId::TextFlow, 0) & 0xFFFF;
    let mut angle = 0i32;
    if flow == FLOW_BOTTOM_TO_TOP {
        angle += 90;
    }
    match props.get(PropertyId::FontRotation, 0) {
        1 if flow == FLOW_TOP_TO_BOTTOM_ASIAN => angle -= 180,
        2 => angle -= 180,
        3 if flow != FLOW_TOP_TO_BOTTOM_ASIAN => angle -= 180,
        _ => {},
    }
    (angle != 0).then_some(angle as f64)
}

/// Adjustment values up to the last one present. Bits of `converted` mark
/// values stored as 16.16 fixed point.
fn adjustment_values(ctx: &StyleContext<'_, '_>, converted: u32) -> Vec<AdjustmentValue> {
    let props = ctx.props;
    let raw_at = |i: u16| props.raw_value(PropertyId::AdjustValue.raw() + i);
    let count = (0..ADJUST_COUNT)
        .rev()
        .find(|&i| raw_at(i).is_some())
        .map_or(0, |last| last + 1);

    (0..count)
        .map(|i| {
            let raw = raw_at(i);
            let value = raw.unwrap_or(0) as i32;
            AdjustmentValue {
                value: if converted & (1 << i) != 0 {
                    AdjustValue::Fixed(value as f64 / 65536.0)
                } else {
                    AdjustValue::Int(value)
                },
                explicit: raw.is_some(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attrs::test_support::with_context;
    use crate::escher::writer::PropertyBuilder;

    fn geometry(props: PropertyBuilder, shape_type: ShapeType) -> Option<CustomShapeGeometry> {
        let mut out = None;
        with_context(props, shape_type, |ctx| out = CustomShapeGeometry::build(ctx, &FormulaFormatter));
        out
    }

    #[test]
    fn test_not_built_without_preset_or_vertices() {
        assert!(geometry(PropertyBuilder::new(), ShapeType::NOT_PRIMITIVE).is_none());
        assert!(geometry(PropertyBuilder::new(), ShapeType::LINE).is_none());

        let mut verts = Vec::new();
        for v in [0i32, 0, 100, 100] {
            verts.extend_from_slice(&v.to_le_bytes());
        }
        let props = PropertyBuilder::new().array(PropertyId::Vertices, 8, &verts);
        let g = geometry(props, ShapeType::NOT_PRIMITIVE).unwrap();
        assert_eq!(g.path.coordinates.as_ref().map(Vec::len), Some(2));
    }

    #[test]
    fn test_view_box_and_type_name() {
        let g = geometry(PropertyBuilder::new(), ShapeType::ROUND_RECTANGLE).unwrap();
        assert_eq!(g.shape_type, "round-rectangle");
        assert_eq!(g.view_box, None);
        assert_eq!(g.view_box().width, DEFAULT_VIEW_SIZE);

        let props = PropertyBuilder::new()
            .signed(PropertyId::GeoLeft, 100)
            .signed(PropertyId::GeoBottom, i32::MIN);
        let vb = geometry(props, ShapeType::RECTANGLE).unwrap().view_box.unwrap();
        assert_eq!((vb.x, vb.y, vb.width), (100, 0, DEFAULT_VIEW_SIZE - 100));
        assert_eq!(vb.height, i32::MIN);
    }

    #[test]
    fn test_adjustments_scan_to_last_present() {
        let props = PropertyBuilder::new()
            .signed(PropertyId::Adjust3Value, 5400)
            .signed(PropertyId::AdjustValue, -7);
        let g = geometry(props, ShapeType::RECTANGLE).unwrap();
        assert_eq!(g.adjustment_values.len(), 3);
        assert_eq!(g.adjustment_values[0].value, AdjustValue::Int(-7));
        assert!(g.adjustment_values[0].explicit);
        assert!(!g.adjustment_values[1].explicit);
        assert_eq!(g.adjustment_values[2].value, AdjustValue::Int(5400));
    }

    #[test]
    fn test_arc_angles_are_fixed_point() {
        let props = PropertyBuilder::new()
            .signed(PropertyId::AdjustValue, -45 * 65_536)
            .signed(PropertyId::Adjust2Value, 90 * 65_536);
        let g = geometry(props, ShapeType::ARC).unwrap();
        assert_eq!(g.adjustment_values[0].value, AdjustValue::Fixed(-45.0));
        assert_eq!(g.adjustment_values[1].value.as_f64(), 90.0);
    }

    #[test]
    fn test_text_rotation_from_flow() {
        let props = PropertyBuilder::new().simple(PropertyId::TextFlow, 2);
        assert_eq!(geometry(props, ShapeType::RECTANGLE).unwrap().text_rotate_angle, Some(90.0));

        let props = PropertyBuilder::new().simple(PropertyId::FontRotation, 2);
        assert_eq!(geometry(props, ShapeType::RECTANGLE).unwrap().text_rotate_angle, Some(-180.0));

        let props = PropertyBuilder::new()
            .simple(PropertyId::TextFlow, 1)
            .simple(PropertyId::FontRotation, 3);
        assert_eq!(geometry(props, ShapeType::RECTANGLE).unwrap().text_rotate_angle, None);
    }

    #[test]
    fn test_text_path_fit_modes() {
        // on, best fit
        let props = PropertyBuilder::new().simple(PropertyId::GeoTextBooleans, 0x4100_4100);
        let tp = geometry(props, ShapeType::RECTANGLE).unwrap().text_path.unwrap();
        assert_eq!(tp.mode, TextPathMode::Path);

        let props = PropertyBuilder::new().simple(PropertyId::GeoTextBooleans, 0x4000_4000);
        let tp = geometry(props, ShapeType::TEXT_PLAIN_TEXT).unwrap().text_path.unwrap();
        assert_eq!(tp.mode, TextPathMode::Shape);

        // stretch explicitly off
        let props = PropertyBuilder::new().simple(PropertyId::GeoTextBooleans, 0x4400_4000);
        let tp = geometry(props, ShapeType::TEXT_PLAIN_TEXT).unwrap().text_path.unwrap();
        assert_eq!(tp.mode, TextPathMode::Normal);

        assert!(geometry(PropertyBuilder::new(), ShapeType::TEXT_PLAIN_TEXT).unwrap().text_path.is_none());
    }

    #[test]
    fn test_guides_formatted() {
        let mut guides = Vec::new();
        guides.extend_from_slice(&0x2000u16.to_le_bytes());
        for v in [0x147i16, 0, 0] {
            guides.extend_from_slice(&v.to_le_bytes());
        }
        let props = PropertyBuilder::new().array(PropertyId::Guides, 8, &guides);
        let g = geometry(props, ShapeType::RECTANGLE).unwrap();
        assert_eq!(g.equations, vec!["$0 ".to_owned()]);
    }
}

//! Line (outline) attributes.

use super::StyleContext;
use super::arrow::{self, Arrowhead, CRITICAL_ARROW_LINE_WIDTH_EMU, LineEnd};
use crate::common::RgbColor;
use crate::escher::properties::{PropertyId, bits};
use crate::escher::shape_type::ShapeType;
use log::trace;
use serde::{Deserialize, Serialize};

const DEFAULT_LINE_WIDTH_EMU: u32 = 9_525;
const OPAQUE: u32 = 0x1_0000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LineCap {
    #[default]
    Flat,
    Round,
    Square,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LineJoin {
    Bevel,
    #[default]
    Miter,
    Round,
}

/// Dash pattern with lengths in percent of the line width.
///
/// A dot length of 100 is a square dot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashPattern {
    pub dots: u16,
    pub dot_length: u32,
    pub dashes: u16,
    pub dash_length: u32,
    pub distance: u32,
}

impl DashPattern {
    const fn new(dots: u16, dashes: u16, dash_length: u32, distance: u32) -> Self {
        Self {
            dots,
            dot_length: 100,
            dashes,
            dash_length,
            distance,
        }
    }

    /// Preset for a `lineDashing` value, `None` for solid lines.
    pub fn preset(raw: u32) -> Option<Self> {
        let pattern = match raw {
            0 => return None,
            1 => Self::new(0, 1, 300, 100),
            2 => Self::new(1, 0, 0, 100),
            3 => Self::new(1, 1, 300, 100),
            4 => Self::new(2, 1, 300, 100),
            5 => Self::new(1, 0, 0, 300),
            6 => Self::new(0, 1, 400, 300),
            7 => Self::new(0, 1, 800, 300),
            8 => Self::new(1, 1, 400, 300),
            9 => Self::new(1, 1, 800, 300),
            10 => Self::new(2, 1, 800, 300),
            _ => Self::new(1, 0, 0, 100),
        };
        Some(pattern)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineAttributes {
    /// Width in logical units, 0 for a hairline.
    pub width: i32,
    pub color: RgbColor,
    /// 0 (opaque) to 100 (invisible).
    pub transparency: u8,
    pub cap: LineCap,
    pub join: LineJoin,
    pub dash: Option<DashPattern>,
    pub start_arrow: Option<Arrowhead>,
    pub end_arrow: Option<Arrowhead>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub enum LineStyle {
    #[default]
    None,
    Stroke(LineAttributes),
}

impl LineStyle {
    #[inline]
    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    pub fn attributes(&self) -> Option<&LineAttributes> {
        match self {
            Self::Stroke(attrs) => Some(attrs),
            Self::None => None,
        }
    }
}

/// Whether the shape draws its outline.
pub fn is_stroked(ctx: &StyleContext<'_, '_>) -> bool {
    let props = ctx.props;
    if props.is_flag_hard_set(PropertyId::LineStyleBooleans, bits::LINE) || ctx.shape_type.is_stroked_by_default() {
        props.flag_or(PropertyId::LineStyleBooleans, bits::LINE, true)
    } else {
        false
    }
}

pub fn build(ctx: &StyleContext<'_, '_>) -> LineStyle {
    if !is_stroked(ctx) {
        trace!("shape {} has no outline", ctx.shape_type);
        return LineStyle::None;
    }
    let props = ctx.props;

    let width = ctx.scaler.scale_emu(props.get(PropertyId::LineWidth, DEFAULT_LINE_WIDTH_EMU) as i32);
    let cap = match props.get(PropertyId::LineEndCapStyle, 2) {
        0 => LineCap::Round,
        1 => LineCap::Square,
        _ => LineCap::Flat,
    };
    let default_join = if ctx.shape_type == ShapeType::NOT_PRIMITIVE { 2 } else { 1 };
    let join = match props.get(PropertyId::LineJoinStyle, default_join) {
        0 => LineJoin::Bevel,
        1 => LineJoin::Miter,
        _ => LineJoin::Round,
    };

    // A negative width with a dash style is treated as solid.
    let dash = if (props.get(PropertyId::LineWidth, DEFAULT_LINE_WIDTH_EMU) as i32) < 0 {
        None
    } else {
        DashPattern::preset(props.get(PropertyId::LineDashing, 0))
    };

    let (start_arrow, end_arrow) = if props.flag_or(PropertyId::LineStyleBooleans, bits::ARROWHEADS_OK, false) {
        let critical = ctx.scaler.scale_emu(CRITICAL_ARROW_LINE_WIDTH_EMU);
        (
            arrow::build(props, LineEnd::Start, width, critical),
            arrow::build(props, LineEnd::End, width, critical),
        )
    } else {
        (None, None)
    };

    LineStyle::Stroke(LineAttributes {
        width,
        color: ctx.color(PropertyId::LineColor, 0),
        transparency: transparency(props.get(PropertyId::LineOpacity, OPAQUE)),
        cap,
        join,
        dash,
        start_arrow,
        end_arrow,
    })
}

/// Transparency percent for a 16.16 opacity.
pub(crate) fn transparency(opacity: u32) -> u8 {
    if opacity >= OPAQUE {
        return 0;
    }
    let percent = (opacity as f64 * 100.0 / OPAQUE as f64).round() as u32;
    100u32.saturating_sub(percent) as u8
}

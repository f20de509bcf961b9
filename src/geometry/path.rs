//! Path data of a custom shape: vertices, segment commands, text frames and
//! glue points.

use super::Param;
use super::handle::ParamPair;
use crate::common::binary::{read_i16_le, read_i32_le, read_u16_le};
use crate::escher::properties::{ArrayProperty, PropertyId, PropertySet, bits};
use log::warn;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SegmentCommand {
    LineTo,
    CurveTo,
    MoveTo,
    Close,
    End,
    AngleEllipseTo,
    AngleEllipse,
    ArcTo,
    Arc,
    ClockwiseArcTo,
    ClockwiseArc,
    EllipticalQuadrantX,
    EllipticalQuadrantY,
    NoFill,
    NoStroke,
    Darken,
    DarkenLess,
    Lighten,
    LightenLess,
    /// Kept verbatim; `count` holds the raw 16-bit value.
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    pub command: SegmentCommand,
    pub count: u16,
}

impl Segment {
    pub fn decode(raw: u16) -> Self {
        use SegmentCommand::*;
        let count = raw & 0x1FFF;
        let at_least_one = count.max(1);
        let (command, count) = match raw >> 13 {
            0 => (LineTo, at_least_one),
            1 => (CurveTo, at_least_one),
            2 => (MoveTo, at_least_one),
            3 => (Close, 0),
            4 => (End, 0),
            5 | 6 => {
                let low = raw & 0xFF;
                match (raw >> 8) & 0x1F {
                    0x0 => (LineTo, at_least_one),
                    0x1 => (AngleEllipseTo, low / 3),
                    0x2 => (AngleEllipse, low / 3),
                    0x3 => (ArcTo, low >> 2),
                    0x4 => (Arc, low >> 2),
                    0x5 => (ClockwiseArcTo, low >> 2),
                    0x6 => (ClockwiseArc, low >> 2),
                    0x7 => (EllipticalQuadrantX, low),
                    0x8 => (EllipticalQuadrantY, low),
                    0xA => (NoFill, 0),
                    0xB => (NoStroke, 0),
                    0x15 => (Darken, 0),
                    0x16 => (DarkenLess, 0),
                    0x17 => (Lighten, 0),
                    0x18 => (LightenLess, 0),
                    _ => (Unknown, raw),
                }
            },
            _ => (Unknown, raw),
        };
        Self { command, count }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextFrameRect {
    pub top_left: ParamPair,
    pub bottom_right: ParamPair,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ShapePath {
    pub extrusion_allowed: bool,
    pub concentric_gradient_fill_allowed: bool,
    pub text_path_allowed: bool,
    pub coordinates: Option<Vec<ParamPair>>,
    pub segments: Option<Vec<Segment>>,
    pub stretch_x: Option<i32>,
    pub stretch_y: Option<i32>,
    pub text_frames: Option<Vec<TextFrameRect>>,
    pub glue_points: Option<Vec<ParamPair>>,
    pub glue_point_type: Option<u16>,
}

/// Coordinate value; a high word of `0x8000` makes it a guide reference.
pub(crate) fn coordinate(value: i32) -> Param {
    let raw = value as u32;
    if raw >> 16 == 0x8000 {
        Param::Equation(raw as u16)
    } else {
        Param::Normal(value)
    }
}

/// Point list in either 8-byte or truncated 4-byte form. `unsigned` reads
/// the short form as unsigned 16-bit values.
pub(crate) fn points(array: &ArrayProperty<'_>, unsigned: bool) -> Option<Vec<ParamPair>> {
    let size = array.element_size();
    if size != 8 && size != 4 {
        warn!("point records of {size} bytes ignored");
        return None;
    }
    if array.is_truncated() {
        warn!("point list declares {} entries, {} present", array.declared_count(), array.len());
        return None;
    }
    let read = |data: &[u8], i: usize| -> i32 {
        if size == 8 {
            read_i32_le(data, i * 4).unwrap_or(0)
        } else if unsigned {
            read_u16_le(data, i * 2).map(i32::from).unwrap_or(0)
        } else {
            read_i16_le(data, i * 2).map(i32::from).unwrap_or(0)
        }
    };
    Some(
        array
            .elements()
            .map(|data| ParamPair {
                first: coordinate(read(data, 0)),
                second: coordinate(read(data, 1)),
            })
            .collect(),
    )
}

fn segments(array: &ArrayProperty<'_>) -> Vec<Segment> {
    if array.is_truncated() {
        warn!("segment list longer than its data, keeping {} entries", array.len());
    }
    array
        .elements()
        .filter_map(|data| read_u16_le(data, 0).ok())
        .map(Segment::decode)
        .collect()
}

fn text_frames(array: &ArrayProperty<'_>) -> Option<Vec<TextFrameRect>> {
    if array.element_size() != 16 || array.is_truncated() {
        warn!("text frame list unreadable");
        return None;
    }
    Some(
        array
            .elements()
            .map(|data| {
                let v = |i: usize| coordinate(read_i32_le(data, i * 4).unwrap_or(0));
                TextFrameRect {
                    top_left: ParamPair {
                        first: v(0),
                        second: v(1),
                    },
                    bottom_right: ParamPair {
                        first: v(2),
                        second: v(3),
                    },
                }
            })
            .collect(),
    )
}

/// Path sub-record. `unsigned_vertices` applies to the short vertex form.
pub fn build(props: &PropertySet<'_>, unsigned_vertices: bool) -> ShapePath {
    let geometry_flag = |bit| props.flag_or(PropertyId::GeometryBooleans, bit, false);
    ShapePath {
        extrusion_allowed: geometry_flag(bits::THREE_D_OK),
        concentric_gradient_fill_allowed: geometry_flag(bits::FILL_SHADE_SHAPE_OK),
        text_path_allowed: geometry_flag(bits::GTEXT_OK),
        coordinates: props
            .array(PropertyId::Vertices)
            .and_then(|a| points(&a, unsigned_vertices)),
        segments: props.array(PropertyId::SegmentInfo).map(|a| segments(&a)),
        stretch_x: props.value(PropertyId::XLimo).map(|v| v as i32),
        stretch_y: props.value(PropertyId::YLimo).map(|v| v as i32),
        text_frames: props.array(PropertyId::Inscribe).and_then(|a| text_frames(&a)),
        glue_points: props
            .array(PropertyId::ConnectionSites)
            .and_then(|a| points(&a, false)),
        glue_point_type: props.value(PropertyId::Cxk).map(|v| v as u16),
    }
}

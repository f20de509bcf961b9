//! Arrowhead outlines.
//!
//! An arrowhead is a small closed outline drawn in its own coordinate space:
//! the tip sits at the top (`y = 0`) and the base at `y = length`. Its size
//! follows the line width, so very thin lines are widened first.

use crate::common::PointF;
use crate::escher::properties::{PropertyId, PropertySet};
use serde::{Deserialize, Serialize};
use smallvec::{SmallVec, smallvec};

/// Lines thinner than this (0.7 mm) size their arrows as if they were this wide.
pub const CRITICAL_ARROW_LINE_WIDTH_EMU: i32 = 25_200;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArrowKind {
    Triangle,
    Stealth,
    Diamond,
    Oval,
    Open,
}

impl ArrowKind {
    /// Arrow kind for a `lineStartArrowhead` / `lineEndArrowhead` value.
    ///
    /// Chevron styles have no outline of their own and are drawn as open
    /// arrows.
    pub fn from_raw(raw: u32) -> Option<Self> {
        match raw {
            1 => Some(Self::Triangle),
            2 => Some(Self::Stealth),
            3 => Some(Self::Diamond),
            4 => Some(Self::Oval),
            5 | 6 | 7 => Some(Self::Open),
            _ => None,
        }
    }
}

/// Outline points; no arrowhead has more than six.
pub type ArrowPoints = SmallVec<[PointF; 6]>;

/// Closed outline of an arrowhead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ArrowShape {
    Polygon(ArrowPoints),
    Ellipse { center: PointF, rx: f64, ry: f64 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Arrowhead {
    pub kind: ArrowKind,
    pub shape: ArrowShape,
    /// Width of the arrowhead in logical units.
    pub width: i32,
    /// The outline is centered on the line end instead of ending at it.
    pub centered: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineEnd {
    Start,
    End,
}

impl LineEnd {
    fn ids(self) -> (PropertyId, PropertyId, PropertyId) {
        match self {
            Self::Start => (
                PropertyId::LineStartArrowhead,
                PropertyId::LineStartArrowWidth,
                PropertyId::LineStartArrowLength,
            ),
            Self::End => (
                PropertyId::LineEndArrowhead,
                PropertyId::LineEndArrowWidth,
                PropertyId::LineEndArrowLength,
            ),
        }
    }
}

/// Arrowhead at one end of a line of `line_width` logical units.
///
/// `critical_width` is the logical-unit equivalent of
/// [`CRITICAL_ARROW_LINE_WIDTH_EMU`].
pub fn build(props: &PropertySet<'_>, end: LineEnd, line_width: i32, critical_width: i32) -> Option<Arrowhead> {
    let (kind_id, width_id, length_id) = end.ids();
    let kind = ArrowKind::from_raw(props.get(kind_id, 0))?;
    let width_class = props.get(width_id, 1);
    let length_class = props.get(length_id, 1);
    let lw = line_width.max(critical_width) as f64;
    Some(outline(kind, width_class, length_class, lw))
}

fn multiplier(class: u32, open: bool) -> f64 {
    match (class, open) {
        (0, false) => 2.0,
        (2, false) => 5.0,
        (_, false) => 3.0,
        (0, true) => 3.5,
        (2, true) => 6.0,
        (_, true) => 4.5,
    }
}

fn outline(kind: ArrowKind, width_class: u32, length_class: u32, lw: f64) -> Arrowhead {
    let open = kind == ArrowKind::Open;
    let w = multiplier(width_class, open) * lw;
    let l = multiplier(length_class, open) * lw;
    let p = PointF::new;

    let (shape, centered) = match kind {
        ArrowKind::Triangle => (ArrowShape::Polygon(smallvec![p(w * 0.5, 0.0), p(w, l), p(0.0, l)]), false),
        ArrowKind::Open => (
            ArrowShape::Polygon(smallvec![
                p(w * 0.5, 0.0),
                p(w, l * 0.91),
                p(w * 0.85, l),
                p(w * 0.5, l * 0.36),
                p(w * 0.15, l),
                p(0.0, l * 0.91),
            ]),
            false,
        ),
        ArrowKind::Stealth => (
            ArrowShape::Polygon(smallvec![p(w * 0.5, 0.0), p(w, l), p(w * 0.5, l * 0.6), p(0.0, l)]),
            false,
        ),
        ArrowKind::Diamond => (
            ArrowShape::Polygon(smallvec![
                p(w * 0.5, 0.0),
                p(w, l * 0.5),
                p(w * 0.5, l),
                p(0.0, l * 0.5),
            ]),
            true,
        ),
        ArrowKind::Oval => (
            ArrowShape::Ellipse {
                center: p(w * 0.5, 0.0),
                rx: w * 0.5,
                ry: l * 0.5,
            },
            true,
        ),
    };

    Arrowhead {
        kind,
        shape,
        width: w.round() as i32,
        centered,
    }
}

//! Group coordinate systems.
//!
//! Children of a group are anchored in the group's own coordinate space.
//! The space is the union of the child anchors of all children, so the
//! frame of a group is found in a pre-pass over its children before any of
//! them is built.

use crate::common::Rect;
use crate::escher::record::{ByteCursor, RecordHeader};
use crate::escher::types::RecordType;
use super::descriptor::read_anchor;
use log::debug;

/// Linear map from a group's child space into logical coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GroupFrame {
    pub source: Rect,
    pub target: Rect,
    scale_x: f64,
    scale_y: f64,
}

impl GroupFrame {
    pub fn new(source: Rect, target: Rect) -> Self {
        let ratio = |to: i32, from: i32| if from != 0 { to as f64 / from as f64 } else { 1.0 };
        let frame = Self {
            source,
            target,
            scale_x: ratio(target.width(), source.width()),
            scale_y: ratio(target.height(), source.height()),
        };
        debug!(
            "group frame {:?} -> {:?} (x{:.4}, y{:.4})",
            source, target, frame.scale_x, frame.scale_y
        );
        frame
    }

    /// Rectangle `r` of the child space in logical coordinates.
    pub fn map(&self, r: Rect) -> Rect {
        let x = (r.left as f64 - self.source.left as f64) * self.scale_x + self.target.left as f64;
        let y = (r.top as f64 - self.source.top as f64) * self.scale_y + self.target.top as f64;
        let w = r.width() as f64 * self.scale_x;
        let h = r.height() as f64 * self.scale_y;
        Rect::new(
            saturate(x),
            saturate(y),
            saturate(x + w),
            saturate(y + h),
        )
    }
}

#[inline]
fn saturate(v: f64) -> i32 {
    v.round().clamp(i32::MIN as f64, i32::MAX as f64) as i32
}

/// Whether an angle in hundredths of a degree stands the frame on its side.
pub fn is_quarter_turn(angle: i32) -> bool {
    let a = angle.rem_euclid(36000);
    (4500 < a && a <= 13500) || (22500 < a && a <= 31500)
}

/// `rect` with width and height exchanged about its center.
pub fn swap_about_center(rect: Rect) -> Rect {
    let c = rect.center();
    let (hw, hh) = (rect.width() as i64 / 2, rect.height() as i64 / 2);
    let left = c.x as i64 - hh;
    let top = c.y as i64 - hw;
    let clamp = |v: i64| v.clamp(i32::MIN as i64, i32::MAX as i64) as i32;
    Rect::new(
        clamp(left),
        clamp(top),
        clamp(left + rect.height() as i64),
        clamp(top + rect.width() as i64),
    )
}

/// The unrotated frame of a shape whose anchor is the box of the rotated one.
pub fn logic_rect(anchor: Rect, angle: i32) -> Rect {
    if is_quarter_turn(angle) {
        swap_about_center(anchor)
    } else {
        anchor
    }
}

/// Child anchor of one child of a group: the anchor of a shape container,
/// or the anchor of a nested group's descriptor.
fn own_child_anchor(cursor: &ByteCursor<'_>, container: &RecordHeader) -> Option<Rect> {
    match container.record_type() {
        RecordType::SpContainer => cursor
            .children(container)
            .find(|h| h.rec_type == RecordType::ChildAnchor as u16)
            .and_then(|h| read_anchor(cursor.content(&h))),
        RecordType::SpgrContainer => {
            let first = cursor.children(container).next()?;
            (first.record_type() == RecordType::SpContainer)
                .then(|| own_child_anchor(cursor, &first))
                .flatten()
        },
        _ => None,
    }
}

/// Union of the child anchors of every child of `group`, the descriptor
/// container excluded.
pub fn children_anchor(cursor: &ByteCursor<'_>, group: &RecordHeader) -> Option<Rect> {
    cursor
        .children(group)
        .skip(1)
        .filter_map(|child| own_child_anchor(cursor, &child))
        .map(Rect::normalized)
        .reduce(|a, b| a.union(&b))
}

//! Frame correction for arc shapes.
//!
//! An arc is anchored at the bounding box of its pie sector, while the
//! geometry engine expects the frame of the whole ellipse. The correction
//! widens the view box to the ellipse, moves the text frame into the
//! sector, and, when asked, grows the outer bounds to match.

use super::{AdjustValue, AdjustmentValue, CustomShapeGeometry, DEFAULT_VIEW_SIZE, Param, ParamPair, TextFrameRect, ViewBox};
use crate::common::{Point, Rect};

const DEFAULT_START: f64 = -90.0;
const DEFAULT_END: f64 = 0.0;

#[derive(Debug, Clone, Copy, PartialEq)]
struct Range {
    min_x: f64,
    min_y: f64,
    max_x: f64,
    max_y: f64,
}

impl Range {
    fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self {
            min_x: x1.min(x2),
            min_y: y1.min(y2),
            max_x: x1.max(x2),
            max_y: y1.max(y2),
        }
    }

    fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    fn include(&mut self, x: f64, y: f64) {
        self.min_x = self.min_x.min(x);
        self.min_y = self.min_y.min(y);
        self.max_x = self.max_x.max(x);
        self.max_y = self.max_y.max(y);
    }
}

/// Result of [`correct_arc`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArcCorrection {
    /// Outer bounds of the shape after the correction.
    pub bounds: Rect,
    /// Sector bounding box in view-box units.
    pub pie: ViewBox,
}

/// Bounding box of the pie sector from `start` to `end` degrees, center
/// included.
fn sector_bounds(ellipse: Range, start: f64, end: f64) -> Range {
    let start = start.rem_euclid(360.0);
    let mut end = end.rem_euclid(360.0);
    if end <= start {
        end += 360.0;
    }
    let cx = (ellipse.min_x + ellipse.max_x) / 2.0;
    let cy = (ellipse.min_y + ellipse.max_y) / 2.0;
    let (rx, ry) = (ellipse.width() / 2.0, ellipse.height() / 2.0);
    let at = |deg: f64| {
        let (sin, cos) = deg.to_radians().sin_cos();
        (cx + rx * cos, cy + ry * sin)
    };

    let mut range = Range::new(cx, cy, cx, cy);
    for deg in [start, end] {
        let (x, y) = at(deg);
        range.include(x, y);
    }
    let mut axis = (start / 90.0).ceil() * 90.0;
    while axis < end {
        let (x, y) = at(axis);
        range.include(x, y);
        axis += 90.0;
    }
    range
}

fn ellipse_frame(geometry: &CustomShapeGeometry) -> Range {
    let coords = geometry.path.coordinates.as_deref().unwrap_or_default();
    if let [first, second, ..] = coords {
        let values = [first.first, first.second, second.first, second.second].map(Param::as_normal);
        if let [Some(l), Some(t), Some(r), Some(b)] = values {
            return Range::new(l as f64, t as f64, r as f64, b as f64);
        }
    }
    let size = DEFAULT_VIEW_SIZE as f64;
    Range::new(-size, 0.0, size, 2.0 * size)
}

/// Rewrite view box, text frame and (when `adjust_bounds` is set) the outer
/// bounds of an arc. `rotation` is in hundredths of a degree; the corrected
/// bounds keep the rotation pivot of the original ones.
pub fn correct_arc(
    geometry: &mut CustomShapeGeometry,
    bounds: Rect,
    rotation: i32,
    flip_h: bool,
    flip_v: bool,
    adjust_bounds: bool,
) -> ArcCorrection {
    let (mut start, mut end) = (DEFAULT_START, DEFAULT_END);
    if geometry.adjustment_values.len() > 1 {
        for (i, default) in [(0, DEFAULT_START), (1, DEFAULT_END)] {
            let adj = &mut geometry.adjustment_values[i];
            if !adj.explicit {
                *adj = AdjustmentValue {
                    value: AdjustValue::Fixed(default),
                    explicit: true,
                };
            }
        }
        start = geometry.adjustment_values[0].value.as_f64();
        end = geometry.adjustment_values[1].value.as_f64();
    }

    let ellipse = ellipse_frame(geometry);
    let pie = match geometry.view_box {
        Some(vb) => Range::new(
            vb.x as f64,
            vb.y as f64,
            vb.x as f64 + vb.width as f64,
            vb.y as f64 + vb.height as f64,
        ),
        None => sector_bounds(ellipse, start, end),
    };

    geometry.view_box = Some(ViewBox {
        x: ellipse.min_x.round() as i32,
        y: ellipse.min_y.round() as i32,
        width: ellipse.width().round() as i32,
        height: ellipse.height().round() as i32,
    });

    let scale = |extent: f64| if extent != 0.0 { DEFAULT_VIEW_SIZE as f64 / extent } else { 0.0 };
    let (sx, sy) = (scale(ellipse.width()), scale(ellipse.height()));
    let frame = |v: f64| Param::Normal(v.round() as i32);
    geometry.path.text_frames = Some(vec![TextFrameRect {
        top_left: ParamPair {
            first: frame((pie.min_x - ellipse.min_x) * sx),
            second: frame((pie.min_y - ellipse.min_y) * sy),
        },
        bottom_right: ParamPair {
            first: frame((pie.max_x - ellipse.min_x) * sx),
            second: frame((pie.max_y - ellipse.min_y) * sy),
        },
    }]);

    let mut corrected = bounds;
    if adjust_bounds {
        let (mut x_ofs, mut y_ofs) = (0.0, 0.0);
        let (mut width, mut height) = (bounds.width() as f64, bounds.height() as f64);
        if pie.width() != 0.0 {
            let s = bounds.width() as f64 / pie.width();
            x_ofs = if flip_h {
                (pie.max_x - ellipse.max_x) * s
            } else {
                (ellipse.min_x - pie.min_x) * s
            };
            width = ellipse.width() * s;
        }
        if pie.height() != 0.0 {
            let s = bounds.height() as f64 / pie.height();
            y_ofs = if flip_v {
                (pie.max_y - ellipse.max_y) * s
            } else {
                (ellipse.min_y - pie.min_y) * s
            };
            height = ellipse.height() * s;
        }
        corrected = Rect::from_size(
            Point::new(
                bounds.left.saturating_add(x_ofs.round() as i32),
                bounds.top.saturating_add(y_ofs.round() as i32),
            ),
            width.round() as i32,
            height.round() as i32,
        );
        if rotation != 0 {
            let center = corrected.center();
            let moved = center.rotate(bounds.center(), rotation);
            corrected = corrected.translate(moved.x - center.x, moved.y - center.y);
        }
    }

    ArcCorrection {
        bounds: corrected,
        pie: ViewBox {
            x: pie.min_x.round() as i32,
            y: pie.min_y.round() as i32,
            width: pie.width().round() as i32,
            height: pie.height().round() as i32,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attrs::test_support::with_context;
    use crate::escher::properties::PropertyId;
    use crate::escher::shape_type::ShapeType;
    use crate::escher::writer::PropertyBuilder;
    use crate::geometry::FormulaFormatter;

    fn arc(props: PropertyBuilder) -> CustomShapeGeometry {
        let mut out = None;
        with_context(props, ShapeType::ARC, |ctx| out = CustomShapeGeometry::build(ctx, &FormulaFormatter));
        out.unwrap()
    }

    fn frame(g: &CustomShapeGeometry) -> [i32; 4] {
        let f = g.path.text_frames.as_ref().unwrap()[0];
        [f.top_left.first, f.top_left.second, f.bottom_right.first, f.bottom_right.second]
            .map(|p| p.as_normal().unwrap())
    }

    #[test]
    fn test_default_quarter_arc() {
        let mut g = arc(PropertyBuilder::new());
        let raw = g.view_box();
        let out = correct_arc(&mut g, Rect::new(0, 0, 100, 100), 0, false, false, true);

        assert_eq!(raw, ViewBox::default());
        assert_eq!(out.pie, ViewBox::default());
        let vb = g.view_box.unwrap();
        assert_eq!((vb.x, vb.y, vb.width, vb.height), (-21_600, 0, 43_200, 43_200));
        // the new view box is shifted by the sector's offset inside the ellipse
        assert_eq!(raw.x - vb.x, 21_600);
        assert_eq!(frame(&g), [10_800, 0, 21_600, 10_800]);
        assert_eq!(out.bounds, Rect::new(-100, 0, 100, 200));
    }

    #[test]
    fn test_flipped_arc_grows_the_other_way() {
        let mut g = arc(PropertyBuilder::new());
        let out = correct_arc(&mut g, Rect::new(0, 0, 100, 100), 0, true, false, true);
        assert_eq!(out.bounds, Rect::new(0, 0, 200, 200));
    }

    #[test]
    fn test_bounds_untouched_without_adjust() {
        let mut g = arc(PropertyBuilder::new());
        let out = correct_arc(&mut g, Rect::new(0, 0, 100, 100), 9000, false, false, false);
        assert_eq!(out.bounds, Rect::new(0, 0, 100, 100));
        assert!(g.view_box.is_some());
    }

    #[test]
    fn test_explicit_angles_half_circle() {
        let props = PropertyBuilder::new()
            .signed(PropertyId::AdjustValue, 180 * 65_536)
            .signed(PropertyId::Adjust2Value, 0);
        let mut g = arc(props);
        let out = correct_arc(&mut g, Rect::new(0, 0, 200, 100), 0, false, false, true);
        // 180 -> 360 sweeps the upper half with y growing downwards
        assert_eq!(out.pie, ViewBox { x: -21_600, y: 0, width: 43_200, height: 21_600 });
        assert_eq!(out.bounds, Rect::new(0, 0, 200, 200));
    }

    #[test]
    fn test_defaulted_angles_become_explicit() {
        let props = PropertyBuilder::new().signed(PropertyId::Adjust2Value, 45 * 65_536);
        let mut g = arc(props);
        correct_arc(&mut g, Rect::new(0, 0, 100, 100), 0, false, false, false);
        assert!(g.adjustment_values[0].explicit);
        assert_eq!(g.adjustment_values[0].value, AdjustValue::Fixed(-90.0));
        assert_eq!(g.adjustment_values[1].value, AdjustValue::Fixed(45.0));
    }
}

//! Integer points and rectangles in logical coordinates.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    #[inline]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Rotate counter-clockwise about `center` by `angle` hundredths of a
    /// degree, with y growing downwards.
    pub fn rotate(self, center: Point, angle: i32) -> Self {
        if angle % 36000 == 0 {
            return self;
        }
        let rad = (angle as f64 / 100.0).to_radians();
        let (sin, cos) = rad.sin_cos();
        let dx = (self.x as i64 - center.x as i64) as f64;
        let dy = (self.y as i64 - center.y as i64) as f64;
        let x = center.x as f64 + dx * cos + dy * sin;
        let y = center.y as f64 - dx * sin + dy * cos;
        Self::new(round_i32(x), round_i32(y))
    }

    /// Reflect across the horizontal line `y = axis_y2 / 2`.
    #[inline]
    pub fn mirror_y(self, axis_y2: i64) -> Self {
        Self::new(self.x, clamp_i32(axis_y2 - self.y as i64))
    }

    /// Reflect across the vertical line `x = axis_x2 / 2`.
    #[inline]
    pub fn mirror_x(self, axis_x2: i64) -> Self {
        Self::new(clamp_i32(axis_x2 - self.x as i64), self.y)
    }
}

/// Point with fractional coordinates, used for synthesized outlines.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PointF {
    pub x: f64,
    pub y: f64,
}

impl PointF {
    #[inline]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned rectangle; `right` and `bottom` are exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Rect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl Rect {
    #[inline]
    pub const fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    pub fn from_size(origin: Point, width: i32, height: i32) -> Self {
        Self::new(
            origin.x,
            origin.y,
            origin.x.saturating_add(width),
            origin.y.saturating_add(height),
        )
    }

    /// Width, saturating instead of overflowing on corrupt input.
    #[inline]
    pub fn width(&self) -> i32 {
        self.right.saturating_sub(self.left)
    }

    #[inline]
    pub fn height(&self) -> i32 {
        self.bottom.saturating_sub(self.top)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width() <= 0 || self.height() <= 0
    }

    #[inline]
    pub fn top_left(&self) -> Point {
        Point::new(self.left, self.top)
    }

    #[inline]
    pub fn top_right(&self) -> Point {
        Point::new(self.right, self.top)
    }

    #[inline]
    pub fn bottom_left(&self) -> Point {
        Point::new(self.left, self.bottom)
    }

    #[inline]
    pub fn bottom_right(&self) -> Point {
        Point::new(self.right, self.bottom)
    }

    pub fn center(&self) -> Point {
        Point::new(
            ((self.left as i64 + self.right as i64) / 2) as i32,
            ((self.top as i64 + self.bottom as i64) / 2) as i32,
        )
    }

    /// Swap left/right and top/bottom where they are reversed.
    pub fn normalized(self) -> Self {
        Self::new(
            self.left.min(self.right),
            self.top.min(self.bottom),
            self.left.max(self.right),
            self.top.max(self.bottom),
        )
    }

    pub fn union(&self, other: &Rect) -> Rect {
        Rect::new(
            self.left.min(other.left),
            self.top.min(other.top),
            self.right.max(other.right),
            self.bottom.max(other.bottom),
        )
    }

    pub fn translate(&self, dx: i32, dy: i32) -> Rect {
        Rect::new(
            self.left.saturating_add(dx),
            self.top.saturating_add(dy),
            self.right.saturating_add(dx),
            self.bottom.saturating_add(dy),
        )
    }

    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.left && p.x < self.right && p.y >= self.top && p.y < self.bottom
    }

    /// Smallest rectangle holding all `points`.
    pub fn bounding(points: &[Point]) -> Option<Rect> {
        let first = points.first()?;
        let init = Rect::new(first.x, first.y, first.x, first.y);
        Some(points.iter().fold(init, |r, p| {
            Rect::new(r.left.min(p.x), r.top.min(p.y), r.right.max(p.x), r.bottom.max(p.y))
        }))
    }
}

#[inline]
pub(crate) fn clamp_i32(v: i64) -> i32 {
    v.clamp(i32::MIN as i64, i32::MAX as i64) as i32
}

#[inline]
pub(crate) fn round_i32(v: f64) -> i32 {
    v.round().clamp(i32::MIN as f64, i32::MAX as f64) as i32
}

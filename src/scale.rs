//! Unit and angle conversion between the drawing format and the host model.
//!
//! Anchors are stored in a source unit (master units or EMU), sizes in EMU
//! and font sizes in points. The host works in one logical unit. All
//! conversions are a rational multiply-divide with a 128-bit intermediate;
//! inputs that would leave the `i32` range saturate instead of wrapping.

use crate::common::geom::{Point, Rect};
use crate::common::unit::{EMUS_PER_INCH, MapUnit, POINTS_PER_INCH, gcd};
use serde::{Deserialize, Serialize};

/// One reduced `mul / div` ratio with its safe input range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ratio {
    pub mul: i64,
    pub div: i64,
    min_safe: i64,
    max_safe: i64,
}

impl Ratio {
    pub fn new(mul: i64, div: i64) -> Self {
        let div = if div == 0 { 1 } else { div };
        let g = gcd(mul, div);
        let (mut mul, mut div) = (mul / g, div / g);
        if div < 0 {
            mul = -mul;
            div = -div;
        }
        let (min_safe, max_safe) = if mul == 0 {
            (i64::MIN, i64::MAX)
        } else {
            let bound = (i32::MAX as i128 * div as i128 / (mul as i128).abs()) as i64;
            (-bound, bound)
        };
        Self {
            mul,
            div,
            min_safe,
            max_safe,
        }
    }

    #[inline]
    pub fn is_identity(&self) -> bool {
        self.mul == self.div
    }

    pub fn inverse(&self) -> Self {
        Self::new(self.div, self.mul)
    }

    /// `value * mul / div`, rounded half away from zero, saturating at the
    /// `i32` range.
    pub fn apply(&self, value: i64) -> i32 {
        if self.is_identity() {
            return value.clamp(i32::MIN as i64, i32::MAX as i64) as i32;
        }
        if value > self.max_safe {
            return if self.mul >= 0 { i32::MAX } else { i32::MIN };
        }
        if value < self.min_safe {
            return if self.mul >= 0 { i32::MIN } else { i32::MAX };
        }
        let num = value as i128 * self.mul as i128;
        let div = self.div as i128;
        let half = div / 2;
        let q = if num >= 0 { (num + half) / div } else { (num - half) / div };
        q.clamp(i32::MIN as i128, i32::MAX as i128) as i32
    }

    #[inline]
    pub fn apply_f64(&self, value: f64) -> f64 {
        value * self.mul as f64 / self.div as f64
    }
}

/// Converts format lengths into host logical units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitScaler {
    map: Ratio,
    emu: Ratio,
    point: Ratio,
    x_offset: i32,
    y_offset: i32,
}

impl Default for UnitScaler {
    fn default() -> Self {
        Self::new(MapUnit::default(), crate::common::unit::PPT_MASTER_UNITS_PER_INCH as u32)
    }
}

impl UnitScaler {
    /// Scaler from `source_units_per_inch` anchors into `unit`.
    pub fn new(unit: MapUnit, source_units_per_inch: u32) -> Self {
        let (num, den) = unit.per_inch();
        let source = (source_units_per_inch.max(1)) as i64;
        Self {
            map: Ratio::new(num, den * source),
            emu: Ratio::new(num, den * EMUS_PER_INCH),
            point: Ratio::new(num, den * POINTS_PER_INCH),
            x_offset: 0,
            y_offset: 0,
        }
    }

    /// Scaler that passes values through unchanged.
    pub fn identity() -> Self {
        Self {
            map: Ratio::new(1, 1),
            emu: Ratio::new(1, 1),
            point: Ratio::new(1, 1),
            x_offset: 0,
            y_offset: 0,
        }
    }

    pub fn with_offset(mut self, x: i32, y: i32) -> Self {
        self.x_offset = x;
        self.y_offset = y;
        self
    }

    /// Whether any conversion or offset applies.
    #[inline]
    pub fn needs_scaling(&self) -> bool {
        !self.map.is_identity() || self.x_offset != 0 || self.y_offset != 0
    }

    #[inline]
    pub fn map_ratio(&self) -> Ratio {
        self.map
    }

    #[inline]
    pub fn emu_ratio(&self) -> Ratio {
        self.emu
    }

    /// Scaler mapping host units back into source units.
    pub fn inverse(&self) -> Self {
        Self {
            map: self.map.inverse(),
            emu: self.emu.inverse(),
            point: self.point.inverse(),
            x_offset: self.x_offset.saturating_neg(),
            y_offset: self.y_offset.saturating_neg(),
        }
    }

    /// Scale a length in source units.
    #[inline]
    pub fn scale_length(&self, value: i32) -> i32 {
        self.map.apply(value as i64)
    }

    #[inline]
    pub fn scale_length_f64(&self, value: f64) -> f64 {
        self.map.apply_f64(value)
    }

    #[inline]
    pub fn scale_x(&self, value: i32) -> i32 {
        self.scale_length(value).saturating_add(self.x_offset)
    }

    #[inline]
    pub fn scale_y(&self, value: i32) -> i32 {
        self.scale_length(value).saturating_add(self.y_offset)
    }

    #[inline]
    pub fn scale_point(&self, p: Point) -> Point {
        Point::new(self.scale_x(p.x), self.scale_y(p.y))
    }

    /// Scale an anchor rectangle, offset included.
    pub fn scale_rect(&self, r: Rect) -> Rect {
        Rect::new(
            self.scale_x(r.left),
            self.scale_y(r.top),
            self.scale_x(r.right),
            self.scale_y(r.bottom),
        )
    }

    /// EMU to logical units.
    #[inline]
    pub fn scale_emu(&self, value: i32) -> i32 {
        self.emu.apply(value as i64)
    }

    /// Logical units back to inches, for pixel sizing.
    #[inline]
    pub fn logical_to_inches(&self, value: i32) -> f64 {
        value as f64 * self.emu.div as f64 / (self.emu.mul as f64 * EMUS_PER_INCH as f64)
    }

    /// Points to logical units.
    #[inline]
    pub fn scale_pt(&self, value: i32) -> i32 {
        self.point.apply(value as i64)
    }
}

/// Bring an angle in hundredths of a degree into `[0, 36000)`.
#[inline]
pub fn normalize_angle(angle: i32) -> i32 {
    angle.rem_euclid(36000)
}

/// Convert a clockwise 16.16 fixed-point angle in degrees into counter-clockwise
/// hundredths of a degree in `[0, 36000)`.
pub fn fixed_angle_to_hundredths(raw: i32) -> i32 {
    let whole = (raw >> 16) as i64 * 100;
    let frac = ((raw & 0xFFFF) as i64 * 100) >> 16;
    (-(whole + frac)).rem_euclid(36000) as i32
}

/// Inverse of [`fixed_angle_to_hundredths`].
pub fn hundredths_to_fixed_angle(angle: i32) -> i32 {
    let clockwise = (36000 - normalize_angle(angle)) % 36000;
    ((clockwise as i64 * 65536) / 100) as i32
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_master_units_to_hundredth_mm() {
        let s = UnitScaler::new(MapUnit::HundredthMm, 576);
        assert_eq!(s.map_ratio().mul, 635);
        assert_eq!(s.map_ratio().div, 144);
        assert_eq!(s.scale_length(576), 2540);
        assert_eq!(s.scale_length(-576), -2540);
        assert_eq!(s.scale_emu(914_400), 2540);
        assert_eq!(s.scale_pt(72), 2540);
        assert!((s.logical_to_inches(2540) - 1.0).abs() < 1e-9);
        assert!(s.needs_scaling());
        assert!(!UnitScaler::identity().needs_scaling());
    }

    #[test]
    fn test_saturates_on_overflow() {
        let s = UnitScaler::new(MapUnit::HundredthMm, 576);
        assert_eq!(s.scale_length(i32::MAX), i32::MAX);
        assert_eq!(s.scale_length(i32::MIN), i32::MIN);
        let emu = UnitScaler::new(MapUnit::Emu, 576);
        assert_eq!(emu.scale_length(i32::MAX / 2), i32::MAX);
    }

    #[test]
    fn test_offset_applies_to_coordinates_only() {
        let s = UnitScaler::identity().with_offset(10, -5);
        assert_eq!(s.scale_x(1), 11);
        assert_eq!(s.scale_y(1), -4);
        assert_eq!(s.scale_length(1), 1);
        assert_eq!(s.scale_rect(Rect::new(0, 0, 2, 2)), Rect::new(10, -5, 12, -3));
    }

    #[test]
    fn test_fixed_angle_quadrants() {
        assert_eq!(fixed_angle_to_hundredths(0), 0);
        assert_eq!(fixed_angle_to_hundredths(90 << 16), 27000);
        assert_eq!(fixed_angle_to_hundredths(270 << 16), 9000);
        assert_eq!(fixed_angle_to_hundredths(-90 << 16), 9000);
        assert_eq!(fixed_angle_to_hundredths((45 << 16) | 0x8000), 31450);
        for deg in [0, 90, 180, 270] {
            let h = deg * 100;
            assert_eq!(fixed_angle_to_hundredths(hundredths_to_fixed_angle(h)), h);
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn prop_angle_round_trip(h in 0i32..36000) {
            let back = fixed_angle_to_hundredths(hundredths_to_fixed_angle(h));
            let diff = (back - h).rem_euclid(36000);
            prop_assert!(diff <= 1 || diff >= 35999);
        }

        #[test]
        fn prop_upscale_round_trips(v in -3_000_000i32..3_000_000) {
            let s = UnitScaler::new(MapUnit::HundredthMm, 576);
            let back = s.inverse().scale_length(s.scale_length(v));
            prop_assert_eq!(back, v);
        }

        #[test]
        fn prop_never_wraps(v in any::<i32>()) {
            let s = UnitScaler::new(MapUnit::Emu, 576);
            let out = s.scale_length(v) as i64;
            prop_assert_eq!(out.signum(), (v as i64).signum());
        }
    }
}

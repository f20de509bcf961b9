//! Length units of the drawing format and of the host model.

use serde::{Deserialize, Serialize};

pub const EMUS_PER_INCH: i64 = 914_400;
pub const EMUS_PER_CM: i64 = 360_000;
pub const EMUS_PER_MM: i64 = 36_000;
pub const EMUS_PER_PT: i64 = 12_700;
pub const EMUS_PER_TWIP: i64 = 635;
pub const PPT_MASTER_UNITS_PER_INCH: i64 = 576;
pub const TWIPS_PER_INCH: i64 = 1_440;
pub const POINTS_PER_INCH: i64 = 72;
pub const HUNDREDTH_MM_PER_INCH: i64 = 2_540;

/// Fixed-point 16.16 value of 1.0.
pub const FIXED_ONE: i32 = 0x1_0000;

/// Logical unit of the host scene model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum MapUnit {
    /// 1/100 millimeter
    #[default]
    HundredthMm,
    /// 1/1440 inch
    Twip,
    /// 1/72 inch
    Point,
    /// English Metric Unit, 1/914400 inch
    Emu,
}

impl MapUnit {
    /// Units per inch, expressed as a ratio `(numerator, denominator)`.
    #[inline]
    pub fn per_inch(self) -> (i64, i64) {
        match self {
            Self::HundredthMm => (HUNDREDTH_MM_PER_INCH, 1),
            Self::Twip => (TWIPS_PER_INCH, 1),
            Self::Point => (POINTS_PER_INCH, 1),
            Self::Emu => (EMUS_PER_INCH, 1),
        }
    }
}

#[inline]
pub fn emu_to_pt_f64(emu: i64) -> f64 {
    emu as f64 / EMUS_PER_PT as f64
}

/// Convert a 16.16 fixed-point value to a double.
#[inline]
pub fn fixed_to_f64(value: i32) -> f64 {
    value as f64 / FIXED_ONE as f64
}

/// Convert a double to 16.16 fixed point, saturating at the i32 range.
#[inline]
pub fn f64_to_fixed(value: f64) -> i32 {
    (value * FIXED_ONE as f64)
        .round()
        .clamp(i32::MIN as f64, i32::MAX as f64) as i32
}

/// Greatest common divisor, used to reduce scale ratios.
pub(crate) fn gcd(mut a: i64, mut b: i64) -> i64 {
    a = a.abs();
    b = b.abs();
    while b != 0 {
        let t = a % b;
        a = b;
        b = t;
    }
    a.max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_point() {
        assert_eq!(fixed_to_f64(0x8000), 0.5);
        assert_eq!(f64_to_fixed(-1.0), -0x1_0000);
        assert_eq!(f64_to_fixed(1e12), i32::MAX);
    }

    #[test]
    fn test_gcd() {
        assert_eq!(gcd(2540, 576), 4);
        assert_eq!(gcd(0, 0), 1);
        assert_eq!(gcd(-12, 8), 4);
    }

    #[test]
    fn test_emu_constants_agree() {
        assert_eq!(EMUS_PER_INCH, EMUS_PER_PT * POINTS_PER_INCH);
        assert_eq!(EMUS_PER_INCH, EMUS_PER_TWIP * TWIPS_PER_INCH);
        assert_eq!(emu_to_pt_f64(EMUS_PER_INCH), 72.0);
    }
}

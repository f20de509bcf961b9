//! Guide formulas.
//!
//! Each guide is an 8-byte record: a 16-bit word holding the operation in
//! its low byte and three "special operand" flags in bits 13-15, followed by
//! three signed 16-bit operands. A special operand names another value
//! instead of being a literal: a previous guide (`0x400 | n`), an adjustment
//! value (`0x147..=0x150`) or a geometry property.

use crate::common::binary::{read_i16_le, read_u16_le};
use crate::escher::properties::ArrayProperty;
use log::warn;
use std::fmt::Write;

const GUIDE_SIZE: usize = 8;
const GUIDE_REFERENCE: i32 = 0x400;
const ADJUST_FIRST: i32 = 0x147;
const ADJUST_LAST: i32 = 0x150;

/// Guide operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EquationOp {
    /// `p1 + p2 - p3`
    Sum,
    /// `p1 * p2 / p3`
    Product,
    /// `(p1 + p2) / 2`
    Mid,
    Abs,
    Min,
    Max,
    /// `p1 > 0 ? p2 : p3`
    If,
    /// `sqrt(p1² + p2² + p3²)`
    Mod,
    Atan2,
    Sin,
    Cos,
    CosAtan2,
    SinAtan2,
    Sqrt,
    /// Same as `Sum`.
    SumAngle,
    Ellipse,
    Tan,
    /// `sqrt(p3² - p1²)`
    Pythagoras,
    /// x coordinate rotated about the view-box center
    RotateX,
    /// y coordinate rotated about the view-box center
    RotateY,
    Unknown(u16),
}

impl EquationOp {
    pub fn from_raw(raw: u16) -> Self {
        match raw {
            0 => Self::Sum,
            1 => Self::Product,
            2 => Self::Mid,
            3 => Self::Abs,
            4 => Self::Min,
            5 => Self::Max,
            6 => Self::If,
            7 => Self::Mod,
            8 => Self::Atan2,
            9 => Self::Sin,
            10 => Self::Cos,
            11 => Self::CosAtan2,
            12 => Self::SinAtan2,
            13 => Self::Sqrt,
            14 => Self::SumAngle,
            15 => Self::Ellipse,
            16 => Self::Tan,
            0x80 => Self::Pythagoras,
            0x81 => Self::RotateX,
            0x82 => Self::RotateY,
            other => Self::Unknown(other),
        }
    }
}

/// One decoded guide record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Equation {
    pub op: EquationOp,
    pub params: [i32; 3],
    pub special: [bool; 3],
}

impl Equation {
    pub fn parse(data: &[u8]) -> Option<Self> {
        let flags = read_u16_le(data, 0).ok()?;
        Some(Self {
            op: EquationOp::from_raw(flags & 0xFF),
            params: [
                read_i16_le(data, 2).ok()? as i32,
                read_i16_le(data, 4).ok()? as i32,
                read_i16_le(data, 6).ok()? as i32,
            ],
            special: [flags & 0x2000 != 0, flags & 0x4000 != 0, flags & 0x8000 != 0],
        })
    }
}

/// Renders guides as formula strings for the host's geometry engine.
pub trait EquationFormatter {
    /// Formula text of `eq`, the guide at position `index` of `count`.
    fn format(&self, eq: &Equation, index: usize, count: usize) -> String;
}

/// Formatter for the enhanced-geometry formula syntax: `?n` for guides,
/// `$n` for adjustment values, `left`/`top`/`right`/`bottom` for the view box.
#[derive(Debug, Clone, Copy, Default)]
pub struct FormulaFormatter;

impl FormulaFormatter {
    fn param(&self, out: &mut String, eq: &Equation, i: usize, count: usize) {
        let value = eq.params[i];
        if !eq.special[i] {
            let _ = write!(out, "{value}");
            return;
        }
        if value & GUIDE_REFERENCE != 0 {
            let target = (value & 0xFF) as usize;
            if target >= count {
                warn!("guide refers to missing guide {target} of {count}");
                out.push('0');
            } else {
                let _ = write!(out, "?{target} ");
            }
            return;
        }
        match value {
            ADJUST_FIRST..=ADJUST_LAST => {
                let _ = write!(out, "${} ", value - ADJUST_FIRST);
            },
            0x140 => out.push_str("left"),
            0x141 => out.push_str("top"),
            0x142 => out.push_str("right"),
            0x143 => out.push_str("bottom"),
            0x153 => out.push_str("xstretch"),
            0x154 => out.push_str("ystretch"),
            0x1BB => out.push_str("hasfill"),
            0x1CB => out.push_str("linewidth"),
            0x1FC => out.push_str("hasstroke"),
            _ => {
                let _ = write!(out, "{value}");
            },
        }
    }
}

impl EquationFormatter for FormulaFormatter {
    fn format(&self, eq: &Equation, _index: usize, count: usize) -> String {
        let mut s = String::new();
        let p = |s: &mut String, i: usize| self.param(s, eq, i, count);
        let [p1, p2, p3] = eq.params;
        let [s1, s2, s3] = eq.special;

        match eq.op {
            EquationOp::Sum | EquationOp::SumAngle => {
                let mut used = 0;
                if p1 != 0 || s1 {
                    used |= 1;
                }
                if p2 != 0 || s2 {
                    used |= 2;
                }
                match used {
                    0 => {},
                    1 => p(&mut s, 0),
                    2 => p(&mut s, 1),
                    _ => {
                        p(&mut s, 0);
                        s.push('+');
                        p(&mut s, 1);
                    },
                }
                if s3 || p3 != 0 {
                    s.push('-');
                    p(&mut s, 2);
                }
                if s.is_empty() {
                    s.push('0');
                }
            },
            EquationOp::Product => {
                p(&mut s, 0);
                if s2 || p2 != 1 {
                    s.push('*');
                    p(&mut s, 1);
                }
                if s3 || p3 != 1 {
                    s.push('/');
                    p(&mut s, 2);
                }
            },
            EquationOp::Mid => {
                s.push('(');
                p(&mut s, 0);
                s.push('+');
                p(&mut s, 1);
                s.push_str(")/2");
            },
            EquationOp::Abs => {
                s.push_str("abs(");
                p(&mut s, 0);
                s.push(')');
            },
            EquationOp::Min | EquationOp::Max => {
                s.push_str(if eq.op == EquationOp::Min { "min(" } else { "max(" });
                p(&mut s, 0);
                s.push(',');
                p(&mut s, 1);
                s.push(')');
            },
            EquationOp::If => {
                s.push_str("if(");
                p(&mut s, 0);
                s.push(',');
                p(&mut s, 1);
                s.push(',');
                p(&mut s, 2);
                s.push(')');
            },
            EquationOp::Mod => {
                s.push_str("sqrt(");
                for i in 0..3 {
                    if i > 0 {
                        s.push('+');
                    }
                    p(&mut s, i);
                    s.push('*');
                    p(&mut s, i);
                }
                s.push(')');
            },
            EquationOp::Atan2 => {
                s.push_str("atan2(");
                p(&mut s, 1);
                s.push(',');
                p(&mut s, 0);
                s.push_str(")/(pi/180)");
            },
            EquationOp::Sin | EquationOp::Cos | EquationOp::Tan => {
                p(&mut s, 0);
                s.push_str(match eq.op {
                    EquationOp::Sin => "*sin(",
                    EquationOp::Cos => "*cos(",
                    _ => "*tan(",
                });
                p(&mut s, 1);
                s.push_str("*(pi/180))");
            },
            EquationOp::CosAtan2 | EquationOp::SinAtan2 => {
                p(&mut s, 0);
                s.push_str(if eq.op == EquationOp::CosAtan2 { "*cos(atan2(" } else { "*sin(atan2(" });
                p(&mut s, 2);
                s.push(',');
                p(&mut s, 1);
                s.push_str("))");
            },
            EquationOp::Sqrt => {
                s.push_str("sqrt(");
                p(&mut s, 0);
                s.push(')');
            },
            EquationOp::Ellipse => {
                p(&mut s, 2);
                s.push_str("*sqrt(1-(");
                p(&mut s, 0);
                s.push('/');
                p(&mut s, 1);
                s.push_str(")*(");
                p(&mut s, 0);
                s.push('/');
                p(&mut s, 1);
                s.push_str("))");
            },
            EquationOp::Pythagoras => {
                s.push_str("sqrt(");
                p(&mut s, 2);
                s.push('*');
                p(&mut s, 2);
                s.push('-');
                p(&mut s, 0);
                s.push('*');
                p(&mut s, 0);
                s.push(')');
            },
            EquationOp::RotateX | EquationOp::RotateY => {
                let (lead, a, b) = if eq.op == EquationOp::RotateX {
                    ("(cos(", ")*(", "-10800)+sin(")
                } else {
                    ("-(sin(", ")*(", "-10800)-cos(")
                };
                s.push_str(lead);
                p(&mut s, 2);
                s.push_str("*(pi/180))");
                s.push_str(&a[1..]);
                p(&mut s, 0);
                s.push_str(b);
                p(&mut s, 2);
                s.push_str("*(pi/180))*(");
                p(&mut s, 1);
                s.push_str("-10800))+10800");
            },
            EquationOp::Unknown(raw) => {
                warn!("unknown guide operation {raw:#x}");
                s.push('0');
            },
        }
        s
    }
}

/// Decode and format every guide of a `Guides` array property.
pub fn build(array: &ArrayProperty<'_>, formatter: &dyn EquationFormatter) -> Vec<String> {
    if array.element_size() != GUIDE_SIZE {
        warn!("guide records of {} bytes ignored", array.element_size());
        return Vec::new();
    }
    let count = array.len();
    array
        .elements()
        .enumerate()
        .map(|(i, data)| match Equation::parse(data) {
            Some(eq) => formatter.format(&eq, i, count),
            None => "0".to_owned(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eq(op: u16, special: [bool; 3], params: [i32; 3]) -> Equation {
        Equation {
            op: EquationOp::from_raw(op),
            params,
            special,
        }
    }

    fn fmt(e: &Equation) -> String {
        FormulaFormatter.format(e, 0, 4)
    }

    #[test]
    fn test_sum_optimizes_zero_operands() {
        assert_eq!(fmt(&eq(0, [true, false, false], [0x147, 0, 0])), "$0 ");
        assert_eq!(fmt(&eq(0, [false, false, false], [0, 21600, 0])), "21600");
        assert_eq!(fmt(&eq(0, [false, true, false], [10, 0x401, 5])), "10+?1 -5");
        assert_eq!(fmt(&eq(0, [false; 3], [0, 0, 0])), "0");
    }

    #[test]
    fn test_product_and_geometry_names() {
        assert_eq!(fmt(&eq(1, [true, false, false], [0x142, 1, 2])), "right/2");
        assert_eq!(fmt(&eq(1, [false, true, true], [3, 0x148, 0x400])), "3*$1 /?0 ");
    }

    #[test]
    fn test_trig_forms() {
        assert_eq!(fmt(&eq(8, [false; 3], [1, 2, 0])), "atan2(2,1)/(pi/180)");
        assert_eq!(fmt(&eq(9, [false; 3], [10, 45, 0])), "10*sin(45*(pi/180))");
        assert_eq!(
            fmt(&eq(0x81, [false; 3], [1, 2, 30])),
            "(cos(30*(pi/180))*(1-10800)+sin(30*(pi/180))*(2-10800))+10800"
        );
    }

    #[test]
    fn test_dangling_guide_reference() {
        let e = eq(3, [true, false, false], [0x409, 0, 0]);
        assert_eq!(FormulaFormatter.format(&e, 0, 2), "abs(0)");
    }

    #[test]
    fn test_parse_record() {
        let mut data = Vec::new();
        data.extend_from_slice(&0x2001u16.to_le_bytes());
        data.extend_from_slice(&0x147i16.to_le_bytes());
        data.extend_from_slice(&(-3i16).to_le_bytes());
        data.extend_from_slice(&7i16.to_le_bytes());
        let e = Equation::parse(&data).unwrap();
        assert_eq!(e.op, EquationOp::Product);
        assert_eq!(e.params, [0x147, -3, 7]);
        assert_eq!(e.special, [true, false, false]);
    }
}

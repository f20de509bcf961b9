//! Interactive handles of a custom shape.

use super::Param;
use crate::common::binary::{read_i32_le, read_u32_le};
use crate::escher::properties::ArrayProperty;
use bitflags::bitflags;
use log::warn;
use serde::{Deserialize, Serialize};

const HANDLE_SIZE: usize = 36;
/// Operand value meaning "center of the view box".
const CENTER: i32 = 2;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct HandleFlags: u32 {
        const MIRRORED_X = 0x0001;
        const MIRRORED_Y = 0x0002;
        const SWITCHED = 0x0004;
        const POLAR = 0x0008;
        const MAP = 0x0010;
        const RANGE = 0x0020;
        const RANGE_X_MIN_IS_SPECIAL = 0x0080;
        const RANGE_X_MAX_IS_SPECIAL = 0x0100;
        const RANGE_Y_MIN_IS_SPECIAL = 0x0200;
        const RANGE_Y_MAX_IS_SPECIAL = 0x0400;
        const RADIUS_RANGE = 0x2000;
        const CENTER_X_IS_SPECIAL = 0x4000;
        const CENTER_Y_IS_SPECIAL = 0x8000;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamPair {
    pub first: Param,
    pub second: Param,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Handle {
    pub position: Option<ParamPair>,
    pub mirrored_x: bool,
    pub mirrored_y: bool,
    pub switched: bool,
    pub polar: Option<ParamPair>,
    pub map: Option<ParamPair>,
    pub range_x_min: Option<Param>,
    pub range_x_max: Option<Param>,
    pub range_y_min: Option<Param>,
    pub range_y_max: Option<Param>,
    pub radius_range_min: Option<Param>,
    pub radius_range_max: Option<Param>,
}

/// Handle operand: special operands name an adjustment value, a guide or a
/// view-box edge.
fn param(value: i32, special: bool, horizontal: bool) -> Param {
    if !special {
        return Param::Normal(value);
    }
    match value {
        0 if horizontal => Param::Left,
        0 => Param::Top,
        1 if horizontal => Param::Right,
        1 => Param::Bottom,
        3..=0x84 => Param::Equation((value - 3) as u16),
        0x100..=0x107 => Param::Adjustment((value & 0xFF) as u8),
        _ => Param::Normal(value),
    }
}

/// Handles of the `Handles` array and the bit set of adjustment values that
/// polar handles store as 16.16 fixed point.
pub fn build(array: &ArrayProperty<'_>, view_width: i32, view_height: i32) -> (Vec<Handle>, u32) {
    if array.element_size() != HANDLE_SIZE {
        warn!("handle records of {} bytes ignored", array.element_size());
        return (Vec::new(), 0);
    }
    let center = |v: i32, extent: i32| if v == CENTER { extent / 2 } else { v };

    let mut converted = 0u32;
    let mut handles = Vec::with_capacity(array.len());
    for (i, data) in array.elements().enumerate() {
        let field = |n: usize| read_i32_le(data, 4 + n * 4).unwrap_or(0);
        let flags = HandleFlags::from_bits_truncate(read_u32_le(data, 0).unwrap_or(0));
        let pos_x = center(field(0), view_width);
        let pos_y = center(field(1), view_height);
        let center_x = center(field(2), view_width);
        let center_y = center(field(3), view_height);
        let (x_min, x_max, y_min, y_max) = (field(4), field(5), field(6), field(7));

        let mut handle = Handle {
            position: Some(ParamPair {
                first: param(pos_x, true, true),
                second: param(pos_y, true, false),
            }),
            mirrored_x: flags.contains(HandleFlags::MIRRORED_X),
            mirrored_y: flags.contains(HandleFlags::MIRRORED_Y),
            switched: flags.contains(HandleFlags::SWITCHED),
            ..Handle::default()
        };
        let center_pair = ParamPair {
            first: param(center_x, flags.contains(HandleFlags::CENTER_X_IS_SPECIAL), true),
            second: param(center_y, flags.contains(HandleFlags::CENTER_Y_IS_SPECIAL), false),
        };
        if flags.contains(HandleFlags::POLAR) {
            if (pos_y >= 0x256 || pos_y <= 0x107) && i < 32 {
                converted |= 1 << i;
            }
            handle.polar = Some(center_pair);
        }
        if flags.contains(HandleFlags::MAP) {
            handle.map = Some(center_pair);
        }
        if flags.contains(HandleFlags::RANGE) {
            if x_min != i32::MIN {
                handle.range_x_min = Some(param(
                    center(x_min, view_width),
                    flags.contains(HandleFlags::RANGE_X_MIN_IS_SPECIAL),
                    true,
                ));
            }
            if x_max != i32::MAX {
                handle.range_x_max = Some(param(x_max, flags.contains(HandleFlags::RANGE_X_MAX_IS_SPECIAL), false));
            }
            if y_min != i32::MIN {
                handle.range_y_min = Some(param(y_min, flags.contains(HandleFlags::RANGE_Y_MIN_IS_SPECIAL), true));
            }
            if y_max != i32::MAX {
                handle.range_y_max = Some(param(y_max, flags.contains(HandleFlags::RANGE_Y_MAX_IS_SPECIAL), false));
            }
        }
        if flags.contains(HandleFlags::RADIUS_RANGE) {
            if x_min != i32::MAX {
                handle.radius_range_min =
                    Some(param(x_min, flags.contains(HandleFlags::RANGE_X_MIN_IS_SPECIAL), true));
            }
            if x_max != i32::MIN {
                handle.radius_range_max =
                    Some(param(x_max, flags.contains(HandleFlags::RANGE_X_MAX_IS_SPECIAL), false));
            }
        }
        handles.push(handle);
    }
    (handles, converted)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handle_array(records: &[[i32; 9]]) -> Vec<u8> {
        let mut data = Vec::new();
        data.extend_from_slice(&(records.len() as u16).to_le_bytes());
        data.extend_from_slice(&(records.len() as u16).to_le_bytes());
        data.extend_from_slice(&(HANDLE_SIZE as u16).to_le_bytes());
        for r in records {
            for v in r {
                data.extend_from_slice(&v.to_le_bytes());
            }
        }
        data
    }

    #[test]
    fn test_polar_handle_center_and_conversion() {
        let data = handle_array(&[[0x0008, 0x101, 0x100, CENTER, CENTER, 0, 0, 0, 0]]);
        let array = ArrayProperty::new(&data).unwrap();
        let (handles, converted) = build(&array, 21600, 43200);
        assert_eq!(handles.len(), 1);
        let h = &handles[0];
        assert_eq!(
            h.position,
            Some(ParamPair {
                first: Param::Adjustment(1),
                second: Param::Adjustment(0)
            })
        );
        assert_eq!(
            h.polar,
            Some(ParamPair {
                first: Param::Normal(10800),
                second: Param::Normal(21600)
            })
        );
        assert_eq!(converted, 1);
    }

    #[test]
    fn test_polar_handle_inside_band_is_not_converted() {
        let data = handle_array(&[
            [0x0001, 0x100, 0, 0, 0, 0, 0, 0, 0],
            [0x0008, 0x100, 0x200, 0, 0, 0, 0, 0, 0],
        ]);
        let (handles, converted) = build(&ArrayProperty::new(&data).unwrap(), 21600, 21600);
        assert!(handles[0].mirrored_x);
        assert!(handles[0].polar.is_none());
        assert_eq!(converted, 0);
    }

    #[test]
    fn test_range_sentinels_are_skipped() {
        let flags = (HandleFlags::RANGE | HandleFlags::RANGE_X_MAX_IS_SPECIAL).bits() as i32;
        let data = handle_array(&[[flags, 0x100, 0, 0, 0, i32::MIN, 1, 0, i32::MAX]]);
        let (handles, _) = build(&ArrayProperty::new(&data).unwrap(), 21600, 21600);
        let h = &handles[0];
        assert_eq!(h.range_x_min, None);
        assert_eq!(h.range_x_max, Some(Param::Bottom));
        assert_eq!(h.range_y_min, Some(Param::Normal(0)));
        assert_eq!(h.range_y_max, None);
    }

    #[test]
    fn test_wrong_record_size() {
        let mut data = handle_array(&[[0; 9]]);
        data[4] = 32;
        let (handles, _) = build(&ArrayProperty::new(&data).unwrap(), 21600, 21600);
        assert!(handles.is_empty());
    }
}

//! Shape kinds stored in the instance field of the shape record.

use phf::phf_map;
use std::borrow::Cow;
use std::fmt;

/// Numeric shape kind (0..=202, plus `0x0FFF` for "no shape").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ShapeType(pub u16);

impl ShapeType {
    pub const NOT_PRIMITIVE: Self = Self(0);
    pub const RECTANGLE: Self = Self(1);
    pub const ROUND_RECTANGLE: Self = Self(2);
    pub const ELLIPSE: Self = Self(3);
    pub const DIAMOND: Self = Self(4);
    pub const ISOCELES_TRIANGLE: Self = Self(5);
    pub const RIGHT_TRIANGLE: Self = Self(6);
    pub const ARC: Self = Self(19);
    pub const LINE: Self = Self(20);
    pub const TEXT_SIMPLE: Self = Self(24);
    pub const STRAIGHT_CONNECTOR: Self = Self(32);
    pub const BENT_CONNECTOR2: Self = Self(33);
    pub const BENT_CONNECTOR3: Self = Self(34);
    pub const BENT_CONNECTOR4: Self = Self(35);
    pub const BENT_CONNECTOR5: Self = Self(36);
    pub const CURVED_CONNECTOR2: Self = Self(37);
    pub const CURVED_CONNECTOR3: Self = Self(38);
    pub const CURVED_CONNECTOR4: Self = Self(39);
    pub const CURVED_CONNECTOR5: Self = Self(40);
    pub const PICTURE_FRAME: Self = Self(75);
    pub const TEXT_PLAIN_TEXT: Self = Self(136);
    pub const TEXT_CAN_DOWN: Self = Self(175);
    pub const HOST_CONTROL: Self = Self(201);
    pub const TEXT_BOX: Self = Self(202);
    pub const NIL: Self = Self(0x0FFF);

    #[inline]
    pub const fn raw(self) -> u16 {
        self.0
    }

    /// Custom-shape type name, `mso-sptN` for kinds without a dedicated name.
    pub fn name(self) -> Cow<'static, str> {
        match SHAPE_NAMES.get(&self.0) {
            Some(name) => Cow::Borrowed(name),
            None => Cow::Owned(format!("mso-spt{}", self.0)),
        }
    }

    #[inline]
    pub fn is_connector(self) -> bool {
        (Self::STRAIGHT_CONNECTOR.0..=Self::CURVED_CONNECTOR5.0).contains(&self.0)
    }

    /// Decorative text-on-path kinds.
    #[inline]
    pub fn is_fontwork(self) -> bool {
        (Self::TEXT_PLAIN_TEXT.0..=Self::TEXT_CAN_DOWN.0).contains(&self.0)
    }

    /// Kinds with a built-in geometry the custom-shape engine can draw.
    #[inline]
    pub fn is_custom_shape(self) -> bool {
        self != Self::NOT_PRIMITIVE
            && self != Self::LINE
            && self != Self::TEXT_BOX
            && self != Self::HOST_CONTROL
            && self != Self::PICTURE_FRAME
            && self.0 < Self::NIL.0
    }

    /// Whether a shape without an explicit fill flag is filled.
    pub fn is_filled_by_default(self) -> bool {
        !(self == Self::LINE || self == Self::ARC || self.is_connector())
    }

    /// Whether a shape without an explicit line flag is outlined.
    pub fn is_stroked_by_default(self) -> bool {
        !self.is_fontwork()
    }
}

impl From<u16> for ShapeType {
    fn from(value: u16) -> Self {
        Self(value & 0x0FFF)
    }
}

impl fmt::Display for ShapeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

static SHAPE_NAMES: phf::Map<u16, &'static str> = phf_map! {
    0u16 => "non-primitive",
    1u16 => "rectangle",
    2u16 => "round-rectangle",
    3u16 => "ellipse",
    4u16 => "diamond",
    5u16 => "isosceles-triangle",
    6u16 => "right-triangle",
    7u16 => "parallelogram",
    8u16 => "trapezoid",
    9u16 => "hexagon",
    10u16 => "octagon",
    11u16 => "cross",
    12u16 => "star5",
    13u16 => "right-arrow",
    15u16 => "pentagon-right",
    16u16 => "cube",
    21u16 => "plaque",
    22u16 => "can",
    23u16 => "ring",
    44u16 => "line-callout-1",
    45u16 => "line-callout-2",
    46u16 => "line-callout-3",
    55u16 => "chevron",
    56u16 => "pentagon",
    57u16 => "forbidden",
    58u16 => "star8",
    61u16 => "rectangular-callout",
    62u16 => "round-rectangular-callout",
    63u16 => "round-callout",
    65u16 => "paper",
    66u16 => "left-arrow",
    67u16 => "down-arrow",
    68u16 => "up-arrow",
    69u16 => "left-right-arrow",
    70u16 => "up-down-arrow",
    72u16 => "bang",
    73u16 => "lightning",
    74u16 => "heart",
    76u16 => "quad-arrow",
    84u16 => "quad-bevel",
    85u16 => "left-bracket",
    86u16 => "right-bracket",
    87u16 => "left-brace",
    88u16 => "right-brace",
    92u16 => "star24",
    94u16 => "striped-right-arrow",
    95u16 => "circle-pie",
    96u16 => "smiley",
    98u16 => "vertical-scroll",
    97u16 => "horizontal-scroll",
    106u16 => "cloud-callout",
    109u16 => "flowchart-process",
    110u16 => "flowchart-decision",
    111u16 => "flowchart-data",
    112u16 => "flowchart-predefined-process",
    113u16 => "flowchart-internal-storage",
    114u16 => "flowchart-document",
    115u16 => "flowchart-multidocument",
    116u16 => "flowchart-terminator",
    117u16 => "flowchart-preparation",
    118u16 => "flowchart-manual-input",
    119u16 => "flowchart-manual-operation",
    120u16 => "flowchart-connector",
    121u16 => "flowchart-card",
    122u16 => "flowchart-punched-tape",
    123u16 => "flowchart-summing-junction",
    124u16 => "flowchart-or",
    125u16 => "flowchart-collate",
    126u16 => "flowchart-sort",
    127u16 => "flowchart-extract",
    128u16 => "flowchart-merge",
    130u16 => "flowchart-stored-data",
    131u16 => "flowchart-sequential-access",
    132u16 => "flowchart-magnetic-disk",
    133u16 => "flowchart-direct-access-storage",
    134u16 => "flowchart-display",
    135u16 => "flowchart-delay",
    136u16 => "fontwork-plain-text",
    137u16 => "fontwork-stop",
    138u16 => "fontwork-triangle-up",
    139u16 => "fontwork-triangle-down",
    140u16 => "fontwork-chevron-up",
    141u16 => "fontwork-chevron-down",
    143u16 => "fontwork-ring-outside",
    144u16 => "fontwork-arch-up-curve",
    145u16 => "fontwork-arch-down-curve",
    146u16 => "fontwork-circle-curve",
    147u16 => "fontwork-open-circle-curve",
    148u16 => "fontwork-arch-up-pour",
    149u16 => "fontwork-arch-down-pour",
    150u16 => "fontwork-circle-pour",
    151u16 => "fontwork-open-circle-pour",
    152u16 => "fontwork-curve-up",
    153u16 => "fontwork-curve-down",
    154u16 => "fontwork-fade-up-and-right",
    155u16 => "fontwork-fade-up-and-left",
    156u16 => "fontwork-wave",
    160u16 => "fontwork-inflate",
    172u16 => "fontwork-fade-right",
    173u16 => "fontwork-fade-left",
    174u16 => "fontwork-fade-up",
    175u16 => "fontwork-fade-down",
    176u16 => "flowchart-alternate-process",
    177u16 => "flowchart-off-page-connector",
    183u16 => "sun",
    184u16 => "moon",
    185u16 => "bracket-pair",
    186u16 => "brace-pair",
    187u16 => "star4",
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_and_fallback() {
        assert_eq!(ShapeType::RECTANGLE.name(), "rectangle");
        assert_eq!(ShapeType::ARC.name(), "mso-spt19");
        assert_eq!(ShapeType(100).to_string(), "mso-spt100");
    }

    #[test]
    fn test_default_fill_and_stroke() {
        assert!(ShapeType::RECTANGLE.is_filled_by_default());
        assert!(ShapeType::RECTANGLE.is_stroked_by_default());
        assert!(!ShapeType::LINE.is_filled_by_default());
        assert!(!ShapeType::ARC.is_filled_by_default());
        assert!(!ShapeType::BENT_CONNECTOR3.is_filled_by_default());
        assert!(!ShapeType(150).is_stroked_by_default());
        assert!(ShapeType(176).is_stroked_by_default());
    }

    #[test]
    fn test_classification() {
        assert!(ShapeType::CURVED_CONNECTOR5.is_connector());
        assert!(!ShapeType(41).is_connector());
        assert!(ShapeType::ARC.is_custom_shape());
        assert!(!ShapeType::TEXT_BOX.is_custom_shape());
        assert_eq!(ShapeType::from(0xF013), ShapeType(0x013));
    }
}

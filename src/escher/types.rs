//! Record type identifiers and shape record flags.

use bitflags::bitflags;

/// Drawing record types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum RecordType {
    /// Unknown or unsupported record type
    Unknown = 0x0000,

    // Containers
    DggContainer = 0xF000,
    BStoreContainer = 0xF001,
    DgContainer = 0xF002,
    SpgrContainer = 0xF003,
    SpContainer = 0xF004,
    SolverContainer = 0xF005,

    // Atoms
    /// Drawing group atom (document-wide shape id bookkeeping)
    Dgg = 0xF006,
    /// Blip store entry
    Bse = 0xF007,
    /// Drawing atom (per page)
    Dg = 0xF008,
    /// Group coordinate system
    Spgr = 0xF009,
    /// Shape descriptor: id, flags, type
    Sp = 0xF00A,
    /// Primary property table
    Opt = 0xF00B,
    Textbox = 0xF00C,
    ClientTextbox = 0xF00D,
    Anchor = 0xF00E,
    ChildAnchor = 0xF00F,
    ClientAnchor = 0xF010,
    ClientData = 0xF011,
    ConnectorRule = 0xF012,
    AlignRule = 0xF013,
    ArcRule = 0xF014,
    ClientRule = 0xF015,
    CalloutRule = 0xF017,

    // Pictures
    BlipEmf = 0xF01A,
    BlipWmf = 0xF01B,
    BlipPict = 0xF01C,
    BlipJpeg = 0xF01D,
    BlipPng = 0xF01E,
    BlipDib = 0xF01F,
    BlipJpegCmyk = 0xF02A,
    BlipTiff = 0xF029,

    ColorMru = 0xF11A,
    SplitMenuColors = 0xF11E,
    /// Secondary ("user defined") property table
    SecondaryOpt = 0xF121,
    TertiaryOpt = 0xF122,
}

impl RecordType {
    /// Check if this is a container record type.
    #[inline]
    pub const fn is_container(self) -> bool {
        matches!(
            self,
            Self::DggContainer
                | Self::BStoreContainer
                | Self::DgContainer
                | Self::SpgrContainer
                | Self::SpContainer
                | Self::SolverContainer
        )
    }

    /// Check if this is a BLIP (embedded picture) record type.
    #[inline]
    pub const fn is_blip(self) -> bool {
        matches!(
            self,
            Self::BlipEmf
                | Self::BlipWmf
                | Self::BlipPict
                | Self::BlipJpeg
                | Self::BlipJpegCmyk
                | Self::BlipPng
                | Self::BlipDib
                | Self::BlipTiff
        )
    }

    /// Either of the two property-table records a shape container may carry.
    #[inline]
    pub const fn is_property_table(self) -> bool {
        matches!(self, Self::Opt | Self::SecondaryOpt | Self::TertiaryOpt)
    }
}

impl From<u16> for RecordType {
    fn from(value: u16) -> Self {
        match value {
            0xF000 => Self::DggContainer,
            0xF001 => Self::BStoreContainer,
            0xF002 => Self::DgContainer,
            0xF003 => Self::SpgrContainer,
            0xF004 => Self::SpContainer,
            0xF005 => Self::SolverContainer,
            0xF006 => Self::Dgg,
            0xF007 => Self::Bse,
            0xF008 => Self::Dg,
            0xF009 => Self::Spgr,
            0xF00A => Self::Sp,
            0xF00B => Self::Opt,
            0xF00C => Self::Textbox,
            0xF00D => Self::ClientTextbox,
            0xF00E => Self::Anchor,
            0xF00F => Self::ChildAnchor,
            0xF010 => Self::ClientAnchor,
            0xF011 => Self::ClientData,
            0xF012 => Self::ConnectorRule,
            0xF013 => Self::AlignRule,
            0xF014 => Self::ArcRule,
            0xF015 => Self::ClientRule,
            0xF017 => Self::CalloutRule,
            0xF01A => Self::BlipEmf,
            0xF01B => Self::BlipWmf,
            0xF01C => Self::BlipPict,
            0xF01D => Self::BlipJpeg,
            0xF01E => Self::BlipPng,
            0xF01F => Self::BlipDib,
            0xF029 => Self::BlipTiff,
            0xF02A => Self::BlipJpegCmyk,
            0xF11A => Self::ColorMru,
            0xF11E => Self::SplitMenuColors,
            0xF121 => Self::SecondaryOpt,
            0xF122 => Self::TertiaryOpt,
            _ => Self::Unknown,
        }
    }
}

impl From<RecordType> for u16 {
    fn from(record_type: RecordType) -> Self {
        record_type as u16
    }
}

bitflags! {
    /// Flags word of the shape descriptor record.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ShapeFlags: u32 {
        /// Shape is a group
        const GROUP = 0x0001;
        /// Shape is a child of a group
        const CHILD = 0x0002;
        /// Shape is the topmost group (patriarch)
        const PATRIARCH = 0x0004;
        /// Shape has been deleted
        const DELETED = 0x0008;
        /// Shape is an OLE object
        const OLE_SHAPE = 0x0010;
        /// Shape has a valid master
        const HAVE_MASTER = 0x0020;
        const FLIP_H = 0x0040;
        const FLIP_V = 0x0080;
        /// Shape is a connector
        const CONNECTOR = 0x0100;
        /// Shape has an anchor
        const HAVE_ANCHOR = 0x0200;
        /// Shape is a background shape
        const BACKGROUND = 0x0400;
        /// Shape has a shape type property
        const HAVE_SPT = 0x0800;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_type_round_trip_and_classes() {
        assert_eq!(RecordType::from(0xF004), RecordType::SpContainer);
        assert_eq!(u16::from(RecordType::Opt), 0xF00B);
        assert!(RecordType::SpgrContainer.is_container());
        assert!(!RecordType::Sp.is_container());
        assert!(RecordType::BlipDib.is_blip());
        assert_eq!(RecordType::from(0x1234), RecordType::Unknown);
    }

    #[test]
    fn test_shape_flags_truncate_unknown_bits() {
        let flags = ShapeFlags::from_bits_truncate(0xF0C1);
        assert!(flags.contains(ShapeFlags::GROUP | ShapeFlags::FLIP_H | ShapeFlags::FLIP_V));
        assert!(!flags.contains(ShapeFlags::CONNECTOR));
    }
}

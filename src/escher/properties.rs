//! Shape property tables (Opt records).
//!
//! A property table is a run of 6-byte entries followed by the blobs of its
//! complex entries:
//!
//! ```text
//! +--------+--------+--------+ ... +--------+--------------------------+
//! | id  u16| value u32       | ... | entry N| blob 1 | blob 2 | ...     |
//! +--------+--------+--------+ ... +--------+--------------------------+
//! ```
//!
//! The id carries a 14-bit property number plus two flags: `0x8000` marks a
//! complex property whose value is the blob length, `0x4000` marks a value
//! that indexes the blip store. Blobs are stored in declaration order, so the
//! decoder walks them in that order instead of indexing by id.
//!
//! # Boolean sets
//!
//! Property ids ending in `0x3F` pack up to 16 booleans: bit `n` is the value
//! and bit `n + 16` says whether the value was set at all.

use super::record::{ByteCursor, RecordHeader};
use crate::common::binary::{read_i16_le, read_u16_le, read_u32_le};
use log::warn;
use std::collections::HashMap;

const COMPLEX_FLAG: u16 = 0x8000;
const BLIP_FLAG: u16 = 0x4000;
const ID_MASK: u16 = 0x3FFF;
const ENTRY_SIZE: usize = 6;
const ARRAY_HEADER_SIZE: usize = 6;

/// Known property ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum PropertyId {
    Rotation = 0x0004,
    ProtectionBooleans = 0x007F,

    TextId = 0x0080,
    TextLeft = 0x0081,
    TextTop = 0x0082,
    TextRight = 0x0083,
    TextBottom = 0x0084,
    WrapText = 0x0085,
    AnchorText = 0x0087,
    TextFlow = 0x0088,
    FontRotation = 0x0089,
    IdOfNextShape = 0x008A,
    TextBidi = 0x008B,
    TextBooleans = 0x00BF,

    GeoTextUnicode = 0x00C0,
    GeoTextRtf = 0x00C1,
    GeoTextAlign = 0x00C2,
    GeoTextSize = 0x00C3,
    GeoTextSpacing = 0x00C4,
    GeoTextFont = 0x00C5,
    GeoTextBooleans = 0x00FF,

    CropFromTop = 0x0100,
    CropFromBottom = 0x0101,
    CropFromLeft = 0x0102,
    CropFromRight = 0x0103,
    Pib = 0x0104,
    PibName = 0x0105,
    PibFlags = 0x0106,
    PictureTransparent = 0x0107,
    PictureContrast = 0x0108,
    PictureBrightness = 0x0109,
    PictureGamma = 0x010A,
    PictureId = 0x010B,
    PictureDblCrMod = 0x010C,
    PictureFillCrMod = 0x010D,
    PictureLineCrMod = 0x010E,
    BlipBooleans = 0x013F,

    GeoLeft = 0x0140,
    GeoTop = 0x0141,
    GeoRight = 0x0142,
    GeoBottom = 0x0143,
    ShapePath = 0x0144,
    Vertices = 0x0145,
    SegmentInfo = 0x0146,
    AdjustValue = 0x0147,
    Adjust2Value = 0x0148,
    Adjust3Value = 0x0149,
    Adjust4Value = 0x014A,
    Adjust5Value = 0x014B,
    Adjust6Value = 0x014C,
    Adjust7Value = 0x014D,
    Adjust8Value = 0x014E,
    Adjust9Value = 0x014F,
    Adjust10Value = 0x0150,
    ConnectionSites = 0x0151,
    ConnectionSitesDir = 0x0152,
    XLimo = 0x0153,
    YLimo = 0x0154,
    Handles = 0x0155,
    Guides = 0x0156,
    Inscribe = 0x0157,
    Cxk = 0x0158,
    Fragments = 0x0159,
    GeometryBooleans = 0x017F,

    FillType = 0x0180,
    FillColor = 0x0181,
    FillOpacity = 0x0182,
    FillBackColor = 0x0183,
    FillBackOpacity = 0x0184,
    FillCrMod = 0x0185,
    FillBlip = 0x0186,
    FillBlipName = 0x0187,
    FillBlipFlags = 0x0188,
    FillWidth = 0x0189,
    FillHeight = 0x018A,
    FillAngle = 0x018B,
    FillFocus = 0x018C,
    FillToLeft = 0x018D,
    FillToTop = 0x018E,
    FillToRight = 0x018F,
    FillToBottom = 0x0190,
    FillRectLeft = 0x0191,
    FillRectTop = 0x0192,
    FillRectRight = 0x0193,
    FillRectBottom = 0x0194,
    FillDzType = 0x0195,
    FillShadePreset = 0x0196,
    FillShadeColors = 0x0197,
    FillOriginX = 0x0198,
    FillOriginY = 0x0199,
    FillShapeOriginX = 0x019A,
    FillShapeOriginY = 0x019B,
    FillShadeType = 0x019C,
    FillStyleBooleans = 0x01BF,

    LineColor = 0x01C0,
    LineOpacity = 0x01C1,
    LineBackColor = 0x01C2,
    LineCrMod = 0x01C3,
    LineType = 0x01C4,
    LineFillBlip = 0x01C5,
    LineWidth = 0x01CB,
    LineMiterLimit = 0x01CC,
    LineStyle = 0x01CD,
    LineDashing = 0x01CE,
    LineDashStyle = 0x01CF,
    LineStartArrowhead = 0x01D0,
    LineEndArrowhead = 0x01D1,
    LineStartArrowWidth = 0x01D2,
    LineStartArrowLength = 0x01D3,
    LineEndArrowWidth = 0x01D4,
    LineEndArrowLength = 0x01D5,
    LineJoinStyle = 0x01D6,
    LineEndCapStyle = 0x01D7,
    LineStyleBooleans = 0x01FF,

    ShadowType = 0x0200,
    ShadowColor = 0x0201,
    ShadowHighlight = 0x0202,
    ShadowCrMod = 0x0203,
    ShadowOpacity = 0x0204,
    ShadowOffsetX = 0x0205,
    ShadowOffsetY = 0x0206,
    ShadowStyleBooleans = 0x023F,

    ThreeDSpecularAmount = 0x0280,
    ThreeDDiffuseAmount = 0x0281,
    ThreeDShininess = 0x0282,
    ThreeDEdgeThickness = 0x0283,
    ThreeDExtrudeForward = 0x0284,
    ThreeDExtrudeBackward = 0x0285,
    ThreeDExtrudePlane = 0x0286,
    ThreeDExtrusionColor = 0x0287,
    ThreeDCrMod = 0x0288,
    ThreeDObjectBooleans = 0x02BF,

    ThreeDYRotationAngle = 0x02C0,
    ThreeDXRotationAngle = 0x02C1,
    ThreeDRotationAxisX = 0x02C2,
    ThreeDRotationAxisY = 0x02C3,
    ThreeDRotationAxisZ = 0x02C4,
    ThreeDRotationAngle = 0x02C5,
    ThreeDRotationCenterX = 0x02C6,
    ThreeDRotationCenterY = 0x02C7,
    ThreeDRotationCenterZ = 0x02C8,
    ThreeDRenderMode = 0x02C9,
    ThreeDTolerance = 0x02CA,
    ThreeDXViewpoint = 0x02CB,
    ThreeDYViewpoint = 0x02CC,
    ThreeDZViewpoint = 0x02CD,
    ThreeDOriginX = 0x02CE,
    ThreeDOriginY = 0x02CF,
    ThreeDSkewAngle = 0x02D0,
    ThreeDSkewAmount = 0x02D1,
    ThreeDAmbientIntensity = 0x02D2,
    ThreeDKeyX = 0x02D3,
    ThreeDKeyY = 0x02D4,
    ThreeDKeyZ = 0x02D5,
    ThreeDKeyIntensity = 0x02D6,
    ThreeDFillX = 0x02D7,
    ThreeDFillY = 0x02D8,
    ThreeDFillZ = 0x02D9,
    ThreeDFillIntensity = 0x02DA,
    ThreeDStyleBooleans = 0x02FF,

    ShapeMaster = 0x0301,
    ConnectorStyle = 0x0303,
    BlackWhiteSettings = 0x0304,
    ShapeBooleans = 0x033F,

    GroupName = 0x0380,
    Description = 0x0381,
    Hyperlink = 0x0382,
    MetroBlob = 0x03A9,
    GroupBooleans = 0x03BF,
}

impl PropertyId {
    #[inline]
    pub const fn raw(self) -> u16 {
        self as u16
    }

    /// Array-valued properties whose blob length some writers store without
    /// the 6-byte array header.
    pub const fn is_array(self) -> bool {
        matches!(
            self,
            Self::Vertices
                | Self::SegmentInfo
                | Self::FillShadeColors
                | Self::Guides
                | Self::Handles
                | Self::ConnectionSites
                | Self::ConnectionSitesDir
                | Self::Inscribe
                | Self::Fragments
                | Self::LineDashStyle
        )
    }
}

const ARRAY_IDS: [u16; 10] = [
    PropertyId::Vertices.raw(),
    PropertyId::SegmentInfo.raw(),
    PropertyId::FillShadeColors.raw(),
    PropertyId::Guides.raw(),
    PropertyId::Handles.raw(),
    PropertyId::ConnectionSites.raw(),
    PropertyId::ConnectionSitesDir.raw(),
    PropertyId::Inscribe.raw(),
    PropertyId::Fragments.raw(),
    PropertyId::LineDashStyle.raw(),
];

/// Bit positions inside the boolean sets.
pub mod bits {
    // GeometryBooleans
    pub const FILL_OK: u32 = 0;
    pub const FILL_SHADE_SHAPE_OK: u32 = 1;
    pub const GTEXT_OK: u32 = 2;
    pub const LINE_OK: u32 = 3;
    pub const THREE_D_OK: u32 = 4;
    pub const SHADOW_OK: u32 = 5;

    // TextBooleans
    pub const FIT_SHAPE_TO_TEXT: u32 = 1;
    pub const AUTO_TEXT_MARGIN: u32 = 3;

    // BlipBooleans
    pub const PICTURE_BI_LEVEL: u32 = 1;
    pub const PICTURE_GRAY: u32 = 2;

    // FillStyleBooleans
    pub const FILL_USE_RECT: u32 = 1;
    pub const FILLED: u32 = 4;
    /// In the secondary table: the fill turns with the shape.
    pub const FILL_USE_SHAPE_ANCHOR: u32 = 5;

    // LineStyleBooleans
    pub const LINE: u32 = 3;
    pub const ARROWHEADS_OK: u32 = 4;

    // ShadowStyleBooleans
    pub const SHADOW: u32 = 1;

    // ThreeDObjectBooleans
    pub const LIGHT_FACE: u32 = 0;
    pub const EXTRUSION_COLOR: u32 = 1;
    pub const METALLIC: u32 = 2;
    pub const THREE_D: u32 = 3;

    // ThreeDStyleBooleans
    pub const FILL_HARSH: u32 = 0;
    pub const KEY_HARSH: u32 = 1;
    pub const PARALLEL: u32 = 2;
    pub const ROTATION_CENTER_AUTO: u32 = 3;

    // GeoTextBooleans
    pub const GT_STRIKE: u32 = 0;
    pub const GT_SMALLCAPS: u32 = 1;
    pub const GT_SHADOW: u32 = 2;
    pub const GT_UNDERLINE: u32 = 3;
    pub const GT_ITALIC: u32 = 4;
    pub const GT_BOLD: u32 = 5;
    pub const GT_DX_MEASURE: u32 = 6;
    pub const GT_NORMALIZE: u32 = 7;
    pub const GT_BEST_FIT: u32 = 8;
    pub const GT_SHRINK_FIT: u32 = 9;
    pub const GT_STRETCH: u32 = 10;
    pub const GT_VERTICAL: u32 = 13;
    pub const GT_ON: u32 = 14;

    // GroupBooleans
    pub const PRINT: u32 = 0;
    pub const HIDDEN: u32 = 1;
}

/// Where a property value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyState {
    /// Written in the shape's own table.
    HardSet,
    /// Taken over from the master shape.
    Inherited,
    /// Not present; callers apply their default.
    Absent,
}

/// Result of a typed property lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyLookup<T> {
    Value(T),
    Absent,
    /// Present, but stored in a shape the caller did not ask for (a simple
    /// value where a blob was expected, or the reverse).
    WrongShape,
}

impl<T> PropertyLookup<T> {
    #[inline]
    pub fn value(self) -> Option<T> {
        match self {
            Self::Value(v) => Some(v),
            _ => None,
        }
    }

    #[inline]
    pub fn unwrap_or(self, default: T) -> T {
        self.value().unwrap_or(default)
    }

    #[inline]
    pub fn is_present(&self) -> bool {
        !matches!(self, Self::Absent)
    }
}

#[derive(Debug, Clone, Copy)]
struct Entry<'data> {
    value: u32,
    blob: Option<&'data [u8]>,
    is_blip: bool,
    inherited: bool,
}

/// Decoded property table of one shape.
///
/// Blob data is borrowed from the drawing stream.
#[derive(Debug, Clone, Default)]
pub struct PropertySet<'data> {
    entries: HashMap<u16, Entry<'data>>,
    partial: bool,
}

impl<'data> PropertySet<'data> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read the table whose header the cursor just consumed.
    ///
    /// The cursor is left at the end of the record.
    pub fn read(cursor: &mut ByteCursor<'data>, header: &RecordHeader) -> Self {
        let set = Self::decode(cursor.content(header), header.instance);
        cursor.seek_to_end(header);
        set
    }

    /// Decode `count` entries and their trailing blobs from `data`.
    ///
    /// Never fails: a table cut short keeps what was readable and is marked
    /// partial.
    pub fn decode(data: &'data [u8], count: u16) -> Self {
        let mut set = Self {
            entries: HashMap::with_capacity(count as usize),
            partial: false,
        };

        let mut fixed = Vec::with_capacity(count as usize);
        for i in 0..count as usize {
            let offset = i * ENTRY_SIZE;
            let (Ok(raw_id), Ok(value)) = (read_u16_le(data, offset), read_u32_le(data, offset + 2))
            else {
                warn!("property table truncated after {i} of {count} entries");
                set.partial = true;
                break;
            };
            fixed.push((raw_id, value));
        }

        let mut blob_offset = fixed.len() * ENTRY_SIZE;
        for (raw_id, value) in fixed {
            let id = raw_id & ID_MASK;
            let blob = if raw_id & COMPLEX_FLAG != 0 {
                let len = complex_length(data, blob_offset, id, value);
                let start = blob_offset.min(data.len());
                let end = blob_offset.saturating_add(len).min(data.len());
                if end - start < len {
                    warn!(
                        "complex property {id:#06x} wants {len} bytes, {} available",
                        end - start
                    );
                    set.partial = true;
                }
                blob_offset = blob_offset.saturating_add(len);
                Some(&data[start..end])
            } else {
                None
            };
            set.entries.insert(
                id,
                Entry {
                    value,
                    blob,
                    is_blip: raw_id & BLIP_FLAG != 0,
                    inherited: false,
                },
            );
        }
        set
    }

    /// Whether any entry or blob was cut short.
    #[inline]
    pub fn is_partial(&self) -> bool {
        self.partial
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn state(&self, id: PropertyId) -> PropertyState {
        match self.entries.get(&id.raw()) {
            Some(e) if e.inherited => PropertyState::Inherited,
            Some(_) => PropertyState::HardSet,
            None => PropertyState::Absent,
        }
    }

    #[inline]
    pub fn contains(&self, id: PropertyId) -> bool {
        self.entries.contains_key(&id.raw())
    }

    /// Set in the shape's own table, not inherited and not defaulted.
    #[inline]
    pub fn is_hard_set(&self, id: PropertyId) -> bool {
        self.state(id) == PropertyState::HardSet
    }

    #[inline]
    pub fn value(&self, id: PropertyId) -> Option<u32> {
        self.raw_value(id.raw())
    }

    #[inline]
    pub fn raw_value(&self, id: u16) -> Option<u32> {
        self.entries.get(&id).map(|e| e.value)
    }

    /// The stored value, or `default` when absent.
    #[inline]
    pub fn get(&self, id: PropertyId, default: u32) -> u32 {
        self.value(id).unwrap_or(default)
    }

    #[inline]
    pub fn get_i32(&self, id: PropertyId, default: i32) -> i32 {
        self.value(id).map_or(default, |v| v as i32)
    }

    /// Simple (non-blob) value.
    pub fn lookup_simple(&self, id: PropertyId) -> PropertyLookup<u32> {
        match self.entries.get(&id.raw()) {
            Some(Entry { blob: None, value, .. }) => PropertyLookup::Value(*value),
            Some(_) => PropertyLookup::WrongShape,
            None => PropertyLookup::Absent,
        }
    }

    /// Blob of a complex property.
    pub fn lookup_complex(&self, id: PropertyId) -> PropertyLookup<&'data [u8]> {
        match self.entries.get(&id.raw()) {
            Some(Entry { blob: Some(b), .. }) => PropertyLookup::Value(*b),
            Some(_) => PropertyLookup::WrongShape,
            None => PropertyLookup::Absent,
        }
    }

    #[inline]
    pub fn complex(&self, id: PropertyId) -> Option<&'data [u8]> {
        self.lookup_complex(id).value()
    }

    /// Blip-store index (1-based) of a picture property.
    pub fn blip_index(&self, id: PropertyId) -> Option<u32> {
        self.entries
            .get(&id.raw())
            .filter(|e| e.blob.is_none())
            .map(|e| e.value)
            .filter(|&v| v != 0)
    }

    #[inline]
    pub fn is_blip(&self, id: PropertyId) -> bool {
        self.entries.get(&id.raw()).is_some_and(|e| e.is_blip)
    }

    /// Array view of a complex property.
    pub fn array(&self, id: PropertyId) -> Option<ArrayProperty<'data>> {
        self.complex(id).and_then(ArrayProperty::new)
    }

    /// UTF-16 string stored in a complex property.
    pub fn string(&self, id: PropertyId) -> Option<String> {
        let blob = self.complex(id)?;
        Some(crate::common::binary::parse_utf16le_string(blob))
    }

    /// Value of bit `bit` in a boolean set, if that bit was set at all.
    ///
    /// Tables that never fill in the "use" half are treated as setting every
    /// bit they carry.
    pub fn flag(&self, id: PropertyId, bit: u32) -> Option<bool> {
        let value = self.value(id)?;
        let used = value >> 16;
        if used != 0 && used & (1 << bit) == 0 {
            return None;
        }
        Some(value & (1 << bit) != 0)
    }

    /// Value of a boolean-set bit, with a default for unset bits.
    #[inline]
    pub fn flag_or(&self, id: PropertyId, bit: u32, default: bool) -> bool {
        self.flag(id, bit).unwrap_or(default)
    }

    /// Whether the shape's own table sets bit `bit` explicitly.
    pub fn is_flag_hard_set(&self, id: PropertyId, bit: u32) -> bool {
        match self.entries.get(&id.raw()) {
            Some(e) if !e.inherited => {
                let used = e.value >> 16;
                used == 0 || used & (1 << bit) != 0
            },
            _ => false,
        }
    }

    /// Take over every property of `master` this set does not define.
    ///
    /// Boolean sets are merged bit by bit: a bit the shape did not mark as
    /// used comes from the master. Only the direct entries of `master` are
    /// inherited, so chains of masters stop after one hop.
    pub fn overlay_master(&mut self, master: &PropertySet<'data>) {
        for (&id, entry) in &master.entries {
            if entry.inherited {
                continue;
            }
            match self.entries.get_mut(&id) {
                None => {
                    self.entries.insert(
                        id,
                        Entry {
                            inherited: true,
                            ..*entry
                        },
                    );
                },
                Some(own) if id & 0x3F == 0x3F && own.blob.is_none() => {
                    own.value = merge_boolean_set(own.value, entry.value);
                },
                Some(_) => {},
            }
        }
        self.partial |= master.partial;
    }

    /// Ids present, in no particular order.
    pub fn ids(&self) -> impl Iterator<Item = u16> + '_ {
        self.entries.keys().copied()
    }
}

fn merge_boolean_set(own: u32, master: u32) -> u32 {
    let own_used = own >> 16;
    if own_used == 0 {
        // Tables without use bits define every bit they carry.
        return own;
    }
    let take = (master >> 16) & !own_used;
    let values = (own & own_used & 0xFFFF) | (master & take & 0xFFFF);
    ((own_used | take) << 16) | values
}

/// Blob length of a complex entry, fixing the array-header quirk.
fn complex_length(data: &[u8], offset: usize, id: u16, declared: u32) -> usize {
    let declared = declared as usize;
    if !ARRAY_IDS.contains(&id) {
        return declared;
    }
    let (Ok(count), Ok(size)) = (read_u16_le(data, offset), read_i16_le(data, offset + 4)) else {
        return declared;
    };
    let size = element_size(size);
    if declared != 0 && declared == count as usize * size {
        declared + ARRAY_HEADER_SIZE
    } else {
        declared
    }
}

#[inline]
fn element_size(raw: i16) -> usize {
    if raw < 0 {
        ((-(raw as i32)) >> 2) as usize
    } else {
        raw as usize
    }
}

/// Array-valued complex property: a 6-byte header then fixed-size elements.
#[derive(Debug, Clone, Copy)]
pub struct ArrayProperty<'data> {
    data: &'data [u8],
}

impl<'data> ArrayProperty<'data> {
    #[inline]
    pub fn new(data: &'data [u8]) -> Option<Self> {
        (data.len() >= ARRAY_HEADER_SIZE).then_some(Self { data })
    }

    /// Declared element count.
    #[inline]
    pub fn declared_count(&self) -> u16 {
        read_u16_le(self.data, 0).unwrap_or(0)
    }

    #[inline]
    pub fn element_size(&self) -> usize {
        element_size(read_i16_le(self.data, 4).unwrap_or(0))
    }

    /// Elements actually present, never more than declared.
    pub fn len(&self) -> usize {
        let size = self.element_size();
        if size == 0 {
            return 0;
        }
        let available = (self.data.len() - ARRAY_HEADER_SIZE) / size;
        available.min(self.declared_count() as usize)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Fewer elements present than declared.
    #[inline]
    pub fn is_truncated(&self) -> bool {
        self.len() < self.declared_count() as usize
    }

    pub fn get(&self, index: usize) -> Option<&'data [u8]> {
        if index >= self.len() {
            return None;
        }
        let size = self.element_size();
        let start = ARRAY_HEADER_SIZE + index * size;
        self.data.get(start..start + size)
    }

    pub fn elements(&self) -> impl Iterator<Item = &'data [u8]> + use<'data> {
        let this = *self;
        (0..this.len()).filter_map(move |i| this.get(i))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::escher::writer::{PropertyBuilder, RecordBuilder};

    fn decode_built(props: PropertyBuilder) -> (Vec<u8>, u16) {
        let count = props.len() as u16;
        let mut b = RecordBuilder::new();
        b.properties(&props);
        let bytes = b.into_bytes();
        (bytes[8..].to_vec(), count)
    }

    #[test]
    fn test_simple_complex_and_blip() {
        let (data, count) = decode_built(
            PropertyBuilder::new()
                .simple(PropertyId::FillColor, 0x0000_00FF)
                .unicode(PropertyId::GroupName, "Box")
                .blip(PropertyId::Pib, 3),
        );
        let set = PropertySet::decode(&data, count);
        assert_eq!(set.len(), 3);
        assert_eq!(set.get(PropertyId::FillColor, 0), 0xFF);
        assert_eq!(set.string(PropertyId::GroupName).as_deref(), Some("Box"));
        assert_eq!(set.blip_index(PropertyId::Pib), Some(3));
        assert!(set.is_blip(PropertyId::Pib));
        assert!(set.is_hard_set(PropertyId::FillColor));
        assert_eq!(set.state(PropertyId::LineColor), PropertyState::Absent);
        assert!(!set.is_partial());
    }

    #[test]
    fn test_typed_lookup_shapes() {
        let (data, count) = decode_built(
            PropertyBuilder::new()
                .simple(PropertyId::LineWidth, 12700)
                .complex(PropertyId::GroupName, &[0x41, 0x00, 0x00, 0x00]),
        );
        let set = PropertySet::decode(&data, count);
        assert_eq!(set.lookup_simple(PropertyId::LineWidth), PropertyLookup::Value(12700));
        assert_eq!(set.lookup_complex(PropertyId::LineWidth), PropertyLookup::WrongShape);
        assert_eq!(set.lookup_simple(PropertyId::GroupName), PropertyLookup::WrongShape);
        assert_eq!(set.lookup_simple(PropertyId::FillColor), PropertyLookup::Absent);
        assert_eq!(set.lookup_simple(PropertyId::FillColor).unwrap_or(7), 7);
    }

    #[test]
    fn test_array_length_without_header() {
        // Declared length counts only the elements: 2 * 4 bytes.
        let mut data = Vec::new();
        data.extend_from_slice(&(0x8000u16 | 0x0145).to_le_bytes());
        data.extend_from_slice(&8u32.to_le_bytes());
        data.extend_from_slice(&(0x8000u16 | 0x0380).to_le_bytes());
        data.extend_from_slice(&2u32.to_le_bytes());
        data.extend_from_slice(&[2, 0, 2, 0, 0xF0, 0xFF]);
        data.extend_from_slice(&[1, 0, 2, 0, 3, 0, 4, 0]);
        data.extend_from_slice(&[0x5A, 0x00]);

        let set = PropertySet::decode(&data, 2);
        let vertices = set.array(PropertyId::Vertices).unwrap();
        assert_eq!(vertices.element_size(), 4);
        assert_eq!(vertices.len(), 2);
        assert_eq!(vertices.get(1), Some(&[3u8, 0, 4, 0][..]));
        assert_eq!(set.complex(PropertyId::GroupName), Some(&[0x5Au8, 0x00][..]));
        assert!(!set.is_partial());
    }

    #[test]
    fn test_truncated_blob_is_partial() {
        let mut data = Vec::new();
        data.extend_from_slice(&(0x8000u16 | 0x0380).to_le_bytes());
        data.extend_from_slice(&100u32.to_le_bytes());
        data.extend_from_slice(&[1, 2, 3]);

        let set = PropertySet::decode(&data, 1);
        assert!(set.is_partial());
        assert_eq!(set.complex(PropertyId::GroupName), Some(&[1u8, 2, 3][..]));
    }

    #[test]
    fn test_truncated_table_keeps_complete_entries() {
        let mut data = Vec::new();
        data.extend_from_slice(&0x0181u16.to_le_bytes());
        data.extend_from_slice(&0x00FFu32.to_le_bytes());
        data.extend_from_slice(&[0xC0, 0x01, 0x00]);

        let set = PropertySet::decode(&data, 2);
        assert!(set.is_partial());
        assert_eq!(set.len(), 1);
        assert_eq!(set.value(PropertyId::FillColor), Some(0xFF));
    }

    #[test]
    fn test_array_truncated_elements() {
        let data = [3, 0, 3, 0, 4, 0, 1, 0, 0, 0, 2, 0];
        let array = ArrayProperty::new(&data).unwrap();
        assert_eq!(array.declared_count(), 3);
        assert_eq!(array.len(), 1);
        assert!(array.is_truncated());
        assert_eq!(array.elements().count(), 1);
    }

    #[test]
    fn test_boolean_flags_with_use_bits() {
        let (data, count) = decode_built(
            PropertyBuilder::new()
                .simple(PropertyId::FillStyleBooleans, 0x0010_0000)
                .simple(PropertyId::LineStyleBooleans, 0x0000_0008),
        );
        let set = PropertySet::decode(&data, count);
        assert_eq!(set.flag(PropertyId::FillStyleBooleans, bits::FILLED), Some(false));
        assert_eq!(set.flag(PropertyId::FillStyleBooleans, bits::FILL_USE_RECT), None);
        assert_eq!(set.flag(PropertyId::LineStyleBooleans, bits::LINE), Some(true));
        assert!(set.is_flag_hard_set(PropertyId::FillStyleBooleans, bits::FILLED));
        assert!(!set.is_flag_hard_set(PropertyId::FillStyleBooleans, bits::FILL_USE_RECT));
    }

    #[test]
    fn test_master_overlay() {
        let (shape_data, shape_count) = decode_built(
            PropertyBuilder::new()
                .simple(PropertyId::FillColor, 0x0000_FF00)
                .simple(PropertyId::LineStyleBooleans, 0x0008_0000),
        );
        let (master_data, master_count) = decode_built(
            PropertyBuilder::new()
                .simple(PropertyId::FillColor, 0x00FF_0000)
                .simple(PropertyId::LineWidth, 25400)
                .simple(PropertyId::LineStyleBooleans, 0x0009_0009),
        );
        let mut shape = PropertySet::decode(&shape_data, shape_count);
        let master = PropertySet::decode(&master_data, master_count);
        shape.overlay_master(&master);

        assert_eq!(shape.get(PropertyId::FillColor, 0), 0x0000_FF00);
        assert_eq!(shape.get(PropertyId::LineWidth, 0), 25400);
        assert_eq!(shape.state(PropertyId::LineWidth), PropertyState::Inherited);
        assert!(!shape.is_hard_set(PropertyId::LineWidth));
        // bit 3 stays the shape's own (off), bit 0 comes from the master
        assert_eq!(shape.flag(PropertyId::LineStyleBooleans, 3), Some(false));
        assert_eq!(shape.flag(PropertyId::LineStyleBooleans, 0), Some(true));
    }
}

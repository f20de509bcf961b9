//! Shape descriptor and the records of one shape container.

use crate::common::Rect;
use crate::common::binary::{read_i16_le, read_i32_le, read_u32_le};
use crate::escher::index::{RecordIndex, SeekMode};
use crate::escher::properties::PropertySet;
use crate::escher::record::{ByteCursor, RecordHeader};
use crate::escher::shape_type::ShapeType;
use crate::escher::types::{RecordType, ShapeFlags};
use log::{trace, warn};

/// Id, flags and kind from the `Sp` atom.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShapeDescriptor {
    pub shape_type: ShapeType,
    pub id: u32,
    pub flags: ShapeFlags,
}

impl Default for ShapeDescriptor {
    /// What a container without a readable `Sp` atom degrades to.
    fn default() -> Self {
        Self {
            shape_type: ShapeType::NIL,
            id: 0,
            flags: ShapeFlags::empty(),
        }
    }
}

impl ShapeDescriptor {
    pub fn parse(header: &RecordHeader, data: &[u8]) -> Option<Self> {
        let id = read_u32_le(data, 0).ok()?;
        let flags = read_u32_le(data, 4).ok()?;
        Some(Self {
            shape_type: ShapeType::from(header.instance),
            id,
            flags: ShapeFlags::from_bits_truncate(flags),
        })
    }

    #[inline]
    pub fn is_group(&self) -> bool {
        self.flags.contains(ShapeFlags::GROUP)
    }

    #[inline]
    pub fn flip_h(&self) -> bool {
        self.flags.contains(ShapeFlags::FLIP_H)
    }

    #[inline]
    pub fn flip_v(&self) -> bool {
        self.flags.contains(ShapeFlags::FLIP_V)
    }
}

/// Four-value anchor. Client anchors written by spreadsheet producers use
/// 16-bit values in top, left, right, bottom order.
pub fn read_anchor(data: &[u8]) -> Option<Rect> {
    if data.len() >= 16 {
        let v = |i: usize| read_i32_le(data, i * 4).ok();
        return Some(Rect::new(v(0)?, v(1)?, v(2)?, v(3)?));
    }
    if data.len() >= 8 {
        let v = |i: usize| read_i16_le(data, i * 2).ok().map(i32::from);
        return Some(Rect::new(v(1)?, v(0)?, v(2)?, v(3)?));
    }
    None
}

/// Headers of the direct children of one shape container, found once.
#[derive(Debug, Clone)]
pub struct ShapeRecords {
    pub container: RecordHeader,
    pub descriptor: ShapeDescriptor,
    pub properties: Option<RecordHeader>,
    pub secondary: Option<RecordHeader>,
    pub child_anchor: Option<RecordHeader>,
    pub client_anchor: Option<RecordHeader>,
    pub group_frame: Option<RecordHeader>,
    pub client_text: Option<RecordHeader>,
}

impl ShapeRecords {
    /// Index the children of the shape container `container`.
    pub fn read(cursor: &mut ByteCursor<'_>, container: &RecordHeader) -> Self {
        let mut index = RecordIndex::new();
        let saved = cursor.position();
        if cursor.seek_to_content(container) {
            index.consume(cursor, container.end);
        }
        let find = |index: &mut RecordIndex, cursor: &mut ByteCursor<'_>, rt: RecordType| {
            index.seek_to_content(cursor, rt.into(), SeekMode::FromBeginning)
        };

        let descriptor = match find(&mut index, cursor, RecordType::Sp) {
            Some(h) => ShapeDescriptor::parse(&h, cursor.content(&h)).unwrap_or_else(|| {
                warn!("short shape descriptor at {}", h.begin);
                ShapeDescriptor::default()
            }),
            None => {
                warn!("shape container at {} without descriptor", container.begin);
                ShapeDescriptor::default()
            },
        };
        let secondary = find(&mut index, cursor, RecordType::TertiaryOpt)
            .or_else(|| find(&mut index, cursor, RecordType::SecondaryOpt));
        let records = Self {
            container: *container,
            descriptor,
            properties: find(&mut index, cursor, RecordType::Opt),
            secondary,
            child_anchor: find(&mut index, cursor, RecordType::ChildAnchor),
            client_anchor: find(&mut index, cursor, RecordType::ClientAnchor),
            group_frame: find(&mut index, cursor, RecordType::Spgr),
            client_text: find(&mut index, cursor, RecordType::ClientTextbox)
                .or_else(|| find(&mut index, cursor, RecordType::Textbox)),
        };
        trace!(
            "shape {} type {} flags {:?} ({} records)",
            descriptor.id,
            descriptor.shape_type.raw(),
            descriptor.flags,
            index.len()
        );
        cursor.seek(saved);
        records
    }

    /// Primary property table; an empty table when the shape has none.
    pub fn properties<'data>(&self, cursor: &ByteCursor<'data>) -> PropertySet<'data> {
        match self.properties {
            Some(h) => PropertySet::decode(cursor.content(&h), h.instance),
            None => PropertySet::new(),
        }
    }

    pub fn secondary_properties<'data>(&self, cursor: &ByteCursor<'data>) -> Option<PropertySet<'data>> {
        self.secondary.map(|h| PropertySet::decode(cursor.content(&h), h.instance))
    }

    pub fn child_anchor(&self, cursor: &ByteCursor<'_>) -> Option<Rect> {
        self.child_anchor.and_then(|h| read_anchor(cursor.content(&h)))
    }

    pub fn client_anchor(&self, cursor: &ByteCursor<'_>) -> Option<Rect> {
        self.client_anchor.and_then(|h| read_anchor(cursor.content(&h)))
    }

    /// Child coordinate system of a group descriptor.
    pub fn group_frame(&self, cursor: &ByteCursor<'_>) -> Option<Rect> {
        self.group_frame.and_then(|h| read_anchor(cursor.content(&h)))
    }
}

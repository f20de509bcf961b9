//! Record stream builder.
//!
//! Produces well-formed drawing streams: nested containers, shape
//! descriptors, anchors and property tables. Used to build test fixtures and
//! by hosts that need to synthesize small drawings.

use super::properties::PropertyId;
use super::record::RawRecordHeader;
use super::types::{RecordType, ShapeFlags};
use zerocopy::IntoBytes;

const COMPLEX_FLAG: u16 = 0x8000;
const BLIP_FLAG: u16 = 0x4000;

/// Incremental writer for nested records.
#[derive(Debug, Default)]
pub struct RecordBuilder {
    buf: Vec<u8>,
    open: Vec<usize>,
}

impl RecordBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current write offset.
    pub fn position(&self) -> usize {
        self.buf.len()
    }

    fn header(&mut self, version: u8, instance: u16, rec_type: u16, length: u32) {
        let header = RawRecordHeader::new(version, instance, rec_type, length);
        self.buf.extend_from_slice(header.as_bytes());
    }

    /// Append an atom record.
    pub fn atom(&mut self, version: u8, instance: u16, rec_type: u16, data: &[u8]) -> &mut Self {
        self.header(version, instance, rec_type, data.len() as u32);
        self.buf.extend_from_slice(data);
        self
    }

    /// Open a container; its length is patched by [`Self::end_container`].
    pub fn begin_container(&mut self, rec_type: RecordType) -> &mut Self {
        self.begin_container_with_instance(rec_type, 0)
    }

    pub fn begin_container_with_instance(&mut self, rec_type: RecordType, instance: u16) -> &mut Self {
        self.open.push(self.buf.len());
        self.header(0x0F, instance, rec_type.into(), 0);
        self
    }

    pub fn end_container(&mut self) -> &mut Self {
        if let Some(start) = self.open.pop() {
            let length = (self.buf.len() - start - 8) as u32;
            self.buf[start + 4..start + 8].copy_from_slice(&length.to_le_bytes());
        }
        self
    }

    /// Write a container whose children are produced by `f`.
    pub fn container(&mut self, rec_type: RecordType, f: impl FnOnce(&mut Self)) -> &mut Self {
        self.begin_container(rec_type);
        f(self);
        self.end_container()
    }

    /// Shape descriptor: type in the instance field, then id and flags.
    pub fn shape(&mut self, shape_type: u16, shape_id: u32, flags: ShapeFlags) -> &mut Self {
        let mut data = [0u8; 8];
        data[..4].copy_from_slice(&shape_id.to_le_bytes());
        data[4..].copy_from_slice(&flags.bits().to_le_bytes());
        self.atom(0x02, shape_type, RecordType::Sp.into(), &data)
    }

    fn rect_atom(&mut self, version: u8, rec_type: RecordType, rect: [i32; 4]) -> &mut Self {
        let data: Vec<u8> = rect.iter().flat_map(|v| v.to_le_bytes()).collect();
        self.atom(version, 0, rec_type.into(), &data)
    }

    /// Absolute anchor as four little-endian i32 (left, top, right, bottom).
    pub fn client_anchor(&mut self, left: i32, top: i32, right: i32, bottom: i32) -> &mut Self {
        self.rect_atom(0, RecordType::ClientAnchor, [left, top, right, bottom])
    }

    pub fn child_anchor(&mut self, left: i32, top: i32, right: i32, bottom: i32) -> &mut Self {
        self.rect_atom(0, RecordType::ChildAnchor, [left, top, right, bottom])
    }

    /// Group coordinate system record.
    pub fn spgr(&mut self, left: i32, top: i32, right: i32, bottom: i32) -> &mut Self {
        self.rect_atom(1, RecordType::Spgr, [left, top, right, bottom])
    }

    pub fn properties(&mut self, props: &PropertyBuilder) -> &mut Self {
        props.write_into(self, RecordType::Opt)
    }

    /// Secondary ("user defined") property table.
    pub fn secondary_properties(&mut self, props: &PropertyBuilder) -> &mut Self {
        props.write_into(self, RecordType::TertiaryOpt)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    pub fn into_bytes(mut self) -> Vec<u8> {
        while !self.open.is_empty() {
            self.end_container();
        }
        self.buf
    }
}

/// Builder for property tables.
#[derive(Debug, Clone, Default)]
pub struct PropertyBuilder {
    entries: Vec<(u16, u32)>,
    complex_data: Vec<u8>,
}

impl PropertyBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn simple(mut self, id: PropertyId, value: u32) -> Self {
        self.entries.push((id as u16, value));
        self
    }

    pub fn signed(self, id: PropertyId, value: i32) -> Self {
        self.simple(id, value as u32)
    }

    /// Raw property id, for ids without a named constant.
    pub fn raw(mut self, id: u16, value: u32) -> Self {
        self.entries.push((id, value));
        self
    }

    /// Picture reference into the blip store (1-based).
    pub fn blip(mut self, id: PropertyId, index: u32) -> Self {
        self.entries.push((id as u16 | BLIP_FLAG, index));
        self
    }

    pub fn complex(mut self, id: PropertyId, data: &[u8]) -> Self {
        self.entries.push((id as u16 | COMPLEX_FLAG, data.len() as u32));
        self.complex_data.extend_from_slice(data);
        self
    }

    /// Array-valued complex property with its 6-byte header.
    pub fn array(self, id: PropertyId, element_size: u16, elements: &[u8]) -> Self {
        let count = if element_size == 0 {
            0
        } else {
            let real = if element_size == 0xFFF0 { 4 } else { element_size as usize };
            (elements.len() / real) as u16
        };
        let mut data = Vec::with_capacity(6 + elements.len());
        data.extend_from_slice(&count.to_le_bytes());
        data.extend_from_slice(&count.to_le_bytes());
        data.extend_from_slice(&element_size.to_le_bytes());
        data.extend_from_slice(elements);
        self.complex(id, &data)
    }

    /// UTF-16LE string property with a terminating NUL.
    pub fn unicode(self, id: PropertyId, text: &str) -> Self {
        let mut data: Vec<u8> = text.encode_utf16().flat_map(|u| u.to_le_bytes()).collect();
        data.extend_from_slice(&[0, 0]);
        self.complex(id, &data)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn write_into<'b>(&self, builder: &'b mut RecordBuilder, rec_type: RecordType) -> &'b mut RecordBuilder {
        let mut data = Vec::with_capacity(self.entries.len() * 6 + self.complex_data.len());
        for (id, value) in &self.entries {
            data.extend_from_slice(&id.to_le_bytes());
            data.extend_from_slice(&value.to_le_bytes());
        }
        data.extend_from_slice(&self.complex_data);
        builder.atom(0x03, self.entries.len() as u16, rec_type.into(), &data)
    }
}

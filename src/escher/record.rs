//! Record headers and the shared stream cursor.
//!
//! # Format
//!
//! Every record starts with an 8-byte header:
//! - Bytes 0-1: version (low 4 bits) and instance (high 12 bits)
//! - Bytes 2-3: record type
//! - Bytes 4-7: payload length, not counting the header
//!
//! Containers (version `0xF`) hold a sequence of child records as payload.
//! The cursor borrows the whole stream so that headers can carry absolute
//! begin/end offsets and callers can seek back and forth between records.

use super::types::RecordType;
use crate::common::binary::{read_i16_le, read_i32_le, read_u16_le, read_u32_le, read_u8};
use crate::common::error::{Error, Result};
use log::trace;
use zerocopy::{
    FromBytes,
    byteorder::{LittleEndian, U16, U32},
};
use zerocopy_derive::{Immutable, IntoBytes, KnownLayout};

/// Size of a record header in bytes.
pub const HEADER_SIZE: u64 = 8;

/// Default ceiling for a single record's declared length.
pub const DEFAULT_MAX_RECORD_LENGTH: u32 = 0x7FFF_FFF7;

/// On-disk layout of a record header.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C, packed)]
pub struct RawRecordHeader {
    pub ver_inst: U16<LittleEndian>,
    pub rec_type: U16<LittleEndian>,
    pub length: U32<LittleEndian>,
}

impl RawRecordHeader {
    pub fn new(version: u8, instance: u16, rec_type: u16, length: u32) -> Self {
        let ver_inst = (version as u16 & 0x0F) | ((instance & 0x0FFF) << 4);
        Self {
            ver_inst: U16::new(ver_inst),
            rec_type: U16::new(rec_type),
            length: U32::new(length),
        }
    }
}

/// A decoded record header with its absolute position in the stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RecordHeader {
    /// Version (4 bits)
    pub version: u8,
    /// Instance (12 bits)
    pub instance: u16,
    /// Raw record type value
    pub rec_type: u16,
    /// Declared payload length
    pub length: u32,
    /// Offset of the first header byte
    pub begin: u64,
    /// Offset one past the last payload byte, clamped to the stream end
    pub end: u64,
}

impl RecordHeader {
    #[inline]
    pub fn record_type(&self) -> RecordType {
        RecordType::from(self.rec_type)
    }

    /// Containers are recognized by the `0xF` version nibble.
    #[inline]
    pub fn is_container(&self) -> bool {
        self.version == 0x0F || self.record_type().is_container()
    }

    #[inline]
    pub fn content_begin(&self) -> u64 {
        self.begin + HEADER_SIZE
    }

    /// Payload bytes actually present in the stream.
    #[inline]
    pub fn content_len(&self) -> u64 {
        self.end.saturating_sub(self.content_begin())
    }

    /// Whether the stream ended before the declared payload did.
    #[inline]
    pub fn is_truncated(&self) -> bool {
        self.end < self.begin + HEADER_SIZE + self.length as u64
    }
}

/// Seekable little-endian cursor over a drawing stream.
///
/// The cursor is the single shared read position of an import; every
/// traversal saves and restores it around nested reads.
#[derive(Debug, Clone)]
pub struct ByteCursor<'data> {
    data: &'data [u8],
    pos: u64,
    max_record_length: u32,
}

impl<'data> ByteCursor<'data> {
    #[inline]
    pub fn new(data: &'data [u8]) -> Self {
        Self {
            data,
            pos: 0,
            max_record_length: DEFAULT_MAX_RECORD_LENGTH,
        }
    }

    pub fn with_max_record_length(mut self, max: u32) -> Self {
        self.max_record_length = max;
        self
    }

    #[inline]
    pub fn data(&self) -> &'data [u8] {
        self.data
    }

    #[inline]
    pub fn len(&self) -> u64 {
        self.data.len() as u64
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[inline]
    pub fn position(&self) -> u64 {
        self.pos
    }

    #[inline]
    pub fn remaining(&self) -> u64 {
        self.len().saturating_sub(self.pos)
    }

    /// Move to an absolute offset. Fails softly past the end of the stream.
    #[inline]
    pub fn seek(&mut self, pos: u64) -> bool {
        if pos > self.len() {
            return false;
        }
        self.pos = pos;
        true
    }

    #[inline]
    pub fn seek_to_begin(&mut self, header: &RecordHeader) -> bool {
        self.seek(header.begin)
    }

    #[inline]
    pub fn seek_to_content(&mut self, header: &RecordHeader) -> bool {
        self.seek(header.content_begin())
    }

    #[inline]
    pub fn seek_to_end(&mut self, header: &RecordHeader) -> bool {
        self.seek(header.end)
    }

    /// Read the header at the current position and advance past it.
    pub fn read_header(&mut self) -> Result<RecordHeader> {
        let begin = self.pos;
        let bytes = self.take(HEADER_SIZE as usize)?;
        let raw = RawRecordHeader::read_from_bytes(bytes).map_err(|_| Error::Truncated {
            offset: begin,
            needed: HEADER_SIZE,
            available: bytes.len() as u64,
        })?;
        let ver_inst = raw.ver_inst.get();
        let length = raw.length.get();
        if length > self.max_record_length {
            self.pos = begin;
            return Err(Error::LengthOverflow {
                offset: begin,
                length,
            });
        }
        let end = (begin + HEADER_SIZE + length as u64).min(self.len());
        let header = RecordHeader {
            version: (ver_inst & 0x000F) as u8,
            instance: (ver_inst >> 4) & 0x0FFF,
            rec_type: raw.rec_type.get(),
            length,
            begin,
            end,
        };
        trace!(
            "record {:#06x} v{} inst {} len {} @ {}",
            header.rec_type, header.version, header.instance, header.length, header.begin
        );
        Ok(header)
    }

    /// Read the next header without moving the cursor.
    pub fn peek_header(&mut self) -> Option<RecordHeader> {
        let pos = self.pos;
        let header = self.read_header().ok();
        self.pos = pos;
        header
    }

    /// Scan sibling records from the current position up to `limit` for the
    /// first one of `rec_type`. On success the cursor is positioned on that
    /// record's content; otherwise it is restored.
    pub fn seek_to_record(&mut self, rec_type: u16, limit: u64) -> Option<RecordHeader> {
        let start = self.pos;
        while self.pos + HEADER_SIZE <= limit {
            let Ok(header) = self.read_header() else {
                break;
            };
            if header.rec_type == rec_type {
                return Some(header);
            }
            if !self.seek_to_end(&header) || header.end <= header.begin {
                break;
            }
        }
        self.pos = start;
        None
    }

    /// Iterate over the direct children of a container record.
    pub fn children(&self, container: &RecordHeader) -> ChildRecords<'data> {
        ChildRecords {
            cursor: self.clone(),
            next: container.content_begin(),
            end: container.end,
        }
    }

    /// Borrow `len` bytes from the current position and advance.
    pub fn take(&mut self, len: usize) -> Result<&'data [u8]> {
        let start = self.pos as usize;
        let available = self.remaining();
        match start.checked_add(len).and_then(|end| self.data.get(start..end)) {
            Some(bytes) => {
                self.pos += len as u64;
                Ok(bytes)
            },
            None => Err(Error::Truncated {
                offset: self.pos,
                needed: len as u64,
                available,
            }),
        }
    }

    /// Borrow the payload of a record as present in the stream.
    pub fn content(&self, header: &RecordHeader) -> &'data [u8] {
        let start = (header.content_begin() as usize).min(self.data.len());
        let end = (header.end as usize).clamp(start, self.data.len());
        &self.data[start..end]
    }

    #[inline]
    pub fn skip(&mut self, len: u64) -> Result<()> {
        if len > self.remaining() {
            return Err(Error::Truncated {
                offset: self.pos,
                needed: len,
                available: self.remaining(),
            });
        }
        self.pos += len;
        Ok(())
    }

    #[inline]
    pub fn read_u8(&mut self) -> Result<u8> {
        let v = read_u8(self.data, self.pos as usize)?;
        self.pos += 1;
        Ok(v)
    }

    #[inline]
    pub fn read_u16(&mut self) -> Result<u16> {
        let v = read_u16_le(self.data, self.pos as usize)?;
        self.pos += 2;
        Ok(v)
    }

    #[inline]
    pub fn read_i16(&mut self) -> Result<i16> {
        let v = read_i16_le(self.data, self.pos as usize)?;
        self.pos += 2;
        Ok(v)
    }

    #[inline]
    pub fn read_u32(&mut self) -> Result<u32> {
        let v = read_u32_le(self.data, self.pos as usize)?;
        self.pos += 4;
        Ok(v)
    }

    #[inline]
    pub fn read_i32(&mut self) -> Result<i32> {
        let v = read_i32_le(self.data, self.pos as usize)?;
        self.pos += 4;
        Ok(v)
    }
}

/// Iterator over the direct children of a container.
///
/// Stops at the container end, at the stream end, or at the first header
/// that cannot be read.
pub struct ChildRecords<'data> {
    cursor: ByteCursor<'data>,
    next: u64,
    end: u64,
}

impl Iterator for ChildRecords<'_> {
    type Item = RecordHeader;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next + HEADER_SIZE > self.end || !self.cursor.seek(self.next) {
            return None;
        }
        let header = self.cursor.read_header().ok()?;
        // Children never extend past their parent.
        let header = RecordHeader {
            end: header.end.min(self.end),
            ..header
        };
        self.next = header.end;
        Some(header)
    }
}

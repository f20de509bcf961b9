//! BlipStoreEntry (BSE) record parsing
//!
//! The blip store container (0xF001) holds one BSE per picture, in index
//! order. An entry either points into the delay stream through `foDelay` or
//! carries the picture record itself right after its header and name.
//!
//! References:
//! - [MS-ODRAW] 2.2.32: OfficeArtBStoreContainerFileBlock
//! - [MS-ODRAW] 2.2.33: OfficeArtFBSE

use super::BlipType;
use crate::common::binary::{parse_utf16le_string, read_u16_le, read_u32_le};
use crate::common::error::{Error, Result};
use crate::escher::record::{ByteCursor, RecordHeader};

const FIXED_SIZE: usize = 36;

/// Where the picture record of an entry lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlipLocation {
    /// Offset into the delay (picture) stream.
    Delay(u32),
    /// Absolute offset of an embedded record in the drawing stream.
    Inline(u64),
}

/// Metadata and location of one stored picture.
///
/// ```text
/// Offset | Size | Field
/// -------|------|------
/// 0      | 1    | btWin32
/// 1      | 1    | btMacOS
/// 2      | 16   | rgbUid
/// 18     | 2    | tag
/// 20     | 4    | size
/// 24     | 4    | cRef
/// 28     | 4    | foDelay
/// 32     | 1    | usage
/// 33     | 1    | cbName
/// 34     | 2    | unused
/// 36     | N    | nameData, then an optional embedded picture record
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlipStoreEntry {
    /// Picture format, `None` for error/unknown type bytes.
    pub blip_type: Option<BlipType>,
    pub win32_type: u8,
    pub mac_type: u8,
    pub uid: [u8; 16],
    pub tag: u16,
    /// Size of the picture record in bytes.
    pub size: u32,
    pub ref_count: u32,
    pub delay_offset: u32,
    pub usage: u8,
    pub name: Option<String>,
    pub location: BlipLocation,
}

impl BlipStoreEntry {
    /// Parse the content of a BSE record that starts at stream offset
    /// `content_begin`.
    pub fn parse(data: &[u8], content_begin: u64) -> Result<Self> {
        if data.len() < FIXED_SIZE {
            return Err(Error::Truncated {
                offset: content_begin,
                needed: FIXED_SIZE as u64,
                available: data.len() as u64,
            });
        }

        let mut uid = [0u8; 16];
        uid.copy_from_slice(&data[2..18]);
        let size = read_u32_le(data, 20)?;
        let delay_offset = read_u32_le(data, 28)?;
        let name_len = data[33] as usize;

        let name = (name_len > 0)
            .then(|| data.get(FIXED_SIZE..FIXED_SIZE + name_len))
            .flatten()
            .map(parse_utf16le_string)
            .filter(|n| !n.is_empty());

        // An entry without a delay offset whose record is larger than the
        // declared picture size embeds the picture.
        let location = if delay_offset == 0 && (size as usize) < data.len() {
            BlipLocation::Inline(content_begin + (FIXED_SIZE + name_len) as u64)
        } else {
            BlipLocation::Delay(delay_offset)
        };

        Ok(Self {
            blip_type: BlipType::from_store_type(data[0]),
            win32_type: data[0],
            mac_type: data[1],
            uid,
            tag: read_u16_le(data, 18)?,
            size,
            ref_count: read_u32_le(data, 24)?,
            delay_offset,
            usage: data[32],
            name,
            location,
        })
    }

    /// Parse the BSE record whose header the cursor just read.
    pub fn read(cursor: &ByteCursor<'_>, header: &RecordHeader) -> Result<Self> {
        Self::parse(cursor.content(header), header.content_begin())
    }

    #[inline]
    pub fn is_inline(&self) -> bool {
        matches!(self.location, BlipLocation::Inline(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixed(kind: u8, size: u32, delay: u32, name: &[u8]) -> Vec<u8> {
        let mut data = vec![kind, kind];
        data.extend_from_slice(&[0x5A; 16]);
        data.extend_from_slice(&0xFFu16.to_le_bytes());
        data.extend_from_slice(&size.to_le_bytes());
        data.extend_from_slice(&1u32.to_le_bytes());
        data.extend_from_slice(&delay.to_le_bytes());
        data.extend_from_slice(&[0, name.len() as u8, 0, 0]);
        data.extend_from_slice(name);
        data
    }

    #[test]
    fn test_delay_entry() {
        let data = fixed(0x02, 4096, 0x1234, &[]);
        let bse = BlipStoreEntry::parse(&data, 100).unwrap();
        assert_eq!(bse.blip_type, Some(BlipType::Emf));
        assert_eq!(bse.size, 4096);
        assert_eq!(bse.ref_count, 1);
        assert_eq!(bse.location, BlipLocation::Delay(0x1234));
        assert!(bse.name.is_none());
    }

    #[test]
    fn test_first_picture_of_delay_stream() {
        // foDelay 0 is a valid offset when nothing is embedded.
        let data = fixed(0x06, 500, 0, &[]);
        let bse = BlipStoreEntry::parse(&data, 0).unwrap();
        assert_eq!(bse.location, BlipLocation::Delay(0));
    }

    #[test]
    fn test_inline_entry_with_name() {
        let mut data = fixed(0x07, 4, 0, &[b'a', 0, b'b', 0]);
        data.extend_from_slice(&[1, 2, 3, 4]);
        let bse = BlipStoreEntry::parse(&data, 1000).unwrap();
        assert_eq!(bse.name.as_deref(), Some("ab"));
        assert_eq!(bse.location, BlipLocation::Inline(1000 + 36 + 4));
        assert!(bse.is_inline());
    }

    #[test]
    fn test_short_entry() {
        assert!(matches!(
            BlipStoreEntry::parse(&[0; 20], 0),
            Err(Error::Truncated { .. })
        ));
    }
}

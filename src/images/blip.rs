//! BLIP (picture) record parsing
//!
//! A picture record starts with one 16-byte UID, or two when the low bit of
//! the instance is set. Metafiles follow with a 34-byte header and usually
//! deflated data; bitmaps follow with a one-byte tag and the file bytes as-is.
//!
//! References:
//! - [MS-ODRAW] 2.2.23: OfficeArtBlip records
//! - [MS-ODRAW] 2.2.31: OfficeArtMetafileHeader

use super::{Graphic, GraphicKind, MetafileFormat, dib};
use crate::common::binary::{read_i32_le, read_u32_le, read_u8};
use crate::common::error::{Error, Result};
use crate::common::unit::EMUS_PER_CM;
use crate::escher::record::{ByteCursor, RecordHeader};
use image::ImageFormat;
use log::{debug, warn};
use std::borrow::Cow;
use std::io::Read;

const UID_SIZE: usize = 16;
const METAFILE_HEADER_SIZE: usize = 34;
const COMPRESSION_DEFLATE: u8 = 0x00;
const PLACEABLE_MAGIC: u32 = 0x9AC6_CDD7;

/// Picture formats a blip record can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlipType {
    Emf,
    Wmf,
    Pict,
    Jpeg,
    /// JPEG in the CMYK color space.
    JpegCmyk,
    Png,
    Dib,
    Tiff,
}

impl BlipType {
    /// Classify by record instance, ignoring the second-UID bit.
    pub const fn from_instance(instance: u16) -> Option<Self> {
        match instance & 0xFFFE {
            0x3D4 => Some(Self::Emf),
            0x216 => Some(Self::Wmf),
            0x542 => Some(Self::Pict),
            0x46A => Some(Self::Jpeg),
            0x6E2 => Some(Self::JpegCmyk),
            0x6E0 => Some(Self::Png),
            0x7A8 => Some(Self::Dib),
            0x6E4 => Some(Self::Tiff),
            _ => None,
        }
    }

    pub const fn from_record_type(rec_type: u16) -> Option<Self> {
        match rec_type {
            0xF01A => Some(Self::Emf),
            0xF01B => Some(Self::Wmf),
            0xF01C => Some(Self::Pict),
            0xF01D => Some(Self::Jpeg),
            0xF01E => Some(Self::Png),
            0xF01F => Some(Self::Dib),
            0xF029 => Some(Self::Tiff),
            0xF02A => Some(Self::JpegCmyk),
            _ => None,
        }
    }

    /// Map the blip type byte of a store entry.
    pub const fn from_store_type(value: u8) -> Option<Self> {
        match value {
            0x02 => Some(Self::Emf),
            0x03 => Some(Self::Wmf),
            0x04 => Some(Self::Pict),
            0x05 => Some(Self::Jpeg),
            0x06 => Some(Self::Png),
            0x07 => Some(Self::Dib),
            0x11 => Some(Self::Tiff),
            0x12 => Some(Self::JpegCmyk),
            _ => None,
        }
    }

    /// Instance tag written for this format with a single UID.
    pub const fn instance(self) -> u16 {
        match self {
            Self::Emf => 0x3D4,
            Self::Wmf => 0x216,
            Self::Pict => 0x542,
            Self::Jpeg => 0x46A,
            Self::JpegCmyk => 0x6E2,
            Self::Png => 0x6E0,
            Self::Dib => 0x7A8,
            Self::Tiff => 0x6E4,
        }
    }

    pub const fn is_metafile(self) -> bool {
        matches!(self, Self::Emf | Self::Wmf | Self::Pict)
    }

    pub const fn extension(self) -> &'static str {
        match self {
            Self::Emf => "emf",
            Self::Wmf => "wmf",
            Self::Pict => "pict",
            Self::Jpeg | Self::JpegCmyk => "jpg",
            Self::Png => "png",
            Self::Dib => "bmp",
            Self::Tiff => "tiff",
        }
    }
}

/// The 34-byte header in front of metafile data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetafileHeader {
    pub uncompressed_size: u32,
    /// Clip bounds (left, top, right, bottom) in metafile units.
    pub bounds: (i32, i32, i32, i32),
    /// Rendered size in EMU.
    pub size_emu: (i32, i32),
    pub compressed_size: u32,
    /// `0x00` deflate, `0xFE` stored.
    pub compression: u8,
    pub filter: u8,
}

impl MetafileHeader {
    fn parse(data: &[u8], offset: usize) -> Result<Self> {
        Ok(Self {
            uncompressed_size: read_u32_le(data, offset)?,
            bounds: (
                read_i32_le(data, offset + 4)?,
                read_i32_le(data, offset + 8)?,
                read_i32_le(data, offset + 12)?,
                read_i32_le(data, offset + 16)?,
            ),
            size_emu: (read_i32_le(data, offset + 20)?, read_i32_le(data, offset + 24)?),
            compressed_size: read_u32_le(data, offset + 28)?,
            compression: read_u8(data, offset + 32)?,
            filter: read_u8(data, offset + 33)?,
        })
    }

    #[inline]
    pub fn is_compressed(&self) -> bool {
        self.compression == COMPRESSION_DEFLATE
    }

    /// Rendered size in 1/100 mm, `None` when degenerate.
    pub fn pref_size(&self) -> Option<(i32, i32)> {
        let (w, h) = self.size_emu;
        let per_hmm = (EMUS_PER_CM / 1000) as i32;
        (w > 0 && h > 0).then(|| (w / per_hmm, h / per_hmm))
    }
}

/// A parsed picture record, payload borrowed from the stream.
#[derive(Debug, Clone)]
pub struct BlipRecord<'data> {
    pub blip_type: BlipType,
    pub uid: [u8; UID_SIZE],
    pub secondary_uid: Option<[u8; UID_SIZE]>,
    pub metafile: Option<MetafileHeader>,
    pub payload: &'data [u8],
}

impl<'data> BlipRecord<'data> {
    /// Parse the content of a picture record.
    ///
    /// The format comes from the instance; the record type is only used
    /// when the instance is not one of the known tags.
    pub fn parse(header: &RecordHeader, content: &'data [u8]) -> Result<Self> {
        let blip_type = BlipType::from_instance(header.instance)
            .or_else(|| BlipType::from_record_type(header.rec_type))
            .ok_or_else(|| {
                Error::Unsupported(format!(
                    "picture record {:#06x} instance {:#05x}",
                    header.rec_type, header.instance
                ))
            })?;

        let mut offset = 0;
        let uid = read_uid(content, offset)?;
        offset += UID_SIZE;
        let secondary_uid = if header.instance & 1 != 0 {
            let uid = read_uid(content, offset)?;
            offset += UID_SIZE;
            Some(uid)
        } else {
            None
        };

        let (metafile, payload) = if blip_type.is_metafile() {
            let mh = MetafileHeader::parse(content, offset)?;
            offset += METAFILE_HEADER_SIZE;
            let rest = &content[offset..];
            let take = (mh.compressed_size as usize).min(rest.len());
            if take < mh.compressed_size as usize {
                warn!(
                    "metafile data truncated: {} of {} bytes",
                    take, mh.compressed_size
                );
            }
            (Some(mh), &rest[..take])
        } else {
            // One tag byte, then the file.
            offset += 1;
            (None, content.get(offset..).unwrap_or(&[]))
        };

        Ok(Self {
            blip_type,
            uid,
            secondary_uid,
            metafile,
            payload,
        })
    }

    /// Read the picture record at the cursor.
    pub fn read(cursor: &mut ByteCursor<'data>) -> Result<Self> {
        let header = cursor.read_header()?;
        if !header.record_type().is_blip() {
            return Err(Error::ParseError(format!(
                "expected a picture record at {}, found {:#06x}",
                header.begin, header.rec_type
            )));
        }
        let content = cursor.content(&header);
        cursor.seek_to_end(&header);
        Self::parse(&header, content)
    }

    /// Payload with metafile compression undone.
    pub fn picture_data(&self) -> Result<Cow<'data, [u8]>> {
        match &self.metafile {
            Some(mh) if mh.is_compressed() => {
                inflate(self.payload, mh.uncompressed_size as usize).map(Cow::Owned)
            },
            _ => Ok(Cow::Borrowed(self.payload)),
        }
    }

    /// Decode into a [`Graphic`].
    pub fn decode(&self) -> Result<Graphic> {
        let kind = match self.blip_type {
            BlipType::Emf => metafile(MetafileFormat::Emf, self.picture_data()?.into_owned()),
            BlipType::Pict => metafile(MetafileFormat::Pict, self.picture_data()?.into_owned()),
            BlipType::Wmf => {
                let data = self.picture_data()?;
                let mh = self.metafile.unwrap_or(EMPTY_HEADER);
                metafile(MetafileFormat::Wmf, with_placeable_header(&data, &mh))
            },
            BlipType::Dib => GraphicKind::Bitmap(dib::decode(self.payload)?),
            BlipType::Jpeg | BlipType::JpegCmyk => decode_image(self.payload, ImageFormat::Jpeg)?,
            BlipType::Png => decode_image(self.payload, ImageFormat::Png)?,
            BlipType::Tiff => decode_image(self.payload, ImageFormat::Tiff)?,
        };
        debug!("decoded {:?} picture", self.blip_type);
        Ok(Graphic {
            kind,
            pref_size: self.metafile.and_then(|mh| mh.pref_size()),
        })
    }
}

const EMPTY_HEADER: MetafileHeader = MetafileHeader {
    uncompressed_size: 0,
    bounds: (0, 0, 0, 0),
    size_emu: (0, 0),
    compressed_size: 0,
    compression: 0xFE,
    filter: 0xFE,
};

/// Decode a complete picture record (header included) held in `data`.
pub fn decode_blip(data: &[u8]) -> Result<Graphic> {
    let mut cursor = ByteCursor::new(data);
    BlipRecord::read(&mut cursor)?.decode()
}

fn read_uid(data: &[u8], offset: usize) -> Result<[u8; UID_SIZE]> {
    let bytes = data.get(offset..offset + UID_SIZE).ok_or(Error::Truncated {
        offset: offset as u64,
        needed: UID_SIZE as u64,
        available: data.len().saturating_sub(offset) as u64,
    })?;
    let mut uid = [0u8; UID_SIZE];
    uid.copy_from_slice(bytes);
    Ok(uid)
}

#[inline]
fn metafile(format: MetafileFormat, data: Vec<u8>) -> GraphicKind {
    GraphicKind::Metafile { format, data }
}

fn decode_image(data: &[u8], format: ImageFormat) -> Result<GraphicKind> {
    let img = image::load_from_memory_with_format(data, format)?;
    Ok(GraphicKind::Bitmap(img.to_rgba8()))
}

/// Inflate metafile data. Writers use both zlib-wrapped and raw deflate.
fn inflate(data: &[u8], size_hint: usize) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(size_hint.min(64 << 20));
    let result = if data.first() == Some(&0x78) {
        flate2::read::ZlibDecoder::new(data).read_to_end(&mut out)
    } else {
        flate2::read::DeflateDecoder::new(data).read_to_end(&mut out)
    };
    result.map_err(|e| Error::CorruptedFile(format!("metafile inflate failed: {e}")))?;
    Ok(out)
}

/// Prefix WMF data with the 22-byte placeable header the store drops.
fn with_placeable_header(wmf: &[u8], mh: &MetafileHeader) -> Vec<u8> {
    if read_u32_le(wmf, 0).is_ok_and(|magic| magic == PLACEABLE_MAGIC) {
        return wmf.to_vec();
    }

    let (left, top, right, bottom) = if mh.bounds == (0, 0, 0, 0) {
        // 1440 units per inch from the EMU size.
        let w = (mh.size_emu.0 as i64 * 1440 / 914_400) as i32;
        let h = (mh.size_emu.1 as i64 * 1440 / 914_400) as i32;
        (0, 0, w, h)
    } else {
        mh.bounds
    };

    let mut out = Vec::with_capacity(22 + wmf.len());
    out.extend_from_slice(&PLACEABLE_MAGIC.to_le_bytes());
    out.extend_from_slice(&0u16.to_le_bytes());
    for v in [left, top, right, bottom] {
        out.extend_from_slice(&(v as i16).to_le_bytes());
    }
    out.extend_from_slice(&1440u16.to_le_bytes());
    out.extend_from_slice(&0u32.to_le_bytes());
    let checksum = out
        .chunks_exact(2)
        .fold(0u16, |acc, w| acc ^ u16::from_le_bytes([w[0], w[1]]));
    out.extend_from_slice(&checksum.to_le_bytes());
    out.extend_from_slice(wmf);
    out
}

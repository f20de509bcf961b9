//! Device-independent bitmap decoding.
//!
//! Picture records store DIBs without the 14-byte file header. The header is
//! rebuilt here, with the pixel offset computed from the info header, masks
//! and palette, and the result goes through the `image` BMP decoder.

use crate::common::binary::{read_i16_le, read_i32_le, read_u16_le, read_u32_le};
use crate::common::error::{Error, Result};
use image::{ImageFormat, RgbaImage};
use log::trace;

const FILE_HEADER_SIZE: u32 = 14;
const CORE_HEADER_SIZE: u32 = 12;
const INFO_HEADER_SIZE: u32 = 40;
const MAX_PIXELS: u64 = 1 << 28;

const BI_BITFIELDS: u32 = 3;

/// Decoded `BITMAPINFOHEADER` / `BITMAPCOREHEADER` fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DibHeader {
    pub header_size: u32,
    pub width: u32,
    pub height: u32,
    /// Rows stored top row first (negative height in the header).
    pub top_down: bool,
    pub bit_count: u16,
    pub compression: u32,
    pub colors_used: u32,
}

impl DibHeader {
    pub fn parse(data: &[u8]) -> Result<Self> {
        let header_size = read_u32_le(data, 0)?;
        let (width, height, bit_count, compression, colors_used) = if header_size == CORE_HEADER_SIZE {
            (
                read_u16_le(data, 4)? as i32,
                read_i16_le(data, 6)? as i32,
                read_u16_le(data, 10)?,
                0,
                0,
            )
        } else if header_size >= INFO_HEADER_SIZE {
            (
                read_i32_le(data, 4)?,
                read_i32_le(data, 8)?,
                read_u16_le(data, 14)?,
                read_u32_le(data, 16)?,
                read_u32_le(data, 32)?,
            )
        } else {
            return Err(Error::ImageDecode(format!("bitmap header size {header_size}")));
        };

        if width <= 0 || height == 0 || height == i32::MIN {
            return Err(Error::ImageDecode(format!("bitmap size {width}x{height}")));
        }
        let (w, h) = (width as u32, height.unsigned_abs());
        if w as u64 * h as u64 > MAX_PIXELS {
            return Err(Error::ImageDecode(format!("bitmap too large: {w}x{h}")));
        }

        Ok(Self {
            header_size,
            width: w,
            height: h,
            top_down: height < 0,
            bit_count,
            compression,
            colors_used,
        })
    }

    fn palette_len(&self) -> u32 {
        if self.bit_count > 8 {
            return 0;
        }
        let max = 1u32 << self.bit_count;
        match self.colors_used {
            0 => max,
            n => n.min(max),
        }
    }

    /// Offset of the pixel array from the start of the DIB.
    pub fn pixel_offset(&self) -> u32 {
        let masks = if self.compression == BI_BITFIELDS && self.header_size == INFO_HEADER_SIZE {
            12
        } else {
            0
        };
        let entry_size = if self.header_size == CORE_HEADER_SIZE { 3 } else { 4 };
        self.header_size + masks + self.palette_len() * entry_size
    }
}

/// Prefix `dib` with a `BITMAPFILEHEADER`.
fn with_file_header(dib: &[u8], header: &DibHeader) -> Vec<u8> {
    let file_size = FILE_HEADER_SIZE.saturating_add(dib.len() as u32);
    let mut bmp = Vec::with_capacity(file_size as usize);
    bmp.extend_from_slice(b"BM");
    bmp.extend_from_slice(&file_size.to_le_bytes());
    bmp.extend_from_slice(&[0u8; 4]);
    bmp.extend_from_slice(&(FILE_HEADER_SIZE + header.pixel_offset()).to_le_bytes());
    bmp.extend_from_slice(dib);
    bmp
}

/// Decode a DIB (header, optional masks and palette, pixels).
pub fn decode(data: &[u8]) -> Result<RgbaImage> {
    let header = DibHeader::parse(data)?;
    trace!("dib {:?}", header);
    let bmp = with_file_header(data, &header);
    let img = image::load_from_memory_with_format(&bmp, ImageFormat::Bmp)?;
    Ok(img.to_rgba8())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    const BI_RGB: u32 = 0;
    const BI_RLE8: u32 = 1;

    fn info_header(width: i32, height: i32, bits: u16, compression: u32, colors: u32) -> Vec<u8> {
        let mut h = Vec::new();
        h.extend_from_slice(&40u32.to_le_bytes());
        h.extend_from_slice(&width.to_le_bytes());
        h.extend_from_slice(&height.to_le_bytes());
        h.extend_from_slice(&1u16.to_le_bytes());
        h.extend_from_slice(&bits.to_le_bytes());
        h.extend_from_slice(&compression.to_le_bytes());
        h.extend_from_slice(&[0; 16]);
        h.extend_from_slice(&colors.to_le_bytes());
        h.extend_from_slice(&0u32.to_le_bytes());
        h
    }

    #[test]
    fn test_pixel_offset() {
        let header = DibHeader::parse(&info_header(8, 8, 24, BI_RGB, 0)).unwrap();
        assert_eq!(header.pixel_offset(), 40);
        let header = DibHeader::parse(&info_header(8, 8, 8, BI_RGB, 0)).unwrap();
        assert_eq!(header.pixel_offset(), 40 + 256 * 4);
        let header = DibHeader::parse(&info_header(8, 8, 4, BI_RGB, 3)).unwrap();
        assert_eq!(header.pixel_offset(), 40 + 3 * 4);
        let header = DibHeader::parse(&info_header(8, 8, 16, BI_BITFIELDS, 0)).unwrap();
        assert_eq!(header.pixel_offset(), 52);
    }

    #[test]
    fn test_24bit_bottom_up() {
        let mut data = info_header(2, 2, 24, BI_RGB, 0);
        // bottom row: blue, green (+2 padding); top row: red, white
        data.extend_from_slice(&[0xFF, 0, 0, 0, 0xFF, 0, 0, 0]);
        data.extend_from_slice(&[0, 0, 0xFF, 0xFF, 0xFF, 0xFF, 0, 0]);
        let img = decode(&data).unwrap();
        assert_eq!(img.dimensions(), (2, 2));
        assert_eq!(img.get_pixel(0, 0), &Rgba([0xFF, 0, 0, 0xFF]));
        assert_eq!(img.get_pixel(1, 0), &Rgba([0xFF, 0xFF, 0xFF, 0xFF]));
        assert_eq!(img.get_pixel(0, 1), &Rgba([0, 0, 0xFF, 0xFF]));
        assert_eq!(img.get_pixel(1, 1), &Rgba([0, 0xFF, 0, 0xFF]));
    }

    #[test]
    fn test_1bit_palette_top_down() {
        let mut data = info_header(8, -2, 1, BI_RGB, 2);
        data.extend_from_slice(&[0, 0, 0, 0]);
        data.extend_from_slice(&[0xFF, 0xFF, 0xFF, 0]);
        data.extend_from_slice(&[0b1010_0000, 0, 0, 0]);
        data.extend_from_slice(&[0b0000_0001, 0, 0, 0]);
        let img = decode(&data).unwrap();
        assert_eq!(img.get_pixel(0, 0).0[0], 0xFF);
        assert_eq!(img.get_pixel(1, 0).0[0], 0);
        assert_eq!(img.get_pixel(2, 0).0[0], 0xFF);
        assert_eq!(img.get_pixel(7, 1).0[0], 0xFF);
        assert_eq!(img.get_pixel(0, 1).0[0], 0);
    }

    #[test]
    fn test_rle8() {
        let mut data = info_header(4, 1, 8, BI_RLE8, 2);
        data.extend_from_slice(&[0, 0, 0, 0]);
        data.extend_from_slice(&[0x10, 0x20, 0x30, 0]);
        // two of index 1, an absolute run of two, end of bitmap
        data.extend_from_slice(&[2, 1, 0, 2, 0, 1, 0, 1]);
        let img = decode(&data).unwrap();
        assert_eq!(img.get_pixel(0, 0), &Rgba([0x30, 0x20, 0x10, 0xFF]));
        assert_eq!(img.get_pixel(1, 0), &Rgba([0x30, 0x20, 0x10, 0xFF]));
        assert_eq!(img.get_pixel(2, 0), &Rgba([0, 0, 0, 0xFF]));
        assert_eq!(img.get_pixel(3, 0), &Rgba([0x30, 0x20, 0x10, 0xFF]));
    }

    #[test]
    fn test_rejects_bad_headers() {
        assert!(decode(&info_header(0, 4, 24, BI_RGB, 0)).is_err());
        assert!(matches!(
            DibHeader::parse(&info_header(1 << 15, 1 << 15, 24, BI_RGB, 0)),
            Err(Error::ImageDecode(_))
        ));
        // pixel data missing
        assert!(decode(&info_header(4, 4, 24, BI_RGB, 0)).is_err());
    }
}

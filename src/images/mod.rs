//! Embedded pictures (BLIPs) and their post-processing.
//!
//! Pictures are stored once per document in the blip store and referenced
//! from shapes by a 1-based index. This module parses the store entries,
//! decodes the picture records themselves and applies the picture
//! adjustments a shape can carry.
//!
//! # Architecture
//!
//! - `blip`: picture record parsing, inflate, dispatch by instance tag
//! - `bse`: blip store entries (`0xF007`) and where their picture lives
//! - `dib`: device-independent bitmaps through the BMP decoder
//! - `store`: `BlipStore`, the index-to-picture locator with its cache
//! - `adjust`: crop, contrast, brightness, gamma, draw mode, color key
//!
//! # Supported formats
//!
//! | Format | Kind | Decoded by |
//! |--------|------|------------|
//! | EMF, WMF, PICT | metafile | kept as bytes, inflated |
//! | JPEG (RGB, CMYK), PNG, TIFF | bitmap | `image` crate |
//! | DIB | bitmap | `dib` + `image` BMP decoder |

pub mod adjust;
pub mod blip;
pub mod bse;
pub mod dib;
pub mod store;

pub use adjust::{Crop, DrawMode, PictureAdjustments};
pub use blip::{BlipRecord, BlipType, decode_blip};
pub use bse::{BlipLocation, BlipStoreEntry};
pub use store::{BlipSource, BlipStore, NoBlips};

use image::RgbaImage;

/// Metafile flavors kept undecoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetafileFormat {
    Emf,
    Wmf,
    Pict,
}

/// Picture payload.
#[derive(Debug, Clone, PartialEq)]
pub enum GraphicKind {
    /// Placeholder for a picture that could not be decoded.
    Empty,
    Bitmap(RgbaImage),
    /// Inflated metafile bytes; WMF data carries a placeable header.
    Metafile { format: MetafileFormat, data: Vec<u8> },
}

/// A decoded picture with its natural size.
#[derive(Debug, Clone, PartialEq)]
pub struct Graphic {
    pub kind: GraphicKind,
    /// Size recorded by the writer, in 1/100 mm (metafiles only).
    pub pref_size: Option<(i32, i32)>,
}

impl Graphic {
    pub fn empty() -> Self {
        Self {
            kind: GraphicKind::Empty,
            pref_size: None,
        }
    }

    pub fn bitmap(image: RgbaImage) -> Self {
        Self {
            kind: GraphicKind::Bitmap(image),
            pref_size: None,
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        matches!(self.kind, GraphicKind::Empty)
    }

    /// Pixel size of a bitmap, `None` for metafiles and placeholders.
    pub fn pixel_size(&self) -> Option<(u32, u32)> {
        match &self.kind {
            GraphicKind::Bitmap(img) => Some(img.dimensions()),
            _ => None,
        }
    }

    pub fn as_bitmap(&self) -> Option<&RgbaImage> {
        match &self.kind {
            GraphicKind::Bitmap(img) => Some(img),
            _ => None,
        }
    }

    pub fn as_bitmap_mut(&mut self) -> Option<&mut RgbaImage> {
        match &mut self.kind {
            GraphicKind::Bitmap(img) => Some(img),
            _ => None,
        }
    }
}

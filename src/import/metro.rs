//! Spreadsheet text-rotation override.
//!
//! Spreadsheet producers store a small zip archive in the metro blob
//! property. Its shape XML says whether text stays upright when the shape
//! turns. Only that one attribute is needed, so the XML is scanned for it
//! rather than parsed.

use crate::common::error::Result;
use log::debug;
use memchr::memmem;
use std::io::{Cursor, Read};

const SHAPE_XML: &str = "drs/shapexml.xml";
const UPRIGHT: &[u8] = b"upright=\"1\"";

/// Whether the blob marks the shape's text as upright.
pub fn is_upright(blob: &[u8]) -> Result<bool> {
    let mut archive = zip::ZipArchive::new(Cursor::new(blob))?;
    let mut xml = Vec::new();
    archive.by_name(SHAPE_XML)?.read_to_end(&mut xml)?;
    let upright = memmem::find(&xml, UPRIGHT).is_some();
    debug!("metro blob: {} bytes of shape xml, upright {upright}", xml.len());
    Ok(upright)
}

//! Configuration of a drawing import.
//!
//! Everything the importer does differently between host applications is
//! switched here: the target unit, the unit of client anchors, crop and
//! arc handling, and a few safety limits.
//!
//! # Examples
//!
//! ```rust
//! use dff_import::{ImportOptions, MapUnit};
//!
//! // Slides in master units, imported into 1/100 mm
//! let options = ImportOptions::default();
//!
//! // Word-style anchors in EMU, imported into twips
//! let options = ImportOptions::new()
//!     .with_map_unit(MapUnit::Twip)
//!     .with_source_units_per_inch(914_400)
//!     .with_slide_import(false);
//! ```

use crate::common::MapUnit;
use crate::common::unit::PPT_MASTER_UNITS_PER_INCH;
use crate::escher::record::DEFAULT_MAX_RECORD_LENGTH;
use crate::images::store::DEFAULT_CACHE_CAPACITY;
use crate::scale::UnitScaler;
use serde::{Deserialize, Serialize};

pub const DEFAULT_MAX_DEPTH: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportOptions {
    /// Logical unit of the host model
    pub map_unit: MapUnit,
    /// Units per inch of client anchors (576 for slides, 914400 for EMU)
    pub source_units_per_inch: u32,
    /// Logical offset added to every mapped coordinate
    pub offset: (i32, i32),
    /// Largest record length accepted before a header counts as corrupt
    pub max_record_length: u32,
    /// Deepest group nesting imported
    pub max_depth: usize,
    /// Decoded pictures kept in memory
    pub blip_cache_capacity: usize,
    /// Express picture crops as attributes instead of cutting the bitmap
    pub declarative_crop: bool,
    /// Hand OLE picture shapes to the host's embedded-object support
    pub import_ole: bool,
    /// Slides keep arc frames as stored; other hosts get them corrected
    pub slide_import: bool,
    /// Honor the spreadsheet upright-text override
    pub excel_text_rotation: bool,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            map_unit: MapUnit::HundredthMm,
            source_units_per_inch: PPT_MASTER_UNITS_PER_INCH as u32,
            offset: (0, 0),
            max_record_length: DEFAULT_MAX_RECORD_LENGTH,
            max_depth: DEFAULT_MAX_DEPTH,
            blip_cache_capacity: DEFAULT_CACHE_CAPACITY,
            declarative_crop: true,
            import_ole: false,
            slide_import: true,
            excel_text_rotation: false,
        }
    }
}

impl ImportOptions {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn with_map_unit(mut self, unit: MapUnit) -> Self {
        self.map_unit = unit;
        self
    }

    #[inline]
    pub fn with_source_units_per_inch(mut self, units: u32) -> Self {
        self.source_units_per_inch = units;
        self
    }

    #[inline]
    pub fn with_offset(mut self, x: i32, y: i32) -> Self {
        self.offset = (x, y);
        self
    }

    #[inline]
    pub fn with_max_record_length(mut self, max: u32) -> Self {
        self.max_record_length = max;
        self
    }

    /// Set the nesting ceiling. Groups deeper than this are skipped.
    #[inline]
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    #[inline]
    pub fn with_blip_cache_capacity(mut self, capacity: usize) -> Self {
        self.blip_cache_capacity = capacity;
        self
    }

    #[inline]
    pub fn with_declarative_crop(mut self, declarative: bool) -> Self {
        self.declarative_crop = declarative;
        self
    }

    #[inline]
    pub fn with_ole_import(mut self, import: bool) -> Self {
        self.import_ole = import;
        self
    }

    #[inline]
    pub fn with_slide_import(mut self, slide: bool) -> Self {
        self.slide_import = slide;
        self
    }

    #[inline]
    pub fn with_excel_text_rotation(mut self, enabled: bool) -> Self {
        self.excel_text_rotation = enabled;
        self
    }

    /// Scaler for anchors and lengths under these options.
    pub fn scaler(&self) -> UnitScaler {
        UnitScaler::new(self.map_unit, self.source_units_per_inch).with_offset(self.offset.0, self.offset.1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = ImportOptions::default();
        assert_eq!(options.max_depth, 64);
        assert_eq!(options.blip_cache_capacity, 64);
        assert!(options.slide_import && options.declarative_crop);
        assert_eq!(options.scaler().scale_length(576), 2540);
    }

    #[test]
    fn test_builder_and_partial_config() {
        let options = ImportOptions::new()
            .with_map_unit(MapUnit::Emu)
            .with_source_units_per_inch(914_400)
            .with_offset(10, 20);
        let scaler = options.scaler();
        assert_eq!(scaler.scale_length(1234), 1234);
        assert_eq!(scaler.scale_x(0), 10);

        let options: ImportOptions = serde_saphyr::from_str("max_depth: 3\nimport_ole: true\n").unwrap();
        assert_eq!(options.max_depth, 3);
        assert!(options.import_ole);
        assert_eq!(options.source_units_per_inch, 576);
    }
}

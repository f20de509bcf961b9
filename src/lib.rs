//! dff-import - importer for binary Office drawing (Escher) records
//!
//! Legacy Word, Excel and PowerPoint files store their shapes, pictures and
//! connectors in one shared binary drawing format. This crate reads that
//! format and rebuilds the drawing in a host scene model: it decodes the
//! record tree and the property tables, resolves colors, lines, fills,
//! custom geometry and pictures, and hands finished nodes to the host.
//!
//! # Features
//!
//! - **Record layer**: bounds-checked record headers, sibling caches, typed
//!   property tables with master-shape inheritance
//! - **Attributes**: lines, arrowheads, solid/gradient/pattern/picture fills,
//!   shadows and text frames
//! - **Geometry**: preset and freeform custom shapes, guides, handles,
//!   extrusion and arc correction
//! - **Pictures**: blip store lookup, PNG/JPEG/DIB/TIFF decoding, metafile
//!   inflation and picture adjustments
//! - **Import**: groups with child coordinate spaces, rotation and flips,
//!   connectors glued through solver rules, client and fontwork text
//!
//! # Example
//!
//! ```no_run
//! use dff_import::{DrawingScanner, ImportOptions, Scene};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let stream = std::fs::read("drawing.bin")?;
//! let mut scanner = DrawingScanner::new(&stream, ImportOptions::default());
//! let mut scene = Scene::new();
//!
//! if let Some(page) = scanner.drawings().first().map(|d| d.offset) {
//!     let result = scanner.import_all(&mut scene, page, None);
//!     for root in &result.roots {
//!         let node = scene.node(*root).unwrap();
//!         println!("{:?} at {:?}", node.shape_type, node.logic_rect);
//!     }
//! }
//! # Ok(())
//! # }
//! ```
//!
//! Hosts other than the in-memory [`Scene`] implement the traits in
//! [`host`] and pass themselves to the same entry points.

pub mod attrs;
pub mod color;
pub mod common;
pub mod escher;
pub mod geometry;
pub mod host;
pub mod images;
pub mod import;
pub mod options;
pub mod scale;
pub mod scanner;

pub use common::{Error, MapUnit, Point, Rect, Result, RgbColor};
pub use host::{Host, NodeId, Scene, SceneHost};
pub use import::{ImportSession, ShapeImporter};
pub use options::ImportOptions;
pub use scanner::{DrawingScanner, ImportResult, ImportStatus};

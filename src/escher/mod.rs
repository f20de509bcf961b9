//! Drawing record layer.
//!
//! The binary drawing format is a tree of tagged, length-prefixed records.
//! This module reads record headers from a shared cursor, caches sibling
//! headers, decodes property tables and knows the shape kinds. It does not
//! build any scene objects; that is the job of [`crate::import`].
//!
//! # Modules
//!
//! - `record`: record headers and the stream cursor
//! - `types`: record type ids and shape flags
//! - `index`: cached sibling headers with typed seeks
//! - `properties`: property tables, boolean sets, array properties
//! - `shape_type`: shape kinds and their default fill/line behavior
//! - `writer`: builders for synthetic record streams

pub mod index;
pub mod properties;
pub mod record;
pub mod shape_type;
pub mod types;
pub mod writer;

pub use index::{RecordIndex, SeekMode};
pub use properties::{ArrayProperty, PropertyId, PropertyLookup, PropertySet, PropertyState};
pub use record::{ByteCursor, HEADER_SIZE, RecordHeader};
pub use shape_type::ShapeType;
pub use types::{RecordType, ShapeFlags};
pub use writer::{PropertyBuilder, RecordBuilder};

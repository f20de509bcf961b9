//! Primitives shared by every layer of the importer: byte reads, errors,
//! units, points and rectangles, and the color value type.

pub mod binary;
pub mod color;
pub mod error;
pub mod geom;
pub mod unit;

pub use color::RgbColor;
pub use error::{Error, Result};
pub use geom::{Point, PointF, Rect};
pub use unit::MapUnit;

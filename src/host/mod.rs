//! The scene model the importer builds into.
//!
//! The importer never owns the objects it creates. It asks a host for new
//! nodes and refers to them by `NodeId` afterwards. Three capabilities make up
//! a host:
//!
//! - `SceneHost`: nodes, attributes, transforms and glue points
//! - `TextEngine`: paragraph text attached to nodes
//! - `EmbeddedObjects`: OLE objects behind picture shapes
//!
//! `Scene` implements all three in memory and is what the tests import into.

pub mod scene;
pub mod text;

pub use scene::{Node, NodeKind, Scene};
pub use text::{CharFormat, Paragraph, TextAlign, TextContent, TextHandle, WritingDirection};

use crate::attrs::AttributeSet;
use crate::color::ColorPalette;
use crate::common::{Point, PointF, Rect};
use crate::escher::shape_type::ShapeType;
use crate::images::Graphic;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Non-owning reference to a host node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectorKind {
    Straight,
    /// Right-angled segments.
    Bent,
    Curved,
}

impl ConnectorKind {
    pub fn for_shape_type(shape_type: ShapeType) -> Self {
        match shape_type.raw() {
            33..=36 => Self::Bent,
            37..=40 => Self::Curved,
            _ => Self::Straight,
        }
    }
}

/// Which end of a connector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConnectorEnd {
    Start,
    End,
}

/// The four glue points every shape has.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StandardGlue {
    Top,
    Left,
    Bottom,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GlueRef {
    Standard(StandardGlue),
    /// Index into the node's glue points: the connection sites of its
    /// geometry first, then the points added through `add_glue_point`.
    Custom(u32),
}

/// Glue point relative to the node bounds, in 1/10000 of width and height.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GluePoint {
    pub position: PointF,
}

/// Naming and visibility of a node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShapeMetadata {
    pub name: Option<String>,
    pub description: Option<String>,
    pub visible: bool,
    pub printable: bool,
}

impl Default for ShapeMetadata {
    fn default() -> Self {
        Self {
            name: None,
            description: None,
            visible: true,
            printable: true,
        }
    }
}

/// Scene model capabilities the importer needs.
pub trait SceneHost {
    /// Palette for scheme and system colors.
    fn palette(&self) -> &dyn ColorPalette;

    fn create_shape(&mut self, shape_type: ShapeType, bounds: Rect) -> NodeId;
    fn create_group(&mut self) -> NodeId;
    fn create_connector(&mut self, kind: ConnectorKind, start: Point, end: Point) -> NodeId;
    fn create_graphic(&mut self, graphic: Arc<Graphic>, bounds: Rect) -> NodeId;
    /// Open path through `points`.
    fn create_polyline(&mut self, points: &[Point]) -> NodeId;

    fn append_child(&mut self, group: NodeId, child: NodeId);
    fn set_attributes(&mut self, node: NodeId, attrs: AttributeSet);
    fn set_metadata(&mut self, node: NodeId, metadata: ShapeMetadata);

    /// Bounding box of the node as drawn.
    fn snap_rect(&self, node: NodeId) -> Option<Rect>;
    /// Rotate counter-clockwise about `center` by hundredths of a degree.
    fn rotate(&mut self, node: NodeId, center: Point, angle: i32);
    /// Mirror across the line through `a` and `b`.
    fn mirror(&mut self, node: NodeId, a: Point, b: Point);

    fn glue_point_count(&self, node: NodeId) -> usize;
    /// Append a glue point and return its index.
    fn add_glue_point(&mut self, node: NodeId, point: GluePoint) -> u32;
    /// Outline points of a polygon-like node, in logical coordinates.
    fn outline(&self, node: NodeId) -> Vec<Point>;
    fn connect(&mut self, connector: NodeId, end: ConnectorEnd, target: NodeId, glue: GlueRef);

    /// Called once all children of a group have been added.
    fn finish_group(&mut self, _group: NodeId) {}
}

/// Text engine capabilities.
pub trait TextEngine {
    fn create_text(&mut self, content: TextContent) -> TextHandle;
    fn attach_text(&mut self, node: NodeId, text: TextHandle);
}

/// Request to turn an OLE picture shape into an embedded object.
#[derive(Debug, Clone)]
pub struct OleRequest {
    /// Name of the sub-storage holding the object.
    pub storage_name: String,
    /// Unique object name within this import.
    pub object_name: String,
    pub preview: Arc<Graphic>,
    pub bounds: Rect,
}

/// Embedded-object support. The default keeps the preview picture.
pub trait EmbeddedObjects {
    fn import_ole(&mut self, _request: &OleRequest) -> Option<NodeId> {
        None
    }
}

/// Everything the importer talks to.
pub trait Host: SceneHost + TextEngine + EmbeddedObjects {}

impl<T: SceneHost + TextEngine + EmbeddedObjects> Host for T {}

//! In-memory scene model.
//!
//! `Scene` is an arena of nodes addressed by [`NodeId`]. It implements every
//! host capability the importer needs and keeps enough state (logic
//! rectangles, rotation, flips, glue points, connections) to check an import
//! without a real drawing layer.

use super::text::{TextContent, TextHandle};
use super::{
    ConnectorEnd, ConnectorKind, EmbeddedObjects, GluePoint, GlueRef, NodeId, OleRequest, SceneHost,
    ShapeMetadata, TextEngine,
};
use crate::attrs::AttributeSet;
use crate::color::{ColorPalette, DefaultPalette};
use crate::common::{Point, Rect};
use crate::escher::shape_type::ShapeType;
use crate::geometry::Param;
use crate::images::Graphic;
use crate::scale::normalize_angle;
use log::{trace, warn};
use std::sync::Arc;

#[derive(Debug, Clone)]
pub enum NodeKind {
    Shape,
    Group,
    Connector(ConnectorKind),
    Graphic(Arc<Graphic>),
    Polyline,
    /// Embedded object created from an OLE picture shape.
    Object {
        storage_name: String,
        object_name: String,
    },
}

/// Connection of one connector end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Connection {
    pub end: ConnectorEnd,
    pub target: NodeId,
    pub glue: GlueRef,
}

#[derive(Debug, Clone)]
pub struct Node {
    pub kind: NodeKind,
    pub shape_type: ShapeType,
    /// Unrotated frame of the node.
    pub logic_rect: Rect,
    /// Counter-clockwise, hundredths of a degree.
    pub rotation: i32,
    pub flip_h: bool,
    pub flip_v: bool,
    /// Path points of connectors and polylines.
    pub points: Vec<Point>,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub attributes: Option<AttributeSet>,
    pub metadata: ShapeMetadata,
    pub text: Option<TextContent>,
    pub glue_points: Vec<GluePoint>,
    pub connections: Vec<Connection>,
}

impl Node {
    fn new(kind: NodeKind, shape_type: ShapeType, logic_rect: Rect) -> Self {
        Self {
            kind,
            shape_type,
            logic_rect,
            rotation: 0,
            flip_h: false,
            flip_v: false,
            points: Vec::new(),
            parent: None,
            children: Vec::new(),
            attributes: None,
            metadata: ShapeMetadata::default(),
            text: None,
            glue_points: Vec::new(),
            connections: Vec::new(),
        }
    }

    #[inline]
    pub fn is_group(&self) -> bool {
        matches!(self.kind, NodeKind::Group)
    }

    fn is_path(&self) -> bool {
        matches!(self.kind, NodeKind::Connector(_) | NodeKind::Polyline)
    }

    fn rotated_corners(&self) -> [Point; 4] {
        let r = self.logic_rect;
        let c = r.center();
        [r.top_left(), r.top_right(), r.bottom_right(), r.bottom_left()].map(|p| p.rotate(c, self.rotation))
    }
}

/// Arena-backed scene.
pub struct Scene {
    nodes: Vec<Node>,
    texts: Vec<TextContent>,
    palette: Box<dyn ColorPalette>,
    accept_ole: bool,
    /// Every OLE request seen, in order.
    pub ole_requests: Vec<OleRequest>,
    /// Groups in the order they were finished.
    pub finished_groups: Vec<NodeId>,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            texts: Vec::new(),
            palette: Box::new(DefaultPalette::default()),
            accept_ole: false,
            ole_requests: Vec::new(),
            finished_groups: Vec::new(),
        }
    }

    pub fn with_palette(mut self, palette: impl ColorPalette + 'static) -> Self {
        self.palette = Box::new(palette);
        self
    }

    /// Turn OLE requests into object nodes instead of declining them.
    pub fn with_ole_objects(mut self) -> Self {
        self.accept_ole = true;
        self
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0 as usize)
    }

    fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.0 as usize)
    }

    fn push(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    /// Remove `id` and its descendants from their parent. Ids stay valid but
    /// point at detached nodes.
    pub fn detach(&mut self, id: NodeId) {
        let Some(parent) = self.node(id).and_then(|n| n.parent) else {
            return;
        };
        if let Some(p) = self.node_mut(parent) {
            p.children.retain(|&c| c != id);
        }
        if let Some(n) = self.node_mut(id) {
            n.parent = None;
        }
    }

    fn child_ids(&self, id: NodeId) -> Vec<NodeId> {
        self.node(id).map(|n| n.children.clone()).unwrap_or_default()
    }
}

fn mirror_point(p: Point, a: Point, b: Point) -> Point {
    let (dx, dy) = ((b.x - a.x) as f64, (b.y - a.y) as f64);
    let len2 = dx * dx + dy * dy;
    if len2 == 0.0 {
        return p;
    }
    let (px, py) = ((p.x - a.x) as f64, (p.y - a.y) as f64);
    let t = (px * dx + py * dy) / len2;
    let (fx, fy) = (a.x as f64 + t * dx, a.y as f64 + t * dy);
    Point::new((2.0 * fx - p.x as f64).round() as i32, (2.0 * fy - p.y as f64).round() as i32)
}

impl SceneHost for Scene {
    fn palette(&self) -> &dyn ColorPalette {
        self.palette.as_ref()
    }

    fn create_shape(&mut self, shape_type: ShapeType, bounds: Rect) -> NodeId {
        self.push(Node::new(NodeKind::Shape, shape_type, bounds))
    }

    fn create_group(&mut self) -> NodeId {
        self.push(Node::new(NodeKind::Group, ShapeType::NOT_PRIMITIVE, Rect::default()))
    }

    fn create_connector(&mut self, kind: ConnectorKind, start: Point, end: Point) -> NodeId {
        let mut node = Node::new(NodeKind::Connector(kind), ShapeType::STRAIGHT_CONNECTOR, Rect::default());
        node.points = vec![start, end];
        node.logic_rect = Rect::bounding(&node.points).unwrap_or_default();
        self.push(node)
    }

    fn create_graphic(&mut self, graphic: Arc<Graphic>, bounds: Rect) -> NodeId {
        self.push(Node::new(NodeKind::Graphic(graphic), ShapeType::PICTURE_FRAME, bounds))
    }

    fn create_polyline(&mut self, points: &[Point]) -> NodeId {
        let mut node = Node::new(NodeKind::Polyline, ShapeType::LINE, Rect::bounding(points).unwrap_or_default());
        node.points = points.to_vec();
        self.push(node)
    }

    fn append_child(&mut self, group: NodeId, child: NodeId) {
        if group == child || self.node(child).is_none() {
            return;
        }
        match self.node_mut(group) {
            Some(g) if g.is_group() => g.children.push(child),
            _ => {
                warn!("append to non-group node {}", group.0);
                return;
            },
        }
        if let Some(c) = self.node_mut(child) {
            c.parent = Some(group);
        }
    }

    fn set_attributes(&mut self, node: NodeId, attrs: AttributeSet) {
        if let Some(n) = self.node_mut(node) {
            n.attributes = Some(attrs);
        }
    }

    fn set_metadata(&mut self, node: NodeId, metadata: ShapeMetadata) {
        if let Some(n) = self.node_mut(node) {
            n.metadata = metadata;
        }
    }

    fn snap_rect(&self, node: NodeId) -> Option<Rect> {
        let n = self.node(node)?;
        if n.is_group() {
            return n
                .children
                .iter()
                .filter_map(|&c| self.snap_rect(c))
                .reduce(|a, b| a.union(&b))
                .or(Some(n.logic_rect));
        }
        if n.is_path() {
            return Rect::bounding(&n.points);
        }
        if n.rotation == 0 {
            return Some(n.logic_rect);
        }
        Rect::bounding(&n.rotated_corners())
    }

    fn rotate(&mut self, node: NodeId, center: Point, angle: i32) {
        if normalize_angle(angle) == 0 {
            return;
        }
        for child in self.child_ids(node) {
            self.rotate(child, center, angle);
        }
        let Some(n) = self.node_mut(node) else {
            return;
        };
        trace!("rotate node {} by {angle}", node.0);
        for p in &mut n.points {
            *p = p.rotate(center, angle);
        }
        if n.is_path() {
            n.logic_rect = Rect::bounding(&n.points).unwrap_or_default();
            return;
        }
        let c = n.logic_rect.center();
        let moved = c.rotate(center, angle);
        n.logic_rect = n.logic_rect.translate(moved.x - c.x, moved.y - c.y);
        n.rotation = normalize_angle(n.rotation + angle);
    }

    fn mirror(&mut self, node: NodeId, a: Point, b: Point) {
        for child in self.child_ids(node) {
            self.mirror(child, a, b);
        }
        let Some(n) = self.node_mut(node) else {
            return;
        };
        for p in &mut n.points {
            *p = mirror_point(*p, a, b);
        }
        if n.is_path() {
            n.logic_rect = Rect::bounding(&n.points).unwrap_or_default();
            return;
        }
        let c = n.logic_rect.center();
        let moved = mirror_point(c, a, b);
        n.logic_rect = n.logic_rect.translate(moved.x - c.x, moved.y - c.y);
        if a.x == b.x {
            n.flip_h = !n.flip_h;
        } else {
            n.flip_v = !n.flip_v;
        }
        n.rotation = normalize_angle(-n.rotation);
    }

    fn glue_point_count(&self, node: NodeId) -> usize {
        self.node(node).map_or(0, |n| n.glue_points.len())
    }

    fn add_glue_point(&mut self, node: NodeId, point: GluePoint) -> u32 {
        match self.node_mut(node) {
            Some(n) => {
                n.glue_points.push(point);
                (n.glue_points.len() - 1) as u32
            },
            None => 0,
        }
    }

    fn outline(&self, node: NodeId) -> Vec<Point> {
        let Some(n) = self.node(node) else {
            return Vec::new();
        };
        if n.is_path() {
            return n.points.clone();
        }
        let geometry = n.attributes.as_ref().and_then(|a| a.geometry.as_ref());
        if let Some(geometry) = geometry
            && let Some(coords) = geometry.path.coordinates.as_deref()
        {
            let vb = geometry.view_box();
            let r = n.logic_rect;
            let map = |v: i32, origin: i32, extent: i32, lo: i32, size: i32| {
                if extent == 0 {
                    lo
                } else {
                    lo + ((v as i64 - origin as i64) * size as i64 / extent as i64) as i32
                }
            };
            let points: Vec<Point> = coords
                .iter()
                .filter_map(|pair| match (pair.first, pair.second) {
                    (Param::Normal(x), Param::Normal(y)) => Some(Point::new(
                        map(x, vb.x, vb.width, r.left, r.width()),
                        map(y, vb.y, vb.height, r.top, r.height()),
                    )),
                    _ => None,
                })
                .collect();
            if !points.is_empty() {
                return points;
            }
        }
        n.rotated_corners().to_vec()
    }

    fn connect(&mut self, connector: NodeId, end: ConnectorEnd, target: NodeId, glue: GlueRef) {
        if self.node(target).is_none() {
            return;
        }
        if let Some(n) = self.node_mut(connector) {
            n.connections.retain(|c| c.end != end);
            n.connections.push(Connection { end, target, glue });
        }
    }

    fn finish_group(&mut self, group: NodeId) {
        if let Some(rect) = self.snap_rect(group)
            && let Some(n) = self.node_mut(group)
        {
            n.logic_rect = rect;
        }
        self.finished_groups.push(group);
    }
}

impl TextEngine for Scene {
    fn create_text(&mut self, content: TextContent) -> TextHandle {
        self.texts.push(content);
        TextHandle((self.texts.len() - 1) as u32)
    }

    fn attach_text(&mut self, node: NodeId, text: TextHandle) {
        let content = self.texts.get(text.0 as usize).cloned();
        if let Some(n) = self.node_mut(node) {
            n.text = content;
        }
    }
}

impl EmbeddedObjects for Scene {
    fn import_ole(&mut self, request: &OleRequest) -> Option<NodeId> {
        self.ole_requests.push(request.clone());
        if !self.accept_ole {
            return None;
        }
        let kind = NodeKind::Object {
            storage_name: request.storage_name.clone(),
            object_name: request.object_name.clone(),
        };
        Some(self.push(Node::new(kind, ShapeType::HOST_CONTROL, request.bounds)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rotate_swaps_snap_rect() {
        let mut scene = Scene::new();
        let id = scene.create_shape(ShapeType::RECTANGLE, Rect::new(-50, 50, 150, 150));
        scene.rotate(id, Point::new(50, 100), 9000);
        assert_eq!(scene.snap_rect(id), Some(Rect::new(0, 0, 100, 200)));
        assert_eq!(scene.node(id).unwrap().rotation, 9000);
    }

    #[test]
    fn test_mirror_keeps_center() {
        let mut scene = Scene::new();
        let id = scene.create_shape(ShapeType::RECTANGLE, Rect::new(0, 0, 100, 200));
        scene.rotate(id, Point::new(50, 100), 9000);
        scene.mirror(id, Point::new(50, 0), Point::new(50, 1));
        let n = scene.node(id).unwrap();
        assert!(n.flip_h);
        assert_eq!(n.rotation, 27000);
        assert_eq!(n.logic_rect.center(), Point::new(50, 100));
    }

    #[test]
    fn test_group_rotation_moves_children() {
        let mut scene = Scene::new();
        let group = scene.create_group();
        let a = scene.create_shape(ShapeType::RECTANGLE, Rect::new(0, 0, 10, 10));
        let line = scene.create_polyline(&[Point::new(0, 0), Point::new(20, 0)]);
        scene.append_child(group, a);
        scene.append_child(group, line);
        scene.rotate(group, Point::new(0, 0), 18000);
        assert_eq!(scene.node(a).unwrap().logic_rect, Rect::new(-10, -10, 0, 0));
        assert_eq!(scene.node(line).unwrap().points[1], Point::new(-20, 0));
        assert_eq!(scene.snap_rect(group), Some(Rect::new(-20, -10, 0, 0)));
    }

    #[test]
    fn test_text_and_ole() {
        let mut scene = Scene::new();
        let id = scene.create_shape(ShapeType::TEXT_BOX, Rect::new(0, 0, 10, 10));
        let handle = scene.create_text(TextContent::from_plain("hi"));
        scene.attach_text(id, handle);
        assert_eq!(scene.node(id).unwrap().text.as_ref().unwrap().plain_text(), "hi");

        let request = OleRequest {
            storage_name: "MBD0001".into(),
            object_name: "Object 1".into(),
            preview: Arc::new(Graphic::empty()),
            bounds: Rect::new(0, 0, 5, 5),
        };
        assert!(scene.import_ole(&request).is_none());
        let mut scene = Scene::new().with_ole_objects();
        let obj = scene.import_ole(&request).unwrap();
        assert!(matches!(scene.node(obj).unwrap().kind, NodeKind::Object { .. }));
    }
}

//! Shape import: shape and group containers into host nodes.
//!
//! [`ShapeImporter`] walks one shape tree depth first. For every shape
//! container it reads the descriptor, the property tables (with the master
//! shape's table underneath), the anchor and the text, decides what kind of
//! node the shape becomes and hands the result to the host. Groups are
//! imported into the frame their children's anchors span, then turned and
//! mirrored as a whole.
//!
//! # Architecture
//!
//! - `descriptor`: the `Sp` atom and the records of one shape container
//! - `anchor`: group frames and the quarter-turn rectangle swap
//! - `text`: client text boxes and fontwork strings
//! - `metro`: the spreadsheet upright-text flag
//! - `order`: shape id to node bookkeeping
//! - `connector`: solver rules and glue points

pub mod anchor;
pub mod connector;
pub mod descriptor;
pub mod metro;
pub mod order;
pub mod text;

pub use anchor::GroupFrame;
pub use connector::{ConnectorRule, apply_rules, read_solver};
pub use descriptor::{ShapeDescriptor, ShapeRecords};
pub use order::{GlueModel, ShapeOrder, ShapeOrderEntry};

use crate::attrs::{AttributeSet, FillStyle, StyleContext};
use crate::color::ColorResolver;
use crate::common::{Point, Rect};
use crate::escher::properties::{PropertyId, PropertySet, bits};
use crate::escher::record::{ByteCursor, RecordHeader};
use crate::escher::shape_type::ShapeType;
use crate::escher::types::{RecordType, ShapeFlags};
use crate::geometry::{CustomShapeGeometry, FormulaFormatter, correct_arc};
use crate::host::{ConnectorKind, Host, NodeId, OleRequest, ShapeMetadata, TextContent};
use crate::images::{BlipSource, Graphic, PictureAdjustments};
use crate::options::ImportOptions;
use crate::scale::{UnitScaler, fixed_angle_to_hundredths};
use log::{debug, trace, warn};
use std::collections::HashMap;
use std::sync::Arc;

/// Shape id to the offset of its shape container.
pub type ShapeIndex = HashMap<u32, u64>;

/// Connection-site kind with explicit sites.
const CXK_CUSTOM: u32 = 2;

/// Length of the helper segment that defines a mirror axis.
const MIRROR_SPAN: i32 = 1000;

/// State shared by every shape of one import.
#[derive(Debug, Default)]
pub struct ImportSession {
    pub order: ShapeOrder,
    objects: u32,
}

impl ImportSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next embedded-object name, unique within the session.
    pub fn next_object_name(&mut self) -> String {
        self.objects += 1;
        format!("Object {}", self.objects)
    }
}

/// What kind of node a shape becomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ShapeKind {
    Graphic,
    Connector,
    Line,
    Custom,
    Plain,
}

impl ShapeKind {
    fn classify(shape_type: ShapeType, props: &PropertySet<'_>) -> Self {
        let picture = [PropertyId::Pib, PropertyId::PibName, PropertyId::PibFlags];
        if picture.iter().any(|&id| props.contains(id)) {
            Self::Graphic
        } else if shape_type.is_connector() {
            Self::Connector
        } else if shape_type == ShapeType::LINE
            && !props.flag_or(PropertyId::ThreeDObjectBooleans, bits::THREE_D, false)
        {
            Self::Line
        } else if shape_type.is_custom_shape() || props.contains(PropertyId::Vertices) {
            Self::Custom
        } else {
            Self::Plain
        }
    }
}

/// Imports shape trees of one drawing into a host.
pub struct ShapeImporter<'a, 'data, H: Host + ?Sized> {
    cursor: ByteCursor<'data>,
    host: &'a mut H,
    blips: &'a mut dyn BlipSource,
    session: &'a mut ImportSession,
    options: &'a ImportOptions,
    shapes: Option<&'a ShapeIndex>,
    scaler: UnitScaler,
    /// Groups being imported, outermost first.
    pending: Vec<NodeId>,
}

impl<'a, 'data, H: Host + ?Sized> ShapeImporter<'a, 'data, H> {
    pub fn new(
        data: &'data [u8],
        host: &'a mut H,
        blips: &'a mut dyn BlipSource,
        session: &'a mut ImportSession,
        options: &'a ImportOptions,
    ) -> Self {
        Self {
            cursor: ByteCursor::new(data).with_max_record_length(options.max_record_length),
            host,
            blips,
            session,
            options,
            shapes: None,
            scaler: options.scaler(),
            pending: Vec::new(),
        }
    }

    /// Shape index used to find master shapes.
    pub fn with_shape_index(mut self, shapes: &'a ShapeIndex) -> Self {
        self.shapes = Some(shapes);
        self
    }

    /// Import the shape or group container whose header starts at `offset`.
    pub fn import_at(&mut self, offset: u64) -> Option<NodeId> {
        if !self.cursor.seek(offset) {
            warn!("shape container offset {offset} out of range");
            return None;
        }
        match self.cursor.read_header() {
            Ok(header) => self.import(&header),
            Err(e) => {
                warn!("unreadable shape container at {offset}: {e}");
                None
            },
        }
    }

    /// Import one container outside of any group.
    pub fn import(&mut self, container: &RecordHeader) -> Option<NodeId> {
        self.import_container(container, None, 0)
    }

    fn import_container(
        &mut self,
        container: &RecordHeader,
        frame: Option<GroupFrame>,
        depth: usize,
    ) -> Option<NodeId> {
        if depth > self.options.max_depth {
            warn!(
                "container at {} nested deeper than {}, skipped",
                container.begin, self.options.max_depth
            );
            return None;
        }
        match container.record_type() {
            RecordType::SpgrContainer => self.import_group(container, frame, depth),
            RecordType::SpContainer => self.import_shape(container, frame),
            _ => {
                trace!("skipping {:#06x} in shape tree", container.rec_type);
                None
            },
        }
    }

    fn import_group(&mut self, container: &RecordHeader, frame: Option<GroupFrame>, depth: usize) -> Option<NodeId> {
        let first = self.cursor.children(container).next();
        let Some(first) = first.filter(|h| h.record_type() == RecordType::SpContainer) else {
            warn!("group at {} does not start with its descriptor", container.begin);
            return None;
        };
        let records = ShapeRecords::read(&mut self.cursor, &first);
        let descriptor = records.descriptor;
        let props = self.properties(&records);
        let rotation = fixed_angle_to_hundredths(props.get_i32(PropertyId::Rotation, 0));

        let logic = self
            .anchor(&records, frame.as_ref())
            .map(|a| anchor::logic_rect(a, rotation));
        let source = anchor::children_anchor(&self.cursor, container)
            .or_else(|| records.group_frame(&self.cursor).map(Rect::normalized));
        let child_frame = match (source, logic) {
            (Some(source), Some(target)) => Some(GroupFrame::new(source, target)),
            _ => frame,
        };

        let group = self.host.create_group();
        self.pending.push(group);
        debug!("group {} at depth {depth}, logic rect {logic:?}", descriptor.id);

        for child in self.cursor.children(container).skip(1) {
            if let Some(node) = self.import_container(&child, child_frame, depth + 1) {
                self.host.append_child(group, node);
            }
        }

        let pivot = logic
            .or_else(|| self.host.snap_rect(group))
            .map(|r| r.center());
        if let Some(pivot) = pivot {
            self.transform(group, pivot, rotation, descriptor.flip_h(), descriptor.flip_v());
        }
        self.apply_metadata(group, &props);
        if descriptor.id != 0 {
            let mut entry = ShapeOrderEntry::new(descriptor.id, group, descriptor.shape_type);
            entry.flip_h = descriptor.flip_h();
            entry.flip_v = descriptor.flip_v();
            self.session.order.insert(entry);
        }

        self.pending.pop();
        self.host.finish_group(group);
        Some(group)
    }

    fn import_shape(&mut self, container: &RecordHeader, frame: Option<GroupFrame>) -> Option<NodeId> {
        let records = ShapeRecords::read(&mut self.cursor, container);
        let descriptor = records.descriptor;
        if descriptor.flags.intersects(ShapeFlags::PATRIARCH | ShapeFlags::GROUP) {
            trace!("shape {} is a group descriptor, nothing to draw", descriptor.id);
            return None;
        }

        let props = self.properties(&records);
        let secondary = records.secondary_properties(&self.cursor);
        let shape_type = descriptor.shape_type;
        let (flip_h, flip_v) = (descriptor.flip_h(), descriptor.flip_v());
        let anchor = if descriptor.flags.contains(ShapeFlags::BACKGROUND) {
            Rect::new(0, 0, 1, 1)
        } else {
            self.anchor(&records, frame.as_ref()).unwrap_or_default()
        };
        let rotation = fixed_angle_to_hundredths(props.get_i32(PropertyId::Rotation, 0));
        let mut bounds = anchor::logic_rect(anchor, rotation);
        let kind = ShapeKind::classify(shape_type, &props);
        trace!("shape {} as {kind:?}, bounds {bounds:?}, rotation {rotation}", descriptor.id);

        let (mut attrs, adjustments) = {
            let colors = ColorResolver::new(self.host.palette());
            let ctx = StyleContext {
                props: &props,
                secondary: secondary.as_ref(),
                colors,
                scaler: &self.scaler,
                shape_type,
                rotation,
                bounds,
                flip_h,
                flip_v,
            };
            let mut attrs = AttributeSet::build(&ctx, &mut *self.blips);
            let mut adjustments = None;
            match kind {
                ShapeKind::Graphic => {
                    if !props.is_flag_hard_set(PropertyId::FillStyleBooleans, bits::FILLED) {
                        attrs.fill = FillStyle::None;
                    }
                    attrs.text_frame = None;
                    adjustments = Some(PictureAdjustments::from_properties(&props, &ctx.colors));
                },
                ShapeKind::Custom => attrs.geometry = CustomShapeGeometry::build(&ctx, &FormulaFormatter),
                _ => {},
            }
            (attrs, adjustments)
        };

        if shape_type == ShapeType::ARC
            && let Some(geometry) = attrs.geometry.as_mut()
        {
            let corrected = correct_arc(geometry, bounds, rotation, flip_h, flip_v, !self.options.slide_import);
            bounds = corrected.bounds;
        }
        if self.options.excel_text_rotation && rotation != 0 && is_upright(&props, secondary.as_ref()) {
            debug!("shape {} keeps its text upright", descriptor.id);
            if let Some(text_frame) = attrs.text_frame.as_mut() {
                text_frame.rotate_with_shape = false;
            }
            if let Some(geometry) = attrs.geometry.as_mut() {
                let angle = geometry.text_rotate_angle.unwrap_or(0.0) - rotation as f64 / 100.0;
                geometry.text_rotate_angle = Some(angle);
            }
        }
        let sites = attrs
            .geometry
            .as_ref()
            .and_then(|g| g.path.glue_points.as_ref())
            .map_or(0, Vec::len);

        let node = match kind {
            ShapeKind::Graphic => {
                let adjustments = adjustments.unwrap_or_default();
                let (node, remaining) = self.create_graphic(&props, bounds, adjustments);
                attrs.picture = Some(remaining);
                node
            },
            ShapeKind::Connector => {
                let (start, end) = connector_points(bounds, rotation, flip_h, flip_v);
                self.host
                    .create_connector(ConnectorKind::for_shape_type(shape_type), start, end)
            },
            ShapeKind::Line => self
                .host
                .create_polyline(&[bounds.top_left(), bounds.bottom_right()]),
            ShapeKind::Custom | ShapeKind::Plain => self.host.create_shape(shape_type, bounds),
        };
        self.host.set_attributes(node, attrs);

        let fontwork = (kind == ShapeKind::Custom)
            .then(|| text::fontwork_text(&props))
            .flatten();
        let content = fontwork.or_else(|| {
            let raw = records
                .client_text
                .and_then(|h| text::client_text(&self.cursor, &h))?;
            let mut content = TextContent::from_plain(&raw);
            content.paragraphs = text::paragraphs(&raw, text::shape_direction(&props));
            Some(content)
        });
        if let Some(content) = content {
            let handle = self.host.create_text(content);
            self.host.attach_text(node, handle);
        }
        self.apply_metadata(node, &props);

        if kind != ShapeKind::Connector {
            self.transform(node, bounds.center(), rotation, flip_h, flip_v);
        }

        if descriptor.id != 0 {
            let mut entry = ShapeOrderEntry::new(descriptor.id, node, shape_type);
            entry.text_id = props.get(PropertyId::TextId, 0);
            entry.flip_h = flip_h;
            entry.flip_v = flip_v;
            entry.glue = glue_model(kind, shape_type, &props, sites);
            entry.is_connector = kind == ShapeKind::Connector;
            self.session.order.insert(entry);
        }
        Some(node)
    }

    /// Picture node of a graphic shape, or the embedded object behind it.
    /// Returns the adjustments still to be applied by the host.
    fn create_graphic(
        &mut self,
        props: &PropertySet<'data>,
        bounds: Rect,
        adjustments: PictureAdjustments,
    ) -> (NodeId, PictureAdjustments) {
        let blip = props.blip_index(PropertyId::Pib);
        let mut graphic = blip.and_then(|i| self.blips.blip(i)).unwrap_or_else(|| {
            warn!("picture shape without a usable blip ({blip:?}), using a placeholder");
            Arc::new(Graphic::empty())
        });
        let group = self.pending.last().copied();
        let rasterize_crop = group.is_some() || !self.options.declarative_crop;
        trace!("picture {blip:?} in group {group:?}, rasterized crop {rasterize_crop}");
        let remaining = if adjustments.is_identity() || graphic.is_empty() {
            adjustments
        } else {
            adjustments.apply(Arc::make_mut(&mut graphic), rasterize_crop)
        };

        if self.options.import_ole && props.contains(PropertyId::PictureId) {
            let request = OleRequest {
                storage_name: format!("MBD{:08X}", props.get(PropertyId::PictureId, 0)),
                object_name: self.session.next_object_name(),
                preview: Arc::clone(&graphic),
                bounds,
            };
            if let Some(node) = self.host.import_ole(&request) {
                debug!("embedded object {} from {}", request.object_name, request.storage_name);
                return (node, remaining);
            }
        }
        (self.host.create_graphic(graphic, bounds), remaining)
    }

    /// Primary property table with the master shape's table underneath.
    fn properties(&self, records: &ShapeRecords) -> PropertySet<'data> {
        let mut props = records.properties(&self.cursor);
        let has_master = records.descriptor.flags.contains(ShapeFlags::HAVE_MASTER)
            || props.contains(PropertyId::ShapeMaster);
        if has_master && let Some(master) = self.master_properties(props.get(PropertyId::ShapeMaster, 0), records) {
            props.overlay_master(&master);
        }
        props
    }

    fn master_properties(&self, master_id: u32, records: &ShapeRecords) -> Option<PropertySet<'data>> {
        if master_id == 0 || master_id == records.descriptor.id {
            return None;
        }
        let Some(&offset) = self.shapes.and_then(|s| s.get(&master_id)) else {
            debug!("master shape {master_id} of shape {} not found", records.descriptor.id);
            return None;
        };
        let mut cursor = self.cursor.clone();
        if !cursor.seek(offset) {
            return None;
        }
        let header = cursor.read_header().ok()?;
        if header.record_type() != RecordType::SpContainer {
            return None;
        }
        let master = ShapeRecords::read(&mut cursor, &header);
        trace!("shape {} inherits from master {master_id}", records.descriptor.id);
        Some(master.properties(&cursor))
    }

    /// Logical anchor of a shape: a child anchor mapped through the group
    /// frame, or a client anchor through the scaler.
    fn anchor(&self, records: &ShapeRecords, frame: Option<&GroupFrame>) -> Option<Rect> {
        let child = || records.child_anchor(&self.cursor).map(Rect::normalized);
        let client = || {
            records
                .client_anchor(&self.cursor)
                .map(|r| self.scaler.scale_rect(r.normalized()))
        };
        match frame {
            Some(frame) => child().map(|r| frame.map(r)).or_else(client),
            None => client().or_else(|| child().map(|r| self.scaler.scale_rect(r))),
        }
    }

    /// Rotate about `pivot`, then mirror vertically and horizontally.
    fn transform(&mut self, node: NodeId, pivot: Point, rotation: i32, flip_h: bool, flip_v: bool) {
        if rotation != 0 {
            self.host.rotate(node, pivot, rotation);
        }
        if flip_v {
            let b = Point::new(pivot.x.saturating_add(MIRROR_SPAN), pivot.y);
            self.host.mirror(node, pivot, b);
        }
        if flip_h {
            let b = Point::new(pivot.x, pivot.y.saturating_add(MIRROR_SPAN));
            self.host.mirror(node, pivot, b);
        }
    }

    fn apply_metadata(&mut self, node: NodeId, props: &PropertySet<'_>) {
        let metadata = ShapeMetadata {
            name: props.string(PropertyId::GroupName),
            description: props.string(PropertyId::Description),
            visible: !props.flag_or(PropertyId::GroupBooleans, bits::HIDDEN, false),
            printable: props.flag_or(PropertyId::GroupBooleans, bits::PRINT, true),
        };
        if metadata != ShapeMetadata::default() {
            self.host.set_metadata(node, metadata);
        }
    }
}

/// End points of a connector: the frame's corners, swapped by the flips and
/// turned about the frame center.
fn connector_points(bounds: Rect, rotation: i32, flip_h: bool, flip_v: bool) -> (Point, Point) {
    let (mut start, mut end) = (bounds.top_left(), bounds.bottom_right());
    if flip_h {
        std::mem::swap(&mut start.x, &mut end.x);
    }
    if flip_v {
        std::mem::swap(&mut start.y, &mut end.y);
    }
    if rotation != 0 {
        let center = bounds.center();
        start = start.rotate(center, rotation);
        end = end.rotate(center, rotation);
    }
    (start, end)
}

fn glue_model(kind: ShapeKind, shape_type: ShapeType, props: &PropertySet<'_>, sites: usize) -> GlueModel {
    match kind {
        ShapeKind::Line => GlueModel::Polygon,
        ShapeKind::Custom if shape_type == ShapeType::NOT_PRIMITIVE => GlueModel::Polygon,
        ShapeKind::Custom if props.contains(PropertyId::Cxk) => GlueModel::Custom {
            kind: props.get(PropertyId::Cxk, 0),
            sites,
        },
        ShapeKind::Custom if sites > 0 => GlueModel::Custom { kind: CXK_CUSTOM, sites },
        _ => GlueModel::Rect,
    }
}

/// Spreadsheet upright flag from the metro blob, secondary table first.
fn is_upright(props: &PropertySet<'_>, secondary: Option<&PropertySet<'_>>) -> bool {
    let blob = secondary
        .and_then(|s| s.complex(PropertyId::MetroBlob))
        .or_else(|| props.complex(PropertyId::MetroBlob));
    match blob.map(metro::is_upright) {
        Some(Ok(upright)) => upright,
        Some(Err(e)) => {
            debug!("unreadable metro blob: {e}");
            false
        },
        None => false,
    }
}

//! Drawing-level driver.
//!
//! [`DrawingScanner`] makes one pass over a drawing stream before anything
//! is imported. The pass reads the drawing group (id clusters and the blip
//! store), every drawing's `Dg` atom, and the offset of every shape
//! container. Imports then resolve master shapes and `get_shape_by_id`
//! through that index instead of searching the stream.
//!
//! # Examples
//!
//! ```rust,no_run
//! use dff_import::{DrawingScanner, ImportOptions, Scene};
//!
//! # fn run(stream: &[u8]) {
//! let mut scanner = DrawingScanner::new(stream, ImportOptions::default());
//! let mut scene = Scene::new();
//! let pages: Vec<u64> = scanner.drawings().iter().map(|d| d.offset).collect();
//! for page in pages {
//!     let result = scanner.import_all(&mut scene, page, None);
//!     println!("{} shapes, {:?}", result.roots.len(), result.status);
//! }
//! # }
//! ```

use crate::common::binary::read_u32_le;
use crate::common::{Error, Result};
use crate::escher::record::{ByteCursor, RecordHeader};
use crate::escher::shape_type::ShapeType;
use crate::escher::properties::PropertyId;
use crate::escher::types::RecordType;
use crate::host::{Host, NodeId};
use crate::images::{BlipStore, Graphic};
use crate::import::{ImportSession, ShapeImporter, ShapeIndex, ShapeOrder, ShapeRecords, apply_rules, read_solver};
use crate::options::ImportOptions;
use log::{debug, trace, warn};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Shapes used by one drawing, from an `FIDCL` pair of the `Dgg` atom.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdCluster {
    pub drawing: u32,
    pub shapes_used: u32,
}

/// Document-wide drawing statistics from the `Dgg` atom.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DrawingGroup {
    pub max_shape_id: u32,
    pub shapes_saved: u32,
    pub drawings_saved: u32,
    pub clusters: Vec<IdCluster>,
}

impl DrawingGroup {
    pub fn parse(data: &[u8]) -> Option<Self> {
        let v = |i: usize| read_u32_le(data, i * 4).ok();
        let cluster_count = v(1)? as usize;
        let clusters = (0..cluster_count.saturating_sub(1))
            .map_while(|i| {
                Some(IdCluster {
                    drawing: v(4 + i * 2)?,
                    shapes_used: v(5 + i * 2)?,
                })
            })
            .collect();
        Some(Self {
            max_shape_id: v(0)?,
            shapes_saved: v(2)?,
            drawings_saved: v(3)?,
            clusters,
        })
    }
}

/// One drawing (page) container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Drawing {
    /// Drawing id from the `Dg` instance.
    pub id: u16,
    pub shape_count: u32,
    pub last_shape_id: u32,
    /// Offset of the `DgContainer` header.
    pub offset: u64,
}

/// Prescan record of one shape container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShapeInfo {
    pub offset: u64,
    pub shape_id: u32,
    /// Text story id, 0 when the shape carries no text.
    pub text_id: u32,
    /// A plain text rectangle the host may turn into a native text frame.
    pub replaceable: bool,
}

#[derive(Debug)]
pub enum ImportStatus {
    Complete,
    /// Stopped between two top-level shapes at the caller's request.
    Cancelled,
    /// The stream broke off; the roots imported before are kept.
    Partial(Error),
}

#[derive(Debug)]
pub struct ImportResult {
    pub roots: Vec<NodeId>,
    pub status: ImportStatus,
}

impl ImportResult {
    fn failed(error: Error) -> Self {
        Self {
            roots: Vec::new(),
            status: ImportStatus::Partial(error),
        }
    }

    #[inline]
    pub fn is_complete(&self) -> bool {
        matches!(self.status, ImportStatus::Complete)
    }
}

pub struct DrawingScanner<'data> {
    data: &'data [u8],
    options: ImportOptions,
    group: Option<DrawingGroup>,
    drawings: Vec<Drawing>,
    /// Sorted by shape id.
    shapes: Vec<ShapeInfo>,
    offsets: ShapeIndex,
    blips: BlipStore<'data>,
    session: ImportSession,
}

impl<'data> DrawingScanner<'data> {
    /// Scan the top-level records of `data`.
    pub fn new(data: &'data [u8], options: ImportOptions) -> Self {
        let blips = BlipStore::new(data)
            .with_capacity(options.blip_cache_capacity)
            .with_max_record_length(options.max_record_length);
        let mut scanner = Self {
            data,
            options,
            group: None,
            drawings: Vec::new(),
            shapes: Vec::new(),
            offsets: ShapeIndex::new(),
            blips,
            session: ImportSession::new(),
        };
        scanner.scan();
        scanner
    }

    /// Stream the blip store's delay offsets point into.
    pub fn with_delay_stream(mut self, delay: &'data [u8]) -> Self {
        self.blips = self.blips.with_delay_stream(delay);
        self
    }

    fn scan(&mut self) {
        let mut cursor = ByteCursor::new(self.data).with_max_record_length(self.options.max_record_length);
        while cursor.remaining() > 0 {
            let header = match cursor.read_header() {
                Ok(h) => h,
                Err(e) => {
                    warn!("drawing stream scan stopped at {}: {e}", cursor.position());
                    break;
                },
            };
            match header.record_type() {
                RecordType::DggContainer => self.scan_drawing_group(&cursor, &header),
                RecordType::DgContainer => self.scan_drawing(&cursor, &header),
                _ => trace!("skipping top-level {:#06x}", header.rec_type),
            }
            if !cursor.seek_to_end(&header) {
                break;
            }
        }
        self.shapes.sort_by_key(|s| s.shape_id);
        debug!(
            "scanned {} drawings, {} shapes, {} pictures",
            self.drawings.len(),
            self.shapes.len(),
            self.blips.len()
        );
    }

    fn scan_drawing_group(&mut self, cursor: &ByteCursor<'data>, container: &RecordHeader) {
        for child in cursor.children(container) {
            match child.record_type() {
                RecordType::Dgg => {
                    self.group = DrawingGroup::parse(cursor.content(&child));
                    if self.group.is_none() {
                        warn!("short drawing group atom at {}", child.begin);
                    }
                },
                RecordType::BStoreContainer => {
                    let added = self.blips.read_container(cursor, &child);
                    debug!("blip store with {added} entries");
                },
                _ => {},
            }
        }
    }

    fn scan_drawing(&mut self, cursor: &ByteCursor<'data>, container: &RecordHeader) {
        let mut drawing = Drawing {
            id: 0,
            shape_count: 0,
            last_shape_id: 0,
            offset: container.begin,
        };
        for child in cursor.children(container) {
            match child.record_type() {
                RecordType::Dg => {
                    let data = cursor.content(&child);
                    drawing.id = child.instance;
                    drawing.shape_count = read_u32_le(data, 0).unwrap_or(0);
                    drawing.last_shape_id = read_u32_le(data, 4).unwrap_or(0);
                },
                RecordType::SpgrContainer | RecordType::SpContainer => self.index_shapes(cursor, &child, 0),
                _ => {},
            }
        }
        self.drawings.push(drawing);
    }

    fn index_shapes(&mut self, cursor: &ByteCursor<'data>, container: &RecordHeader, depth: usize) {
        match container.record_type() {
            RecordType::SpContainer => {
                let records = ShapeRecords::read(&mut cursor.clone(), container);
                let props = records.properties(cursor);
                let shape_type = records.descriptor.shape_type;
                let text_id = props.get(PropertyId::TextId, 0);
                let info = ShapeInfo {
                    offset: container.begin,
                    shape_id: records.descriptor.id,
                    text_id,
                    replaceable: text_id != 0
                        && (shape_type == ShapeType::TEXT_BOX || shape_type == ShapeType::RECTANGLE)
                        && props.get(PropertyId::Rotation, 0) == 0,
                };
                if info.shape_id != 0 {
                    self.offsets.insert(info.shape_id, info.offset);
                    self.shapes.push(info);
                }
            },
            RecordType::SpgrContainer if depth <= self.options.max_depth => {
                for child in cursor.children(container) {
                    self.index_shapes(cursor, &child, depth + 1);
                }
            },
            RecordType::SpgrContainer => warn!("shape index stops at depth {depth}"),
            _ => {},
        }
    }

    pub fn drawing_group(&self) -> Option<&DrawingGroup> {
        self.group.as_ref()
    }

    pub fn drawings(&self) -> &[Drawing] {
        &self.drawings
    }

    /// Prescan records, sorted by shape id.
    pub fn shapes(&self) -> &[ShapeInfo] {
        &self.shapes
    }

    pub fn shape_info(&self, shape_id: u32) -> Option<&ShapeInfo> {
        self.shapes
            .binary_search_by_key(&shape_id, |s| s.shape_id)
            .ok()
            .map(|i| &self.shapes[i])
    }

    /// Shapes with text, in text story order.
    pub fn text_order(&self) -> Vec<&ShapeInfo> {
        let mut stories: Vec<_> = self.shapes.iter().filter(|s| s.text_id != 0).collect();
        stories.sort_by_key(|s| (s.text_id, s.shape_id));
        stories
    }

    pub fn blip_store(&self) -> &BlipStore<'data> {
        &self.blips
    }

    /// Shapes imported so far.
    pub fn order(&self) -> &ShapeOrder {
        &self.session.order
    }

    /// Import every shape of the drawing container at `page_offset` and glue
    /// its connectors. `cancel` is checked between top-level shapes.
    pub fn import_all<H: Host + ?Sized>(
        &mut self,
        host: &mut H,
        page_offset: u64,
        cancel: Option<&AtomicBool>,
    ) -> ImportResult {
        let mut cursor = ByteCursor::new(self.data).with_max_record_length(self.options.max_record_length);
        if !cursor.seek(page_offset) {
            return ImportResult::failed(Error::NotFound(format!("drawing at {page_offset}")));
        }
        let page = match cursor.read_header() {
            Ok(h) => h,
            Err(e) => return ImportResult::failed(e),
        };
        if page.record_type() != RecordType::DgContainer {
            return ImportResult::failed(Error::ParseError(format!(
                "record {:#06x} at {page_offset} is not a drawing",
                page.rec_type
            )));
        }

        let cancelled = || cancel.is_some_and(|c| c.load(Ordering::Relaxed));
        let mut roots = Vec::new();
        let mut rules = Vec::new();
        let mut status = ImportStatus::Complete;
        {
            let mut importer = ShapeImporter::new(self.data, &mut *host, &mut self.blips, &mut self.session, &self.options)
                .with_shape_index(&self.offsets);
            'page: for child in cursor.children(&page) {
                match child.record_type() {
                    RecordType::SpgrContainer => {
                        // the first child describes the patriarch itself
                        for shape in cursor.children(&child).skip(1) {
                            if cancelled() {
                                status = ImportStatus::Cancelled;
                                break 'page;
                            }
                            roots.extend(importer.import(&shape));
                        }
                    },
                    RecordType::SpContainer => {
                        if cancelled() {
                            status = ImportStatus::Cancelled;
                            break 'page;
                        }
                        roots.extend(importer.import(&child));
                    },
                    RecordType::SolverContainer => rules.extend(read_solver(&cursor, &child)),
                    _ => trace!("skipping {:#06x} in drawing", child.rec_type),
                }
            }
        }

        if matches!(status, ImportStatus::Cancelled) {
            debug!("import of drawing at {page_offset} cancelled after {} shapes", roots.len());
            return ImportResult { roots, status };
        }
        let glued = apply_rules(host, &self.session.order, &rules);
        debug!("drawing at {page_offset}: {} roots, {glued} connector ends glued", roots.len());
        if page.is_truncated() {
            status = ImportStatus::Partial(Error::Truncated {
                offset: page.begin,
                needed: page.length as u64,
                available: page.end.saturating_sub(page.content_begin()),
            });
        }
        ImportResult { roots, status }
    }

    /// Node of shape `shape_id`, imported on demand when it was not yet.
    pub fn get_shape_by_id<H: Host + ?Sized>(&mut self, host: &mut H, shape_id: u32) -> Result<NodeId> {
        if let Some(node) = self.session.order.node(shape_id) {
            return Ok(node);
        }
        let offset = self
            .shape_info(shape_id)
            .map(|s| s.offset)
            .ok_or_else(|| Error::NotFound(format!("shape {shape_id}")))?;
        ShapeImporter::new(self.data, host, &mut self.blips, &mut self.session, &self.options)
            .with_shape_index(&self.offsets)
            .import_at(offset)
            .ok_or_else(|| Error::NotFound(format!("shape {shape_id} has nothing to draw")))
    }

    /// Decoded picture for a 1-based blip store index.
    pub fn get_blip(&mut self, index: u32) -> Result<Arc<Graphic>> {
        self.blips.get(index)
    }

    /// Forget `node`; returns the number of shape entries that referred to it.
    pub fn notify_node_freed(&mut self, node: NodeId) -> usize {
        self.session.order.notify_freed(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::escher::types::ShapeFlags;
    use crate::escher::writer::RecordBuilder;
    use crate::host::{GlueRef, Scene, StandardGlue};
    use crate::common::MapUnit;

    fn options() -> ImportOptions {
        ImportOptions::new()
            .with_map_unit(MapUnit::Emu)
            .with_source_units_per_inch(914_400)
    }

    fn shape(b: &mut RecordBuilder, shape_type: ShapeType, id: u32, flags: ShapeFlags, anchor: [i32; 4]) {
        b.container(RecordType::SpContainer, |b| {
            b.shape(shape_type.raw(), id, flags | ShapeFlags::HAVE_ANCHOR);
            b.client_anchor(anchor[0], anchor[1], anchor[2], anchor[3]);
        });
    }

    fn drawing() -> Vec<u8> {
        let mut b = RecordBuilder::new();
        b.container(RecordType::DggContainer, |b| {
            let dgg: Vec<u8> = [1027u32, 2, 3, 1, 1, 4].iter().flat_map(|v| v.to_le_bytes()).collect();
            b.atom(0, 0, RecordType::Dgg.into(), &dgg);
        });
        b.begin_container_with_instance(RecordType::DgContainer, 0);
        let dg: Vec<u8> = [3u32, 1027].iter().flat_map(|v| v.to_le_bytes()).collect();
        b.atom(0, 1, RecordType::Dg.into(), &dg);
        b.container(RecordType::SpgrContainer, |b| {
            b.container(RecordType::SpContainer, |b| {
                b.shape(0, 1024, ShapeFlags::GROUP | ShapeFlags::PATRIARCH);
                b.spgr(0, 0, 0, 0);
            });
            shape(b, ShapeType::RECTANGLE, 1025, ShapeFlags::empty(), [0, 0, 100, 100]);
            shape(b, ShapeType::ELLIPSE, 1026, ShapeFlags::empty(), [300, 0, 400, 100]);
            shape(b, ShapeType::STRAIGHT_CONNECTOR, 1027, ShapeFlags::CONNECTOR, [100, 50, 300, 50]);
        });
        b.container(RecordType::SolverContainer, |b| {
            let rule: Vec<u8> = [1u32, 1025, 1026, 1027, 3, 1].iter().flat_map(|v| v.to_le_bytes()).collect();
            b.atom(1, 0, RecordType::ConnectorRule.into(), &rule);
        });
        b.end_container();
        b.into_bytes()
    }

    #[test]
    fn test_prescan() {
        let data = drawing();
        let scanner = DrawingScanner::new(&data, options());
        let group = scanner.drawing_group().unwrap();
        assert_eq!(group.max_shape_id, 1027);
        assert_eq!(group.clusters, vec![IdCluster { drawing: 1, shapes_used: 4 }]);
        assert_eq!(scanner.drawings().len(), 1);
        assert_eq!(scanner.drawings()[0].id, 1);
        assert_eq!(scanner.drawings()[0].shape_count, 3);
        let ids: Vec<u32> = scanner.shapes().iter().map(|s| s.shape_id).collect();
        assert_eq!(ids, [1024, 1025, 1026, 1027]);
        assert!(scanner.shape_info(1026).is_some());
        assert!(scanner.shape_info(9).is_none());
    }

    #[test]
    fn test_import_all_glues_connectors() {
        let data = drawing();
        let mut scanner = DrawingScanner::new(&data, options());
        let mut scene = Scene::new();
        let page = scanner.drawings()[0].offset;
        let result = scanner.import_all(&mut scene, page, None);

        assert!(result.is_complete());
        assert_eq!(result.roots.len(), 3);
        let connector = scanner.get_shape_by_id(&mut scene, 1027).unwrap();
        let conns = &scene.node(connector).unwrap().connections;
        assert_eq!(conns.len(), 2);
        assert_eq!(conns[0].glue, GlueRef::Standard(StandardGlue::Right));
        assert_eq!(conns[1].glue, GlueRef::Standard(StandardGlue::Left));
    }

    #[test]
    fn test_cancel_and_lookup() {
        let data = drawing();
        let mut scanner = DrawingScanner::new(&data, options());
        let mut scene = Scene::new();
        let page = scanner.drawings()[0].offset;
        let cancel = AtomicBool::new(true);
        let result = scanner.import_all(&mut scene, page, Some(&cancel));
        assert!(matches!(result.status, ImportStatus::Cancelled));
        assert!(result.roots.is_empty());

        let node = scanner.get_shape_by_id(&mut scene, 1026).unwrap();
        assert_eq!(scanner.get_shape_by_id(&mut scene, 1026).unwrap(), node);
        assert!(matches!(scanner.get_shape_by_id(&mut scene, 77), Err(Error::NotFound(_))));

        assert_eq!(scanner.notify_node_freed(node), 1);
        assert!(scanner.order().get(1026).unwrap().is_freed());
        assert!(matches!(scanner.get_blip(1), Err(Error::NotFound(_))));
    }

    #[test]
    fn test_bad_page_offset() {
        let data = drawing();
        let mut scanner = DrawingScanner::new(&data, options());
        let mut scene = Scene::new();
        let result = scanner.import_all(&mut scene, 0, None);
        assert!(matches!(result.status, ImportStatus::Partial(Error::ParseError(_))));
    }
}

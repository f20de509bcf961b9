//! Bookkeeping of imported shapes.
//!
//! Entries refer to host nodes by id only. The host owns the nodes and has
//! to report freed ones through [`ShapeOrder::notify_freed`]; a freed entry
//! stays in the table but no longer resolves to a node.

use crate::escher::shape_type::ShapeType;
use crate::host::NodeId;
use std::collections::HashMap;

/// How connectors glue to a shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GlueModel {
    /// Four side midpoints.
    Rect,
    /// Custom geometry with its connection kind and explicit site count.
    Custom { kind: u32, sites: usize },
    /// Polygon-like outline.
    Polygon,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShapeOrderEntry {
    pub shape_id: u32,
    node: Option<NodeId>,
    /// Text id property, used by hosts that sort text boxes into story order.
    pub text_id: u32,
    pub shape_type: ShapeType,
    pub flip_h: bool,
    pub flip_v: bool,
    pub glue: GlueModel,
    pub is_connector: bool,
}

impl ShapeOrderEntry {
    pub fn new(shape_id: u32, node: NodeId, shape_type: ShapeType) -> Self {
        Self {
            shape_id,
            node: Some(node),
            text_id: 0,
            shape_type,
            flip_h: false,
            flip_v: false,
            glue: GlueModel::Rect,
            is_connector: false,
        }
    }

    /// Node of the entry, `None` once the host freed it.
    #[inline]
    pub fn node(&self) -> Option<NodeId> {
        self.node
    }

    #[inline]
    pub fn is_freed(&self) -> bool {
        self.node.is_none()
    }
}

/// Imported shapes in import order, at most one entry per shape id.
#[derive(Debug, Clone, Default)]
pub struct ShapeOrder {
    entries: Vec<ShapeOrderEntry>,
    by_id: HashMap<u32, usize>,
}

impl ShapeOrder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `entry`, replacing an earlier entry with the same shape id.
    pub fn insert(&mut self, entry: ShapeOrderEntry) {
        match self.by_id.get(&entry.shape_id) {
            Some(&i) => self.entries[i] = entry,
            None => {
                self.by_id.insert(entry.shape_id, self.entries.len());
                self.entries.push(entry);
            },
        }
    }

    pub fn get(&self, shape_id: u32) -> Option<&ShapeOrderEntry> {
        self.by_id.get(&shape_id).map(|&i| &self.entries[i])
    }

    /// Live node of `shape_id`.
    pub fn node(&self, shape_id: u32) -> Option<NodeId> {
        self.get(shape_id).and_then(ShapeOrderEntry::node)
    }

    /// Mark every entry pointing at `node` as freed. Returns how many were.
    pub fn notify_freed(&mut self, node: NodeId) -> usize {
        let mut count = 0;
        for entry in self.entries.iter_mut().filter(|e| e.node == Some(node)) {
            entry.node = None;
            count += 1;
        }
        count
    }

    pub fn iter(&self) -> impl Iterator<Item = &ShapeOrderEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

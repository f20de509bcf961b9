//! Connector rules from the solver container and glue-point resolution.

use super::order::{GlueModel, ShapeOrder, ShapeOrderEntry};
use crate::common::binary::read_u32_le;
use crate::common::{PointF, Rect};
use crate::escher::record::{ByteCursor, RecordHeader};
use crate::escher::types::RecordType;
use crate::host::{ConnectorEnd, GluePoint, GlueRef, NodeId, SceneHost, StandardGlue};
use log::{debug, warn};

const RULE_SIZE: usize = 24;
const RELATIVE_UNIT: f64 = 10_000.0;

/// Connection-site kinds of custom geometry.
const CXK_SEGMENTS: u32 = 1;
const CXK_CUSTOM: u32 = 2;
const CXK_RECT: u32 = 3;

/// One `ConnectorRule` atom.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectorRule {
    pub rule_id: u32,
    /// Shape at the start of the connector, 0 when unattached.
    pub start_shape: u32,
    pub end_shape: u32,
    pub connector: u32,
    pub start_site: u32,
    pub end_site: u32,
}

impl ConnectorRule {
    pub fn parse(data: &[u8]) -> Option<Self> {
        if data.len() < RULE_SIZE {
            return None;
        }
        let v = |i: usize| read_u32_le(data, i * 4).ok();
        Some(Self {
            rule_id: v(0)?,
            start_shape: v(1)?,
            end_shape: v(2)?,
            connector: v(3)?,
            start_site: v(4)?,
            end_site: v(5)?,
        })
    }
}

/// Connector rules of a solver container.
pub fn read_solver(cursor: &ByteCursor<'_>, solver: &RecordHeader) -> Vec<ConnectorRule> {
    cursor
        .children(solver)
        .filter(|h| h.rec_type == RecordType::ConnectorRule as u16)
        .filter_map(|h| {
            let rule = ConnectorRule::parse(cursor.content(&h));
            if rule.is_none() {
                warn!("short connector rule at {}", h.begin);
            }
            rule
        })
        .collect()
}

/// Side of a rectangle for connection site `site`, counting top, left,
/// bottom, right and following the shape's flips.
fn rect_side(site: u32, flip_h: bool, flip_v: bool) -> StandardGlue {
    let mut side = site & 3;
    if flip_h && side & 1 == 1 {
        side ^= 2;
    }
    if flip_v && side & 1 == 0 {
        side ^= 2;
    }
    match side {
        0 => StandardGlue::Top,
        1 => StandardGlue::Left,
        2 => StandardGlue::Bottom,
        _ => StandardGlue::Right,
    }
}

/// Add a glue point at outline vertex `vertex` of `node`, relative to its
/// bounds. Returns the index of the new point.
fn synthesize<H: SceneHost + ?Sized>(host: &mut H, node: NodeId, vertex: u32) -> Option<u32> {
    let outline = host.outline(node);
    let point = outline.get(vertex as usize).or(outline.last())?;
    let bounds = host.snap_rect(node).unwrap_or(Rect::default());
    let rel = |v: i32, lo: i32, extent: i32| {
        if extent == 0 {
            0.0
        } else {
            ((v as f64 - lo as f64) * RELATIVE_UNIT / extent as f64).round()
        }
    };
    let position = PointF::new(
        rel(point.x, bounds.left, bounds.width()),
        rel(point.y, bounds.top, bounds.height()),
    );
    debug!("synthesized glue point {position:?} on node {}", node.0);
    Some(host.add_glue_point(node, GluePoint { position }))
}

/// Glue reference for connection site `site` of the shape in `entry`.
pub fn resolve_glue<H: SceneHost + ?Sized>(
    host: &mut H,
    entry: &ShapeOrderEntry,
    node: NodeId,
    site: u32,
) -> GlueRef {
    let rect = || GlueRef::Standard(rect_side(site, entry.flip_h, entry.flip_v));
    match entry.glue {
        GlueModel::Rect => rect(),
        GlueModel::Custom { kind: CXK_RECT, .. } => rect(),
        GlueModel::Custom { kind: CXK_CUSTOM, sites } if (site as usize) < sites => GlueRef::Custom(site),
        GlueModel::Custom { kind, sites } if kind == CXK_CUSTOM || kind == CXK_SEGMENTS => {
            match synthesize(host, node, site) {
                Some(i) => GlueRef::Custom(sites as u32 + i),
                None => rect(),
            }
        },
        GlueModel::Custom { .. } => rect(),
        GlueModel::Polygon => {
            if (site as usize) < host.glue_point_count(node) {
                GlueRef::Custom(site)
            } else {
                synthesize(host, node, site).map_or_else(rect, GlueRef::Custom)
            }
        },
    }
}

/// Connect every connector named by `rules`. Returns the number of ends
/// connected.
pub fn apply_rules<H: SceneHost + ?Sized>(host: &mut H, order: &ShapeOrder, rules: &[ConnectorRule]) -> usize {
    let mut connected = 0;
    for rule in rules {
        let Some(connector) = order.node(rule.connector) else {
            debug!("connector rule {} names unknown connector {}", rule.rule_id, rule.connector);
            continue;
        };
        let ends = [
            (ConnectorEnd::Start, rule.start_shape, rule.start_site),
            (ConnectorEnd::End, rule.end_shape, rule.end_site),
        ];
        for (end, shape, site) in ends {
            if shape == 0 {
                continue;
            }
            let Some(entry) = order.get(shape) else {
                debug!("connector {} glued to unknown shape {shape}", rule.connector);
                continue;
            };
            let Some(target) = entry.node() else {
                continue;
            };
            let glue = resolve_glue(host, entry, target, site);
            host.connect(connector, end, target, glue);
            connected += 1;
        }
    }
    connected
}

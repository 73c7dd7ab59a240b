//! Sankey layout: stage-aware node ordering, id to index translation, link
//! validation and a layered flow layout, memoized on a canonical fingerprint.

mod layered;
mod order;
mod paint;
mod validate;

pub use layered::{CycleError, Extent, Flow, FlowLink, FlowNode, layout as layered_layout};
pub use order::{
    NodeOrderCache, SCORE_AGREEMENT_STAGE, UNKNOWN_AGREEMENT_RANK, agreement_rank, sort_nodes,
    sorted_nodes,
};
pub use paint::{LinkPath, NEUTRAL_COLOR, generate_path, link_color, node_color};
pub use validate::validate_sankey;

use crate::cache::{CacheSettings, Clock, EvictionCache};
use crate::geometry::Margin;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

pub const SANKEY_MARGIN: Margin = Margin {
    top: 20.0,
    right: 140.0,
    bottom: 20.0,
    left: 80.0,
};
pub const NODE_WIDTH: f64 = 15.0;
pub const NODE_PADDING: f64 = 10.0;

pub type SankeyLayoutCache = EvictionCache<SankeyLayout>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeCategory {
    Root,
    FeatureSplitting,
    SemanticDistance,
    ScoreAgreement,
    #[default]
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SankeyNode {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub category: NodeCategory,
    pub stage: u32,
    #[serde(default)]
    pub feature_count: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_path: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SankeyLink {
    pub source: String,
    pub target: String,
    pub value: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SankeyData {
    #[serde(default)]
    pub nodes: Vec<SankeyNode>,
    #[serde(default)]
    pub links: Vec<SankeyLink>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SortConfig {
    /// Order the score-agreement stage by agreement pattern.
    pub stage4_enabled: bool,
    /// Sort the other stages by display name instead of keeping input order.
    pub sort_by_name: bool,
}

impl Default for SortConfig {
    fn default() -> Self {
        Self {
            stage4_enabled: true,
            sort_by_name: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayoutNode {
    /// Position in draw order.
    pub index: usize,
    pub id: String,
    pub name: String,
    pub category: NodeCategory,
    pub stage: u32,
    pub feature_count: u64,
    /// Fill from the category palette.
    pub color: &'static str,
    pub value: f64,
    pub depth: usize,
    pub layer: usize,
    pub x0: f64,
    pub x1: f64,
    pub y0: f64,
    pub y1: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayoutLink {
    /// Position in the input link list.
    pub index: usize,
    pub source: usize,
    pub target: usize,
    pub source_id: String,
    pub target_id: String,
    pub value: f64,
    pub width: f64,
    pub y0: f64,
    pub y1: f64,
    /// Right edge of the source node.
    pub x0: f64,
    /// Left edge of the target node.
    pub x1: f64,
    /// Translucent source-node color.
    pub color: &'static str,
    /// SVG path data for the band's center line; stroke with `width`.
    pub path: String,
}

/// Node and link geometry in inner-area coordinates (offset by `margin`
/// when drawing).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SankeyLayout {
    pub nodes: Vec<LayoutNode>,
    pub links: Vec<LayoutLink>,
    pub width: f64,
    pub height: f64,
    pub margin: Margin,
}

impl SankeyLayout {
    /// Nothing to draw, but sized for the container.
    pub fn empty(width: f64, height: f64) -> Self {
        Self {
            nodes: Vec::new(),
            links: Vec::new(),
            width,
            height,
            margin: SANKEY_MARGIN,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.links.is_empty()
    }

    pub fn node(&self, id: &str) -> Option<&LayoutNode> {
        self.nodes.iter().find(|n| n.id == id)
    }
}

/// The two caches the Sankey engine reads and writes.
#[derive(Debug)]
pub struct SankeyCaches {
    pub layouts: SankeyLayoutCache,
    pub node_orders: NodeOrderCache,
}

impl SankeyCaches {
    pub fn new(layouts: CacheSettings, node_orders: CacheSettings, clock: Arc<dyn Clock>) -> Self {
        Self {
            layouts: EvictionCache::new("sankey_layout", layouts, Arc::clone(&clock)),
            node_orders: EvictionCache::new("node_sort", node_orders, clock),
        }
    }

    pub fn clear(&mut self) {
        self.layouts.clear(None);
        self.node_orders.clear(None);
    }
}

impl Default for SankeyCaches {
    fn default() -> Self {
        Self::new(
            CacheSettings::SANKEY_LAYOUT,
            CacheSettings::NODE_SORT,
            Arc::new(crate::cache::SystemClock::new()),
        )
    }
}

/// Cache key: dimensions, sort flags, and the sorted node ids and
/// `source_target_value` triples. Input order does not change the key.
pub fn cache_key(data: &SankeyData, width: f64, height: f64, sort: SortConfig) -> String {
    let mut ids: Vec<&str> = data.nodes.iter().map(|n| n.id.as_str()).collect();
    ids.sort_unstable();
    let mut triples: Vec<String> = data
        .links
        .iter()
        .map(|l| format!("{}_{}_{}", l.source, l.target, l.value))
        .collect();
    triples.sort_unstable();

    format!(
        "{}x{}_{}_{}|{}|{}",
        width,
        height,
        sort.stage4_enabled,
        sort.sort_by_name,
        ids.join(","),
        triples.join(",")
    )
}

/// Lay out a Sankey diagram, reusing a cached layout when the key is fresh.
///
/// Duplicate node ids, links naming unknown nodes, or links forming a cycle
/// produce [`SankeyLayout::empty`] and a warning rather than an error.
pub fn compute_layout(
    caches: &mut SankeyCaches,
    data: &SankeyData,
    width: f64,
    height: f64,
    sort: SortConfig,
) -> Arc<SankeyLayout> {
    let key = cache_key(data, width, height, sort);
    let SankeyCaches {
        layouts,
        node_orders,
    } = caches;
    layouts.get_or_insert_with(&key, || build_layout(node_orders, data, width, height, sort))
}

/// Uncached layout computation (node order is still memoized).
pub fn build_layout(
    node_orders: &mut NodeOrderCache,
    data: &SankeyData,
    width: f64,
    height: f64,
    sort: SortConfig,
) -> SankeyLayout {
    let order = sorted_nodes(node_orders, &data.nodes, sort);

    let mut index_of: HashMap<&str, usize> = HashMap::with_capacity(order.len());
    let mut duplicates = Vec::new();
    for (index, &position) in order.iter().enumerate() {
        let id = data.nodes[position].id.as_str();
        if index_of.insert(id, index).is_some() {
            duplicates.push(id);
        }
    }
    if !duplicates.is_empty() {
        tracing::warn!(
            ids = ?duplicates,
            "sankey node ids are not unique; rendering empty layout"
        );
        return SankeyLayout::empty(width, height);
    }

    let mut indexed = Vec::with_capacity(data.links.len());
    let mut unknown = Vec::new();
    for link in &data.links {
        match (
            index_of.get(link.source.as_str()),
            index_of.get(link.target.as_str()),
        ) {
            (Some(&s), Some(&t)) => indexed.push((s, t, link.value)),
            _ => unknown.push(format!("{} -> {}", link.source, link.target)),
        }
    }
    if !unknown.is_empty() {
        tracing::warn!(
            count = unknown.len(),
            links = ?unknown,
            "sankey links reference unknown node ids; rendering empty layout"
        );
        return SankeyLayout::empty(width, height);
    }

    let extent = Extent {
        x0: 0.0,
        y0: 0.0,
        x1: SANKEY_MARGIN.inner_width(width),
        y1: SANKEY_MARGIN.inner_height(height),
    };
    let flow = match layered::layout(order.len(), &indexed, extent, NODE_WIDTH, NODE_PADDING) {
        Ok(flow) => flow,
        Err(err) => {
            let id = order
                .get(err.node)
                .map(|&p| data.nodes[p].id.as_str())
                .unwrap_or_default();
            tracing::warn!(node = id, "sankey links form a cycle; rendering empty layout");
            return SankeyLayout::empty(width, height);
        }
    };

    let nodes: Vec<LayoutNode> = order
        .iter()
        .zip(&flow.nodes)
        .enumerate()
        .map(|(index, (&position, placed))| {
            let node = &data.nodes[position];
            LayoutNode {
                index,
                id: node.id.clone(),
                name: node.name.clone(),
                category: node.category,
                stage: node.stage,
                feature_count: node.feature_count,
                color: node_color(node.category),
                value: placed.value,
                depth: placed.depth,
                layer: placed.layer,
                x0: placed.x0,
                x1: placed.x1,
                y0: placed.y0,
                y1: placed.y1,
            }
        })
        .collect();

    let links = flow
        .links
        .iter()
        .enumerate()
        .map(|(index, placed)| {
            let source = &nodes[placed.source];
            let mut link = LayoutLink {
                index,
                source: placed.source,
                target: placed.target,
                source_id: source.id.clone(),
                target_id: nodes[placed.target].id.clone(),
                value: placed.value,
                width: placed.width,
                y0: placed.y0,
                y1: placed.y1,
                x0: source.x1,
                x1: nodes[placed.target].x0,
                color: link_color(source.category),
                path: String::new(),
            };
            link.path = generate_path(&link).svg_path();
            link
        })
        .collect();

    SankeyLayout {
        nodes,
        links,
        width,
        height,
        margin: SANKEY_MARGIN,
    }
}

//! Layered flow layout for a directed acyclic graph with weighted links.
//!
//! Nodes are placed in columns by longest-path depth (justified, so sinks
//! move to the last column), stacked within each column proportionally to
//! their throughput, then relaxed toward the vertical centers of their
//! neighbours for a fixed number of iterations. Column order is never
//! re-sorted: the order nodes are handed in is the order they are drawn.

use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use thiserror::Error;

const ITERATIONS: usize = 6;
const COLLISION_EPSILON: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Extent {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("link set contains a cycle through node {node}")]
pub struct CycleError {
    pub node: usize,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlowNode {
    pub value: f64,
    pub depth: usize,
    pub height: usize,
    pub layer: usize,
    pub x0: f64,
    pub x1: f64,
    pub y0: f64,
    pub y1: f64,
    source_links: Vec<usize>,
    target_links: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FlowLink {
    pub source: usize,
    pub target: usize,
    pub value: f64,
    pub width: f64,
    /// Vertical center where the link leaves its source.
    pub y0: f64,
    /// Vertical center where the link enters its target.
    pub y1: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Flow {
    pub nodes: Vec<FlowNode>,
    pub links: Vec<FlowLink>,
}

/// Lay out `node_count` nodes joined by `(source, target, value)` links.
///
/// Endpoints must be valid indices below `node_count`.
pub fn layout(
    node_count: usize,
    links: &[(usize, usize, f64)],
    extent: Extent,
    node_width: f64,
    node_padding: f64,
) -> Result<Flow, CycleError> {
    let mut nodes = vec![FlowNode::default(); node_count];
    let mut flow_links = Vec::with_capacity(links.len());
    for (i, &(source, target, value)) in links.iter().enumerate() {
        nodes[source].source_links.push(i);
        nodes[target].target_links.push(i);
        flow_links.push(FlowLink {
            source,
            target,
            value,
            width: 0.0,
            y0: 0.0,
            y1: 0.0,
        });
    }

    let mut layouter = Layouter {
        nodes,
        links: flow_links,
        extent,
        node_width,
        node_padding,
        py: node_padding,
    };
    if node_count == 0 {
        return Ok(layouter.finish());
    }

    layouter.compute_node_values();
    layouter.compute_node_depths()?;
    layouter.compute_node_breadths();
    layouter.compute_link_breadths();
    Ok(layouter.finish())
}

struct Layouter {
    nodes: Vec<FlowNode>,
    links: Vec<FlowLink>,
    extent: Extent,
    node_width: f64,
    node_padding: f64,
    /// Effective padding, shrunk when the tallest column would not fit.
    py: f64,
}

impl Layouter {
    fn finish(self) -> Flow {
        Flow {
            nodes: self.nodes,
            links: self.links,
        }
    }

    fn compute_node_values(&mut self) {
        for i in 0..self.nodes.len() {
            let node = &self.nodes[i];
            let outgoing: f64 = node.source_links.iter().map(|&l| self.links[l].value).sum();
            let incoming: f64 = node.target_links.iter().map(|&l| self.links[l].value).sum();
            self.nodes[i].value = outgoing.max(incoming);
        }
    }

    /// Longest path from any source (depth) and to any sink (height).
    fn compute_node_depths(&mut self) -> Result<(), CycleError> {
        let mut graph: DiGraph<(), ()> = DiGraph::with_capacity(self.nodes.len(), self.links.len());
        for _ in 0..self.nodes.len() {
            graph.add_node(());
        }
        for link in &self.links {
            graph.add_edge(NodeIndex::new(link.source), NodeIndex::new(link.target), ());
        }

        let order = toposort(&graph, None).map_err(|cycle| CycleError {
            node: cycle.node_id().index(),
        })?;

        for idx in &order {
            let n = idx.index();
            let depth = self.nodes[n].depth;
            for &l in &self.nodes[n].source_links.clone() {
                let target = self.links[l].target;
                self.nodes[target].depth = self.nodes[target].depth.max(depth + 1);
            }
        }
        for idx in order.iter().rev() {
            let n = idx.index();
            let height = self.nodes[n].height;
            for &l in &self.nodes[n].target_links.clone() {
                let source = self.links[l].source;
                self.nodes[source].height = self.nodes[source].height.max(height + 1);
            }
        }
        Ok(())
    }

    /// Justified alignment: sinks go to the last column.
    fn compute_node_layers(&mut self) -> Vec<Vec<usize>> {
        let column_count = self.nodes.iter().map(|n| n.depth).max().unwrap_or(0) + 1;
        let kx = if column_count > 1 {
            (self.extent.x1 - self.extent.x0 - self.node_width) / (column_count - 1) as f64
        } else {
            0.0
        };

        let mut columns = vec![Vec::new(); column_count];
        for (i, node) in self.nodes.iter_mut().enumerate() {
            let layer = if node.source_links.is_empty() {
                column_count - 1
            } else {
                node.depth.min(column_count - 1)
            };
            node.layer = layer;
            node.x0 = self.extent.x0 + layer as f64 * kx;
            node.x1 = node.x0 + self.node_width;
            columns[layer].push(i);
        }
        columns.retain(|c: &Vec<usize>| !c.is_empty());
        columns
    }

    fn compute_node_breadths(&mut self) {
        let columns = self.compute_node_layers();
        let tallest = columns.iter().map(Vec::len).max().unwrap_or(1);
        self.py = if tallest > 1 {
            self.node_padding
                .min((self.extent.y1 - self.extent.y0) / (tallest - 1) as f64)
        } else {
            self.node_padding
        };

        self.initialize_node_breadths(&columns);
        for i in 0..ITERATIONS {
            let alpha = 0.99f64.powi(i as i32);
            let beta = (1.0 - alpha).max((i + 1) as f64 / ITERATIONS as f64);
            self.relax_right_to_left(&columns, alpha, beta);
            self.relax_left_to_right(&columns, alpha, beta);
        }
    }

    fn initialize_node_breadths(&mut self, columns: &[Vec<usize>]) {
        let Extent { y0, y1, .. } = self.extent;
        let ky = columns
            .iter()
            .filter_map(|column| {
                let total: f64 = column.iter().map(|&n| self.nodes[n].value).sum();
                (total > 0.0).then(|| (y1 - y0 - (column.len() - 1) as f64 * self.py) / total)
            })
            .fold(f64::INFINITY, f64::min);
        let ky = if ky.is_finite() { ky.max(0.0) } else { 0.0 };

        for column in columns {
            let mut y = y0;
            for &n in column {
                let node = &mut self.nodes[n];
                node.y0 = y;
                node.y1 = y + node.value * ky;
                y = node.y1 + self.py;
                for &l in &node.source_links {
                    self.links[l].width = self.links[l].value * ky;
                }
            }
            let spread = (y1 - y + self.py) / (column.len() + 1) as f64;
            for (i, &n) in column.iter().enumerate() {
                let shift = spread * (i + 1) as f64;
                self.nodes[n].y0 += shift;
                self.nodes[n].y1 += shift;
            }
            for &n in column {
                self.sort_source_links(n);
                self.sort_target_links(n);
            }
        }
    }

    /// Move each node toward the weighted center of its incoming links.
    fn relax_left_to_right(&mut self, columns: &[Vec<usize>], alpha: f64, beta: f64) {
        for column in columns.iter().skip(1) {
            for &target in column {
                let mut y = 0.0;
                let mut w = 0.0;
                for &l in &self.nodes[target].target_links {
                    let link = &self.links[l];
                    let span = self.nodes[target].layer as f64 - self.nodes[link.source].layer as f64;
                    let v = link.value * span;
                    y += self.target_top(link.source, target) * v;
                    w += v;
                }
                if !(w > 0.0) {
                    continue;
                }
                let dy = (y / w - self.nodes[target].y0) * alpha;
                self.nodes[target].y0 += dy;
                self.nodes[target].y1 += dy;
                self.reorder_node_links(target);
            }
            self.resolve_collisions(column, beta);
        }
    }

    /// Move each node toward the weighted center of its outgoing links.
    fn relax_right_to_left(&mut self, columns: &[Vec<usize>], alpha: f64, beta: f64) {
        for column in columns.iter().rev().skip(1) {
            for &source in column {
                let mut y = 0.0;
                let mut w = 0.0;
                for &l in &self.nodes[source].source_links {
                    let link = &self.links[l];
                    let span = self.nodes[link.target].layer as f64 - self.nodes[source].layer as f64;
                    let v = link.value * span;
                    y += self.source_top(source, link.target) * v;
                    w += v;
                }
                if !(w > 0.0) {
                    continue;
                }
                let dy = (y / w - self.nodes[source].y0) * alpha;
                self.nodes[source].y0 += dy;
                self.nodes[source].y1 += dy;
                self.reorder_node_links(source);
            }
            self.resolve_collisions(column, beta);
        }
    }

    /// Push overlapping nodes apart around the column's middle node, then
    /// pull the column back inside the extent.
    fn resolve_collisions(&mut self, column: &[usize], alpha: f64) {
        if column.is_empty() {
            return;
        }
        let mid = column.len() / 2;
        let subject_y0 = self.nodes[column[mid]].y0;
        let subject_y1 = self.nodes[column[mid]].y1;

        self.push_up(&column[..mid], subject_y0 - self.py, alpha);
        self.push_down(&column[mid + 1..], subject_y1 + self.py, alpha);
        self.push_up(column, self.extent.y1, alpha);
        self.push_down(column, self.extent.y0, alpha);
    }

    fn push_down(&mut self, column: &[usize], mut y: f64, alpha: f64) {
        for &n in column {
            let node = &mut self.nodes[n];
            let dy = (y - node.y0) * alpha;
            if dy > COLLISION_EPSILON {
                node.y0 += dy;
                node.y1 += dy;
            }
            y = node.y1 + self.py;
        }
    }

    fn push_up(&mut self, column: &[usize], mut y: f64, alpha: f64) {
        for &n in column.iter().rev() {
            let node = &mut self.nodes[n];
            let dy = (node.y1 - y) * alpha;
            if dy > COLLISION_EPSILON {
                node.y0 -= dy;
                node.y1 -= dy;
            }
            y = node.y0 - self.py;
        }
    }

    /// `y0` for `target` that would make the source→target link straight.
    fn target_top(&self, source: usize, target: usize) -> f64 {
        let s = &self.nodes[source];
        let mut y = s.y0 - (s.source_links.len() as f64 - 1.0) * self.py / 2.0;
        for &l in &s.source_links {
            let link = &self.links[l];
            if link.target == target {
                break;
            }
            y += link.width + self.py;
        }
        for &l in &self.nodes[target].target_links {
            let link = &self.links[l];
            if link.source == source {
                break;
            }
            y -= link.width;
        }
        y
    }

    /// `y0` for `source` that would make the source→target link straight.
    fn source_top(&self, source: usize, target: usize) -> f64 {
        let t = &self.nodes[target];
        let mut y = t.y0 - (t.target_links.len() as f64 - 1.0) * self.py / 2.0;
        for &l in &t.target_links {
            let link = &self.links[l];
            if link.source == source {
                break;
            }
            y += link.width + self.py;
        }
        for &l in &self.nodes[source].source_links {
            let link = &self.links[l];
            if link.target == target {
                break;
            }
            y -= link.width;
        }
        y
    }

    /// After `n` moved, re-sort the link lists of its neighbours that
    /// reference it.
    fn reorder_node_links(&mut self, n: usize) {
        let upstream: Vec<usize> = self.nodes[n]
            .target_links
            .iter()
            .map(|&l| self.links[l].source)
            .collect();
        let downstream: Vec<usize> = self.nodes[n]
            .source_links
            .iter()
            .map(|&l| self.links[l].target)
            .collect();
        for source in upstream {
            self.sort_source_links(source);
        }
        for target in downstream {
            self.sort_target_links(target);
        }
    }

    /// Outgoing links ordered by target position, then by link index.
    fn sort_source_links(&mut self, n: usize) {
        let mut ordered = std::mem::take(&mut self.nodes[n].source_links);
        ordered.sort_by(|&a, &b| {
            let ya = self.nodes[self.links[a].target].y0;
            let yb = self.nodes[self.links[b].target].y0;
            ya.total_cmp(&yb).then(a.cmp(&b))
        });
        self.nodes[n].source_links = ordered;
    }

    /// Incoming links ordered by source position, then by link index.
    fn sort_target_links(&mut self, n: usize) {
        let mut ordered = std::mem::take(&mut self.nodes[n].target_links);
        ordered.sort_by(|&a, &b| {
            let ya = self.nodes[self.links[a].source].y0;
            let yb = self.nodes[self.links[b].source].y0;
            ya.total_cmp(&yb).then(a.cmp(&b))
        });
        self.nodes[n].target_links = ordered;
    }

    fn compute_link_breadths(&mut self) {
        for n in 0..self.nodes.len() {
            let mut y0 = self.nodes[n].y0;
            let mut y1 = y0;
            for &l in &self.nodes[n].source_links {
                let link = &mut self.links[l];
                link.y0 = y0 + link.width / 2.0;
                y0 += link.width;
            }
            for &l in &self.nodes[n].target_links {
                let link = &mut self.links[l];
                link.y1 = y1 + link.width / 2.0;
                y1 += link.width;
            }
        }
    }
}

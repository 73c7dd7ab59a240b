mod json;
mod markdown;

pub use json::JsonOutput;
pub use markdown::MarkdownOutput;

use crate::histogram::{HistogramLayout, MultiHistogramLayout, ThresholdLine};
use crate::sankey::SankeyLayout;
use crate::threshold::{GroupInfo, Metric, MetricValues, NodeKind, ThresholdStore};
use serde::Serialize;
use std::io::Write;
use std::sync::Arc;

/// Anything a command prints.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Report {
    Sankey(Arc<SankeyLayout>),
    Histogram(HistogramReport),
    Histograms(MultiHistogramLayout),
    Resolution(Resolution),
}

#[derive(Debug, Clone, Serialize)]
pub struct HistogramReport {
    pub layout: Arc<HistogramLayout>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threshold_line: Option<ThresholdLine>,
}

/// Effective thresholds at one node, and the groups an edit there would touch.
#[derive(Debug, Clone, Serialize)]
pub struct Resolution {
    pub node_id: String,
    pub kind: Option<NodeKind>,
    pub thresholds: MetricValues,
    pub groups: Vec<GroupInfo>,
}

impl Resolution {
    /// Resolve `metrics` at `node_id`. Group membership is judged among
    /// `known_node_ids` plus the node itself.
    pub fn compute(
        store: &ThresholdStore,
        node_id: &str,
        metrics: &[Metric],
        known_node_ids: &[String],
    ) -> Self {
        let mut known = known_node_ids.to_vec();
        if !known.iter().any(|id| id == node_id) {
            known.push(node_id.to_string());
        }

        Self {
            node_id: node_id.to_string(),
            kind: NodeKind::classify(node_id),
            thresholds: metrics
                .iter()
                .map(|&m| (m, store.resolve(node_id, m)))
                .collect(),
            groups: store.group_info(node_id, metrics, &known),
        }
    }
}

pub trait OutputFormatter {
    fn format<W: Write>(&self, report: &Report, writer: &mut W) -> std::io::Result<()>;
}

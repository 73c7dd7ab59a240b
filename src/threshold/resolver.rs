use super::node_id::{self, NodeKind};
use super::{HierarchicalThresholds, Metric, MetricValues};
use serde::Serialize;

/// Effective threshold for `metric` at `node_id`.
///
/// Total over every id and metric: ids that match no convention fall through
/// to the global default.
pub fn resolve(thresholds: &HierarchicalThresholds, node_id: &str, metric: Metric) -> f64 {
    if let Some(value) = thresholds
        .individual_node_groups
        .get(node_id)
        .and_then(|values| values.get(&metric))
    {
        return *value;
    }

    let grouped = match metric {
        Metric::SemdistMean => node_id::splitting_ancestor(node_id)
            .and_then(|group| thresholds.semantic_distance_groups.get(group)),
        Metric::ScoreFuzz | Metric::ScoreSimulation | Metric::ScoreDetection => {
            node_id::semdist_ancestor(node_id)
                .and_then(|group| thresholds.score_agreement_groups.get(group))
                .and_then(|values| values.get(&metric))
        }
        Metric::FeatureSplitting => None,
    };

    grouped
        .copied()
        .unwrap_or_else(|| thresholds.global_thresholds.for_metric(metric))
}

/// Every metric's effective threshold at `node_id`.
pub fn resolve_all(thresholds: &HierarchicalThresholds, node_id: &str) -> MetricValues {
    Metric::ALL
        .into_iter()
        .map(|metric| (metric, resolve(thresholds, node_id, metric)))
        .collect()
}

/// Who else an edit to `node_id`'s threshold would touch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupInfo {
    pub metric: Metric,
    pub group_id: Option<String>,
    pub affected_node_ids: Vec<String>,
    pub is_grouped: bool,
}

/// Group membership of `node_id` for each metric, among `known_node_ids`.
///
/// Affected nodes are the known nodes of the same kind that share the group.
/// A node counts as grouped only when the group exists and holds more than
/// one node.
pub fn group_info<S: AsRef<str>>(
    node_id: &str,
    metrics: &[Metric],
    known_node_ids: &[S],
) -> Vec<GroupInfo> {
    let kind = NodeKind::classify(node_id);

    metrics
        .iter()
        .map(|&metric| {
            let group_id = node_id::group_id_for(node_id, metric);
            let affected_node_ids: Vec<String> = match group_id {
                Some(group) => known_node_ids
                    .iter()
                    .map(AsRef::<str>::as_ref)
                    .filter(|other| {
                        NodeKind::classify(other) == kind
                            && node_id::group_id_for(other, metric) == Some(group)
                    })
                    .map(str::to_string)
                    .collect(),
                None => Vec::new(),
            };
            let is_grouped = group_id.is_some() && affected_node_ids.len() > 1;

            GroupInfo {
                metric,
                group_id: group_id.map(str::to_string),
                affected_node_ids,
                is_grouped,
            }
        })
        .collect()
}

use super::node_id;
use super::resolver::{self, GroupInfo};
use super::{GlobalThresholds, HierarchicalThresholds, Metric, MetricFamily, MetricValues, clamp_unit};
use serde::Serialize;

/// Result of a group write or clear.
///
/// `Ungroupable` means the id matched no grouping convention for the metric
/// and nothing was written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupOutcome {
    Grouped,
    Cleared,
    Ungroupable,
}

/// Mutable threshold state with the group-maintenance rules.
#[derive(Debug, Clone)]
pub struct ThresholdStore {
    state: HierarchicalThresholds,
    defaults: GlobalThresholds,
}

impl Default for ThresholdStore {
    fn default() -> Self {
        Self::new(GlobalThresholds::default())
    }
}

impl ThresholdStore {
    /// A store whose globals start at, and reset to, `defaults`.
    pub fn new(defaults: GlobalThresholds) -> Self {
        let defaults = defaults.clamped();
        Self {
            state: HierarchicalThresholds::with_globals(defaults),
            defaults,
        }
    }

    /// Load a document. Values are clamped on the way in.
    pub fn from_document(document: HierarchicalThresholds, defaults: GlobalThresholds) -> Self {
        let mut store = Self::new(defaults);
        store.state.global_thresholds = document.global_thresholds.clamped();
        store.state.semantic_distance_groups = document
            .semantic_distance_groups
            .into_iter()
            .map(|(id, v)| (id, clamp_unit(v)))
            .collect();
        store.state.score_agreement_groups = document
            .score_agreement_groups
            .into_iter()
            .map(|(id, values)| (id, clamp_values(values)))
            .filter(|(_, values)| !values.is_empty())
            .collect();
        store.state.individual_node_groups = document
            .individual_node_groups
            .into_iter()
            .map(|(id, values)| (id, clamp_values(values)))
            .filter(|(_, values)| !values.is_empty())
            .collect();
        store
    }

    pub fn document(&self) -> &HierarchicalThresholds {
        &self.state
    }

    pub fn to_document(&self) -> HierarchicalThresholds {
        self.state.clone()
    }

    pub fn globals(&self) -> GlobalThresholds {
        self.state.global_thresholds
    }

    pub fn resolve(&self, node_id: &str, metric: Metric) -> f64 {
        resolver::resolve(&self.state, node_id, metric)
    }

    pub fn resolve_all(&self, node_id: &str) -> MetricValues {
        resolver::resolve_all(&self.state, node_id)
    }

    pub fn group_info<S: AsRef<str>>(
        &self,
        node_id: &str,
        metrics: &[Metric],
        known_node_ids: &[S],
    ) -> Vec<GroupInfo> {
        resolver::group_info(node_id, metrics, known_node_ids)
    }

    /// Write the family default that `metric` falls back to.
    pub fn set_global_threshold(&mut self, metric: Metric, value: f64) {
        let value = clamp_unit(value);
        match metric.family() {
            MetricFamily::SemanticDistance => self.state.global_thresholds.semdist_mean = value,
            MetricFamily::Score => self.state.global_thresholds.score_high = value,
        }
    }

    /// Override one metric for one node, leaving its other overrides alone.
    pub fn set_node_threshold(&mut self, node_id: &str, metric: Metric, value: f64) {
        self.state
            .individual_node_groups
            .entry(node_id.to_string())
            .or_default()
            .insert(metric, clamp_unit(value));
    }

    pub fn set_threshold_group(&mut self, group_id: &str, metric: Metric, value: f64) -> GroupOutcome {
        let value = clamp_unit(value);
        match metric {
            Metric::SemdistMean if node_id::is_splitting_group_id(group_id) => {
                self.state
                    .semantic_distance_groups
                    .insert(group_id.to_string(), value);
                GroupOutcome::Grouped
            }
            Metric::ScoreFuzz | Metric::ScoreSimulation | Metric::ScoreDetection
                if node_id::is_score_group_id(group_id) =>
            {
                let backfill = self.state.global_thresholds.score_high;
                let group = self
                    .state
                    .score_agreement_groups
                    .entry(group_id.to_string())
                    .or_insert_with(|| Metric::SCORES.into_iter().map(|m| (m, backfill)).collect());
                group.insert(metric, value);
                GroupOutcome::Grouped
            }
            _ => {
                tracing::debug!(group_id, %metric, "id matches no grouping convention");
                GroupOutcome::Ungroupable
            }
        }
    }

    /// Remove one metric override, or the whole node entry when `metric` is `None`.
    pub fn clear_node_threshold(&mut self, node_id: &str, metric: Option<Metric>) {
        match metric {
            Some(metric) => {
                let now_empty = match self.state.individual_node_groups.get_mut(node_id) {
                    Some(values) => {
                        values.remove(&metric);
                        values.is_empty()
                    }
                    None => false,
                };
                if now_empty {
                    self.state.individual_node_groups.remove(node_id);
                }
            }
            None => {
                self.state.individual_node_groups.remove(node_id);
            }
        }
    }

    pub fn clear_threshold_group(&mut self, group_id: &str, metric: Option<Metric>) -> GroupOutcome {
        match metric {
            None => {
                if node_id::is_splitting_group_id(group_id) {
                    self.state.semantic_distance_groups.remove(group_id);
                    GroupOutcome::Cleared
                } else if node_id::is_score_group_id(group_id) {
                    self.state.score_agreement_groups.remove(group_id);
                    GroupOutcome::Cleared
                } else {
                    GroupOutcome::Ungroupable
                }
            }
            Some(Metric::SemdistMean) if node_id::is_splitting_group_id(group_id) => {
                self.state.semantic_distance_groups.remove(group_id);
                GroupOutcome::Cleared
            }
            Some(metric) if metric.is_score() && node_id::is_score_group_id(group_id) => {
                let now_empty = match self.state.score_agreement_groups.get_mut(group_id) {
                    Some(values) => {
                        values.remove(&metric);
                        values.is_empty()
                    }
                    None => false,
                };
                if now_empty {
                    self.state.score_agreement_groups.remove(group_id);
                }
                GroupOutcome::Cleared
            }
            Some(_) => GroupOutcome::Ungroupable,
        }
    }

    /// Back to the initial state: default globals, no overrides, no groups.
    pub fn reset_thresholds(&mut self) {
        self.state = HierarchicalThresholds::with_globals(self.defaults);
    }
}

fn clamp_values(values: MetricValues) -> MetricValues {
    values
        .into_iter()
        .map(|(metric, v)| (metric, clamp_unit(v)))
        .collect()
}

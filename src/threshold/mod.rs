//! Hierarchical threshold resolution.
//!
//! A threshold for (node, metric) comes from exactly one of three levels,
//! consulted in order: a node-specific override, the group the node belongs
//! to, then the global default for the metric's family.

pub mod metric;
pub mod node_id;
mod resolver;
mod store;

pub use metric::{Metric, MetricFamily, UnknownMetric};
pub use node_id::NodeKind;
pub use resolver::{GroupInfo, group_info, resolve, resolve_all};
pub use store::{GroupOutcome, ThresholdStore};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const DEFAULT_SEMDIST_THRESHOLD: f64 = 0.15;
pub const DEFAULT_SCORE_THRESHOLD: f64 = 0.8;

/// The two fallback values of last resort.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GlobalThresholds {
    /// Default for the splitting and semantic-distance family.
    pub semdist_mean: f64,
    /// Default shared by all three score metrics.
    pub score_high: f64,
}

impl Default for GlobalThresholds {
    fn default() -> Self {
        Self {
            semdist_mean: DEFAULT_SEMDIST_THRESHOLD,
            score_high: DEFAULT_SCORE_THRESHOLD,
        }
    }
}

impl GlobalThresholds {
    pub fn for_metric(&self, metric: Metric) -> f64 {
        match metric.family() {
            MetricFamily::SemanticDistance => self.semdist_mean,
            MetricFamily::Score => self.score_high,
        }
    }

    pub fn clamped(self) -> Self {
        Self {
            semdist_mean: clamp_unit(self.semdist_mean),
            score_high: clamp_unit(self.score_high),
        }
    }
}

pub type MetricValues = BTreeMap<Metric, f64>;

/// Full threshold state, in the document shape the classification service
/// accepts as `hierarchicalThresholds`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HierarchicalThresholds {
    #[serde(default)]
    pub global_thresholds: GlobalThresholds,
    /// Splitting-ancestor id → `semdist_mean` threshold.
    #[serde(default)]
    pub semantic_distance_groups: BTreeMap<String, f64>,
    /// Semantic-distance-ancestor id → score thresholds.
    #[serde(default)]
    pub score_agreement_groups: BTreeMap<String, MetricValues>,
    /// Node id → per-metric overrides.
    #[serde(default)]
    pub individual_node_groups: BTreeMap<String, MetricValues>,
}

impl HierarchicalThresholds {
    pub fn with_globals(global_thresholds: GlobalThresholds) -> Self {
        Self {
            global_thresholds,
            ..Self::default()
        }
    }
}

/// Clamp into [0, 1]. NaN becomes 0.
pub fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

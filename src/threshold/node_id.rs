//! Ancestry recovery from node identifiers.
//!
//! Ids encode their path through the classification tree with fixed markers:
//!
//! ```text
//! root
//! split_true
//! split_true_semdist_high
//! split_true_semdist_high_agree_2of3
//! ```
//!
//! All id parsing in the crate goes through this module.

use super::Metric;
use serde::Serialize;

pub const ROOT_ID: &str = "root";
pub const SPLIT_PREFIX: &str = "split_";
pub const SEMDIST_MARKER: &str = "_semdist_";
pub const AGREE_MARKER: &str = "_agree_";

const SPLITTING_IDS: [&str; 2] = ["split_true", "split_false"];

/// Position of a node in the classification tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Root,
    Splitting,
    SemanticDistance,
    ScoreAgreement,
}

impl NodeKind {
    /// Classify an id by its markers. Ids matching no convention yield `None`.
    pub fn classify(id: &str) -> Option<NodeKind> {
        if id == ROOT_ID {
            Some(NodeKind::Root)
        } else if id.contains(AGREE_MARKER) {
            Some(NodeKind::ScoreAgreement)
        } else if id.contains(SEMDIST_MARKER) {
            Some(NodeKind::SemanticDistance)
        } else if id.starts_with(SPLIT_PREFIX) {
            Some(NodeKind::Splitting)
        } else {
            None
        }
    }
}

/// The leading `split_true` / `split_false` token of an id.
pub fn splitting_ancestor(id: &str) -> Option<&str> {
    SPLITTING_IDS.into_iter().find_map(|prefix| {
        let rest = id.strip_prefix(prefix)?;
        (rest.is_empty() || rest.starts_with('_')).then(|| &id[..prefix.len()])
    })
}

/// The semantic-distance node that owns the score thresholds for `id`.
///
/// Only agreement nodes have one: the id minus its trailing `_agree_<type>`
/// segments. Semantic-distance nodes key score groups but resolve score
/// metrics against the global default.
pub fn semdist_ancestor(id: &str) -> Option<&str> {
    match NodeKind::classify(id)? {
        NodeKind::ScoreAgreement => {
            let mut parts = id.rsplitn(3, '_');
            parts.next()?;
            parts.next()?;
            parts.next().filter(|prefix| !prefix.is_empty())
        }
        NodeKind::SemanticDistance | NodeKind::Root | NodeKind::Splitting => None,
    }
}

/// Whether `id` can key a semantic-distance group.
pub fn is_splitting_group_id(id: &str) -> bool {
    id.starts_with(SPLIT_PREFIX) && !id.contains(SEMDIST_MARKER)
}

/// Whether `id` can key a score-agreement group.
pub fn is_score_group_id(id: &str) -> bool {
    id.contains(SEMDIST_MARKER)
}

/// The group whose value governs `metric` for node `id`, if any.
pub fn group_id_for(id: &str, metric: Metric) -> Option<&str> {
    match metric {
        Metric::SemdistMean => splitting_ancestor(id),
        Metric::ScoreFuzz | Metric::ScoreSimulation | Metric::ScoreDetection => {
            semdist_ancestor(id)
        }
        Metric::FeatureSplitting => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify() {
        assert_eq!(NodeKind::classify("root"), Some(NodeKind::Root));
        assert_eq!(NodeKind::classify("split_true"), Some(NodeKind::Splitting));
        assert_eq!(
            NodeKind::classify("split_false_semdist_low"),
            Some(NodeKind::SemanticDistance)
        );
        assert_eq!(
            NodeKind::classify("split_true_semdist_high_agree_2of3"),
            Some(NodeKind::ScoreAgreement)
        );
        assert_eq!(NodeKind::classify("mystery"), None);
        assert_eq!(NodeKind::classify(""), None);
    }

    #[test]
    fn test_splitting_ancestor() {
        assert_eq!(splitting_ancestor("split_true"), Some("split_true"));
        assert_eq!(
            splitting_ancestor("split_false_semdist_high_agree_all"),
            Some("split_false")
        );
        assert_eq!(splitting_ancestor("split_trueish"), None);
        assert_eq!(splitting_ancestor("root"), None);
    }

    #[test]
    fn test_semdist_ancestor() {
        assert_eq!(
            semdist_ancestor("split_true_semdist_high_agree_all"),
            Some("split_true_semdist_high")
        );
        assert_eq!(
            semdist_ancestor("split_true_semdist_low_agree_1of3"),
            Some("split_true_semdist_low")
        );
        assert_eq!(semdist_ancestor("split_true_semdist_low"), None);
        assert_eq!(semdist_ancestor("split_true"), None);
        assert_eq!(semdist_ancestor("_agree_"), None);
    }

    #[test]
    fn test_group_id_for() {
        let id = "split_false_semdist_high_agree_none";
        assert_eq!(group_id_for(id, Metric::SemdistMean), Some("split_false"));
        assert_eq!(
            group_id_for(id, Metric::ScoreFuzz),
            Some("split_false_semdist_high")
        );
        assert_eq!(group_id_for(id, Metric::FeatureSplitting), None);
    }

    #[test]
    fn test_group_conventions() {
        assert!(is_splitting_group_id("split_true"));
        assert!(!is_splitting_group_id("split_true_semdist_high"));
        assert!(is_score_group_id("split_true_semdist_high"));
        assert!(!is_score_group_id("split_true"));
    }
}

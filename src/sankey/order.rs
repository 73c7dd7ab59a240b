use super::{NodeCategory, SankeyNode, SortConfig};
use crate::cache::EvictionCache;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Stage that holds score-agreement nodes.
pub const SCORE_AGREEMENT_STAGE: u32 = 4;

/// Rank for names outside the known agreement patterns.
pub const UNKNOWN_AGREEMENT_RANK: u32 = 999;

/// Permutation of input node positions, in draw order.
pub type NodeOrderCache = EvictionCache<Vec<usize>>;

const AGREEMENT_PATTERNS: [(&str, u32); 5] = [
    ("all 3 scores high", 0),
    ("2 of 3 scores high", 1),
    ("1 of 3 scores high", 2),
    ("all scores low", 3),
    ("all 3 scores low", 3),
];

/// Position of a score-agreement node name in the fixed pattern order.
pub fn agreement_rank(name: &str) -> u32 {
    let name = name.trim().to_lowercase();
    AGREEMENT_PATTERNS
        .iter()
        .find(|(pattern, _)| *pattern == name)
        .map(|&(_, rank)| rank)
        .unwrap_or(UNKNOWN_AGREEMENT_RANK)
}

fn is_agreement_stage(stage: u32, members: &[usize], nodes: &[SankeyNode]) -> bool {
    stage == SCORE_AGREEMENT_STAGE
        || members
            .iter()
            .all(|&i| nodes[i].category == NodeCategory::ScoreAgreement)
}

/// Draw order for `nodes`, as positions into the slice.
///
/// Stages ascend. Inside the score-agreement stage, nodes follow the
/// agreement pattern order when `stage4_enabled`. Elsewhere input order is
/// kept unless `sort_by_name`. All sorts are stable.
pub fn sort_nodes(nodes: &[SankeyNode], config: SortConfig) -> Vec<usize> {
    let mut stages: BTreeMap<u32, Vec<usize>> = BTreeMap::new();
    for (i, node) in nodes.iter().enumerate() {
        stages.entry(node.stage).or_default().push(i);
    }

    let mut order = Vec::with_capacity(nodes.len());
    for (stage, mut members) in stages {
        if is_agreement_stage(stage, &members, nodes) {
            if config.stage4_enabled {
                members.sort_by_key(|&i| agreement_rank(&nodes[i].name));
            }
        } else if config.sort_by_name {
            members.sort_by(|&a, &b| nodes[a].name.cmp(&nodes[b].name));
        }
        order.extend(members);
    }
    order
}

pub(super) fn order_key(nodes: &[SankeyNode], config: SortConfig) -> String {
    let mut key = format!("{}_{}", config.stage4_enabled, config.sort_by_name);
    for node in nodes {
        key.push('|');
        key.push_str(&node.id);
        key.push(':');
        key.push_str(&node.stage.to_string());
        key.push(':');
        key.push_str(&node.name);
    }
    key
}

/// [`sort_nodes`], memoized on the sort flags and each node's
/// (id, stage, name) in input order.
pub fn sorted_nodes(
    cache: &mut NodeOrderCache,
    nodes: &[SankeyNode],
    config: SortConfig,
) -> Arc<Vec<usize>> {
    let key = order_key(nodes, config);
    cache.get_or_insert_with(&key, || sort_nodes(nodes, config))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheSettings;

    fn node(id: &str, name: &str, stage: u32, category: NodeCategory) -> SankeyNode {
        SankeyNode {
            id: id.into(),
            name: name.into(),
            category,
            stage,
            feature_count: 1,
            parent_path: None,
        }
    }

    fn names(nodes: &[SankeyNode], order: &[usize]) -> Vec<String> {
        order.iter().map(|&i| nodes[i].name.clone()).collect()
    }

    #[test]
    fn test_agreement_rank() {
        assert_eq!(agreement_rank("All 3 Scores High"), 0);
        assert_eq!(agreement_rank("2 of 3 scores high"), 1);
        assert_eq!(agreement_rank("1 of 3 scores high"), 2);
        assert_eq!(agreement_rank("all scores low"), 3);
        assert_eq!(agreement_rank("mystery"), UNKNOWN_AGREEMENT_RANK);
    }

    #[test]
    fn test_agreement_stage_order() {
        let nodes = vec![
            node("a", "all scores low", 4, NodeCategory::ScoreAgreement),
            node("b", "all 3 scores high", 4, NodeCategory::ScoreAgreement),
            node("c", "1 of 3 scores high", 4, NodeCategory::ScoreAgreement),
        ];
        let order = sort_nodes(&nodes, SortConfig::default());
        assert_eq!(
            names(&nodes, &order),
            vec!["all 3 scores high", "1 of 3 scores high", "all scores low"]
        );

        let off = SortConfig {
            stage4_enabled: false,
            ..SortConfig::default()
        };
        assert_eq!(sort_nodes(&nodes, off), vec![0, 1, 2]);
    }

    #[test]
    fn test_unknown_patterns_sort_last_and_stable() {
        let nodes = vec![
            node("x", "odd one", 4, NodeCategory::ScoreAgreement),
            node("y", "another", 4, NodeCategory::ScoreAgreement),
            node("z", "2 of 3 scores high", 4, NodeCategory::ScoreAgreement),
        ];
        assert_eq!(sort_nodes(&nodes, SortConfig::default()), vec![2, 0, 1]);
    }

    #[test]
    fn test_stages_ascend_and_other_stages_keep_input_order() {
        let nodes = vec![
            node("split_true", "Splitting: True", 1, NodeCategory::FeatureSplitting),
            node("root", "All Features", 0, NodeCategory::Root),
            node("split_false", "Splitting: False", 1, NodeCategory::FeatureSplitting),
        ];
        assert_eq!(sort_nodes(&nodes, SortConfig::default()), vec![1, 0, 2]);

        let by_name = SortConfig {
            sort_by_name: true,
            ..SortConfig::default()
        };
        assert_eq!(sort_nodes(&nodes, by_name), vec![1, 2, 0]);
    }

    #[test]
    fn test_agreement_category_outside_stage_four() {
        // Upstream payloads may number the agreement stage differently.
        let nodes = vec![
            node("p", "1 of 3 Scores High", 3, NodeCategory::ScoreAgreement),
            node("q", "All 3 Scores High", 3, NodeCategory::ScoreAgreement),
        ];
        assert_eq!(sort_nodes(&nodes, SortConfig::default()), vec![1, 0]);
    }

    #[test]
    fn test_sorted_nodes_is_memoized() {
        let mut cache = NodeOrderCache::with_system_clock("node_sort", CacheSettings::NODE_SORT);
        let nodes = vec![node("root", "All", 0, NodeCategory::Root)];
        let a = sorted_nodes(&mut cache, &nodes, SortConfig::default());
        let b = sorted_nodes(&mut cache, &nodes, SortConfig::default());
        assert!(Arc::ptr_eq(&a, &b));

        let renamed = vec![node("root", "Everything", 0, NodeCategory::Root)];
        sorted_nodes(&mut cache, &renamed, SortConfig::default());
        assert_eq!(cache.len(), 2);
    }
}

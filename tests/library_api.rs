//! Integration tests for the saeflow library API.

use saeflow::config::CacheConfig;
use saeflow::histogram::{Bins, Statistics};
use saeflow::sankey::{NodeCategory, SankeyLink, SankeyNode, sort_nodes};
use saeflow::threshold::{GlobalThresholds, Metric};
use saeflow::{
    CacheSettings, EvictionCache, GroupOutcome, HistogramData, LayoutEngine, ManualClock,
    SaeflowError, SankeyData, SortConfig, ThresholdStore, api,
};
use std::sync::Arc;
use std::time::Duration;

fn node(id: &str, name: &str, category: NodeCategory, stage: u32) -> SankeyNode {
    SankeyNode {
        id: id.to_string(),
        name: name.to_string(),
        category,
        stage,
        feature_count: 0,
        parent_path: None,
    }
}

fn link(source: &str, target: &str, value: f64) -> SankeyLink {
    SankeyLink {
        source: source.to_string(),
        target: target.to_string(),
        value,
    }
}

fn two_bin_histogram() -> HistogramData {
    HistogramData {
        metric: "semdist_mean".to_string(),
        histogram: Bins {
            bins: vec![0.25, 0.75],
            counts: vec![10, 30],
            bin_edges: vec![0.0, 0.5, 1.0],
        },
        statistics: Some(Statistics {
            min: 0.0,
            max: 1.0,
            mean: 0.6,
            median: 0.7,
            std: 0.2,
        }),
        total_features: 40,
    }
}

fn engine_with_clock() -> (LayoutEngine, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new());
    let engine = LayoutEngine::with_clock(&CacheConfig::default(), clock.clone());
    (engine, clock)
}

#[test]
fn test_score_group_backfills_from_global_default() {
    let mut store = ThresholdStore::default();
    let outcome = store.set_threshold_group("split_true_semdist_high", Metric::ScoreFuzz, 0.6);
    assert_eq!(outcome, GroupOutcome::Grouped);

    let doc = store.to_document();
    let group = &doc.score_agreement_groups["split_true_semdist_high"];
    assert_eq!(group[&Metric::ScoreFuzz], 0.6);
    assert_eq!(group[&Metric::ScoreSimulation], 0.8);
    assert_eq!(group[&Metric::ScoreDetection], 0.8);

    // The semantic-distance node keys the group but is not governed by it.
    assert_eq!(store.resolve("split_true_semdist_high", Metric::ScoreFuzz), 0.8);

    // Agreement children inherit the whole group.
    let child = "split_true_semdist_high_agree_all";
    assert_eq!(store.resolve(child, Metric::ScoreFuzz), 0.6);
    assert_eq!(store.resolve(child, Metric::ScoreDetection), 0.8);
}

#[test]
fn test_node_override_wins_over_group() {
    let mut store = ThresholdStore::default();
    let id = "split_false_semdist_low";
    store.set_node_threshold(id, Metric::SemdistMean, 0.42);
    store.set_threshold_group("split_false", Metric::SemdistMean, 0.3);

    assert_eq!(store.resolve(id, Metric::SemdistMean), 0.42);
    assert_eq!(store.resolve("split_false_semdist_high", Metric::SemdistMean), 0.3);
}

#[test]
fn test_reset_restores_configured_defaults() {
    let defaults = GlobalThresholds {
        semdist_mean: 0.25,
        score_high: 0.5,
    };
    let mut store = ThresholdStore::new(defaults);
    store.set_global_threshold(Metric::ScoreFuzz, 0.9);
    store.set_node_threshold("root", Metric::SemdistMean, 0.7);
    store.set_threshold_group("split_true", Metric::SemdistMean, 0.1);

    store.reset_thresholds();
    assert_eq!(store.resolve("root", Metric::SemdistMean), 0.25);
    assert_eq!(store.resolve("split_true_semdist_high", Metric::SemdistMean), 0.25);
    assert_eq!(store.resolve("split_true_semdist_high_agree_all", Metric::ScoreFuzz), 0.5);
}

#[test]
fn test_histogram_bins_and_densities() {
    let (mut engine, _) = engine_with_clock();
    let layout = engine.histogram(&two_bin_histogram(), 600.0, 300.0);

    let summary: Vec<_> = layout
        .bins
        .iter()
        .map(|b| (b.x0, b.x1, b.count, b.density))
        .collect();
    assert_eq!(summary, vec![(0.0, 0.5, 10, 0.25), (0.5, 1.0, 30, 0.75)]);
    assert!(layout.bins[1].height > layout.bins[0].height);
}

#[test]
fn test_histogram_cache_idempotence_and_expiry() {
    let (mut engine, clock) = engine_with_clock();
    let data = two_bin_histogram();

    let first = engine.histogram(&data, 600.0, 300.0);
    clock.advance(Duration::from_secs(10));
    let second = engine.histogram(&data, 600.0, 300.0);
    assert!(Arc::ptr_eq(&first, &second));

    clock.advance(Duration::from_secs(31));
    let third = engine.histogram(&data, 600.0, 300.0);
    assert!(!Arc::ptr_eq(&first, &third));
    assert_eq!(*first, *third);
}

#[test]
fn test_agreement_stage_ordering() {
    let nodes = vec![
        node("a", "all scores low", NodeCategory::ScoreAgreement, 4),
        node("b", "all 3 scores high", NodeCategory::ScoreAgreement, 4),
        node("c", "1 of 3 scores high", NodeCategory::ScoreAgreement, 4),
    ];
    let order: Vec<_> = sort_nodes(&nodes, SortConfig::default())
        .into_iter()
        .map(|i| nodes[i].name.as_str())
        .collect();
    assert_eq!(
        order,
        vec!["all 3 scores high", "1 of 3 scores high", "all scores low"]
    );
}

#[test]
fn test_unknown_link_target_yields_empty_layout() {
    let data = SankeyData {
        nodes: vec![
            node("root", "All Features", NodeCategory::Root, 0),
            node("split_true", "Splitting", NodeCategory::FeatureSplitting, 1),
        ],
        links: vec![
            link("root", "split_true", 5.0),
            link("root", "split_ghost", 2.0),
        ],
        metadata: None,
    };
    let (mut engine, _) = engine_with_clock();
    let layout = engine.sankey(&data, 900.0, 500.0, SortConfig::default());

    assert!(layout.nodes.is_empty());
    assert!(layout.links.is_empty());
    assert_eq!(layout.width, 900.0);
    assert_eq!(layout.height, 500.0);
    assert_eq!(layout.margin, saeflow::sankey::SANKEY_MARGIN);
}

#[test]
fn test_sankey_layout_places_every_node() {
    let data = SankeyData {
        nodes: vec![
            node("root", "All Features", NodeCategory::Root, 0),
            node("split_true", "Splitting", NodeCategory::FeatureSplitting, 1),
            node("split_false", "No Splitting", NodeCategory::FeatureSplitting, 1),
        ],
        links: vec![
            link("root", "split_true", 10.0),
            link("root", "split_false", 30.0),
        ],
        metadata: None,
    };
    let (mut engine, _) = engine_with_clock();
    let layout = engine.sankey(&data, 800.0, 600.0, SortConfig::default());

    assert_eq!(layout.nodes.len(), 3);
    assert_eq!(layout.links.len(), 2);
    let root = layout.node("root").unwrap();
    let yes = layout.node("split_true").unwrap();
    let no = layout.node("split_false").unwrap();
    assert!(root.x1 <= yes.x0);
    assert!(yes.y1 <= no.y0, "input order is kept within a stage");
    assert!(((no.y1 - no.y0) / (yes.y1 - yes.y0) - 3.0).abs() < 1e-6);
}

#[test]
fn test_eviction_keeps_newest_entries() {
    let clock = Arc::new(ManualClock::new());
    let mut cache: EvictionCache<u32> = EvictionCache::new(
        "test",
        CacheSettings::new(Duration::from_secs(60), 3),
        clock.clone(),
    );
    for i in 0..6 {
        cache.set(format!("k{i}"), i);
        clock.advance(Duration::from_secs(1));
    }
    cache.evict();

    assert_eq!(cache.len(), 3);
    for key in ["k3", "k4", "k5"] {
        assert!(cache.contains_key(key), "{key} should survive");
    }
}

#[test]
fn test_parse_sankey_reports_every_problem() {
    let err = api::parse_sankey(
        r#"{"nodes":[{"id":"root","name":"All","stage":0},{"id":"root","name":"Dup","stage":0}],
            "links":[{"source":"root","target":"nowhere","value":-1}]}"#,
    )
    .unwrap_err();
    assert!(matches!(err, SaeflowError::InvalidPayload(_)));
    assert!(err.problems().len() >= 3, "{:?}", err.problems());
}

#[test]
fn test_parse_histogram_accepts_valid_payload() {
    let json = serde_json::to_string(&two_bin_histogram()).unwrap();
    let data = api::parse_histogram(&json).unwrap();
    assert_eq!(data, two_bin_histogram());
}

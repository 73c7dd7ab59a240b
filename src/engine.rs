//! Composition root for the layout caches.

use crate::cache::{Clock, EvictionCache, SystemClock};
use crate::config::CacheConfig;
use crate::histogram::{self, HistogramCache, HistogramData, HistogramLayout, MultiHistogramLayout};
use crate::sankey::{self, SankeyCaches, SankeyData, SankeyLayout, SortConfig};
use std::sync::Arc;

/// Owns one cache per layout kind and hands them to the layout functions.
#[derive(Debug)]
pub struct LayoutEngine {
    histograms: HistogramCache,
    sankey: SankeyCaches,
}

impl LayoutEngine {
    pub fn new(config: &CacheConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock::new()))
    }

    /// All caches read time from `clock`.
    pub fn with_clock(config: &CacheConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            histograms: EvictionCache::new("histogram", config.histogram, Arc::clone(&clock)),
            sankey: SankeyCaches::new(config.sankey_layout, config.node_sort, clock),
        }
    }

    pub fn histogram(&mut self, data: &HistogramData, width: f64, height: f64) -> Arc<HistogramLayout> {
        histogram::compute_layout(&mut self.histograms, data, width, height)
    }

    pub fn histograms(
        &mut self,
        data: &[HistogramData],
        width: f64,
        height: f64,
    ) -> MultiHistogramLayout {
        histogram::compute_multi_layout(&mut self.histograms, data, width, height)
    }

    pub fn sankey(
        &mut self,
        data: &SankeyData,
        width: f64,
        height: f64,
        sort: SortConfig,
    ) -> Arc<SankeyLayout> {
        sankey::compute_layout(&mut self.sankey, data, width, height, sort)
    }

    pub fn histogram_cache(&self) -> &HistogramCache {
        &self.histograms
    }

    pub fn sankey_caches(&self) -> &SankeyCaches {
        &self.sankey
    }

    pub fn clear(&mut self) {
        self.histograms.clear(None);
        self.sankey.clear();
    }

    /// Sweep every cache. Returns the number of entries dropped.
    pub fn evict(&mut self) -> usize {
        self.histograms.evict() + self.sankey.layouts.evict() + self.sankey.node_orders.evict()
    }
}

impl Default for LayoutEngine {
    fn default() -> Self {
        Self::new(&CacheConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ManualClock;
    use crate::histogram::{Bins, Statistics};
    use std::time::Duration;

    fn payload(metric: &str) -> HistogramData {
        HistogramData {
            metric: metric.into(),
            histogram: Bins {
                bins: vec![0.25, 0.75],
                counts: vec![10, 30],
                bin_edges: vec![0.0, 0.5, 1.0],
            },
            statistics: Some(Statistics {
                min: 0.0,
                max: 1.0,
                ..Default::default()
            }),
            total_features: 40,
        }
    }

    #[test]
    fn test_histogram_cache_hit_then_expiry() {
        let clock = Arc::new(ManualClock::new());
        let mut engine = LayoutEngine::with_clock(&CacheConfig::default(), clock.clone());

        let a = engine.histogram(&payload("score_fuzz"), 400.0, 300.0);
        let b = engine.histogram(&payload("score_fuzz"), 400.0, 300.0);
        assert!(Arc::ptr_eq(&a, &b));

        clock.advance(Duration::from_secs(31));
        let c = engine.histogram(&payload("score_fuzz"), 400.0, 300.0);
        assert!(!Arc::ptr_eq(&a, &c));
        assert_eq!(engine.histogram_cache().len(), 1);
    }

    #[test]
    fn test_evict_and_clear() {
        let clock = Arc::new(ManualClock::new());
        let mut engine = LayoutEngine::with_clock(&CacheConfig::default(), clock.clone());
        engine.histogram(&payload("score_fuzz"), 400.0, 300.0);
        engine.histogram(&payload("score_detection"), 400.0, 300.0);
        engine.sankey(&SankeyData::default(), 400.0, 300.0, SortConfig::default());

        assert_eq!(engine.evict(), 0);
        clock.advance(Duration::from_secs(45));
        // Histogram (30 s) and node-sort (30 s) entries are stale, the layout (60 s) is not.
        assert_eq!(engine.evict(), 3);
        assert_eq!(engine.sankey_caches().layouts.len(), 1);

        engine.clear();
        assert!(engine.sankey_caches().layouts.is_empty());
    }
}

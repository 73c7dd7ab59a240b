//! Histogram layout: bins and counts to pixel rectangles, plus vertical
//! stacking of several histograms and threshold-line projection.

mod scale;
mod validate;

pub use scale::{LinearScale, tick_increment, ticks};
pub use validate::validate_histogram;

use crate::cache::EvictionCache;
use crate::geometry::Margin;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub type HistogramCache = EvictionCache<HistogramLayout>;

pub const HISTOGRAM_MARGIN: Margin = Margin {
    top: 20.0,
    right: 30.0,
    bottom: 50.0,
    left: 60.0,
};

/// Height reserved above each chart in a stacked layout for its title.
pub const STACK_TITLE_HEIGHT: f64 = 24.0;
/// Gap between consecutive charts in a stacked layout.
pub const STACK_SPACING: f64 = 20.0;
/// Charts in a stacked layout never shrink below this height.
pub const STACK_MIN_CHART_HEIGHT: f64 = 120.0;

const NICE_TICK_COUNT: usize = 10;
const BIN_GAP: f64 = 1.0;

/// Histogram payload for one metric, as served by the data service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HistogramData {
    pub metric: String,
    #[serde(default)]
    pub histogram: Bins,
    #[serde(default)]
    pub statistics: Option<Statistics>,
    #[serde(default)]
    pub total_features: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Bins {
    /// Bin centers.
    #[serde(default)]
    pub bins: Vec<f64>,
    #[serde(default)]
    pub counts: Vec<u64>,
    /// `counts.len() + 1` ascending edges.
    #[serde(default)]
    pub bin_edges: Vec<f64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Statistics {
    pub min: f64,
    pub max: f64,
    #[serde(default)]
    pub mean: f64,
    #[serde(default)]
    pub median: f64,
    #[serde(default)]
    pub std: f64,
}

/// One bin in data space (`x0`, `x1`, `count`, `density`) and in pixel space
/// (`x`, `y`, `width`, `height`, relative to the chart's inner area).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BinGeometry {
    pub x0: f64,
    pub x1: f64,
    pub count: u64,
    pub density: f64,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistogramLayout {
    pub metric: String,
    pub bins: Vec<BinGeometry>,
    pub x_scale: LinearScale,
    pub y_scale: LinearScale,
    pub width: f64,
    pub height: f64,
    pub margin: Margin,
    pub chart_width: f64,
    pub chart_height: f64,
}

/// A vertical marker at a threshold value, in inner-area coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ThresholdLine {
    pub x: f64,
    pub y1: f64,
    pub y2: f64,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StackedHistogram {
    pub layout: Arc<HistogramLayout>,
    /// Top of the chart, below its title.
    pub y_offset: f64,
    pub title_y: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MultiHistogramLayout {
    pub charts: Vec<StackedHistogram>,
    pub width: f64,
    /// `max(requested_height, consumed)`; charts may run past the viewport.
    pub total_height: f64,
    pub requested_height: f64,
}

impl MultiHistogramLayout {
    pub fn overflows(&self) -> bool {
        self.total_height > self.requested_height
    }
}

/// Cache key: summary statistics and dimensions, not the bin array.
/// Payloads that agree on these are treated as layout-identical.
pub fn cache_key(data: &HistogramData, width: f64, height: f64) -> String {
    let (min, max) = data
        .statistics
        .map(|s| (s.min, s.max))
        .unwrap_or((0.0, 0.0));
    format!(
        "{}_{}_{}_{}_{}_{}",
        data.metric, width, height, data.total_features, min, max
    )
}

/// Lay out one histogram, reusing a cached layout when the key is fresh.
///
/// Assumes `data` passed [`validate_histogram`].
pub fn compute_layout(
    cache: &mut HistogramCache,
    data: &HistogramData,
    width: f64,
    height: f64,
) -> Arc<HistogramLayout> {
    let key = cache_key(data, width, height);
    cache.get_or_insert_with(&key, || build_layout(data, width, height))
}

/// Uncached layout computation.
pub fn build_layout(data: &HistogramData, width: f64, height: f64) -> HistogramLayout {
    let margin = HISTOGRAM_MARGIN;
    let chart_width = margin.inner_width(width);
    let chart_height = margin.inner_height(height);

    let stats = data.statistics.unwrap_or_default();
    let x_scale = LinearScale::new([stats.min, stats.max], [0.0, chart_width]).nice(NICE_TICK_COUNT);

    let max_count = data.histogram.counts.iter().copied().max().unwrap_or(0);
    // All-zero counts would collapse the domain and float the bars mid-chart.
    let y_max = max_count.max(1) as f64;
    let y_scale = LinearScale::new([0.0, y_max], [chart_height, 0.0]).nice(NICE_TICK_COUNT);

    let total = data.total_features as f64;
    let bins = data
        .histogram
        .counts
        .iter()
        .zip(data.histogram.bin_edges.windows(2))
        .map(|(&count, edges)| {
            let (x0, x1) = (edges[0], edges[1]);
            let density = if total > 0.0 { count as f64 / total } else { 0.0 };
            let px0 = x_scale.apply(x0);
            let px1 = x_scale.apply(x1);
            let y = y_scale.apply(count as f64);
            BinGeometry {
                x0,
                x1,
                count,
                density,
                x: px0,
                y,
                width: (px1 - px0 - BIN_GAP).max(0.0),
                height: (chart_height - y).max(0.0),
            }
        })
        .collect();

    HistogramLayout {
        metric: data.metric.clone(),
        bins,
        x_scale,
        y_scale,
        width,
        height,
        margin,
        chart_width,
        chart_height,
    }
}

/// Stack one chart per payload, top to bottom, in the given order.
///
/// The space left after titles and spacing is split evenly, but no chart
/// gets less than [`STACK_MIN_CHART_HEIGHT`].
pub fn compute_multi_layout(
    cache: &mut HistogramCache,
    data: &[HistogramData],
    width: f64,
    height: f64,
) -> MultiHistogramLayout {
    let n = data.len();
    if n == 0 {
        return MultiHistogramLayout {
            charts: Vec::new(),
            width,
            total_height: height,
            requested_height: height,
        };
    }

    let reserved = n as f64 * STACK_TITLE_HEIGHT + (n - 1) as f64 * STACK_SPACING;
    let chart_height = ((height - reserved) / n as f64).max(STACK_MIN_CHART_HEIGHT);

    let mut offset = 0.0;
    let mut charts = Vec::with_capacity(n);
    for (i, payload) in data.iter().enumerate() {
        let title_y = offset;
        offset += STACK_TITLE_HEIGHT;
        let layout = compute_layout(cache, payload, width, chart_height);
        charts.push(StackedHistogram {
            layout,
            y_offset: offset,
            title_y,
        });
        offset += chart_height;
        if i + 1 < n {
            offset += STACK_SPACING;
        }
    }

    MultiHistogramLayout {
        charts,
        width,
        total_height: height.max(offset),
        requested_height: height,
    }
}

/// Project `threshold` through the layout's x scale; spans the full chart height.
pub fn compute_threshold_line(threshold: f64, layout: &HistogramLayout) -> ThresholdLine {
    ThresholdLine {
        x: layout.x_scale.apply(threshold),
        y1: 0.0,
        y2: layout.chart_height,
        value: threshold,
    }
}

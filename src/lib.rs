pub mod api;
pub mod cache;
pub mod cli;
pub mod commands;
pub mod config;
pub mod engine;
pub mod fs;
pub mod geometry;
pub mod histogram;
pub mod output;
pub mod sankey;
pub mod server;
pub mod style;
pub mod threshold;

pub use api::SaeflowError;
pub use cache::{CacheSettings, Clock, EvictionCache, ManualClock, SystemClock};
pub use cli::Cli;
pub use commands::{
    CommandContext, cmd_histogram, cmd_init, cmd_resolve, cmd_sankey, cmd_serve, cmd_validate,
};
pub use config::Config;
pub use engine::LayoutEngine;
pub use geometry::Margin;
pub use histogram::{HistogramData, HistogramLayout, MultiHistogramLayout};
pub use sankey::{SankeyData, SankeyLayout, SortConfig};
pub use threshold::{GroupOutcome, HierarchicalThresholds, Metric, NodeKind, ThresholdStore};

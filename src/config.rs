use crate::cache::CacheSettings;
use crate::fs::{FileSystem, default_fs};
use crate::threshold::GlobalThresholds;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

pub const CONFIG_FILE_NAME: &str = ".saeflow.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Config {
    pub thresholds: GlobalThresholds,
    pub cache: CacheConfig,
    pub layout: LayoutDefaults,
}

/// Settings for the three layout caches.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CacheConfig {
    pub histogram: CacheSettings,
    pub sankey_layout: CacheSettings,
    pub node_sort: CacheSettings,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            histogram: CacheSettings::HISTOGRAM,
            sankey_layout: CacheSettings::SANKEY_LAYOUT,
            node_sort: CacheSettings::NODE_SORT,
        }
    }
}

/// Container size used when a command or request does not give one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutDefaults {
    pub width: f64,
    pub height: f64,
}

impl Default for LayoutDefaults {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 600.0,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    thresholds: Option<RawThresholds>,
    cache: Option<RawCacheConfig>,
    layout: Option<RawLayout>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawThresholds {
    semdist_mean: Option<f64>,
    score_high: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawCacheConfig {
    histogram: Option<RawCacheSettings>,
    sankey_layout: Option<RawCacheSettings>,
    node_sort: Option<RawCacheSettings>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawCacheSettings {
    ttl_secs: Option<u64>,
    max_entries: Option<usize>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawLayout {
    width: Option<f64>,
    height: Option<f64>,
}

impl RawCacheSettings {
    fn apply(self, defaults: CacheSettings) -> CacheSettings {
        CacheSettings {
            ttl: self.ttl_secs.map(Duration::from_secs).unwrap_or(defaults.ttl),
            max_entries: self.max_entries.unwrap_or(defaults.max_entries),
        }
    }
}

fn merge(raw: Option<RawCacheSettings>, defaults: CacheSettings) -> CacheSettings {
    raw.map(|r| r.apply(defaults)).unwrap_or(defaults)
}

impl Config {
    /// Load `.saeflow.toml` from `dir`, or the defaults when it is absent.
    pub fn load(dir: &Path) -> Result<Self, ConfigError> {
        Self::load_with_fs(dir, default_fs())
    }

    pub fn load_with_fs(dir: &Path, fs: &dyn FileSystem) -> Result<Self, ConfigError> {
        let config_path = dir.join(CONFIG_FILE_NAME);
        if !fs.exists(&config_path) {
            return Ok(Self::default());
        }

        let content = fs.read_to_string(&config_path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let raw: RawConfig = toml::from_str(content)?;
        let defaults = Self::default();

        let thresholds = match raw.thresholds {
            Some(t) => GlobalThresholds {
                semdist_mean: t.semdist_mean.unwrap_or(defaults.thresholds.semdist_mean),
                score_high: t.score_high.unwrap_or(defaults.thresholds.score_high),
            }
            .clamped(),
            None => defaults.thresholds,
        };

        let cache = match raw.cache {
            Some(c) => CacheConfig {
                histogram: merge(c.histogram, defaults.cache.histogram),
                sankey_layout: merge(c.sankey_layout, defaults.cache.sankey_layout),
                node_sort: merge(c.node_sort, defaults.cache.node_sort),
            },
            None => defaults.cache,
        };

        let layout = match raw.layout {
            Some(l) => LayoutDefaults {
                width: l.width.unwrap_or(defaults.layout.width),
                height: l.height.unwrap_or(defaults.layout.height),
            },
            None => defaults.layout,
        };

        Ok(Self {
            thresholds,
            cache,
            layout,
        })
    }
}

/// Starter `.saeflow.toml` with every key at its default.
pub fn generate_config_template() -> String {
    let config = Config::default();
    let cache_section = |name: &str, settings: CacheSettings| {
        format!(
            "[cache.{}]\nttl_secs = {}\nmax_entries = {}\n",
            name,
            settings.ttl.as_secs(),
            settings.max_entries
        )
    };

    format!(
        "# saeflow configuration\n\
         \n\
         # Global fallbacks, used when neither a node nor its group overrides a metric.\n\
         [thresholds]\n\
         semdist_mean = {}\n\
         score_high = {}\n\
         \n\
         {}\n{}\n{}\n\
         # Container size when none is given.\n\
         [layout]\n\
         width = {:.1}\n\
         height = {:.1}\n",
        config.thresholds.semdist_mean,
        config.thresholds.score_high,
        cache_section("histogram", config.cache.histogram),
        cache_section("sankey_layout", config.cache.sankey_layout),
        cache_section("node_sort", config.cache.node_sort),
        config.layout.width,
        config.layout.height,
    )
}

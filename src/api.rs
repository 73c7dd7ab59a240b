//! Library entry points that read payloads, check them and report problems as
//! `Result`s, for callers that would rather not go through the CLI.
//!
//! # Example
//!
//! ```no_run
//! use saeflow::api;
//! use saeflow::{LayoutEngine, SortConfig};
//! use std::path::Path;
//!
//! let data = api::load_sankey(Path::new("sankey.json"))?;
//! let mut engine = LayoutEngine::default();
//! let layout = engine.sankey(&data, 800.0, 600.0, SortConfig::default());
//! println!("{} nodes placed", layout.nodes.len());
//! # Ok::<(), saeflow::SaeflowError>(())
//! ```

use crate::config::ConfigError;
use crate::fs::{FileSystem, default_fs};
use crate::histogram::{HistogramData, validate_histogram};
use crate::sankey::{SankeyData, validate_sankey};
use crate::threshold::{GlobalThresholds, HierarchicalThresholds, ThresholdStore};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SaeflowError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The payload parsed but failed validation.
    #[error("Invalid payload: {}", .0.join("; "))]
    InvalidPayload(Vec<String>),
}

impl SaeflowError {
    /// Validation messages, if this is a validation failure.
    pub fn problems(&self) -> &[String] {
        match self {
            Self::InvalidPayload(problems) => problems,
            _ => &[],
        }
    }
}

fn checked(problems: Vec<String>) -> Result<(), SaeflowError> {
    if problems.is_empty() {
        Ok(())
    } else {
        Err(SaeflowError::InvalidPayload(problems))
    }
}

fn read_json<T: DeserializeOwned>(path: &Path, fs: &dyn FileSystem) -> Result<T, SaeflowError> {
    let content = fs.read_to_string(path).map_err(|source| SaeflowError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(serde_json::from_str(&content)?)
}

/// Parse and validate a Sankey payload.
pub fn parse_sankey(json: &str) -> Result<SankeyData, SaeflowError> {
    let data: SankeyData = serde_json::from_str(json)?;
    checked(validate_sankey(&data))?;
    Ok(data)
}

/// Parse and validate one histogram payload.
pub fn parse_histogram(json: &str) -> Result<HistogramData, SaeflowError> {
    let data: HistogramData = serde_json::from_str(json)?;
    checked(validate_histogram(&data))?;
    Ok(data)
}

pub fn load_sankey(path: &Path) -> Result<SankeyData, SaeflowError> {
    load_sankey_with_fs(path, default_fs())
}

pub fn load_sankey_with_fs(path: &Path, fs: &dyn FileSystem) -> Result<SankeyData, SaeflowError> {
    let data: SankeyData = read_json(path, fs)?;
    checked(validate_sankey(&data))?;
    Ok(data)
}

pub fn load_histogram(path: &Path) -> Result<HistogramData, SaeflowError> {
    load_histogram_with_fs(path, default_fs())
}

pub fn load_histogram_with_fs(
    path: &Path,
    fs: &dyn FileSystem,
) -> Result<HistogramData, SaeflowError> {
    let data: HistogramData = read_json(path, fs)?;
    checked(validate_histogram(&data))?;
    Ok(data)
}

/// Build a store from a hierarchical threshold document on disk. Values are
/// clamped on the way in; `defaults` are what a reset returns to.
pub fn load_thresholds_with_fs(
    path: &Path,
    defaults: GlobalThresholds,
    fs: &dyn FileSystem,
) -> Result<ThresholdStore, SaeflowError> {
    let document: HierarchicalThresholds = read_json(path, fs)?;
    Ok(ThresholdStore::from_document(document, defaults))
}

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A measurement a threshold gates.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
#[value(rename_all = "snake_case")]
pub enum Metric {
    /// Decoder cosine-similarity splitting ratio.
    FeatureSplitting,
    /// Mean semantic distance between explanations.
    SemdistMean,
    ScoreFuzz,
    ScoreSimulation,
    ScoreDetection,
}

/// Which global default a metric falls back to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricFamily {
    SemanticDistance,
    Score,
}

impl Metric {
    pub const ALL: [Metric; 5] = [
        Metric::FeatureSplitting,
        Metric::SemdistMean,
        Metric::ScoreFuzz,
        Metric::ScoreSimulation,
        Metric::ScoreDetection,
    ];

    pub const SCORES: [Metric; 3] = [
        Metric::ScoreFuzz,
        Metric::ScoreSimulation,
        Metric::ScoreDetection,
    ];

    pub fn family(self) -> MetricFamily {
        match self {
            Metric::FeatureSplitting | Metric::SemdistMean => MetricFamily::SemanticDistance,
            Metric::ScoreFuzz | Metric::ScoreSimulation | Metric::ScoreDetection => {
                MetricFamily::Score
            }
        }
    }

    pub fn is_score(self) -> bool {
        self.family() == MetricFamily::Score
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Metric::FeatureSplitting => "feature_splitting",
            Metric::SemdistMean => "semdist_mean",
            Metric::ScoreFuzz => "score_fuzz",
            Metric::ScoreSimulation => "score_simulation",
            Metric::ScoreDetection => "score_detection",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown metric: {0}")]
pub struct UnknownMetric(pub String);

impl FromStr for Metric {
    type Err = UnknownMetric;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Metric::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| UnknownMetric(s.to_string()))
    }
}

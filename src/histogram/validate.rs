use super::HistogramData;

/// Developer-facing problems with a histogram payload. Empty means valid.
pub fn validate_histogram(data: &HistogramData) -> Vec<String> {
    let mut errors = Vec::new();
    let hist = &data.histogram;

    if data.metric.trim().is_empty() {
        errors.push("Histogram metric name is missing".to_string());
    }

    if hist.counts.is_empty() {
        errors.push("Histogram counts are missing or empty".to_string());
    }
    if hist.bin_edges.is_empty() {
        errors.push("Histogram bin_edges are missing or empty".to_string());
    }

    if !hist.counts.is_empty() && !hist.bin_edges.is_empty() {
        if hist.bin_edges.len() != hist.counts.len() + 1 {
            errors.push(format!(
                "Expected {} bin edges for {} counts, found {}",
                hist.counts.len() + 1,
                hist.counts.len(),
                hist.bin_edges.len()
            ));
        }
    }
    if !hist.bins.is_empty() && hist.bins.len() != hist.counts.len() {
        errors.push(format!(
            "Bin centers ({}) and counts ({}) differ in length",
            hist.bins.len(),
            hist.counts.len()
        ));
    }

    if hist.bin_edges.iter().any(|e| !e.is_finite()) {
        errors.push("Histogram bin_edges contain non-finite values".to_string());
    } else if let Some(i) = hist.bin_edges.windows(2).position(|w| w[1] <= w[0]) {
        errors.push(format!(
            "Bin edges must be strictly ascending (edge {} = {} is not greater than edge {} = {})",
            i + 1,
            hist.bin_edges[i + 1],
            i,
            hist.bin_edges[i]
        ));
    }

    match data.statistics {
        None => errors.push("Histogram statistics are missing".to_string()),
        Some(stats) => {
            if !stats.min.is_finite() || !stats.max.is_finite() {
                errors.push("Statistics min/max must be finite".to_string());
            } else if stats.min > stats.max {
                errors.push(format!(
                    "Statistics min ({}) is greater than max ({})",
                    stats.min, stats.max
                ));
            }
        }
    }

    let counted: u64 = hist.counts.iter().sum();
    if data.total_features > 0 && counted > data.total_features {
        errors.push(format!(
            "Bin counts sum to {} but total_features is {}",
            counted, data.total_features
        ));
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::histogram::{Bins, Statistics};

    fn valid() -> HistogramData {
        HistogramData {
            metric: "score_fuzz".into(),
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
    fn test_valid_payload_has_no_errors() {
        assert!(validate_histogram(&valid()).is_empty());
    }

    #[test]
    fn test_missing_arrays_and_statistics() {
        let data = HistogramData {
            metric: "score_fuzz".into(),
            ..Default::default()
        };
        let errors = validate_histogram(&data);
        assert!(errors.iter().any(|e| e.contains("counts")));
        assert!(errors.iter().any(|e| e.contains("bin_edges")));
        assert!(errors.iter().any(|e| e.contains("statistics")));
    }

    #[test]
    fn test_length_mismatch() {
        let mut data = valid();
        data.histogram.bin_edges = vec![0.0, 1.0];
        let errors = validate_histogram(&data);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("Expected 3 bin edges"));
    }

    #[test]
    fn test_non_ascending_edges() {
        let mut data = valid();
        data.histogram.bin_edges = vec![0.0, 0.5, 0.5];
        let errors = validate_histogram(&data);
        assert!(errors[0].contains("strictly ascending"));
    }

    #[test]
    fn test_inverted_statistics() {
        let mut data = valid();
        data.statistics = Some(Statistics {
            min: 2.0,
            max: 1.0,
            ..Default::default()
        });
        assert!(validate_histogram(&data)[0].contains("greater than max"));
    }

    #[test]
    fn test_counts_exceeding_population() {
        let mut data = valid();
        data.total_features = 5;
        assert!(validate_histogram(&data)[0].contains("total_features"));
    }
}

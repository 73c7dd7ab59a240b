use crate::api;
use crate::cli::HistogramArgs;
use crate::fs::{FileSystem, default_fs};
use crate::histogram::{HistogramData, compute_threshold_line};
use crate::output::{HistogramReport, Report};
use crate::style;

use super::{CommandContext, emit, report_error};

pub fn cmd_histogram(args: HistogramArgs, ctx: &CommandContext) -> i32 {
    run_with_fs(&args, ctx, default_fs())
}

fn run_with_fs(args: &HistogramArgs, ctx: &CommandContext, fs: &dyn FileSystem) -> i32 {
    let mut payloads: Vec<HistogramData> = Vec::with_capacity(args.payloads.len());
    for path in &args.payloads {
        match api::load_histogram_with_fs(path, fs) {
            Ok(data) => payloads.push(data),
            Err(e) => {
                report_error(&format!("Cannot lay out {}", style::path(path)), &e);
                return 1;
            }
        }
    }

    let (width, height) = ctx.dimensions(args.width, args.height);
    let mut engine = ctx.engine();

    let report = match payloads.as_slice() {
        [single] => {
            let layout = engine.histogram(single, width, height);
            let threshold_line = args
                .threshold
                .map(|value| compute_threshold_line(value, &layout));
            Report::Histogram(HistogramReport {
                layout,
                threshold_line,
            })
        }
        many => {
            if args.threshold.is_some() {
                style::hint("--threshold applies to a single histogram and is ignored here");
            }
            Report::Histograms(engine.histograms(many, width, height))
        }
    };

    emit(&report, args.format, args.output.as_deref(), fs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::OutputFormat;
    use crate::fs::mock::MockFs;
    use std::path::{Path, PathBuf};

    const PAYLOAD: &str = r#"{
        "metric": "score_fuzz",
        "histogram": {"bins": [0.25, 0.75], "counts": [10, 30], "bin_edges": [0.0, 0.5, 1.0]},
        "statistics": {"min": 0.0, "max": 1.0, "mean": 0.6, "median": 0.7, "std": 0.2},
        "total_features": 40
    }"#;

    #[test]
    fn test_single_histogram_with_threshold() {
        let fs = MockFs::with_file("/in/h.json", PAYLOAD);
        let ctx = CommandContext::with_fs(Path::new("/cfg"), &fs);
        let args = HistogramArgs {
            payloads: vec![PathBuf::from("/in/h.json")],
            width: Some(400.0),
            height: Some(300.0),
            threshold: Some(0.5),
            format: OutputFormat::Json,
            output: Some(PathBuf::from("/out/h.json")),
        };

        assert_eq!(run_with_fs(&args, &ctx, &fs), 0);
        let value: serde_json::Value =
            serde_json::from_str(&fs.contents(Path::new("/out/h.json")).unwrap()).unwrap();
        assert_eq!(value["layout"]["bins"][0]["density"], 0.25);
        assert_eq!(value["threshold_line"]["x"], 155.0);
    }

    #[test]
    fn test_missing_payload_fails() {
        let fs = MockFs::new();
        let ctx = CommandContext::with_fs(Path::new("/cfg"), &fs);
        let args = HistogramArgs {
            payloads: vec![PathBuf::from("/in/missing.json")],
            width: None,
            height: None,
            threshold: None,
            format: OutputFormat::Markdown,
            output: None,
        };
        assert_eq!(run_with_fs(&args, &ctx, &fs), 1);
    }
}

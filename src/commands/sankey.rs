use crate::api;
use crate::cli::SankeyArgs;
use crate::fs::{FileSystem, default_fs};
use crate::output::Report;
use crate::sankey::SortConfig;
use crate::style;

use super::{CommandContext, emit, report_error};

pub fn cmd_sankey(args: SankeyArgs, ctx: &CommandContext) -> i32 {
    run_with_fs(&args, ctx, default_fs())
}

fn run_with_fs(args: &SankeyArgs, ctx: &CommandContext, fs: &dyn FileSystem) -> i32 {
    let data = match api::load_sankey_with_fs(&args.payload, fs) {
        Ok(data) => data,
        Err(e) => {
            report_error(&format!("Cannot lay out {}", style::path(&args.payload)), &e);
            return 1;
        }
    };

    let (width, height) = ctx.dimensions(args.width, args.height);
    let sort = SortConfig {
        stage4_enabled: !args.no_agreement_sort,
        sort_by_name: args.sort_by_name,
    };
    let layout = ctx.engine().sankey(&data, width, height, sort);
    if layout.is_empty() && !data.nodes.is_empty() {
        style::warning("layout is empty; run with RUST_LOG=warn for details");
    }

    emit(&Report::Sankey(layout), args.format, args.output.as_deref(), fs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::OutputFormat;
    use crate::fs::mock::MockFs;
    use std::path::{Path, PathBuf};

    const PAYLOAD: &str = r#"{
        "nodes": [
            {"id": "root", "name": "All Features", "stage": 0, "category": "root", "feature_count": 10},
            {"id": "split_true", "name": "Splitting: True", "stage": 1, "category": "feature_splitting", "feature_count": 4},
            {"id": "split_false", "name": "Splitting: False", "stage": 1, "category": "feature_splitting", "feature_count": 6}
        ],
        "links": [
            {"source": "root", "target": "split_true", "value": 4},
            {"source": "root", "target": "split_false", "value": 6}
        ]
    }"#;

    fn args(output: &str) -> SankeyArgs {
        SankeyArgs {
            payload: PathBuf::from("/in/sankey.json"),
            width: Some(600.0),
            height: Some(400.0),
            no_agreement_sort: false,
            sort_by_name: false,
            format: OutputFormat::Json,
            output: Some(PathBuf::from(output)),
        }
    }

    #[test]
    fn test_writes_layout_json() {
        let fs = MockFs::with_file("/in/sankey.json", PAYLOAD);
        let ctx = CommandContext::with_fs(Path::new("/cfg"), &fs);

        assert_eq!(run_with_fs(&args("/out/layout.json"), &ctx, &fs), 0);
        let written = fs.contents(Path::new("/out/layout.json")).unwrap();
        let value: serde_json::Value = serde_json::from_str(&written).unwrap();
        assert_eq!(value["nodes"].as_array().unwrap().len(), 3);
        assert_eq!(value["width"], 600.0);
    }

    #[test]
    fn test_invalid_payload_fails() {
        let fs = MockFs::with_file("/in/sankey.json", r#"{"nodes": [], "links": []}"#);
        let ctx = CommandContext::with_fs(Path::new("/cfg"), &fs);
        assert_eq!(run_with_fs(&args("/out/layout.json"), &ctx, &fs), 1);
        assert!(fs.contents(Path::new("/out/layout.json")).is_none());
    }
}

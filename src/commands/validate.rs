use crate::api::SaeflowError;
use crate::cli::{PayloadKind, ValidateArgs};
use crate::fs::{FileSystem, default_fs};
use crate::histogram::{HistogramData, validate_histogram};
use crate::sankey::{SankeyData, validate_sankey};
use crate::style;

/// Exit code 0 when the payload is valid, 1 when it has problems or cannot
/// be read.
pub fn cmd_validate(args: ValidateArgs) -> i32 {
    run_with_fs(&args, default_fs())
}

fn problems(args: &ValidateArgs, fs: &dyn FileSystem) -> Result<Vec<String>, SaeflowError> {
    let content = fs
        .read_to_string(&args.payload)
        .map_err(|source| SaeflowError::Io {
            path: args.payload.clone(),
            source,
        })?;
    Ok(match args.kind {
        PayloadKind::Sankey => validate_sankey(&serde_json::from_str::<SankeyData>(&content)?),
        PayloadKind::Histogram => {
            validate_histogram(&serde_json::from_str::<HistogramData>(&content)?)
        }
    })
}

fn run_with_fs(args: &ValidateArgs, fs: &dyn FileSystem) -> i32 {
    match problems(args, fs) {
        Ok(found) if found.is_empty() => {
            style::success(&format!("{} is valid", style::path(&args.payload)));
            0
        }
        Ok(found) => {
            println!(
                "{}",
                style::heading(&format!("{} problem(s) in {}", found.len(), args.payload.display()))
            );
            for problem in &found {
                println!("{}", style::problem(problem));
            }
            1
        }
        Err(e) => {
            style::error(&e.to_string());
            1
        }
    }
}

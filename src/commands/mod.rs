mod histogram;
mod init;
mod resolve;
mod sankey;
mod serve;
mod validate;

pub use histogram::cmd_histogram;
pub use init::{cmd_init, cmd_init_with_fs};
pub use resolve::cmd_resolve;
pub use sankey::cmd_sankey;
pub use serve::cmd_serve;
pub use validate::cmd_validate;

use crate::api::SaeflowError;
use crate::cli::OutputFormat;
use crate::config::Config;
use crate::engine::LayoutEngine;
use crate::fs::{FileSystem, default_fs};
use crate::output::{JsonOutput, MarkdownOutput, OutputFormatter, Report};
use crate::style;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Shared context for command execution: the resolved config directory and
/// the configuration loaded from it.
pub struct CommandContext {
    pub config_dir: PathBuf,
    pub config: Config,
}

impl CommandContext {
    /// A missing config file means defaults; an unreadable one is warned
    /// about and also falls back to defaults.
    pub fn new(config_dir: &Path) -> Self {
        Self::with_fs(config_dir, default_fs())
    }

    pub fn with_fs(config_dir: &Path, fs: &dyn FileSystem) -> Self {
        let config = Config::load_with_fs(config_dir, fs).unwrap_or_else(|e| {
            style::warning(&format!("Failed to load config: {}. Using defaults.", e));
            Config::default()
        });
        Self {
            config_dir: config_dir.to_path_buf(),
            config,
        }
    }

    pub fn engine(&self) -> LayoutEngine {
        LayoutEngine::new(&self.config.cache)
    }

    pub fn dimensions(&self, width: Option<f64>, height: Option<f64>) -> (f64, f64) {
        (
            width.unwrap_or(self.config.layout.width),
            height.unwrap_or(self.config.layout.height),
        )
    }
}

/// Report a library error, listing validation problems one per line.
pub(crate) fn report_error(context: &str, err: &SaeflowError) {
    match err {
        SaeflowError::InvalidPayload(problems) => {
            style::error(&format!("{}: {} problem(s)", context, problems.len()));
            for problem in problems {
                eprintln!("{}", style::problem(problem));
            }
        }
        other => style::error(&format!("{}: {}", context, other)),
    }
}

/// Format `report` and write it to `output`, or stdout.
pub(crate) fn emit(
    report: &Report,
    format: OutputFormat,
    output: Option<&Path>,
    fs: &dyn FileSystem,
) -> i32 {
    let mut buffer = Vec::new();
    let format_result = match format {
        OutputFormat::Markdown => MarkdownOutput::new().format(report, &mut buffer),
        OutputFormat::Json => JsonOutput::new(style::is_terminal() || output.is_some())
            .format(report, &mut buffer),
    };
    if let Err(e) = format_result {
        style::error(&format!("Failed to format output: {}", e));
        return 1;
    }

    let text = String::from_utf8_lossy(&buffer);
    match output {
        Some(path) => {
            if let Err(e) = fs.write(path, &text) {
                style::error(&format!("Could not write output file: {}", e));
                return 1;
            }
            style::success(&format!("Wrote {}", style::path(path)));
        }
        None => {
            let mut stdout = io::stdout().lock();
            if let Err(e) = stdout.write_all(text.as_bytes()) {
                style::error(&format!("Failed to write output: {}", e));
                return 1;
            }
        }
    }
    0
}

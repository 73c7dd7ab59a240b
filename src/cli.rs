use crate::threshold::Metric;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "saeflow")]
#[command(about = "Threshold resolution and Sankey/histogram layout for SAE feature dashboards")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Directory holding .saeflow.toml (defaults to current directory)
    #[arg(long, global = true, default_value = ".")]
    pub config_dir: PathBuf,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Lay out a Sankey payload
    Sankey(SankeyArgs),

    /// Lay out one histogram payload, or stack several
    Histogram(HistogramArgs),

    /// Show the effective thresholds at a node
    Resolve(ResolveArgs),

    /// Check a payload and list every problem found
    Validate(ValidateArgs),

    /// Serve the layout and threshold endpoints over HTTP
    Serve(ServeArgs),

    /// Generate a starter .saeflow.toml configuration file
    Init(InitArgs),
}

#[derive(Parser, Debug, Clone)]
pub struct SankeyArgs {
    /// Sankey payload (JSON with `nodes` and `links`)
    pub payload: PathBuf,

    /// Container width in pixels (defaults to [layout] width)
    #[arg(long)]
    pub width: Option<f64>,

    /// Container height in pixels (defaults to [layout] height)
    #[arg(long)]
    pub height: Option<f64>,

    /// Keep score-agreement nodes in input order
    #[arg(long)]
    pub no_agreement_sort: bool,

    /// Sort nodes of the other stages by display name
    #[arg(long)]
    pub sort_by_name: bool,

    /// Output format
    #[arg(short, long, default_value = "markdown")]
    pub format: OutputFormat,

    /// Output file (defaults to stdout)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Parser, Debug, Clone)]
pub struct HistogramArgs {
    /// Histogram payloads; more than one produces a stacked layout
    #[arg(required = true)]
    pub payloads: Vec<PathBuf>,

    #[arg(long)]
    pub width: Option<f64>,

    #[arg(long)]
    pub height: Option<f64>,

    /// Project a threshold onto a single histogram's x axis
    #[arg(long)]
    pub threshold: Option<f64>,

    #[arg(short, long, default_value = "markdown")]
    pub format: OutputFormat,

    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Parser, Debug, Clone)]
pub struct ResolveArgs {
    /// Node id, e.g. split_true_semdist_high_agree_all
    pub node_id: String,

    /// Only this metric (defaults to all five)
    #[arg(long)]
    pub metric: Option<Metric>,

    /// Hierarchical threshold document to resolve against
    #[arg(long)]
    pub thresholds: Option<PathBuf>,

    /// Other node ids, used to report who shares each group
    #[arg(long, value_delimiter = ',')]
    pub known: Vec<String>,

    #[arg(short, long, default_value = "markdown")]
    pub format: OutputFormat,
}

#[derive(Parser, Debug, Clone)]
pub struct ValidateArgs {
    pub payload: PathBuf,

    /// Payload shape
    #[arg(long, default_value = "sankey")]
    pub kind: PayloadKind,
}

#[derive(Parser, Debug, Clone)]
pub struct ServeArgs {
    /// Port for HTTP server
    #[arg(long, default_value = "3000")]
    pub port: u16,

    /// Open browser automatically
    #[arg(long)]
    pub open: bool,

    /// Seed the threshold store from this document
    #[arg(long)]
    pub thresholds: Option<PathBuf>,
}

#[derive(Parser, Debug, Clone)]
pub struct InitArgs {
    /// Path where to create .saeflow.toml (defaults to current directory)
    #[arg(default_value = ".")]
    pub path: PathBuf,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Markdown,
    Json,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum PayloadKind {
    #[default]
    Sankey,
    Histogram,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_sankey_flags() {
        let cli = Cli::parse_from([
            "saeflow",
            "sankey",
            "data.json",
            "--width",
            "1024",
            "--no-agreement-sort",
            "-f",
            "json",
        ]);
        match cli.command {
            Command::Sankey(args) => {
                assert_eq!(args.width, Some(1024.0));
                assert!(args.no_agreement_sort);
                assert!(!args.sort_by_name);
                assert_eq!(args.format, OutputFormat::Json);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_parse_resolve_metric() {
        let cli = Cli::parse_from([
            "saeflow",
            "resolve",
            "split_true",
            "--metric",
            "semdist_mean",
            "--known",
            "split_true_semdist_high,split_true_semdist_low",
        ]);
        match cli.command {
            Command::Resolve(args) => {
                assert_eq!(args.metric, Some(Metric::SemdistMean));
                assert_eq!(args.known.len(), 2);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }
}

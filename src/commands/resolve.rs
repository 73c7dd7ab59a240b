use crate::api;
use crate::cli::ResolveArgs;
use crate::fs::{FileSystem, default_fs};
use crate::output::{Report, Resolution};
use crate::threshold::{Metric, NodeKind, ThresholdStore};
use crate::style;

use super::{CommandContext, emit, report_error};

pub fn cmd_resolve(args: ResolveArgs, ctx: &CommandContext) -> i32 {
    run_with_fs(&args, ctx, default_fs())
}

fn run_with_fs(args: &ResolveArgs, ctx: &CommandContext, fs: &dyn FileSystem) -> i32 {
    let defaults = ctx.config.thresholds;
    let store = match &args.thresholds {
        Some(path) => match api::load_thresholds_with_fs(path, defaults, fs) {
            Ok(store) => store,
            Err(e) => {
                report_error(&format!("Cannot load {}", style::path(path)), &e);
                return 1;
            }
        },
        None => ThresholdStore::new(defaults),
    };

    if NodeKind::classify(&args.node_id).is_none() {
        style::hint(&format!(
            "'{}' matches no node id convention; global defaults apply",
            args.node_id
        ));
    }

    let resolution = resolve_node(&store, args);
    emit(&Report::Resolution(resolution), args.format, None, fs)
}

fn resolve_node(store: &ThresholdStore, args: &ResolveArgs) -> Resolution {
    let metrics: Vec<Metric> = match args.metric {
        Some(metric) => vec![metric],
        None => Metric::ALL.to_vec(),
    };
    Resolution::compute(store, &args.node_id, &metrics, &args.known)
}

use crate::api;
use crate::cli::ServeArgs;
use crate::fs::default_fs;
use crate::server::{self, AppState};
use crate::style;
use crate::threshold::ThresholdStore;

use super::{CommandContext, report_error};

pub fn cmd_serve(args: ServeArgs, ctx: &CommandContext) -> i32 {
    let defaults = ctx.config.thresholds;
    let store = match &args.thresholds {
        Some(path) => match api::load_thresholds_with_fs(path, defaults, default_fs()) {
            Ok(store) => store,
            Err(e) => {
                report_error(&format!("Cannot load {}", style::path(path)), &e);
                return 1;
            }
        },
        None => ThresholdStore::new(defaults),
    };

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            style::error(&format!("Failed to create tokio runtime: {}", e));
            return 1;
        }
    };

    let state = AppState::new(ctx.config.clone(), store);
    if let Err(e) = rt.block_on(server::serve(state, args.port, args.open)) {
        style::error(&format!("Server failed: {}", e));
        return 1;
    }
    0
}

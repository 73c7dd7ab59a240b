use clap::Parser;
use saeflow::cli::{Cli, Command};
use saeflow::{
    CommandContext, cmd_histogram, cmd_init, cmd_resolve, cmd_sankey, cmd_serve, cmd_validate,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .init();

    let cli = Cli::parse();

    let exit_code = match cli.command {
        Command::Sankey(args) => cmd_sankey(args, &CommandContext::new(&cli.config_dir)),
        Command::Histogram(args) => cmd_histogram(args, &CommandContext::new(&cli.config_dir)),
        Command::Resolve(args) => cmd_resolve(args, &CommandContext::new(&cli.config_dir)),
        Command::Serve(args) => cmd_serve(args, &CommandContext::new(&cli.config_dir)),
        Command::Validate(args) => cmd_validate(args),
        Command::Init(args) => cmd_init(args),
    };

    std::process::exit(exit_code);
}

//! subvend - Azure subscription provisioning
//!
//! Command-line entry point: parses arguments, loads configuration and maps
//! failures to process exit codes.

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use subvend::cli::Cli;
use subvend::config::load_config;
use subvend::utils::format::DisplayUtils;
use subvend::Result;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_logging(cli.debug);

    let display = DisplayUtils::new(cli.no_color);
    if let Err(e) = run(cli).await {
        error!("Error: {}", e);
        display.print_error(&format!("Error: {}", e));
        std::process::exit(e.exit_code());
    }
}

async fn run(cli: Cli) -> Result<()> {
    info!("Starting subvend");

    let config = load_config(cli.config.as_deref()).await?;
    cli.command.validate_config(&config)?;

    cli.execute(config).await
}

fn init_logging(debug: bool) {
    let default_filter = if debug { "subvend=debug" } else { "subvend=info" };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

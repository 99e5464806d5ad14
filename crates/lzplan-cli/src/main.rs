mod cli;
mod commands;
mod output;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Command};
use commands::Settings;
use lzplan_driver::AzCliConfig;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let settings = Settings {
        config: cli.config,
        output: cli.output,
        az: AzCliConfig {
            binary: cli.az_binary,
            subscription: cli.subscription,
        },
    };

    match cli.command.unwrap_or_default() {
        Command::Plan { provider } => commands::plan(settings, provider).await,
        Command::Apply { provider } => commands::apply(settings, provider).await,
        Command::Validate => commands::validate(settings).await,
    }
}

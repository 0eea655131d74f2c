mod commands;
mod config;

use clap::Parser;
use commands::{Cli, Command};
use config::Config;
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = match cli.config.as_deref() {
        Some(path) => Config::from_path(path)?,
        None => Config::default(),
    };

    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        config.log.level.parse().unwrap_or(tracing::Level::INFO)
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let db = cellar_engine::Database::open(config.store_options()?).await?;
    let command: Command = cli.command;
    commands::run(&db, command).await
}

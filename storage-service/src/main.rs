// SPDX-License-Identifier: GPL-3.0-only

//! storage-monitord - watches drives, volumes and mounts and logs how they change

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

mod config;
mod daemon;
mod logging;
mod watch;

use config::{LoggingLevel, MonitorConfig};

/// Removable storage monitor
#[derive(Parser)]
#[command(name = "storage-monitord")]
#[command(about = "Watch drives, volumes and mounts and log how they change", long_about = None)]
struct Cli {
    /// Config file to load instead of the default location
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// Override the configured log level
    #[arg(long, value_enum)]
    log_level: Option<LoggingLevel>,

    /// Extra path to watch for file changes (repeatable)
    #[arg(long = "watch", value_name = "PATH")]
    watch: Vec<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let (mut config, config_error) = match MonitorConfig::load(cli.config.as_deref()) {
        Ok(config) => (config, None),
        Err(e) => (MonitorConfig::default(), Some(e)),
    };
    if let Some(level) = cli.log_level {
        config.log_level = level;
    }
    config.watch_paths.extend(cli.watch);

    logging::init(config.log_level, config.log_file.as_deref());
    if let Some(e) = config_error {
        tracing::warn!("Ignoring config, using defaults: {e}");
    }

    tracing::info!("Starting storage-monitord v{}", env!("CARGO_PKG_VERSION"));
    daemon::run(config).await
}

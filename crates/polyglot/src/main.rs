//! Main entry point for Polyglot.

use anyhow::{Context, Result};
use clap::Parser;
use polyglot::{apply_log_level, load_parser, App, Cli};
use polyglot_common::init_logging;
use polyglot_config::{ConfigCache, ConfigLoader};
use std::sync::Arc;
use tracing::{debug, error};

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = ConfigLoader::new(&cli.config)
        .load()
        .with_context(|| format!("failed to load configuration from {}", cli.config.display()))?;
    let config = Arc::new(ConfigCache::new(config));
    apply_log_level(&config, cli.log_level.as_deref())?;
    let _guard = init_logging(&config.get().logging).context("failed to initialise logging")?;
    debug!(command = ?cli.command, "starting");

    let parser = load_parser(cli.asts.as_deref()).context("failed to load parsed messages")?;
    let app = App::new(config, parser).context("failed to open translation catalogs")?;

    let stdout = std::io::stdout();
    if let Err(e) = app.run(&cli.command, &mut stdout.lock()) {
        error!(error = %e, "command failed");
        return Err(e.into());
    }
    Ok(())
}

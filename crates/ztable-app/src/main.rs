//! ztable - headless table runner
//!
//! Prints the settled page of a table, or the facets of one field, as JSON on stdout.

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use ztable_app::args::{Cli, Commands};
use ztable_app::logging::{self, LoggingConfig};
use ztable_app::{RunRequest, TableRunner};
use ztable_core::ColumnDef;
use ztable_settings::TableSettings;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = if cli.verbose {
        LoggingConfig::development()
    } else {
        LoggingConfig::production()
    };
    if let Err(e) = logging::init(config) {
        // Logging is not up yet
        eprintln!("FATAL: Failed to initialize logging: {}", e);
        std::process::exit(1);
    }

    tracing::debug!(version = env!("CARGO_PKG_VERSION"), "starting ztable");

    if let Err(e) = run(cli).await {
        tracing::error!(error = %e, "ztable run failed");
        eprintln!("error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let settings = match &cli.settings {
        Some(path) => TableSettings::load_from(path)?,
        None => TableSettings::load()?,
    };

    let source = cli
        .data_source()
        .context("Provide --data <file> or --url <endpoint>")?;
    let mut request = RunRequest::new(source).with_query(cli.query.clone());
    if let Some(path) = &cli.columns {
        request = request.with_columns(load_columns(path)?);
    }
    if let Some(path) = &cli.storage {
        request = request.with_storage_file(path);
    }

    let runner = TableRunner::new(settings);
    match cli.command.unwrap_or(Commands::Page) {
        Commands::Page => {
            let report = runner.page(&request).await?;
            print_json(&report, cli.pretty)
        }
        Commands::Facets { field } => {
            let options = runner.facets(&request, &field).await?;
            print_json(&options, cli.pretty)
        }
    }
}

fn load_columns(path: &std::path::Path) -> Result<Vec<ColumnDef>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read columns from {:?}", path))?;
    serde_json::from_str(&content).with_context(|| "Failed to parse column definitions")
}

fn print_json<T: Serialize>(value: &T, pretty: bool) -> Result<()> {
    let output = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{}", output);
    Ok(())
}

//! Pairs, categorizes and files extracted expense documents.
//!
//! The pipeline takes the structured records produced by an upstream
//! extractor, groups invoices with their vouchers (`matching`), picks a
//! folder per group (`categorize`), builds a filename per document
//! (`naming`) and writes the result into an output tree (`execution`).

pub mod categorize;
pub mod cli;
pub mod config;
pub mod error;
pub mod execution;
pub mod matching;
pub mod naming;
pub mod organizer;
pub mod records;

pub use config::{OrganizerConfig, PlacementMode};
pub use error::{OrganizeError, PlacementError, Result};
pub use organizer::{organize, preview};
pub use records::{load_manifest, Category, Record};

use anyhow::Context;
use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// CLI entry point
pub fn run() -> anyhow::Result<ExitCode> {
    // Load .env so RUST_LOG can be set there
    let _ = dotenvy::dotenv();

    // Default: warn for dependencies, info for run summaries.
    // Use RUST_LOG=reimburse_lib=debug for per-file logs
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("warn,reimburse_lib=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = cli::Cli::parse();

    let config = OrganizerConfig::load_or_default(cli.config.as_deref())
        .context("Failed to load configuration")?;
    let config = cli.apply(config);

    let records = load_manifest(&cli.manifest)
        .with_context(|| format!("Failed to read manifest {}", cli.manifest.display()))?;

    if cli.dry_run {
        config.folders.validate().context("Invalid folder labels")?;
        let plan = preview(&records, &config.folders);
        if cli.json {
            println!("{}", serde_json::to_string_pretty(&plan)?);
        } else {
            print!("{}", cli::render_plan(&plan));
        }
        return Ok(ExitCode::SUCCESS);
    }

    let report = organize(&records, &config)
        .with_context(|| format!("Cannot organize into {}", config.output_root.display()))?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", cli::render_summary(&report.summary()));
    }

    if report.has_failures() {
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}

#![doc = "docs-pull: documentation-tree synchronization pipeline."]

//! Fetches remote documentation archives, gates them on a branch
//! whitelist, atomically replaces the local tree, rebuilds the navigation
//! sitemap and signals the downstream search index.
//!
//! External collaborators (the search indexer, notification subscribers,
//! the archive transport) plug in through the traits in [`contract`].

pub mod branch;
pub mod config;
pub mod contract;
pub mod download;
pub mod load_config;
pub mod replace;
pub mod retry;
pub mod sitemap;
pub mod synchronise;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::download::HttpDownloader;
use crate::load_config::load_config;
use crate::synchronise::{LoggingIndex, SyncReport, Syncer};

#[derive(Parser)]
#[clap(
    name = "docs-pull",
    version,
    about = "Pull documentation archives and rebuild the local tree and sitemap"
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Synchronize all configured sources unconditionally
    Sync {
        /// Path to the YAML config file
        #[clap(long)]
        config: PathBuf,
    },
    /// Synchronize only if no sitemap exists yet (bootstrap check)
    Ensure {
        /// Path to the YAML config file
        #[clap(long)]
        config: PathBuf,
        /// Run even when a sitemap is already present
        #[clap(long)]
        force: bool,
    },
}

/// CLI logic entrypoint, shared by main() and the integration tests.
pub async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Sync { config } => {
            let syncer = build_syncer(config)?;
            let report = syncer.run().await;
            print_report(&report);
        }
        Commands::Ensure { config, force } => {
            let syncer = build_syncer(config)?;
            match syncer.ensure_synced(force).await? {
                Some(report) => print_report(&report),
                None => println!("Documentation already synced, nothing to do."),
            }
        }
    }
    Ok(())
}

fn build_syncer(config_path: PathBuf) -> Result<Syncer<LoggingIndex>> {
    let config = load_config(config_path)?;
    let downloader =
        HttpDownloader::new().map_err(|e| anyhow::anyhow!("failed to build http client: {e}"))?;
    Ok(Syncer::new(config, Box::new(downloader), LoggingIndex))
}

fn print_report(report: &SyncReport) {
    println!(
        "Sync complete: {} synced, {} skipped.",
        report.synced, report.skipped
    );
}

//! Argument parsing and the top-level run.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::info;

use dirsync_cloud::{DetectionStrategy, S3ObjectStore, SyncConfig, SyncEngine};

/// Mirror local directories into an S3 bucket.
#[derive(Debug, Parser)]
#[command(name = "dirsync", version)]
pub struct Cli {
    /// Path to the JSON configuration file.
    #[arg(short, long, default_value = "config.json")]
    pub config: PathBuf,

    /// Verify every remote object against the file on disk instead of
    /// trusting the persisted snapshot.
    #[arg(long)]
    pub live: bool,
}

pub async fn run(cli: Cli) -> Result<()> {
    let mut config = SyncConfig::load(&cli.config)
        .with_context(|| format!("loading config from {}", cli.config.display()))?;
    if cli.live {
        config.strategy = DetectionStrategy::Live;
    }

    let store = Arc::new(S3ObjectStore::new(&config).await);
    let engine = SyncEngine::new(store, config);

    let summary = engine.run().await?;
    info!(
        uploaded = summary.uploaded(),
        deleted = summary.deleted,
        "done"
    );

    if !summary.is_clean() {
        bail!("{} transfer unit(s) failed; see log for keys", summary.failed);
    }
    Ok(())
}

mod cli;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let args = cli::Cli::parse();
    let result = cli::run(args).await;
    if let Err(e) = &result {
        tracing::error!(error = %e, "sync run failed");
    }
    result
}

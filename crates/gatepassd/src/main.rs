use anyhow::{Context, Result};
use gatepass_core::Config;
use gatepass_net::{spawn_pipeline, DeliveryClient};
use std::sync::Arc;
use tokio::io::BufReader;
use tracing_subscriber::EnvFilter;

mod feed;
mod input;

#[tokio::main]
async fn main() -> Result<()> {
    // stdout is left alone; stdin carries the event stream.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("gatepassd starting");

    // Fail fast on configuration, mapping or client errors.
    let config = Config::from_env().context("failed to load configuration")?;
    let mapping = config
        .mapping
        .load()
        .context("failed to load credential mapping")?;
    let delivery = DeliveryClient::from_config(&config).context("failed to build delivery client")?;

    let pipeline = spawn_pipeline(Arc::new(mapping), Arc::new(delivery));
    tracing::info!(endpoint = %config.endpoint, "gatepassd ready; reading classifier events from stdin");

    let stdin = BufReader::new(tokio::io::stdin());
    let shutdown = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };
    let summary = feed::feed(stdin, &pipeline, shutdown).await;
    tracing::info!(
        submitted = summary.submitted,
        malformed = summary.malformed,
        abandoned = summary.abandoned,
        "event stream finished"
    );

    tracing::info!("gatepassd shutting down");
    Ok(())
}

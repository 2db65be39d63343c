//! BigQuery remote-function server.
//!
//! Configuration comes from `BQ_BRIDGE_CONFIG` (YAML) plus environment
//! overrides; see [`bq_genai_bridge::config`]. Logging honours `RUST_LOG`.

use std::sync::Arc;

use anyhow::Context;
use bq_genai_bridge::{server, BatchDispatcher, BridgeConfig, GeminiCaller, RequestHandler};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("bq_genai_bridge=info,tower_http=info")),
        )
        .init();

    let config = Arc::new(BridgeConfig::load().context("loading configuration")?);
    let caller = GeminiCaller::from_env(config.clone()).context("building Gemini client")?;
    info!(
        model = %config.model,
        endpoint = %caller.transport().endpoint(),
        concurrency = config.dispatch.concurrency_limit,
        item_timeout_secs = ?config.dispatch.item_timeout_secs,
        max_retries = config.dispatch.retry.max_retries,
        "starting bridge"
    );

    let handler = Arc::new(RequestHandler::new(
        Arc::new(caller),
        BatchDispatcher::from_config(&config.dispatch),
    ));

    server::serve(&config.server, handler)
        .await
        .context("serving HTTP")?;
    Ok(())
}

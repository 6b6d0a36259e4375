use crate::relay_logic::config::Config;
use crate::relay_logic::state::AppState;
use lib_common::ingestors::{GatewaySource, IngestRunner};
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

/// Runs the chat gateway ingest until shutdown or until retries run out.
/// Without a token the relay only serves HTTP pushes.
pub async fn run(config: Config, app_state: AppState, mut shutdown: broadcast::Receiver<()>) {
    if config.token().is_none() {
        log::warn!("No bot token configured; upstream gateway disabled.");
        return;
    }

    let token = CancellationToken::new();
    let bridge = token.clone();
    tokio::spawn(async move {
        shutdown.recv().await.ok();
        bridge.cancel();
    });

    log::info!("Connecting to chat gateway: {}", config.gateway().url);
    let runner = IngestRunner::new(
        GatewaySource::new(config.gateway()),
        app_state.pipeline.clone(),
        app_state.upstream.clone(),
        config.reconnect_policy(),
    );

    match runner.run(token).await {
        Ok(()) => log::info!("Upstream shutting down..."),
        Err(e) => log::error!("Upstream stopped: {}", e),
    }
}

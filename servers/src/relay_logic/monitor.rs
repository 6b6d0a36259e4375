use crate::relay_logic::state::AppState;
use tokio::sync::broadcast;
use tokio::time::interval;

/// Periodically drops queue entries older than the configured TTL.
pub async fn run(app_state: AppState, mut shutdown: broadcast::Receiver<()>) {
    let period = app_state.pipeline.config().queue.sweep_interval();
    let mut sweep_interval = interval(period);

    loop {
        tokio::select! {
            _ = shutdown.recv() => {
                log::info!("Monitor service received shutdown signal.");
                break;
            }
            _ = sweep_interval.tick() => {
                let removed = app_state.queue().sweep();
                if removed > 0 {
                    log::info!(
                        "Expired {} queued server(s); {} remaining",
                        removed,
                        app_state.queue().len()
                    );
                }
            }
        }
    }
}

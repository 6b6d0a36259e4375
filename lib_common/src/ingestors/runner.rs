use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use super::{IngestError, MessageSource};
use crate::core::pipeline::RelayPipeline;
use crate::core::upstream_manager::{ConnectionStatus, ReconnectPolicy, UpstreamState};

enum ReadEnd {
    Shutdown,
    Closed,
    Failed(IngestError),
}

/// # Ingest Runner
///
/// Drives a [`MessageSource`]: connect, read until the connection drops, wait
/// out the backoff, repeat. The attempt counter resets after every successful
/// connect; once the policy's budget is spent the runner stops with
/// [`IngestError::RetriesExhausted`] and the upstream status stays `Exhausted`.
pub struct IngestRunner<S> {
    source: S,
    pipeline: Arc<RelayPipeline>,
    upstream: Arc<UpstreamState>,
    policy: ReconnectPolicy,
}

impl<S: MessageSource> IngestRunner<S> {
    pub fn new(
        source: S,
        pipeline: Arc<RelayPipeline>,
        upstream: Arc<UpstreamState>,
        policy: ReconnectPolicy,
    ) -> Self {
        Self {
            source,
            pipeline,
            upstream,
            policy,
        }
    }

    /// Runs until `shutdown` is cancelled (`Ok`) or retries run out (`Err`).
    pub async fn run(mut self, shutdown: CancellationToken) -> Result<(), IngestError> {
        let mut attempt: u32 = 0;

        loop {
            let status = if attempt == 0 {
                ConnectionStatus::Connecting
            } else {
                ConnectionStatus::Reconnecting
            };
            self.upstream.set_status(status, format!("attempt {}", attempt)).await;

            let connected = tokio::select! {
                _ = shutdown.cancelled() => break,
                res = self.source.connect() => res,
            };

            match connected {
                Ok(()) => {
                    attempt = 0;
                    self.upstream.set_attempt(0);
                    self.upstream.set_status(ConnectionStatus::Connected, "").await;

                    match self.read_loop(&shutdown).await {
                        ReadEnd::Shutdown => break,
                        ReadEnd::Closed => log::warn!("Upstream connection closed."),
                        ReadEnd::Failed(e) => log::error!("Upstream connection lost: {}", e),
                    }
                }
                Err(e) => log::error!("Upstream connect failed: {}", e),
            }

            attempt += 1;
            self.upstream.set_attempt(attempt);
            let Some(delay) = self.policy.delay_for(attempt) else {
                let attempts = attempt - 1;
                self.upstream
                    .set_status(ConnectionStatus::Exhausted, "manual restart required")
                    .await;
                log::error!(
                    "Upstream reconnect gave up after {} attempts. Manual restart required.",
                    attempts
                );
                return Err(IngestError::RetriesExhausted { attempts });
            };

            log::info!(
                "Reconnecting in {}s (attempt {}/{})",
                delay.as_secs_f64(),
                attempt,
                self.policy.max_attempts
            );
            self.upstream
                .set_status(ConnectionStatus::Reconnecting, format!("retry in {:?}", delay))
                .await;

            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = tokio::time::sleep(delay) => {}
            }
        }

        self.upstream.set_status(ConnectionStatus::Disconnected, "shutdown").await;
        log::info!("Ingest runner stopped.");
        Ok(())
    }

    async fn read_loop(&mut self, shutdown: &CancellationToken) -> ReadEnd {
        loop {
            let next = tokio::select! {
                biased;
                _ = shutdown.cancelled() => return ReadEnd::Shutdown,
                next = self.source.next_message() => next,
            };

            match next {
                Ok(Some(message)) => {
                    if self.upstream.is_paused() {
                        log::debug!("Paused, skipping message {:?}", message.id);
                        continue;
                    }
                    self.pipeline.process(&message);
                }
                Ok(None) => return ReadEnd::Closed,
                Err(e) => return ReadEnd::Failed(e),
            }
        }
    }
}

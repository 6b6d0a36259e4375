use async_trait::async_trait;
use lib_common::configs::RelayConfig;
use lib_common::core::{ConnectionStatus, ReconnectPolicy, UpstreamState};
use lib_common::ingestors::{IngestError, IngestRunner, MessageSource};
use lib_common::model::InboundMessage;
use project_tests::*;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Serves one batch of messages, then reports the connection as closed and
/// refuses every later connect.
struct OneShot {
    pending: Option<Vec<InboundMessage>>,
    current: VecDeque<InboundMessage>,
}

#[async_trait]
impl MessageSource for OneShot {
    async fn connect(&mut self) -> Result<(), IngestError> {
        match self.pending.take() {
            Some(batch) => {
                self.current = batch.into();
                Ok(())
            }
            None => Err(IngestError::Protocol("gateway unavailable".into())),
        }
    }

    async fn next_message(&mut self) -> Result<Option<InboundMessage>, IngestError> {
        Ok(self.current.pop_front())
    }
}

#[tokio::test(start_paused = true)]
async fn test_runner_feeds_the_pipeline_then_gives_up() {
    let pipeline = pipeline(RelayConfig::default());
    let upstream = Arc::new(UpstreamState::new());
    let source = OneShot {
        pending: Some(vec![
            text_message(chilli_hub_content()),
            text_message(positional_content("5", "0/s")),
        ]),
        current: VecDeque::new(),
    };
    let policy = ReconnectPolicy {
        base_delay: Duration::from_secs(1),
        max_delay: Duration::from_secs(2),
        max_attempts: 2,
    };

    let runner = IngestRunner::new(source, Arc::clone(&pipeline), Arc::clone(&upstream), policy);
    let result = runner.run(CancellationToken::new()).await;

    assert!(matches!(result, Err(IngestError::RetriesExhausted { attempts: 2 })));
    assert_eq!(upstream.status().await, ConnectionStatus::Exhausted);

    let stats = pipeline.stats().snapshot(0);
    assert_eq!(stats.messages_processed, 2);
    assert_eq!(stats.servers_sent, 1);
    assert_eq!(stats.servers_filtered, 1);
    assert_eq!(pipeline.queue().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_stops_a_retrying_runner() {
    let pipeline = pipeline(RelayConfig::default());
    let upstream = Arc::new(UpstreamState::new());
    let source = OneShot {
        pending: None,
        current: VecDeque::new(),
    };
    let runner = IngestRunner::new(source, pipeline, Arc::clone(&upstream), ReconnectPolicy::default());

    let shutdown = CancellationToken::new();
    let handle = tokio::spawn(runner.run(shutdown.clone()));

    tokio::time::sleep(Duration::from_secs(30)).await;
    assert!(upstream.attempt() >= 1);
    shutdown.cancel();

    assert!(handle.await.unwrap().is_ok());
}

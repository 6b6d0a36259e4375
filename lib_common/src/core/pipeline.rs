//! # Relay Pipeline
//!
//! The message handler: channel check, parse, filter, then queue and fan out.
//! Every outcome is counted in [`RelayStats`]; nothing here fails outward.

use std::sync::Arc;

use crate::configs::RelayConfig;
use crate::core::dispatcher::Dispatcher;
use crate::core::metrics::RelayStats;
use crate::core::relay_queue::{PushReceipt, RelayQueue};
use crate::filters::FilterEngine;
use crate::model::{InboundMessage, ServerEvent};
use crate::parsers::{self, ParseFailure};

/// What happened to one inbound message.
#[derive(Debug, Clone, PartialEq)]
pub enum ProcessOutcome {
    /// Channel not in the monitored set.
    IgnoredChannel,
    Unparsed(ParseFailure),
    Filtered { reason: String },
    Accepted(ServerEvent),
}

pub struct RelayPipeline {
    config: Arc<RelayConfig>,
    filter: FilterEngine,
    queue: Arc<RelayQueue>,
    dispatcher: Arc<Dispatcher>,
    stats: Arc<RelayStats>,
}

impl RelayPipeline {
    pub fn new(
        config: Arc<RelayConfig>,
        queue: Arc<RelayQueue>,
        dispatcher: Arc<Dispatcher>,
        stats: Arc<RelayStats>,
    ) -> Self {
        Self {
            filter: FilterEngine::new(config.filters.clone()),
            config,
            queue,
            dispatcher,
            stats,
        }
    }

    pub fn config(&self) -> &RelayConfig {
        &self.config
    }

    pub fn queue(&self) -> &Arc<RelayQueue> {
        &self.queue
    }

    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }

    pub fn stats(&self) -> &Arc<RelayStats> {
        &self.stats
    }

    pub fn process(&self, message: &InboundMessage) -> ProcessOutcome {
        if !self.config.is_monitored(&message.channel_id) {
            self.stats.record_ignored();
            return ProcessOutcome::IgnoredChannel;
        }

        let logging = &self.config.logging;
        if logging.log_raw_messages {
            match serde_json::to_string(message) {
                Ok(raw) => log::debug!("Raw message from {}: {}", message.author_name(), raw),
                Err(e) => log::debug!("Raw message could not be rendered: {}", e),
            }
        }

        let event = match parsers::parse_message(message, &self.config) {
            Ok(event) => event,
            Err(failure) => {
                log::debug!("Message {:?} not parsed: {}", message.id, failure);
                self.stats.record_unparsed();
                return ProcessOutcome::Unparsed(failure);
            }
        };
        self.stats.record_processed();

        if logging.log_parsed_data {
            log::debug!("Parsed event: {:?}", event);
        }

        let verdict = self.filter.evaluate(&event);
        if !verdict.accepted {
            let reason = verdict.reason.unwrap_or_default();
            if logging.log_filter_results {
                log::info!("Filtered {}: {}", event.name.as_deref().unwrap_or("<unnamed>"), reason);
            } else {
                log::debug!("Filtered {}: {}", event.name.as_deref().unwrap_or("<unnamed>"), reason);
            }
            self.stats.record_filtered();
            return ProcessOutcome::Filtered { reason };
        }

        self.relay(&event);
        self.stats.record_accepted(&event);
        log::info!(
            "Relayed {} ({}M/s, {}) [{}]",
            event.name.as_deref().unwrap_or("<unnamed>"),
            event.money_rate.unwrap_or(0.0),
            event.players.as_deref().unwrap_or("?/?"),
            event.source_dialect.as_str()
        );
        ProcessOutcome::Accepted(event)
    }

    /// Queues and broadcasts an event without parsing or filtering it, as the
    /// HTTP push endpoint does for external producers.
    pub fn relay(&self, event: &ServerEvent) -> PushReceipt {
        let receipt = self.queue.push(event.clone());
        if receipt.evicted_oldest {
            log::warn!("Relay queue full ({}), dropped oldest entry", self.queue.capacity());
        }
        self.dispatcher.broadcast(event);
        receipt
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    const CHANNEL: &str = "1266358579934269463";
    const ID: &str = "aaaaaaaa-bbbb-cccc-dddd-eeeeeeeeeeee";

    fn pipeline(config: RelayConfig) -> RelayPipeline {
        RelayPipeline::new(
            Arc::new(config),
            Arc::new(RelayQueue::new(10, Duration::from_secs(10))),
            Arc::new(Dispatcher::new()),
            Arc::new(RelayStats::new()),
        )
    }

    fn message(channel: &str, content: &str) -> InboundMessage {
        InboundMessage {
            channel_id: channel.into(),
            content: content.into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_unmonitored_channel_is_ignored() {
        let p = pipeline(RelayConfig::default());
        let outcome = p.process(&message("1", "Name\nFoo"));
        assert_eq!(outcome, ProcessOutcome::IgnoredChannel);
        assert!(p.queue().is_empty());
        assert_eq!(p.stats().snapshot(0).messages_ignored, 1);
    }

    #[test]
    fn test_accepted_event_is_queued_and_broadcast() {
        let p = pipeline(RelayConfig::default());
        let mut sub = p.dispatcher().register("ws-1");

        let outcome = p.process(&message(CHANNEL, &format!("Name\nFoo\nMoney\n2M\nJob ID\n{ID}")));
        let ProcessOutcome::Accepted(event) = outcome else {
            panic!("expected acceptance, got {outcome:?}");
        };
        assert_eq!(event.job_id.as_deref(), Some(ID));
        assert_eq!(p.queue().len(), 1);
        assert!(sub.lines.try_recv().unwrap().starts_with("name=Foo|money=2.0|"));

        let snap = p.stats().snapshot(0);
        assert_eq!((snap.messages_processed, snap.servers_sent, snap.unique_servers), (1, 1, 1));
    }

    #[test]
    fn test_filtered_event_is_counted_not_queued() {
        let p = pipeline(RelayConfig::default());
        let outcome = p.process(&message(CHANNEL, "Name\nFoo\nPlayers\n18/18"));
        assert!(matches!(outcome, ProcessOutcome::Filtered { ref reason } if reason.contains("threshold")));
        assert!(p.queue().is_empty());
        assert_eq!(p.stats().snapshot(0).servers_filtered, 1);
    }

    #[test]
    fn test_unparsed_message() {
        let p = pipeline(RelayConfig::default());
        let outcome = p.process(&message(CHANNEL, "hello there"));
        assert!(matches!(outcome, ProcessOutcome::Unparsed(ParseFailure::EmptyEvent(_))));
        assert_eq!(p.stats().snapshot(0).messages_unparsed, 1);
        assert_eq!(p.stats().snapshot(0).messages_processed, 0);
    }
}

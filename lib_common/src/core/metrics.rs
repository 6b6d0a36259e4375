use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::model::ServerEvent;

/// Most recent accepted server, for the stats view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LastServer {
    pub name: Option<String>,
    pub money: Option<f64>,
    pub players: Option<String>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct Counters {
    processed: u64,
    accepted: u64,
    filtered: u64,
    unparsed: u64,
    ignored_channel: u64,
    unique_names: HashSet<String>,
    last_server: Option<LastServer>,
}

/// Point-in-time copy of [`RelayStats`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatsSnapshot {
    pub messages_processed: u64,
    pub servers_sent: u64,
    pub servers_filtered: u64,
    pub messages_unparsed: u64,
    pub messages_ignored: u64,
    pub queue_overflow_drops: u64,
    pub unique_servers: usize,
    pub last_server: Option<LastServer>,
}

/// # Relay Stats
///
/// All pipeline counters behind one lock. Writers call the `record_*` methods;
/// readers take a [`StatsSnapshot`]. The underlying sets never leave this type.
#[derive(Debug, Default)]
pub struct RelayStats {
    inner: Mutex<Counters>,
}

impl RelayStats {
    pub fn new() -> Self {
        Self::default()
    }

    fn counters(&self) -> MutexGuard<'_, Counters> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// A message parsed into an event, whatever the filter later decides.
    pub fn record_processed(&self) {
        self.counters().processed += 1;
    }

    pub fn record_accepted(&self, event: &ServerEvent) {
        let mut c = self.counters();
        c.accepted += 1;
        if let Some(name) = &event.name {
            c.unique_names.insert(name.clone());
        }
        c.last_server = Some(LastServer {
            name: event.name.clone(),
            money: event.money_rate,
            players: event.players.clone(),
            timestamp: Utc::now(),
        });
    }

    pub fn record_filtered(&self) {
        self.counters().filtered += 1;
    }

    pub fn record_unparsed(&self) {
        self.counters().unparsed += 1;
    }

    pub fn record_ignored(&self) {
        self.counters().ignored_channel += 1;
    }

    /// `queue_overflow_drops` is owned by the queue and passed in by the caller.
    pub fn snapshot(&self, queue_overflow_drops: u64) -> StatsSnapshot {
        let c = self.counters();
        StatsSnapshot {
            messages_processed: c.processed,
            servers_sent: c.accepted,
            servers_filtered: c.filtered,
            messages_unparsed: c.unparsed,
            messages_ignored: c.ignored_channel,
            queue_overflow_drops,
            unique_servers: c.unique_names.len(),
            last_server: c.last_server.clone(),
        }
    }
}

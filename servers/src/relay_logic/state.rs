use crate::relay_logic::model::PingRecord;
use lib_common::configs::RelayConfig;
use lib_common::core::{Dispatcher, RelayPipeline, RelayQueue, RelayStats, UpstreamState};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};

/// How many pings `/api/logs` remembers.
pub const PING_LOG_CAPACITY: usize = 50;

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<RelayPipeline>,
    pub upstream: Arc<UpstreamState>,
    ping_log: Arc<Mutex<VecDeque<PingRecord>>>,
}

impl AppState {
    pub fn new(relay: RelayConfig) -> Self {
        let queue = Arc::new(RelayQueue::new(relay.queue.capacity, relay.queue.ttl()));
        let pipeline = RelayPipeline::new(
            Arc::new(relay),
            queue,
            Arc::new(Dispatcher::new()),
            Arc::new(RelayStats::new()),
        );
        Self {
            pipeline: Arc::new(pipeline),
            upstream: Arc::new(UpstreamState::new()),
            ping_log: Arc::new(Mutex::new(VecDeque::with_capacity(PING_LOG_CAPACITY))),
        }
    }

    pub fn queue(&self) -> &Arc<RelayQueue> {
        self.pipeline.queue()
    }

    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        self.pipeline.dispatcher()
    }

    pub fn record_ping(&self, record: PingRecord) {
        let mut log = self.ping_log.lock().unwrap_or_else(PoisonError::into_inner);
        if log.len() >= PING_LOG_CAPACITY {
            log.pop_front();
        }
        log.push_back(record);
    }

    pub fn recent_pings(&self) -> Vec<PingRecord> {
        let log = self.ping_log.lock().unwrap_or_else(PoisonError::into_inner);
        log.iter().cloned().collect()
    }
}

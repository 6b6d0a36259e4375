//! # Upstream Manager
//!
//! Connection status of the inbound message source, the cooperative pause flag
//! consulted before each message, and the reconnect backoff policy.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::time::Duration;

use serde::Serialize;
use tokio::sync::RwLock;

/// Lifecycle of the inbound connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionStatus {
    Disconnected,
    Connecting,
    Connected,
    Reconnecting,
    /// Retry budget spent; only a restart brings the source back.
    Exhausted,
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            ConnectionStatus::Disconnected => "disconnected",
            ConnectionStatus::Connecting => "connecting",
            ConnectionStatus::Connected => "connected",
            ConnectionStatus::Reconnecting => "reconnecting",
            ConnectionStatus::Exhausted => "exhausted",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpstreamSnapshot {
    pub status: ConnectionStatus,
    pub detail: String,
    pub attempt: u32,
    pub paused: bool,
}

/// # Upstream State
///
/// Shared between the ingest runner (writer) and the HTTP surface (reader).
#[derive(Debug)]
pub struct UpstreamState {
    status: RwLock<(ConnectionStatus, String)>,
    attempt: AtomicU32,
    paused: AtomicBool,
}

impl Default for UpstreamState {
    fn default() -> Self {
        Self {
            status: RwLock::new((ConnectionStatus::Disconnected, String::new())),
            attempt: AtomicU32::new(0),
            paused: AtomicBool::new(false),
        }
    }
}

impl UpstreamState {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_status(&self, status: ConnectionStatus, detail: impl Into<String>) {
        let detail = detail.into();
        let mut guard = self.status.write().await;
        if guard.0 != status {
            log::info!("Upstream status: {} -> {} {}", guard.0, status, detail);
        }
        *guard = (status, detail);
    }

    pub async fn status(&self) -> ConnectionStatus {
        self.status.read().await.0
    }

    pub fn set_attempt(&self, attempt: u32) {
        self.attempt.store(attempt, Ordering::Relaxed);
    }

    pub fn attempt(&self) -> u32 {
        self.attempt.load(Ordering::Relaxed)
    }

    pub fn pause(&self) {
        self.paused.store(true, Ordering::SeqCst);
        log::info!("Upstream processing paused");
    }

    pub fn resume(&self) {
        self.paused.store(false, Ordering::SeqCst);
        log::info!("Upstream processing resumed");
    }

    /// Flips the pause flag and returns the new value.
    pub fn toggle_pause(&self) -> bool {
        let paused = !self.paused.fetch_xor(true, Ordering::SeqCst);
        log::info!("Upstream processing {}", if paused { "paused" } else { "resumed" });
        paused
    }

    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::SeqCst)
    }

    pub async fn snapshot(&self) -> UpstreamSnapshot {
        let (status, detail) = self.status.read().await.clone();
        UpstreamSnapshot {
            status,
            detail,
            attempt: self.attempt(),
            paused: self.is_paused(),
        }
    }
}

/// Exponential backoff with a ceiling and a bounded number of attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub max_attempts: u32,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            base_delay: Duration::from_secs(5),
            max_delay: Duration::from_secs(300),
            max_attempts: 50,
        }
    }
}

impl ReconnectPolicy {
    /// Delay before reconnect attempt `attempt` (1-based), or `None` once the
    /// attempt budget is spent.
    pub fn delay_for(&self, attempt: u32) -> Option<Duration> {
        if attempt == 0 || attempt > self.max_attempts {
            return None;
        }
        let factor = 2u32.saturating_pow(attempt - 1);
        Some(self.base_delay.saturating_mul(factor).min(self.max_delay))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_doubles_and_caps() {
        let policy = ReconnectPolicy::default();
        assert_eq!(policy.delay_for(1), Some(Duration::from_secs(5)));
        assert_eq!(policy.delay_for(2), Some(Duration::from_secs(10)));
        assert_eq!(policy.delay_for(4), Some(Duration::from_secs(40)));
        assert_eq!(policy.delay_for(7), Some(Duration::from_secs(300)));
        assert_eq!(policy.delay_for(50), Some(Duration::from_secs(300)));
        assert_eq!(policy.delay_for(51), None);
        assert_eq!(policy.delay_for(0), None);
    }

    #[test]
    fn test_pause_flag() {
        let state = UpstreamState::new();
        assert!(!state.is_paused());
        assert!(state.toggle_pause());
        assert!(state.is_paused());
        assert!(!state.toggle_pause());
        state.pause();
        assert!(state.is_paused());
        state.resume();
        assert!(!state.is_paused());
    }

    #[tokio::test]
    async fn test_status_snapshot() {
        let state = UpstreamState::new();
        assert_eq!(state.status().await, ConnectionStatus::Disconnected);
        state.set_attempt(3);
        state.set_status(ConnectionStatus::Reconnecting, "retry in 20s").await;

        let snap = state.snapshot().await;
        assert_eq!(snap.status, ConnectionStatus::Reconnecting);
        assert_eq!(snap.detail, "retry in 20s");
        assert_eq!(snap.attempt, 3);
        assert!(!snap.paused);
    }
}

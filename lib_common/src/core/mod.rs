//! # Core Engine Module
//!
//! Everything between a parsed event and its consumers.
//!
//! ## Core Components:
//!
//! - **`relay_queue`**: bounded, insertion-ordered, TTL-evicting buffer read by
//!   HTTP pullers.
//! - **`dispatcher`**: fan-out of wire lines to live WebSocket consumers.
//! - **`wire`**: the flat `key=value|...` line format.
//! - **`metrics`**: lock-protected aggregate counters.
//! - **`pipeline`**: the message handler tying parsing, filtering, queueing and
//!   broadcasting together.
//! - **`upstream_manager`**: inbound connection status, pause flag and reconnect
//!   policy.

/// Fan-out of wire lines to live consumers.
pub mod dispatcher;
/// Aggregate pipeline counters.
pub mod metrics;
/// Inbound message handler.
pub mod pipeline;
/// Bounded TTL relay queue.
pub mod relay_queue;
/// Upstream connection status and reconnect policy.
pub mod upstream_manager;
/// Broadcast line format.
pub mod wire;

// --- Public API Re-exports ---
pub use dispatcher::{ClientSubscription, Dispatcher, WireLine};
pub use metrics::{RelayStats, StatsSnapshot};
pub use pipeline::{ProcessOutcome, RelayPipeline};
pub use relay_queue::{PushReceipt, QueueEntry, QueuedEvent, RelayQueue};
pub use upstream_manager::{ConnectionStatus, ReconnectPolicy, UpstreamSnapshot, UpstreamState};

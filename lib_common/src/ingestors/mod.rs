//! # Data Ingestors Module
//!
//! Inbound side of the relay. A [`MessageSource`] hands over chat messages one
//! at a time; the [`IngestRunner`] owns the connect / read / reconnect cycle
//! around any source and feeds what it reads into the pipeline.
//!
//! ## Contained Modules:
//! - **`gateway_wss`**: WebSocket client for the chat platform's real-time
//!   gateway (hello, identify, heartbeats, dispatch).
//! - **`runner`**: backoff-driven connection loop with the pause check.

use async_trait::async_trait;
use thiserror::Error;
use tokio_tungstenite::tungstenite;

use crate::model::InboundMessage;

/// WebSocket client for the chat gateway.
pub mod gateway_wss;
/// Reconnecting read loop around a message source.
pub mod runner;

// --- Public API Re-exports ---
pub use gateway_wss::{GatewayConfig, GatewaySource};
pub use runner::IngestRunner;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("failed to connect to {url}: {source}")]
    Connect {
        url: String,
        #[source]
        source: tungstenite::Error,
    },

    #[error("transport error: {0}")]
    Transport(#[from] tungstenite::Error),

    #[error("undecodable gateway payload: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("gateway protocol error: {0}")]
    Protocol(String),

    #[error("connection closed by remote host")]
    Closed,

    #[error("gateway requested a reconnect")]
    ReconnectRequested,

    #[error("gateway invalidated the session")]
    InvalidSession,

    #[error("gave up after {attempts} reconnect attempts, manual restart required")]
    RetriesExhausted { attempts: u32 },
}

/// # Message Source
///
/// Anything that can deliver inbound chat messages. `next_message` yields
/// `Ok(None)` when the remote side closes cleanly; every failure, including a
/// protocol-level request to reconnect, is an [`IngestError`].
#[async_trait]
pub trait MessageSource: Send {
    async fn connect(&mut self) -> Result<(), IngestError>;

    async fn next_message(&mut self) -> Result<Option<InboundMessage>, IngestError>;
}

//! # Data Model
//!
//! The canonical shapes that flow through the relay: the inbound chat message as
//! delivered by the platform, and the normalized [`ServerEvent`] every dialect
//! parser reduces it to.

/// Canonical server discovery event and filter verdict.
pub mod event;
/// Inbound chat message, embeds and forwarded snapshots.
pub mod message;

pub use event::{FilterVerdict, ServerEvent, SourceDialect, HIGH_VALUE_THRESHOLD};
pub use message::{Author, Embed, EmbedField, InboundMessage, MessageSnapshot, SnapshotMessage};

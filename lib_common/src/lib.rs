//! # lib_common
//!
//! Shared engine of the discovery relay. Raw chat notifications come in through
//! an ingestor, are reduced to one canonical [`model::ServerEvent`] by the dialect
//! parsers, pass through the filter engine and land in the relay queue, from which
//! HTTP pollers pull and WebSocket listeners are fed by the dispatcher.
//!
//! Each folder is gated behind a cargo feature of the same name; `full` (the
//! default) turns on everything.

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms, unused_qualifications)]

// Declare the modules to re-export
#[cfg(feature = "configs")]
pub mod configs;
#[cfg(feature = "model")]
pub mod model;
#[cfg(feature = "parsers")]
pub mod parsers;
#[cfg(feature = "filters")]
pub mod filters;
#[cfg(feature = "core")]
pub mod core;
#[cfg(feature = "ingestors")]
pub mod ingestors;

// Re-export the types most callers need
#[cfg(feature = "configs")]
pub use configs::config_relay::RelayConfig;
#[cfg(feature = "model")]
pub use model::{InboundMessage, ServerEvent, SourceDialect};

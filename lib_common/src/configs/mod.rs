//! # Configuration Modules
//!
//! This module aggregates the relay's configuration: which channels are watched,
//! how structured fields are recognised, which events the filter accepts and how
//! the relay queue is sized.

// // Statements: Exporting sub-modules to make them accessible via lib_common::configs
/// Relay configuration types and JSON file loading.
pub mod config_relay;

pub use config_relay::{
    AllowListConfig, ConfigError, FieldPatterns, FilterConfig, LoggingConfig, MoneyRange,
    PositionalConfig, PositionalFilterConfig, QueueConfig, RelayConfig,
};

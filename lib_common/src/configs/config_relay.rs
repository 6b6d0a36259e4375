//! # Relay Configuration
//!
//! Everything the pipeline needs to know that is not process plumbing: watched
//! channels, field-name patterns, dialect-specific constants, filter rules and
//! queue sizing. Every field carries a default, so a configuration file only has
//! to mention what it changes.

use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error occurred: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid relay configuration JSON: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// # Relay Config
///
/// Root of the relay configuration tree, usually read from the `relay` section
/// of the server's JSON config file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RelayConfig {
    /// Channel identifiers whose messages are processed; everything else is ignored.
    pub monitored_channels: HashSet<String>,
    /// Field-name patterns used by the structured-embed dialect.
    pub patterns: FieldPatterns,
    /// Constants of the positional (UUID-first) vendor dialect.
    pub positional: PositionalConfig,
    /// Acceptance rules.
    pub filters: FilterConfig,
    /// Relay queue sizing and expiry.
    pub queue: QueueConfig,
    /// Optional debug output switches.
    pub logging: LoggingConfig,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            monitored_channels: [
                "1266358579934269463",
                "1266358579934269464",
                "1422270976632160316",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            patterns: FieldPatterns::default(),
            positional: PositionalConfig::default(),
            filters: FilterConfig::default(),
            queue: QueueConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl RelayConfig {
    /// Reads a relay configuration from a JSON file. Missing keys keep their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    /// Parses a relay configuration from a JSON string.
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn is_monitored(&self, channel_id: &str) -> bool {
        self.monitored_channels.contains(channel_id)
    }
}

impl fmt::Display for RelayConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "RelayConfig
    Monitored channels: {},
    Queue: capacity {}, ttl {}s, sweep every {}s,
    Money range: [{}, {}],
    Player threshold: {},
    Positional filter enabled: {},
    Bypass high-value block: {}
",
            self.monitored_channels.len(),
            self.queue.capacity,
            self.queue.ttl_secs,
            self.queue.sweep_interval_secs,
            self.filters.money.min,
            self.filters.money.max,
            self.filters.player_threshold,
            self.filters.positional.enabled,
            self.filters.bypass_high_value
        )
    }
}

/// Substrings matched against embed field names. A field may match several
/// categories; later fields overwrite earlier matches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FieldPatterns {
    pub name: Vec<String>,
    pub money: Vec<String>,
    pub players: Vec<String>,
    pub job_id: Vec<String>,
    pub script: Vec<String>,
    pub join_link: Vec<String>,
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Default for FieldPatterns {
    fn default() -> Self {
        Self {
            name: strings(&["Name", "Server Name", "name"]),
            money: strings(&["Money", "Money per sec", "Income", "money"]),
            players: strings(&["Players", "players"]),
            job_id: strings(&["Job ID", "JobID", "job_id"]),
            script: strings(&["Script", "Join Script", "script"]),
            join_link: strings(&["Join Link", "Link", "join_link"]),
        }
    }
}

/// Constants of the positional vendor dialect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PositionalConfig {
    /// Phrase whose presence in the message text selects the positional dialect.
    pub marker_phrase: String,
    /// Place identifier embedded in the synthesized rejoin script.
    pub place_id: u64,
    /// Capacity appended to bare player counts (`"5"` becomes `"5/18"`).
    pub server_capacity: u32,
}

impl Default for PositionalConfig {
    fn default() -> Self {
        Self {
            marker_phrase: "Ice Hub Finder - Target Located".to_string(),
            place_id: 109983668079237,
            server_capacity: 18,
        }
    }
}

impl PositionalConfig {
    /// Builds the rejoin invocation for a discovered job id.
    pub fn script_for(&self, job_id: &str) -> String {
        format!(
            "game:GetService('TeleportService'):TeleportToPlaceInstance({}, '{}')",
            self.place_id, job_id
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FilterConfig {
    pub positional: PositionalFilterConfig,
    pub money: MoneyRange,
    /// Events whose current player count is at or above this value are rejected.
    pub player_threshold: u32,
    pub ignore_unknown: bool,
    pub ignore_list: Vec<String>,
    pub allow_list: AllowListConfig,
    /// When false, high-value events are rejected outright.
    pub bypass_high_value: bool,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            positional: PositionalFilterConfig::default(),
            money: MoneyRange::default(),
            player_threshold: 18,
            ignore_unknown: false,
            ignore_list: Vec::new(),
            allow_list: AllowListConfig::default(),
            bypass_high_value: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PositionalFilterConfig {
    pub enabled: bool,
    pub require_job_id: bool,
    pub min_players: u32,
    pub max_players: u32,
    pub ignore_zero_income: bool,
}

impl Default for PositionalFilterConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            require_job_id: true,
            min_players: 1,
            max_players: 18,
            ignore_zero_income: true,
        }
    }
}

/// Inclusive money-rate range in canonical (M/s) units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MoneyRange {
    pub min: f64,
    pub max: f64,
}

impl Default for MoneyRange {
    fn default() -> Self {
        Self {
            min: 0.0,
            max: 999999.0,
        }
    }
}

impl MoneyRange {
    pub fn contains(&self, value: f64) -> bool {
        self.min <= value && value <= self.max
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AllowListConfig {
    pub enabled: bool,
    pub allowed_names: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QueueConfig {
    /// Maximum number of queued events; the oldest is dropped on overflow.
    pub capacity: usize,
    /// Maximum age of a queued event before the sweep removes it.
    pub ttl_secs: u64,
    /// Period of the expiry sweep.
    pub sweep_interval_secs: u64,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            capacity: 100,
            ttl_secs: 10,
            sweep_interval_secs: 10,
        }
    }
}

impl QueueConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs.max(1))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggingConfig {
    /// Dump the raw inbound message JSON at debug level.
    pub log_raw_messages: bool,
    /// Dump every extracted event at debug level.
    pub log_parsed_data: bool,
    /// Log rejection reasons at info level instead of debug.
    pub log_filter_results: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_raw_messages: true,
            log_parsed_data: true,
            log_filter_results: true,
        }
    }
}

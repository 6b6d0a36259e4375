use clap::Parser;
use lib_common::configs::RelayConfig;
use lib_common::core::ReconnectPolicy;
use lib_common::ingestors::GatewayConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

const DEFAULT_CONFIG_FILE: &str = "server_relay.conf";

#[derive(Parser, Deserialize, Serialize, Debug, Clone, Default)]
#[clap(about = "Server discovery relay: chat gateway in, HTTP and WebSocket out", version)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[clap(long, env = "RELAY_PORT", help = "Port to listen on for HTTP and WebSocket clients.")]
    pub port: Option<u16>,

    #[clap(long, env = "RELAY_CONFIG_PATH", help = "Path to the JSON configuration file.")]
    pub config_path: Option<PathBuf>,

    #[clap(long, env = "RELAY_LOG_DIR", help = "Directory for log files.")]
    pub log_dir: Option<PathBuf>,

    #[clap(long, env = "RELAY_LOG_LEVEL", help = "Logging level (trace, debug, info, warn, error).")]
    pub log_level: Option<String>,

    #[clap(long, env = "RELAY_GATEWAY_URL", help = "Chat gateway WebSocket URL.")]
    pub gateway_url: Option<String>,

    #[clap(long, env = "DISCORD_TOKEN", hide_env_values = true, help = "Bot token; the upstream is disabled when unset.")]
    #[serde(skip_serializing)]
    pub discord_token: Option<String>,

    #[clap(long, env = "RELAY_RECONNECT_BASE_DELAY_SECS", help = "Base delay in seconds for upstream reconnect attempts.")]
    pub reconnect_base_delay_secs: Option<u64>,

    #[clap(long, env = "RELAY_RECONNECT_MAX_DELAY_SECS", help = "Maximum delay in seconds between upstream reconnect attempts.")]
    pub reconnect_max_delay_secs: Option<u64>,

    #[clap(long, env = "RELAY_MAX_RECONNECT_ATTEMPTS", help = "Reconnect attempts before the upstream gives up.")]
    pub max_reconnect_attempts: Option<u32>,

    #[clap(long, env = "TLS_CERT_PATH", help = "Path to the TLS certificate file.")]
    pub tls_cert_path: Option<PathBuf>,

    #[clap(long, env = "TLS_KEY_PATH", help = "Path to the TLS private key file.")]
    pub tls_key_path: Option<PathBuf>,

    /// Pipeline settings; only read from the configuration file.
    #[clap(skip)]
    pub relay: Option<RelayConfig>,
}

impl Config {
    // Merge two Config structs, where 'other' overrides 'self' for Some values
    fn merge(self, other: Config) -> Config {
        Config {
            port: other.port.or(self.port),
            config_path: other.config_path.or(self.config_path),
            log_dir: other.log_dir.or(self.log_dir),
            log_level: other.log_level.or(self.log_level),
            gateway_url: other.gateway_url.or(self.gateway_url),
            discord_token: other.discord_token.or(self.discord_token),
            reconnect_base_delay_secs: other.reconnect_base_delay_secs.or(self.reconnect_base_delay_secs),
            reconnect_max_delay_secs: other.reconnect_max_delay_secs.or(self.reconnect_max_delay_secs),
            max_reconnect_attempts: other.max_reconnect_attempts.or(self.max_reconnect_attempts),
            tls_cert_path: other.tls_cert_path.or(self.tls_cert_path),
            tls_key_path: other.tls_key_path.or(self.tls_key_path),
            relay: other.relay.or(self.relay),
        }
    }

    fn defaults() -> Config {
        let policy = ReconnectPolicy::default();
        Config {
            port: Some(5000),
            log_dir: Some(PathBuf::from("./logs")),
            log_level: Some("info".to_string()),
            gateway_url: Some(GatewayConfig::default().url),
            reconnect_base_delay_secs: Some(policy.base_delay.as_secs()),
            reconnect_max_delay_secs: Some(policy.max_delay.as_secs()),
            max_reconnect_attempts: Some(policy.max_attempts),
            relay: Some(RelayConfig::default()),
            ..Default::default()
        }
    }

    pub fn port(&self) -> u16 {
        self.port.unwrap_or(5000)
    }

    pub fn log_dir(&self) -> PathBuf {
        self.log_dir.clone().unwrap_or_else(|| PathBuf::from("./logs"))
    }

    pub fn log_level(&self) -> &str {
        self.log_level.as_deref().unwrap_or("info")
    }

    /// The bot token, when one is configured and not blank.
    pub fn token(&self) -> Option<&str> {
        self.discord_token.as_deref().map(str::trim).filter(|t| !t.is_empty())
    }

    pub fn relay(&self) -> RelayConfig {
        self.relay.clone().unwrap_or_default()
    }

    pub fn gateway(&self) -> GatewayConfig {
        let mut gateway = GatewayConfig::default();
        if let Some(url) = &self.gateway_url {
            gateway.url = url.clone();
        }
        if let Some(token) = self.token() {
            gateway.token = token.to_string();
        }
        gateway
    }

    pub fn reconnect_policy(&self) -> ReconnectPolicy {
        let default = ReconnectPolicy::default();
        ReconnectPolicy {
            base_delay: self
                .reconnect_base_delay_secs
                .map(Duration::from_secs)
                .unwrap_or(default.base_delay),
            max_delay: self
                .reconnect_max_delay_secs
                .map(Duration::from_secs)
                .unwrap_or(default.max_delay),
            max_attempts: self.max_reconnect_attempts.unwrap_or(default.max_attempts),
        }
    }

    /// Both TLS paths, when both are configured.
    pub fn tls_paths(&self) -> Option<(PathBuf, PathBuf)> {
        match (&self.tls_cert_path, &self.tls_key_path) {
            (Some(cert), Some(key)) => Some((cert.clone(), key.clone())),
            _ => None,
        }
    }
}

/// Reads a configuration file; problems are logged and the file is skipped.
fn read_config_file(path: &Path) -> Option<Config> {
    if !path.exists() {
        log::info!("Config file not found at {}. Using defaults and environment/CLI variables.", path.display());
        return None;
    }

    match fs::read_to_string(path) {
        Ok(config_str) => match serde_json::from_str::<Config>(&config_str) {
            Ok(file_config) => Some(file_config),
            Err(e) => {
                log::warn!("Failed to parse config file {}: {}. Falling back to other sources.", path.display(), e);
                None
            }
        },
        Err(e) => {
            log::warn!("Failed to read config file {}: {}. Falling back to other sources.", path.display(), e);
            None
        }
    }
}

/// Layers defaults, the JSON file and the parsed CLI/environment values.
pub fn resolve(cli: Config) -> Config {
    let config_file_path = cli
        .config_path
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));

    let mut current_config = Config::defaults();
    if let Some(file_config) = read_config_file(&config_file_path) {
        current_config = current_config.merge(file_config);
    }
    current_config.merge(cli)
}

pub fn load_config() -> Config {
    // A missing .env file is normal.
    let _ = dotenvy::dotenv();
    resolve(Config::parse())
}

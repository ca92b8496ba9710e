//! Agent Configuration
//!
//! Settings shared by every admin operation issued from this node. Values come from
//! `REPLICA_ADMIN_*` environment variables, falling back to defaults.

use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const ENV_PREFIX: &str = "REPLICA_ADMIN_";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value '{value}' for {key}")]
    Invalid { key: String, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Admin port of the local storage node.
    pub admin_port: u16,
    /// Cluster name, used for metadata locations.
    pub cluster: String,
    /// Address this node advertises as upstream for its own replicas.
    pub self_address: String,
    pub request_timeout_ms: u64,
    /// Bandwidth cap for backups/restores that do not set their own.
    pub default_rate_limit_mbs: Option<u32>,
    pub share_files_with_checksum: bool,
    /// `tracing` filter directive for the binary.
    pub log_level: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            admin_port: 9090,
            cluster: "default".to_string(),
            self_address: "127.0.0.1".to_string(),
            request_timeout_ms: 10_000,
            default_rate_limit_mbs: None,
            share_files_with_checksum: false,
            log_level: "info".to_string(),
        }
    }
}

impl AgentConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn metadata_location(&self, resource: &str) -> String {
        crate::naming::metadata_location(&self.cluster, resource)
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from an arbitrary `key -> value` source. Keys carry [`ENV_PREFIX`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let get = |name: &str| {
            let key = format!("{}{}", ENV_PREFIX, name);
            lookup(&key).map(|value| (key, value))
        };

        if let Some((key, value)) = get("ADMIN_PORT") {
            config.admin_port = parse(&key, &value)?;
        }
        if let Some((_, value)) = get("CLUSTER") {
            config.cluster = value;
        }
        if let Some((_, value)) = get("SELF_ADDRESS") {
            config.self_address = value;
        }
        if let Some((key, value)) = get("REQUEST_TIMEOUT_MS") {
            config.request_timeout_ms = parse(&key, &value)?;
        }
        if let Some((key, value)) = get("RATE_LIMIT_MBS") {
            config.default_rate_limit_mbs = Some(parse(&key, &value)?);
        }
        if let Some((key, value)) = get("SHARE_FILES_WITH_CHECKSUM") {
            config.share_files_with_checksum = parse(&key, &value)?;
        }
        if let Some((_, value)) = get("LOG_LEVEL") {
            config.log_level = value;
        }

        Ok(config)
    }
}

fn parse<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::Invalid {
        key: key.to_string(),
        value: value.to_string(),
    })
}

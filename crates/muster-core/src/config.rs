//! Configuration system for Muster.
//!
//! Resolution order: environment variables → config file → defaults.
//!
//! Config file location:
//!   1. $MUSTER_CONFIG (explicit override)
//!   2. $XDG_CONFIG_HOME/muster/config.toml
//!   3. ~/.config/muster/config.toml

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MusterConfig {
    pub network: NetworkConfig,
    pub discovery: DiscoveryConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Rendezvous service address.
    pub service_addr: String,
    /// Rendezvous service UDP port.
    pub service_port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// How long to wait for a registration reply before retrying.
    pub register_timeout_ms: u64,
    /// Registration attempts before giving up.
    pub register_attempts: u32,
    /// Interval between directory refreshes. 0 = never refresh.
    pub refresh_interval_secs: u64,
}

// ── Defaults ──────────────────────────────────────────────────────────────────

impl Default for MusterConfig {
    fn default() -> Self {
        Self {
            network: NetworkConfig::default(),
            discovery: DiscoveryConfig::default(),
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            service_addr: "127.0.0.1".to_string(),
            service_port: 12345,
        }
    }
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            register_timeout_ms: 2000,
            register_attempts: 3,
            refresh_interval_secs: 10,
        }
    }
}

// ── Path helpers ──────────────────────────────────────────────────────────────

fn config_dir() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| dirs_or_home().join(".config"))
        .join("muster")
}

fn dirs_or_home() -> PathBuf {
    std::env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/tmp"))
}

// ── Errors ────────────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {0}: {1}")]
    ReadFailed(PathBuf, std::io::Error),
    #[error("failed to parse {0}: {1}")]
    ParseFailed(PathBuf, toml::de::Error),
    #[error("failed to write {0}: {1}")]
    WriteFailed(PathBuf, std::io::Error),
    #[error("failed to serialize: {0}")]
    SerializeFailed(toml::ser::Error),
}

// ── Loading ───────────────────────────────────────────────────────────────────

impl MusterConfig {
    /// Load config: env vars → file → defaults.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::file_path();
        let mut config = if path.exists() {
            let text = std::fs::read_to_string(&path)
                .map_err(|e| ConfigError::ReadFailed(path.clone(), e))?;
            toml::from_str(&text).map_err(|e| ConfigError::ParseFailed(path.clone(), e))?
        } else {
            MusterConfig::default()
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Config file path.
    pub fn file_path() -> PathBuf {
        std::env::var("MUSTER_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| config_dir().join("config.toml"))
    }

    /// Write default config if none exists. Returns the path.
    pub fn write_default_if_missing() -> Result<PathBuf, ConfigError> {
        let path = Self::file_path();
        if !path.exists() {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| ConfigError::WriteFailed(path.clone(), e))?;
            }
            let text = toml::to_string_pretty(&MusterConfig::default())
                .map_err(ConfigError::SerializeFailed)?;
            std::fs::write(&path, text)
                .map_err(|e| ConfigError::WriteFailed(path.clone(), e))?;
        }
        Ok(path)
    }

    /// Apply MUSTER_* env var overrides.
    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("MUSTER_NETWORK__SERVICE_ADDR") {
            self.network.service_addr = v;
        }
        if let Ok(v) = std::env::var("MUSTER_NETWORK__SERVICE_PORT") {
            if let Ok(p) = v.parse() {
                self.network.service_port = p;
            }
        }
        if let Ok(v) = std::env::var("MUSTER_DISCOVERY__REGISTER_TIMEOUT_MS") {
            if let Ok(ms) = v.parse() {
                self.discovery.register_timeout_ms = ms;
            }
        }
        if let Ok(v) = std::env::var("MUSTER_DISCOVERY__REGISTER_ATTEMPTS") {
            if let Ok(n) = v.parse() {
                self.discovery.register_attempts = n;
            }
        }
        if let Ok(v) = std::env::var("MUSTER_DISCOVERY__REFRESH_INTERVAL_SECS") {
            if let Ok(secs) = v.parse() {
                self.discovery.refresh_interval_secs = secs;
            }
        }
    }
}

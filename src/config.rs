// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Configuration for the mail bridge.
//!
//! Loaded from a JSON file; every field has a default so a minimal file only
//! needs the SMTP relay and the recipient map.

use lettre::Address;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Could not read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Could not parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Not an email address for recipient {id}: {address}")]
    InvalidRecipient { id: String, address: String },

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue {
        field: &'static str,
        reason: &'static str,
    },
}

/// Configuration for the mail bridge service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server bind address (default: 0.0.0.0:8080)
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Access token configuration
    #[serde(default)]
    pub tokens: TokenConfig,

    /// Tarpit configuration
    #[serde(default)]
    pub tarpit: TarpitConfig,

    /// Outgoing SMTP relay
    #[serde(default)]
    pub smtp: SmtpConfig,

    /// Recipient id -> email address. Clients only ever see the id.
    #[serde(default)]
    pub recipients: HashMap<String, String>,

    /// HTTP layer limits
    #[serde(default)]
    pub http: HttpConfig,

    /// Metrics configuration
    #[serde(default)]
    pub metrics: MetricsConfig,
}

/// Lifetime and cleanup schedule of access tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenConfig {
    /// Seconds a freshly issued token stays valid (default: 60)
    #[serde(default = "default_lifetime_secs")]
    pub lifetime_secs: u64,

    /// Seconds between sweeps of expired tokens (default: 10)
    #[serde(default = "default_cleanup_interval_secs")]
    pub cleanup_interval_secs: u64,
}

/// Tarpit configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TarpitConfig {
    /// Decay period and delay unit in seconds (default: 10)
    #[serde(default = "default_tick_secs")]
    pub tick_secs: u64,
}

/// SMTP relay settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmtpConfig {
    #[serde(default = "default_smtp_host")]
    pub host: String,

    /// Default: 587 (submission)
    #[serde(default = "default_smtp_port")]
    pub port: u16,

    #[serde(default)]
    pub username: String,

    #[serde(default)]
    pub password: String,

    /// One of `none`, `starttls`, `tls` (default: starttls)
    #[serde(default = "default_tls_mode")]
    pub tls_mode: TlsMode,

    /// Connection timeout in seconds (default: 30)
    #[serde(default = "default_smtp_timeout_secs")]
    pub timeout_secs: u64,
}

/// Transport security towards the SMTP relay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TlsMode {
    None,
    Starttls,
    Tls,
}

/// HTTP layer configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Maximum accepted request body (default: 1 MiB)
    #[serde(default = "default_body_limit_bytes")]
    pub body_limit_bytes: usize,
}

/// Metrics configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Enable Prometheus metrics endpoint (default: true)
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Metrics endpoint path (default: /metrics)
    #[serde(default = "default_metrics_path")]
    pub path: String,
}

// Default value functions
fn default_bind_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_lifetime_secs() -> u64 {
    60
}

fn default_cleanup_interval_secs() -> u64 {
    10
}

fn default_tick_secs() -> u64 {
    10
}

fn default_smtp_host() -> String {
    "localhost".to_string()
}

fn default_smtp_port() -> u16 {
    587
}

fn default_tls_mode() -> TlsMode {
    TlsMode::Starttls
}

fn default_smtp_timeout_secs() -> u64 {
    30
}

fn default_body_limit_bytes() -> usize {
    1_048_576
}

fn default_true() -> bool {
    true
}

fn default_metrics_path() -> String {
    "/metrics".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            tokens: TokenConfig::default(),
            tarpit: TarpitConfig::default(),
            smtp: SmtpConfig::default(),
            recipients: HashMap::new(),
            http: HttpConfig::default(),
            metrics: MetricsConfig::default(),
        }
    }
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            lifetime_secs: default_lifetime_secs(),
            cleanup_interval_secs: default_cleanup_interval_secs(),
        }
    }
}

impl Default for TarpitConfig {
    fn default() -> Self {
        Self {
            tick_secs: default_tick_secs(),
        }
    }
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            host: default_smtp_host(),
            port: default_smtp_port(),
            username: String::new(),
            password: String::new(),
            tls_mode: default_tls_mode(),
            timeout_secs: default_smtp_timeout_secs(),
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            body_limit_bytes: default_body_limit_bytes(),
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            path: default_metrics_path(),
        }
    }
}

impl Config {
    /// Read, parse and validate a JSON config file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config = Self::from_json(&raw)?;
        Ok(config)
    }

    /// Parse and validate a JSON config document.
    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Let the environment override deployment specific values.
    ///
    /// - `BIND_ADDR`
    /// - `SMTP_USERNAME`
    /// - `SMTP_PASSWORD`
    pub fn apply_env_overrides(&mut self) {
        if let Ok(addr) = std::env::var("BIND_ADDR") {
            self.bind_addr = addr;
        }
        if let Ok(user) = std::env::var("SMTP_USERNAME") {
            self.smtp.username = user;
        }
        if let Ok(password) = std::env::var("SMTP_PASSWORD") {
            self.smtp.password = password;
        }
    }

    /// Check values that would make the service misbehave at runtime.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (id, address) in &self.recipients {
            if address.parse::<Address>().is_err() {
                return Err(ConfigError::InvalidRecipient {
                    id: id.clone(),
                    address: address.clone(),
                });
            }
        }
        if self.tokens.lifetime_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "tokens.lifetime_secs",
                reason: "must be greater than zero",
            });
        }
        // A zero period would make the sweep timers panic.
        if self.tokens.cleanup_interval_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "tokens.cleanup_interval_secs",
                reason: "must be greater than zero",
            });
        }
        if self.tarpit.tick_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "tarpit.tick_secs",
                reason: "must be greater than zero",
            });
        }
        Ok(())
    }
}

impl TokenConfig {
    /// Get the token lifetime
    pub fn lifetime(&self) -> Duration {
        Duration::from_secs(self.lifetime_secs)
    }

    /// Get the cleanup interval
    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_secs(self.cleanup_interval_secs)
    }
}

impl TarpitConfig {
    /// Get the tick duration
    pub fn tick(&self) -> Duration {
        Duration::from_secs(self.tick_secs)
    }
}

impl SmtpConfig {
    /// Get the connection timeout
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

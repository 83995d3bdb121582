// src/config.rs

//! Manages bridge configuration: loading from TOML, defaults, and validation.

use crate::core::protocol::DEFAULT_MAX_LINE_LENGTH;
use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use std::fs;
use std::time::Duration;
use tracing::warn;

/// The well-known MobDebug port the debuggee connects to.
pub const DEFAULT_PORT: u16 = 8172;

/// Runtime configuration of the bridge.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Config {
    /// The interface the listening socket binds to.
    #[serde(default = "default_host")]
    pub host: String,
    /// The listening port. `0` asks the OS for an ephemeral port.
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Upper bound on how long the send-loop sleeps between queue checks.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// How long a command may occupy the pending slot. `0` disables the timeout.
    #[serde(default = "default_response_timeout_ms")]
    pub response_timeout_ms: u64,
    /// Inbound lines longer than this are a protocol fault.
    #[serde(default = "default_max_line_length")]
    pub max_line_length: usize,
    /// Written once after the initial queue drain to let the debuggee run.
    #[serde(default = "default_start_directive")]
    pub start_directive: String,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}
fn default_port() -> u16 {
    DEFAULT_PORT
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_poll_interval_ms() -> u64 {
    5
}
fn default_response_timeout_ms() -> u64 {
    10_000 // 10 seconds
}
fn default_max_line_length() -> usize {
    DEFAULT_MAX_LINE_LENGTH
}
fn default_start_directive() -> String {
    "RUN".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            log_level: default_log_level(),
            poll_interval_ms: default_poll_interval_ms(),
            response_timeout_ms: default_response_timeout_ms(),
            max_line_length: default_max_line_length(),
            start_directive: default_start_directive(),
        }
    }
}

impl Config {
    /// Creates a new `Config` instance by reading and parsing a TOML file.
    pub fn from_file(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file at '{path}'"))?;
        Self::from_toml_str(&contents).with_context(|| format!("Invalid config in '{path}'"))
    }

    /// Parses and validates a TOML document.
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents).context("Failed to parse TOML")?;
        config.validate()?;
        Ok(config)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// `None` when the response timeout is disabled.
    pub fn response_timeout(&self) -> Option<Duration> {
        (self.response_timeout_ms > 0).then(|| Duration::from_millis(self.response_timeout_ms))
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Validates the configuration to ensure logical consistency.
    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(anyhow!("host cannot be empty"));
        }
        if self.poll_interval_ms == 0 {
            return Err(anyhow!("poll_interval_ms cannot be 0"));
        }
        if self.max_line_length == 0 {
            return Err(anyhow!("max_line_length cannot be 0"));
        }
        let directive = self.start_directive.trim();
        if directive.is_empty() {
            return Err(anyhow!("start_directive cannot be empty"));
        }
        if directive.contains(['\n', '\r']) {
            return Err(anyhow!("start_directive must be a single line"));
        }
        if self.response_timeout_ms == 0 {
            warn!(
                "response_timeout_ms is 0: a command that never receives its response will stall the queue."
            );
        } else if self.response_timeout_ms < self.poll_interval_ms {
            warn!(
                "response_timeout_ms ({}) is shorter than poll_interval_ms ({}); timeouts fire late.",
                self.response_timeout_ms, self.poll_interval_ms
            );
        }
        Ok(())
    }
}

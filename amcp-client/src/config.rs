//! Client configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Top-level configuration for the command-line client.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub network: NetworkConfig,
    /// Values used when a command leaves them out.
    pub defaults: DefaultsConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Server address, `host` or `host:port`.
    pub server: String,
    /// Deadline for connecting and for each reply, in milliseconds.
    pub timeout_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DefaultsConfig {
    pub channel: u32,
    pub layer: u32,
    /// `CUT`, `MIX`, `PUSH`, `WIPE` or `SLIDE`.
    pub transition: String,
    /// Transition and tween length in frames.
    pub duration: u32,
    pub easing: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level, overridden by `RUST_LOG`.
    pub level: String,
    /// Optional log file; stderr when empty.
    pub file: String,
}

// ── Defaults ─────────────────────────────────────────────────────

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            server: "127.0.0.1:5250".into(),
            timeout_ms: 5000,
        }
    }
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            channel: 1,
            layer: 10,
            transition: "CUT".into(),
            duration: 0,
            easing: "Linear".into(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".into(),
            file: String::new(),
        }
    }
}

// ── Loading ──────────────────────────────────────────────────────

impl ClientConfig {
    /// Load from a TOML file. A missing file gives the defaults; a file
    /// that does not parse is an error so the caller can report it once
    /// logging is up.
    pub fn load(path: &Path) -> Result<Self, toml::de::Error> {
        match std::fs::read_to_string(path) {
            Ok(contents) => toml::from_str(&contents),
            Err(_) => Ok(Self::default()),
        }
    }

    /// Write default config to a file.
    pub fn write_default(path: &Path) -> std::io::Result<()> {
        let text = toml::to_string_pretty(&Self::default()).map_err(std::io::Error::other)?;
        std::fs::write(path, text)
    }
}

// ── Tests ────────────────────────────────────────────────────────

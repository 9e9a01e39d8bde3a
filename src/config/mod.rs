//! Configuration module for Pipeworks
//!
//! A configuration file describes logging and a set of named pipes. Each pipe
//! is a chain of fittings plus the module junctions it is registered on:
//!
//! ```toml
//! [logging]
//! level = "info"
//!
//! [[pipes]]
//! name = "to-logger"
//! endpoints = [
//!     { module = "shell", direction = "output" },
//!     { module = "logger", direction = "input" },
//! ]
//!
//! [[pipes.chain]]
//! kind = "filter"
//! name = "scale"
//! script = "header.width *= params.factor; header.height *= params.factor; true"
//! params = { factor = 10 }
//!
//! [[pipes.chain]]
//! kind = "queue"
//! mode = "sort"
//! ```
//!
//! Files are TOML. Use [`PipeworksConfig::load`] / [`PipeworksConfig::save`].

use crate::error::{PipeworksError, Result, ResultExt};
use crate::pipeline::{FilterMode, QueueMode};
use crate::scripting::builtins;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Default `EnvFilter` directive when `RUST_LOG` is unset
pub const DEFAULT_LOG_LEVEL: &str = "info";

// ==================== Logging ====================

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is not set
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output
    #[serde(default)]
    pub json: bool,

    /// Also write to a daily-rolling log file at this path
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
            file: None,
        }
    }
}

// ==================== Pipes ====================

/// One fitting in a pipe's chain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum FittingConfig {
    /// Plain passthrough
    Pipe,
    /// Named filter, optionally scripted
    Filter {
        name: String,
        /// Rhai filter script; accepts everything when absent
        #[serde(default, skip_serializing_if = "Option::is_none")]
        script: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        params: Option<Value>,
        #[serde(default)]
        mode: FilterMode,
    },
    /// Buffering queue
    Queue {
        #[serde(default)]
        mode: QueueMode,
    },
    /// Fan-out; lets several listeners attach to the end of the chain
    Split,
}

/// Where a pipe is registered
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EndpointConfig {
    /// Module whose junction gets the pipe
    pub module: String,
    /// `"input"` or `"output"`
    pub direction: String,
}

impl EndpointConfig {
    pub fn new(module: impl Into<String>, direction: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            direction: direction.into(),
        }
    }
}

/// A named pipe and the junctions it is registered on
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipeConfig {
    pub name: String,

    #[serde(default)]
    pub endpoints: Vec<EndpointConfig>,

    /// Fittings from head to tail. Empty means a single plain pipe.
    #[serde(default)]
    pub chain: Vec<FittingConfig>,
}

// ==================== Root ====================

/// Root configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipeworksConfig {
    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub pipes: Vec<PipeConfig>,
}

impl PipeworksConfig {
    /// Parse a configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).context("Failed to parse configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to TOML text
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize configuration")
    }

    /// Load a configuration file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {:?}", path))?;
        Self::from_toml_str(&content).with_context(|| format!("In config file {:?}", path))
    }

    /// Load a configuration file, returning defaults if any error occurs
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(path).unwrap_or_else(|e| {
            tracing::warn!("Failed to load config, using defaults: {}", e);
            Self::default()
        })
    }

    /// Save to disk as TOML
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        // Ensure parent directory exists
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let content = self.to_toml_string()?;
        std::fs::write(path, content).with_context(|| format!("Failed to write {:?}", path))
    }

    /// Structural checks that do not need to build anything
    pub fn validate(&self) -> Result<()> {
        let mut names = HashSet::new();
        for pipe in &self.pipes {
            if pipe.name.trim().is_empty() {
                return Err(PipeworksError::Config("Pipe with empty name".to_string()));
            }
            if !names.insert(pipe.name.as_str()) {
                return Err(PipeworksError::Config(format!(
                    "Pipe '{}' is defined more than once",
                    pipe.name
                )));
            }
            for endpoint in &pipe.endpoints {
                if endpoint.module.trim().is_empty() {
                    return Err(PipeworksError::Config(format!(
                        "Pipe '{}' has an endpoint without a module",
                        pipe.name
                    )));
                }
            }
        }
        Ok(())
    }

    /// Two-module topology used by the demo binary: the shell sends on
    /// `to-logger`, which scales message headers and queues them by
    /// priority before they reach the logger module.
    pub fn demo() -> Self {
        Self {
            logging: LoggingConfig::default(),
            pipes: vec![PipeConfig {
                name: "to-logger".to_string(),
                endpoints: vec![
                    EndpointConfig::new("shell", "output"),
                    EndpointConfig::new("logger", "input"),
                ],
                chain: vec![
                    FittingConfig::Filter {
                        name: "scale".to_string(),
                        script: Some(builtins::SCALE_DIMENSIONS.trim().to_string()),
                        params: Some(serde_json::json!({"factor": 10})),
                        mode: FilterMode::Filter,
                    },
                    FittingConfig::Queue {
                        mode: QueueMode::Sort,
                    },
                ],
            }],
        }
    }
}

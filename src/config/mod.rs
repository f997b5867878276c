// procwatch: Managed subprocess execution
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Configuration management for procwatch.
//!
//! # Configuration Hierarchy
//!
//! ```text
//! Priority (low → high)
//! 1. defaults
//! 2. procwatch.toml (cwd, optional)
//! 3. --config
//! 4. PROCWATCH_* env vars
//! 5. CLI overrides
//! ```
//!
//! # Environment Variable Mapping
//!
//! ```text
//! PROCWATCH_PROCESS__SHELL=sh           → process.shell = "sh"
//! PROCWATCH_PROCESS__TIMEOUT_SECS=30    → process.timeout_secs = 30
//! PROCWATCH_LOG__LEVEL=4                → log.level = 4
//! ```

pub mod loader;


use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::core::output::DEFAULT_LINE_CAPACITY;
use crate::core::process::{DEFAULT_SHELL, ProcessConfig};
use crate::error::{ConfigError, Result};
use crate::logging::LogLevel;

use loader::ConfigLoader;

/// Default bound of the line queue used by `procwatch stream`.
pub const DEFAULT_QUEUE_CAPACITY: usize = 1024;

/// Complete application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub process: ProcessSettings,
    pub log: LogSettings,
}

/// Defaults applied to every managed process.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessSettings {
    /// Interpreter for shell-mode commands.
    pub shell: PathBuf,
    /// Timeout in seconds; 0 disables it.
    pub timeout_secs: u64,
    /// Carry-over capacity of line queues, in bytes.
    pub line_buffer_size: usize,
    /// Bound of the line queue.
    pub queue_capacity: usize,
}

impl Default for ProcessSettings {
    fn default() -> Self {
        Self {
            shell: PathBuf::from(DEFAULT_SHELL),
            timeout_secs: 0,
            line_buffer_size: DEFAULT_LINE_CAPACITY,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }
}

impl ProcessSettings {
    #[must_use]
    pub const fn timeout(&self) -> Option<Duration> {
        match self.timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }

    /// Shell-mode configuration for `command` with these defaults applied.
    pub fn to_process_config(&self, command: impl Into<String>) -> ProcessConfig {
        ProcessConfig::builder()
            .command(command)
            .shell(self.shell.clone())
            .maybe_timeout(self.timeout())
            .line_capacity(self.line_buffer_size)
            .build()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LogSettings {
    pub level: LogLevel,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
}

impl Settings {
    /// Create a new configuration builder.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use procwatch::config::Settings;
    ///
    /// let settings = Settings::builder()
    ///     .add_toml_file_optional("procwatch.toml")
    ///     .with_env_prefix("PROCWATCH")
    ///     .build()?;
    /// # Ok::<(), anyhow::Error>(())
    /// ```
    #[must_use]
    pub fn builder() -> ConfigLoader {
        ConfigLoader::new()
    }

    /// Load configuration from a single TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, contains invalid TOML, or
    /// fails validation.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::builder().add_toml_file(path).build()
    }

    /// Load configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the content is not valid TOML or fails validation.
    pub fn parse(content: &str) -> Result<Self> {
        Self::builder().add_toml_str(content).build()
    }

    /// Rejects values the process core cannot work with.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` naming the offending key.
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        let invalid = |key: &str, message: &str| ConfigError::InvalidValue {
            section: "process".to_string(),
            key: key.to_string(),
            message: message.to_string(),
        };

        if self.process.line_buffer_size == 0 {
            return Err(invalid("line_buffer_size", "must be greater than 0"));
        }
        if self.process.queue_capacity == 0 {
            return Err(invalid("queue_capacity", "must be greater than 0"));
        }
        if self.process.shell.as_os_str().is_empty() {
            return Err(invalid("shell", "must not be empty"));
        }
        Ok(())
    }
}

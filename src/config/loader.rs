// procwatch: Managed subprocess execution
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Layered loading of [`Settings`].
//!
//! ```text
//! procwatch.toml (optional) --+
//! --config FILE (required) ---+--> PROCWATCH_<SECTION>__<KEY> --> flag overrides
//! inline TOML (tests) --------+                                        |
//!                                                                      v
//!                                         build() --> Settings --> validate()
//! ```
//!
//! Later layers replace individual keys, not whole sections.

use std::path::PathBuf;

use anyhow::Context;

use super::Settings;
use crate::error::Result;

/// Collects configuration layers in priority order, lowest first.
pub struct ConfigLoader {
    builder: config::ConfigBuilder<config::builder::DefaultState>,
    env_prefix: Option<String>,
    env_source: Option<config::Map<String, String>>,
    files: Vec<(String, PathBuf)>,
}

impl ConfigLoader {
    #[must_use]
    pub fn new() -> Self {
        Self {
            builder: config::Config::builder(),
            env_prefix: None,
            env_source: None,
            files: Vec::new(),
        }
    }

    /// Adds a `--config` style file that must exist.
    ///
    /// Read lazily; a missing or malformed file surfaces from `build()`.
    #[must_use]
    pub fn add_toml_file<P: AsRef<std::path::Path>>(mut self, path: P) -> Self {
        use config::{File, FileFormat};
        let p = path.as_ref();
        self.builder = self
            .builder
            .add_source(File::from(p).format(FileFormat::Toml).required(true));
        self.files.push(("file".to_string(), p.to_path_buf()));
        self
    }

    /// Adds a file that is skipped when absent, such as `procwatch.toml`.
    #[must_use]
    pub fn add_toml_file_optional<P: AsRef<std::path::Path>>(mut self, path: P) -> Self {
        use config::{File, FileFormat};
        let p = path.as_ref();
        self.builder = self
            .builder
            .add_source(File::from(p).format(FileFormat::Toml).required(false));
        if p.exists() {
            self.files.push(("optional".to_string(), p.to_path_buf()));
        }
        self
    }

    /// Adds an inline TOML layer.
    #[must_use]
    pub fn add_toml_str(mut self, content: &str) -> Self {
        use config::{File, FileFormat};
        self.builder = self
            .builder
            .add_source(File::from_str(content, FileFormat::Toml));
        self.files
            .push(("string".to_string(), PathBuf::from("<string>")));
        self
    }

    /// Reads `<PREFIX>_<SECTION>__<KEY>` environment variables.
    #[must_use]
    pub fn with_env_prefix(mut self, prefix: &str) -> Self {
        self.env_prefix = Some(prefix.to_string());
        self
    }

    /// Reads prefixed variables from `vars` instead of the process environment.
    #[must_use]
    pub fn with_env_vars(mut self, vars: config::Map<String, String>) -> Self {
        self.env_source = Some(vars);
        self
    }

    /// Pins `key` (dotted, e.g. `process.shell`) above every other layer.
    /// Used for command-line flags.
    ///
    /// # Errors
    ///
    /// Returns an error for a malformed key path.
    pub fn set<T: Into<config::Value>>(mut self, key: &str, value: T) -> Result<Self> {
        self.builder = self
            .builder
            .set_override(key, value)
            .with_context(|| format!("invalid override key '{key}'"))?;
        Ok(self)
    }

    /// Merges the layers into validated [`Settings`].
    ///
    /// # Errors
    ///
    /// Fails on a missing `--config` file, malformed TOML, an unknown key or
    /// a mistyped value in any layer, and on [`Settings::validate`]
    /// rejections such as a zero `line_buffer_size`.
    pub fn build(self) -> Result<Settings> {
        let builder = match &self.env_prefix {
            Some(prefix) => self.builder.add_source(
                config::Environment::with_prefix(prefix)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true)
                    .source(self.env_source),
            ),
            None => self.builder,
        };
        let merged = builder.build().context("failed to read configuration")?;
        let settings: Settings = merged
            .try_deserialize()
            .context("failed to decode configuration")?;
        settings.validate()?;
        Ok(settings)
    }

    /// Layers that contribute, as `(kind, path)`; absent optional files are omitted.
    #[must_use]
    pub fn loaded_files(&self) -> Vec<(String, PathBuf)> {
        self.files.clone()
    }

    /// Numbered, human-readable form of [`loaded_files`](Self::loaded_files).
    #[must_use]
    pub fn format_loaded_files(&self) -> Vec<String> {
        self.files
            .iter()
            .enumerate()
            .map(|(i, (source, path))| format!("{}. [{}] {}", i + 1, source, path.display()))
            .collect()
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

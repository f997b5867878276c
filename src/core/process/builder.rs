// procwatch: Managed subprocess execution
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Process configuration.
//!
//! ```text
//! ProcessConfig::builder()
//!  • command (required), args, mode (Shell | Exec)
//!  • timeout, cwd, env (overlay), shell, line_capacity
//!
//! Shell: <shell> -c <command>
//! Exec:  program = args.is_empty() ? split(command)[0] : command
//! ```

use bon::Builder;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

use crate::core::output::DEFAULT_LINE_CAPACITY;
use crate::error::{ConfigError, ProcessError, ProcessResult};

/// Shell used for [`ExecMode::Shell`] unless configured otherwise.
pub const DEFAULT_SHELL: &str = "bash";

/// How the command string is turned into a process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecMode {
    /// Run the command string as a script through the configured shell.
    #[default]
    Shell,
    /// Run the program directly, without a shell.
    Exec,
}

/// Configuration for one managed process.
///
/// A plain value: build it, then hand it to
/// [`ProcessHandle::new`](super::ProcessHandle::new).
#[derive(Debug, Clone, Builder)]
pub struct ProcessConfig {
    /// Shell script (shell mode) or program / whitespace-separated command line (exec mode)
    #[builder(into)]
    command: String,
    /// Explicit arguments (exec mode); when set, `command` is the program as-is
    #[builder(default)]
    args: Vec<String>,
    #[builder(default)]
    mode: ExecMode,
    /// Deadline measured from spawn; `None` or zero means unbounded
    timeout: Option<Duration>,
    /// Working directory
    #[builder(into)]
    cwd: Option<PathBuf>,
    /// Variables laid over the inherited environment
    #[builder(default)]
    env: BTreeMap<String, String>,
    /// Interpreter for shell mode
    #[builder(into, default = PathBuf::from(DEFAULT_SHELL))]
    shell: PathBuf,
    /// Carry-over capacity for line queues
    #[builder(default = DEFAULT_LINE_CAPACITY)]
    line_capacity: usize,
}

impl ProcessConfig {
    /// Shell-mode configuration with defaults.
    pub fn shell_command(command: impl Into<String>) -> Self {
        Self::builder().command(command).build()
    }

    /// Exec-mode configuration with an explicit argument vector.
    pub fn argv<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::builder()
            .command(program)
            .args(args.into_iter().map(Into::into).collect())
            .mode(ExecMode::Exec)
            .build()
    }

    /// Overlays `NAME=VALUE` entries onto the environment.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` for an entry without `=` or with
    /// an empty name.
    pub fn with_env_list<I, S>(mut self, entries: I) -> std::result::Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for entry in entries {
            let entry = entry.as_ref();
            match entry.split_once('=') {
                Some((name, value)) if !name.is_empty() => {
                    self.env.insert(name.to_string(), value.to_string());
                }
                _ => {
                    return Err(ConfigError::InvalidValue {
                        section: "process".to_string(),
                        key: "env".to_string(),
                        message: format!("expected NAME=VALUE, got '{entry}'"),
                    });
                }
            }
        }
        Ok(self)
    }

    #[must_use]
    pub fn command(&self) -> &str {
        &self.command
    }

    #[must_use]
    pub const fn mode(&self) -> ExecMode {
        self.mode
    }

    /// Returns the effective timeout; zero counts as unbounded.
    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout.filter(|t| !t.is_zero())
    }

    #[must_use]
    pub fn cwd(&self) -> Option<&Path> {
        self.cwd.as_deref()
    }

    #[must_use]
    pub const fn env(&self) -> &BTreeMap<String, String> {
        &self.env
    }

    #[must_use]
    pub fn shell(&self) -> &Path {
        &self.shell
    }

    #[must_use]
    pub const fn line_capacity(&self) -> usize {
        self.line_capacity
    }

    /// Resolves the program and its arguments.
    fn program_and_args(&self) -> ProcessResult<(PathBuf, Vec<String>)> {
        match self.mode {
            ExecMode::Shell => Ok((
                self.shell.clone(),
                vec!["-c".to_string(), self.command.clone()],
            )),
            ExecMode::Exec if !self.args.is_empty() => {
                Ok((PathBuf::from(&self.command), self.args.clone()))
            }
            ExecMode::Exec => {
                let mut parts = self.command.split_whitespace();
                let program = parts.next().ok_or_else(|| ProcessError::InvalidCommand {
                    command: self.command.clone(),
                    reason: "empty command".to_string(),
                })?;
                Ok((PathBuf::from(program), parts.map(String::from).collect()))
            }
        }
    }

    /// Returns the full command line as a string (for logging).
    pub(super) fn command_line(&self) -> String {
        use std::fmt::Write as _;

        let Ok((program, args)) = self.program_and_args() else {
            return self.command.clone();
        };
        let mut line = program.display().to_string();
        for arg in &args {
            if arg.contains(' ') {
                let _ = write!(line, " \"{arg}\"");
            } else {
                let _ = write!(line, " {arg}");
            }
        }
        line
    }

    /// Builds the tokio Command with piped output in its own process group.
    pub(super) fn build_command(&self) -> ProcessResult<Command> {
        let (program, args) = self.program_and_args()?;
        let mut command = Command::new(program);
        command.args(args);

        if let Some(cwd) = &self.cwd {
            command.current_dir(cwd);
        }
        command.envs(&self.env);

        command.stdin(Stdio::null());
        command.stdout(Stdio::piped());
        command.stderr(Stdio::piped());

        // Reaping stays with the watcher; this only covers a dropped runtime.
        command.kill_on_drop(true);

        #[cfg(unix)]
        command.process_group(0);

        Ok(command)
    }
}

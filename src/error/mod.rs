// procwatch: Managed subprocess execution
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Error handling module.
//!
//! ```text
//!          Error
//!            |
//!   +--------+--------+
//!   |        |        |
//!   v        v        v
//! Process  Config   Io/Other
//!   Box      Box     Box
//!
//! ProcessError (Clone, stored in Status):
//!   spawn     SpawnFailed, InvalidCommand
//!   exit      CommandNotFound(127), NotExecutable(126),
//!             InvalidArguments(128), NonZeroExit
//!   race      Timeout, Cancelled
//!   guards    AlreadyStarted, AlreadyFinished, NoRuntime
//!   sinks     LineBufferOverflow, CapacityLocked, QueueClosed
//!   os        Signal, Io
//! ```

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

/// Convenience alias for `anyhow::Result`.
pub type Result<T> = anyhow::Result<T>;

/// Result type for the process core.
pub type ProcessResult<T> = std::result::Result<T, ProcessError>;

/// Top-level error type.
///
/// Sub-errors are boxed to keep this enum small on the stack.
#[derive(Debug, Error)]
pub enum Error {
    /// Process execution error.
    #[error("process error: {0}")]
    Process(#[from] Box<ProcessError>),

    /// Configuration error.
    #[error("config error: {0}")]
    Config(#[from] Box<ConfigError>),

    /// I/O error.
    #[error("io error: {0}")]
    Io(Box<std::io::Error>),

    /// Generic error with message.
    #[error("{0}")]
    Other(Box<str>),
}

macro_rules! impl_from_boxed {
    ($($error:ty => $variant:ident),+ $(,)?) => {
        $(
            impl From<$error> for Error {
                fn from(err: $error) -> Self {
                    Error::$variant(Box::new(err))
                }
            }
        )+
    };
}

impl_from_boxed! {
    ProcessError => Process,
    ConfigError => Config,
    std::io::Error => Io,
}

// --- Process Errors ---

/// Errors produced by the process lifecycle and the output sinks.
///
/// The enum is `Clone` so that the terminal error can live inside a frozen
/// [`Status`](crate::core::process::Status) and still be handed to every
/// waiter. OS errors are shared through `Arc` for that reason.
#[derive(Debug, Clone, Error)]
pub enum ProcessError {
    /// The OS refused to spawn the process.
    #[error("failed to spawn process '{command}': {source}")]
    SpawnFailed {
        command: String,
        #[source]
        source: Arc<std::io::Error>,
    },

    /// The command string could not be turned into an argument vector.
    #[error("invalid command '{command}': {reason}")]
    InvalidCommand { command: String, reason: String },

    /// The shell reported exit status 127.
    #[error("command not found")]
    CommandNotFound,

    /// The shell reported exit status 126.
    #[error("permission denied: not executable")]
    NotExecutable,

    /// The process exited with status 128.
    #[error("invalid argument to exit")]
    InvalidArguments,

    /// Any other non-zero exit. `-1` means the process died from a signal.
    #[error("process exited with code {code}")]
    NonZeroExit { code: i32 },

    /// The timeout deadline won the finalize race.
    #[error("process timed out after {timeout:?}")]
    Timeout { timeout: Duration },

    /// An explicit stop won the finalize race.
    #[error("process cancelled")]
    Cancelled,

    /// `start` was called outside a tokio runtime.
    #[error("no tokio runtime available to drive the process")]
    NoRuntime,

    /// `start` was called on a handle that already spawned its process.
    #[error("process already started")]
    AlreadyStarted,

    /// `start` was called on a handle whose status is frozen.
    #[error("process already finished")]
    AlreadyFinished,

    /// The carry-over buffer of a line stream could not hold a partial line.
    #[error("line buffer overflow after {consumed} bytes (capacity {capacity})")]
    LineBufferOverflow { consumed: usize, capacity: usize },

    /// The line buffer capacity can only change before the first write.
    #[error("line buffer capacity cannot change after the first write")]
    CapacityLocked,

    /// Every receiver of a line queue was dropped.
    #[error("line queue closed")]
    QueueClosed,

    /// Delivering a signal failed for a reason other than a vanished process.
    #[error("failed to signal pid {pid}: {message}")]
    Signal { pid: i32, message: String },

    /// Other I/O failure while driving the process.
    #[error("io error: {0}")]
    Io(#[from] Arc<std::io::Error>),
}

impl ProcessError {
    /// Maps a raw exit code onto the error taxonomy.
    ///
    /// Returns `None` for a clean exit.
    #[must_use]
    pub const fn from_exit_code(code: i32) -> Option<Self> {
        match code {
            0 => None,
            126 => Some(Self::NotExecutable),
            127 => Some(Self::CommandNotFound),
            128 => Some(Self::InvalidArguments),
            code => Some(Self::NonZeroExit { code }),
        }
    }

    /// Returns the conventional exit code associated with this error, if any.
    #[must_use]
    pub const fn exit_code_hint(&self) -> Option<i32> {
        match self {
            Self::NotExecutable => Some(126),
            Self::CommandNotFound => Some(127),
            Self::InvalidArguments => Some(128),
            Self::NonZeroExit { code } => Some(*code),
            _ => None,
        }
    }

    /// Returns true if the error was produced by the timeout/stop race.
    #[must_use]
    pub const fn is_terminated(&self) -> bool {
        matches!(self, Self::Timeout { .. } | Self::Cancelled)
    }

    pub(crate) fn spawn_failed(command: impl Into<String>, source: std::io::Error) -> Self {
        Self::SpawnFailed {
            command: command.into(),
            source: Arc::new(source),
        }
    }
}

impl From<std::io::Error> for ProcessError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(Arc::new(err))
    }
}

impl From<ProcessError> for std::io::Error {
    fn from(err: ProcessError) -> Self {
        match err {
            ProcessError::Io(source) => Self::new(source.kind(), ProcessError::Io(source)),
            other => Self::other(other),
        }
    }
}

// --- Config Errors ---

/// Configuration-related errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to parse configuration.
    #[error("failed to parse config '{path}': {message}")]
    ParseError { path: String, message: String },

    /// Invalid configuration value.
    #[error("invalid value for '{key}' in section '[{section}]': {message}")]
    InvalidValue {
        section: String,
        key: String,
        message: String,
    },

    /// Configuration file not found.
    #[error("config file not found: {0}")]
    NotFound(String),
}

#[cfg(test)]
mod tests;

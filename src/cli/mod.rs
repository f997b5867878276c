// procwatch: Managed subprocess execution
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! CLI module for procwatch using clap derive.
//!
//! # Command Structure
//!
//! ```text
//! procwatch [global options] <command>
//! run <cmd> [--timeout S] [--cwd DIR] [--exec] [--env K=V]... [--json]
//! stream <cmd> [--timeout S]
//! exists <program>
//! version
//! ```

pub mod args;
pub mod global;


use crate::cli::args::{ExistsArgs, RunArgs, StreamArgs};
use crate::cli::global::GlobalOptions;
use clap::{Parser, Subcommand};

/// Managed subprocess execution.
///
/// Runs commands with timeouts, cancellation and captured output.
#[derive(Debug, Parser)]
#[command(
    name = "procwatch",
    author,
    version,
    about = "Managed subprocess execution",
    long_about = "procwatch Copyright (C) 2026 Romeo Ahmed\n\
                  This program comes with ABSOLUTELY NO WARRANTY\n\
                  This is free software, and you are welcome to redistribute it\n\
                  under certain conditions; see LICENSE for details.\n\n\
                  Runs a command through a shell (or directly with --exec),\n\
                  enforces an optional timeout and reports the captured output\n\
                  and exit status. The exit code of procwatch mirrors the child's.",
    after_help = "CONFIG FILES:\n\n\
                  procwatch reads `procwatch.toml` from the current directory if\n\
                  present, then every file given with --config, then PROCWATCH_*\n\
                  environment variables (e.g. PROCWATCH_PROCESS__TIMEOUT_SECS=30).\n\
                  Command-line flags override all of them."
)]
pub struct Cli {
    /// Global options shared by all commands
    #[command(flatten)]
    pub global: GlobalOptions,

    /// Command to execute
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Shows the version.
    #[command(visible_alias = "-v")]
    Version,

    /// Runs a command and reports its output and status.
    Run(RunArgs),

    /// Runs a command and prints output lines as they arrive.
    Stream(StreamArgs),

    /// Checks whether a program is on PATH.
    Exists(ExistsArgs),
}

/// Parses command-line arguments.
#[must_use]
pub fn parse() -> Cli {
    Cli::parse()
}

/// Tries to parse command-line arguments, returning an error on failure.
///
/// # Errors
///
/// Returns a `clap::Error` if the arguments are invalid or if help/version information
/// was requested.
pub fn try_parse() -> Result<Cli, clap::Error> {
    Cli::try_parse()
}

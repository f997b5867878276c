// procwatch: Managed subprocess execution
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Command arguments.

use clap::Args;
use std::path::PathBuf;

/// Arguments for the `run` command.
#[derive(Debug, Clone, Default, Args)]
pub struct RunArgs {
    /// Timeout in seconds; overrides process.timeout_secs (0 disables it).
    #[arg(short = 't', long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Working directory of the command.
    #[arg(long, value_name = "DIR")]
    pub cwd: Option<PathBuf>,

    /// Runs the program directly instead of through the shell.
    #[arg(short = 'x', long)]
    pub exec: bool,

    /// Sets an environment variable for the command.
    /// Can be specified multiple times.
    #[arg(short = 'e', long = "env", value_name = "NAME=VALUE", action = clap::ArgAction::Append)]
    pub env: Vec<String>,

    /// Prints the final status as JSON instead of the raw output.
    #[arg(long)]
    pub json: bool,

    /// Command line to run.
    #[arg(value_name = "COMMAND", required = true, num_args = 1.., trailing_var_arg = true, allow_hyphen_values = true)]
    pub command: Vec<String>,
}

/// Arguments for the `stream` command.
#[derive(Debug, Clone, Default, Args)]
pub struct StreamArgs {
    /// Timeout in seconds; overrides process.timeout_secs (0 disables it).
    #[arg(short = 't', long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Command line to run.
    #[arg(value_name = "COMMAND", required = true, num_args = 1.., trailing_var_arg = true, allow_hyphen_values = true)]
    pub command: Vec<String>,
}

/// Arguments for the `exists` command.
#[derive(Debug, Clone, Default, Args)]
pub struct ExistsArgs {
    /// Program name to look up on PATH.
    #[arg(value_name = "PROGRAM")]
    pub program: String,
}

/// Joins trailing command words back into one command line.
#[must_use]
pub fn command_line(words: &[String]) -> String {
    words.join(" ")
}

// procwatch: Managed subprocess execution
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Exists command implementation.

use crate::cli::args::ExistsArgs;

/// Prints the resolved path of the program; exit code 1 if it is not on PATH.
#[must_use]
pub fn run_exists_command(args: &ExistsArgs) -> u8 {
    match which::which(&args.program) {
        Ok(path) => {
            println!("{}", path.display());
            0
        }
        Err(_) => {
            eprintln!("{}: not found", args.program);
            1
        }
    }
}

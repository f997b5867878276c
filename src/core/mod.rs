// procwatch: Managed subprocess execution
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Core modules for process lifecycle and output capture.
//!
//! ```text
//!              core
//!               |
//!        +------+------+
//!        |             |
//!        v             v
//!     process        output
//!        |             |
//!   ProcessHandle  OutputBuffer
//!   ProcessConfig  LineStream
//!   Status
//! ```

pub mod output;
pub mod process;

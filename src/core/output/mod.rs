// procwatch: Managed subprocess execution
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Output sinks for process streams.
//!
//! ```text
//! bytes --> OutputBuffer   Arc<Mutex<bytes + lines + cursor>>
//!           append() / lines() / to_string_lossy()
//!
//! bytes --> LineStream     carry-over (<= capacity) --> flume::Sender<String>
//!           "ab" + "c\n"   --> "abc"
//!           "x\r\n"        --> "x"
//!           partial > cap  --> LineBufferOverflow { consumed }
//! ```

mod buffer;
mod stream;

pub use buffer::OutputBuffer;
pub use stream::{DEFAULT_LINE_CAPACITY, LineStream};

/// Decodes one line, dropping a trailing carriage return.
fn decode_line(bytes: &[u8]) -> String {
    let bytes = bytes.strip_suffix(b"\r").unwrap_or(bytes);
    String::from_utf8_lossy(bytes).into_owned()
}

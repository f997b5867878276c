// procwatch: Managed subprocess execution
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Thread-safe accumulating byte buffer.

use std::io::Write;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::decode_line;

/// Append-only byte buffer shared between writer tasks.
///
/// Cloning is cheap and yields another handle onto the same storage, so the
/// stdout and stderr pumps can both append to one combined buffer.
///
/// Line extraction keeps a scan cursor: each complete line is split out once
/// and cached, and [`lines`](Self::lines) returns the whole cache. Calling it
/// repeatedly never duplicates lines.
#[derive(Debug, Clone, Default)]
pub struct OutputBuffer {
    inner: Arc<Mutex<BufferState>>,
}

#[derive(Debug, Default)]
struct BufferState {
    bytes: Vec<u8>,
    lines: Vec<String>,
    /// Offset of the first byte not yet split into `lines`.
    cursor: usize,
}

impl OutputBuffer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, BufferState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Appends bytes under the buffer lock.
    pub fn append(&self, bytes: &[u8]) {
        self.state().bytes.extend_from_slice(bytes);
    }

    /// Returns every line seen so far, in order.
    ///
    /// Complete lines are cached as the cursor advances. A trailing
    /// unterminated line is reported last but not cached, so it is returned
    /// again (possibly longer) once more bytes arrive.
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        let mut state = self.state();
        let BufferState {
            bytes,
            lines,
            cursor,
        } = &mut *state;

        while let Some(offset) = bytes[*cursor..].iter().position(|&b| b == b'\n') {
            let end = *cursor + offset;
            lines.push(decode_line(&bytes[*cursor..end]));
            *cursor = end + 1;
        }

        let mut result = lines.clone();
        if *cursor < bytes.len() {
            result.push(decode_line(&bytes[*cursor..]));
        }
        result
    }

    /// Returns a copy of the raw bytes.
    #[must_use]
    pub fn contents(&self) -> Vec<u8> {
        self.state().bytes.clone()
    }

    /// Returns the buffer decoded as UTF-8, replacing invalid sequences.
    #[must_use]
    pub fn to_string_lossy(&self) -> String {
        String::from_utf8_lossy(&self.state().bytes).into_owned()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.state().bytes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Write for OutputBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.append(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl Write for &OutputBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.append(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

// procwatch: Managed subprocess execution
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Incremental line framing onto a bounded queue.

use std::io::Write;

use super::decode_line;
use crate::error::{ProcessError, ProcessResult};

/// Default carry-over capacity for an unterminated line.
pub const DEFAULT_LINE_CAPACITY: usize = 16 * 1024;

/// Splits a byte stream into lines and pushes each complete line to a queue.
///
/// Bytes after the last newline are kept in a carry-over buffer and
/// prepended to the next line. A trailing `\r` is stripped from every line.
/// The carry-over never grows beyond the configured capacity: a partial line
/// that does not fit fails the write with
/// [`ProcessError::LineBufferOverflow`], which is fatal for the stream.
///
/// Pushing blocks (or yields, for the async variants) while a bounded queue
/// is full.
#[derive(Debug)]
pub struct LineStream {
    tx: flume::Sender<String>,
    capacity: usize,
    carry: Vec<u8>,
    written: bool,
}

/// Result of splitting one write: the complete lines, then the write outcome.
struct Framed {
    lines: Vec<String>,
    outcome: ProcessResult<usize>,
}

impl LineStream {
    #[must_use]
    pub const fn new(tx: flume::Sender<String>) -> Self {
        Self::with_capacity(tx, DEFAULT_LINE_CAPACITY)
    }

    #[must_use]
    pub const fn with_capacity(tx: flume::Sender<String>, capacity: usize) -> Self {
        Self {
            tx,
            capacity,
            carry: Vec::new(),
            written: false,
        }
    }

    /// Changes the carry-over capacity.
    ///
    /// # Errors
    ///
    /// Returns [`ProcessError::CapacityLocked`] once bytes have been written.
    pub fn set_capacity(&mut self, capacity: usize) -> ProcessResult<()> {
        if self.written {
            return Err(ProcessError::CapacityLocked);
        }
        self.capacity = capacity;
        Ok(())
    }

    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of bytes currently held for an unterminated line.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.carry.len()
    }

    /// Frames `bytes` and pushes complete lines, blocking on a full queue.
    ///
    /// Returns the number of bytes consumed, which is `bytes.len()` on success.
    ///
    /// # Errors
    ///
    /// - [`ProcessError::LineBufferOverflow`] when the trailing partial line
    ///   does not fit; `consumed` counts the bytes up to and including the
    ///   last newline, whose lines were delivered.
    /// - [`ProcessError::QueueClosed`] when every receiver is gone.
    pub fn write_bytes(&mut self, bytes: &[u8]) -> ProcessResult<usize> {
        let Framed { lines, outcome } = self.frame(bytes);
        for line in lines {
            self.tx.send(line).map_err(|_| ProcessError::QueueClosed)?;
        }
        outcome
    }

    /// Async counterpart of [`write_bytes`](Self::write_bytes).
    ///
    /// # Errors
    ///
    /// Same as [`write_bytes`](Self::write_bytes).
    pub async fn write_bytes_async(&mut self, bytes: &[u8]) -> ProcessResult<usize> {
        let Framed { lines, outcome } = self.frame(bytes);
        for line in lines {
            self.tx
                .send_async(line)
                .await
                .map_err(|_| ProcessError::QueueClosed)?;
        }
        outcome
    }

    /// Pushes the carried-over partial line, if any, as a final line.
    ///
    /// # Errors
    ///
    /// Returns [`ProcessError::QueueClosed`] when every receiver is gone.
    pub fn flush_partial(&mut self) -> ProcessResult<()> {
        if let Some(line) = self.take_partial() {
            self.tx.send(line).map_err(|_| ProcessError::QueueClosed)?;
        }
        Ok(())
    }

    /// Async counterpart of [`flush_partial`](Self::flush_partial).
    ///
    /// # Errors
    ///
    /// Returns [`ProcessError::QueueClosed`] when every receiver is gone.
    pub async fn flush_partial_async(&mut self) -> ProcessResult<()> {
        if let Some(line) = self.take_partial() {
            self.tx
                .send_async(line)
                .await
                .map_err(|_| ProcessError::QueueClosed)?;
        }
        Ok(())
    }

    fn take_partial(&mut self) -> Option<String> {
        if self.carry.is_empty() {
            return None;
        }
        let carry = std::mem::take(&mut self.carry);
        Some(decode_line(&carry))
    }

    fn frame(&mut self, bytes: &[u8]) -> Framed {
        self.written = true;

        let mut lines = Vec::new();
        let mut start = 0;
        while let Some(offset) = bytes[start..].iter().position(|&b| b == b'\n') {
            let end = start + offset;
            let line = if self.carry.is_empty() {
                decode_line(&bytes[start..end])
            } else {
                let mut joined = std::mem::take(&mut self.carry);
                joined.extend_from_slice(&bytes[start..end]);
                decode_line(&joined)
            };
            lines.push(line);
            start = end + 1;
        }

        let remain = bytes.len() - start;
        if remain > self.capacity.saturating_sub(self.carry.len()) {
            return Framed {
                lines,
                outcome: Err(ProcessError::LineBufferOverflow {
                    consumed: start,
                    capacity: self.capacity,
                }),
            };
        }
        self.carry.extend_from_slice(&bytes[start..]);

        Framed {
            lines,
            outcome: Ok(bytes.len()),
        }
    }
}

impl Write for LineStream {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.write_bytes(buf).map_err(Into::into)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

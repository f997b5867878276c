// procwatch: Managed subprocess execution
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Output pumps from child pipes into sinks.
//!
//! ```text
//! ChildStdout --read--> combined + stdout  [+ LineStream]
//! ChildStderr --read--> combined + stderr  [+ LineStream]
//! EOF --> flush trailing partial line
//! ```

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Child;
use tokio::task::JoinHandle;
use tracing::{trace, warn};

use crate::core::output::{LineStream, OutputBuffer};

const READ_BUFFER_SIZE: usize = 4096;

/// Sinks fed by one stream.
struct StreamSinks {
    combined: OutputBuffer,
    own: OutputBuffer,
    lines: Option<LineStream>,
}

/// Destination buffers shared with the lifecycle.
#[derive(Debug, Clone, Default)]
pub(super) struct Buffers {
    pub(super) combined: OutputBuffer,
    pub(super) stdout: OutputBuffer,
    pub(super) stderr: OutputBuffer,
}

/// Running pump tasks.
pub(super) struct Pumps {
    handles: Vec<JoinHandle<()>>,
}

impl Pumps {
    /// Waits for every pump to reach end of stream. Cancel-safe.
    pub(super) async fn join(&mut self) {
        while let Some(handle) = self.handles.last_mut() {
            let _ = handle.await;
            self.handles.pop();
        }
    }

    pub(super) fn abort(self) {
        for handle in self.handles {
            handle.abort();
        }
    }
}

/// Spawns reader tasks for the child's stdout and stderr.
///
/// Each stream gets its own `LineStream` on the shared queue so partial
/// lines of one stream never merge with the other.
pub(super) fn spawn_pumps(
    child: &mut Child,
    buffers: &Buffers,
    queue: Option<(&flume::Sender<String>, usize)>,
) -> Pumps {
    let line_stream = || queue.map(|(tx, capacity)| LineStream::with_capacity(tx.clone(), capacity));

    let mut handles = Vec::with_capacity(2);
    if let Some(stdout) = child.stdout.take() {
        let sinks = StreamSinks {
            combined: buffers.combined.clone(),
            own: buffers.stdout.clone(),
            lines: line_stream(),
        };
        handles.push(tokio::spawn(pump(stdout, sinks, "stdout")));
    }
    if let Some(stderr) = child.stderr.take() {
        let sinks = StreamSinks {
            combined: buffers.combined.clone(),
            own: buffers.stderr.clone(),
            lines: line_stream(),
        };
        handles.push(tokio::spawn(pump(stderr, sinks, "stderr")));
    }
    Pumps { handles }
}

async fn pump<R>(mut reader: R, mut sinks: StreamSinks, stream: &'static str)
where
    R: AsyncRead + Unpin,
{
    let mut buf = [0u8; READ_BUFFER_SIZE];
    loop {
        match reader.read(&mut buf).await {
            Ok(0) => break,
            Ok(n) => {
                let chunk = &buf[..n];
                sinks.combined.append(chunk);
                sinks.own.append(chunk);
                if let Some(lines) = sinks.lines.as_mut()
                    && let Err(e) = lines.write_bytes_async(chunk).await
                {
                    warn!(stream = stream, error = %e, "line queue disabled");
                    sinks.lines = None;
                }
            }
            Err(e) => {
                warn!(stream = stream, error = %e, "error reading stream");
                break;
            }
        }
    }

    if let Some(mut lines) = sinks.lines
        && let Err(e) = lines.flush_partial_async().await
    {
        trace!(stream = stream, error = %e, "dropping trailing line");
    }
    trace!(stream = stream, "eof");
}

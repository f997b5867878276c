// procwatch: Managed subprocess execution
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

use std::time::Duration;

use super::{ConfigError, Error, ProcessError};

#[test]
fn test_exit_code_mapping() {
    assert!(ProcessError::from_exit_code(0).is_none());
    assert!(matches!(
        ProcessError::from_exit_code(127),
        Some(ProcessError::CommandNotFound)
    ));
    assert!(matches!(
        ProcessError::from_exit_code(126),
        Some(ProcessError::NotExecutable)
    ));
    assert!(matches!(
        ProcessError::from_exit_code(128),
        Some(ProcessError::InvalidArguments)
    ));
    assert!(matches!(
        ProcessError::from_exit_code(2),
        Some(ProcessError::NonZeroExit { code: 2 })
    ));
}

#[test]
fn test_exit_code_hint_roundtrips_mapped_kinds() {
    for code in [1, 2, 126, 127, 128, 255] {
        let err = ProcessError::from_exit_code(code).expect("non-zero code maps to an error");
        assert_eq!(err.exit_code_hint(), Some(code));
    }
    assert_eq!(ProcessError::Cancelled.exit_code_hint(), None);
}

#[test]
fn test_terminated_kinds_are_distinct() {
    let timeout = ProcessError::Timeout {
        timeout: Duration::from_secs(2),
    };
    assert!(timeout.is_terminated());
    assert!(ProcessError::Cancelled.is_terminated());
    assert!(!ProcessError::CommandNotFound.is_terminated());
    assert_ne!(timeout.to_string(), ProcessError::Cancelled.to_string());
}

#[test]
fn test_process_error_display() {
    let overflow = ProcessError::LineBufferOverflow {
        consumed: 4,
        capacity: 8,
    };
    insta::assert_snapshot!(overflow.to_string(), @"line buffer overflow after 4 bytes (capacity 8)");

    let timeout = ProcessError::Timeout {
        timeout: Duration::from_secs(2),
    };
    insta::assert_snapshot!(timeout.to_string(), @"process timed out after 2s");
}

#[test]
fn test_config_error_display() {
    let err = ConfigError::InvalidValue {
        section: "process".to_string(),
        key: "line_buffer_size".to_string(),
        message: "must be greater than 0".to_string(),
    };
    insta::assert_snapshot!(err.to_string(), @"invalid value for 'line_buffer_size' in section '[process]': must be greater than 0");
}

#[test]
fn test_io_conversion_keeps_kind() {
    let io = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe");
    let err: ProcessError = io.into();
    let back: std::io::Error = err.into();
    assert_eq!(back.kind(), std::io::ErrorKind::BrokenPipe);

    let other: std::io::Error = ProcessError::QueueClosed.into();
    assert_eq!(other.kind(), std::io::ErrorKind::Other);
}

#[test]
fn test_error_size() {
    let size = std::mem::size_of::<Error>();
    assert!(size <= 24, "Error is {size} bytes, expected <= 24");
}

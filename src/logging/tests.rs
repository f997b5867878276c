// procwatch: Managed subprocess execution
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

use super::{LogConfig, LogLevel};

#[test]
fn test_log_level_conversion() {
    let conversions: Vec<_> = [0u8, 2, 5, 6]
        .into_iter()
        .map(|raw| (raw, LogLevel::from_u8(raw).map(LogLevel::to_filter_string)))
        .collect();
    insta::assert_debug_snapshot!(conversions, @r#"
    [
        (
            0,
            Some(
                "off",
            ),
        ),
        (
            2,
            Some(
                "warn",
            ),
        ),
        (
            5,
            Some(
                "trace",
            ),
        ),
        (
            6,
            None,
        ),
    ]
    "#);
}

#[test]
fn test_log_level_rejects_out_of_range() {
    let err = LogLevel::new(9).unwrap_err();
    insta::assert_snapshot!(err, @"invalid value for 'level' in section '[log]': log level must be 0-5, got 9");
}

#[test]
fn test_log_level_tracing_mapping() {
    assert_eq!(LogLevel::SILENT.to_tracing_level(), None);
    assert_eq!(
        LogLevel::DEBUG.to_tracing_level(),
        Some(tracing::Level::DEBUG)
    );
    assert!(LogLevel::TRACE > LogLevel::INFO);
}

#[test]
fn test_log_level_deserialize() {
    #[derive(serde::Deserialize)]
    struct Wrapper {
        level: LogLevel,
    }

    let ok: Wrapper = serde_json::from_str(r#"{"level": 4}"#).unwrap();
    assert_eq!(ok.level, LogLevel::DEBUG);
    assert!(serde_json::from_str::<Wrapper>(r#"{"level": 7}"#).is_err());
}

#[test]
fn test_log_config_defaults() {
    let config = LogConfig::default();
    assert_eq!(config.console_level(), LogLevel::WARN);
    assert_eq!(config.file_level(), LogLevel::TRACE);
    assert!(config.log_file().is_none());
    assert!(!config.show_target());
}

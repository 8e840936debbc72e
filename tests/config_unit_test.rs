//! Unit tests for configuration checks.
//!
//! Run with: cargo test --test config_unit_test

use pretty_assertions::assert_eq;

use redenv_collector::config::{Config, ConfigError, Deployment};
use redenv_collector::frame::FrameFormat;

fn config() -> Config {
    Config {
        database_url: "sqlite::memory:".to_string(),
        api_host: "0.0.0.0".to_string(),
        api_port: 8006,
        request_timeout_seconds: 30,
        max_body_bytes: 65_536,
        civil_timezone: chrono_tz::America::Los_Angeles,
        accept_legacy_frames: false,
        ingest_concurrent_limit: 32,
        ttn_app_id: None,
        ttn_webhook_key: None,
        deployment: Deployment::Local,
    }
}

#[test]
fn defaults_are_valid() {
    assert!(config().validate().is_ok());
    assert_eq!(config().bind_address(), "0.0.0.0:8006");
}

#[test]
fn zero_ingest_limit_is_rejected() {
    let err = Config {
        ingest_concurrent_limit: 0,
        ..config()
    }
    .validate()
    .unwrap_err();

    assert!(matches!(
        err,
        ConfigError::Invalid {
            var: "INGEST_CONCURRENT_LIMIT",
            ..
        }
    ));
}

#[test]
fn legacy_frames_are_opt_in() {
    assert_eq!(config().frame_formats(), vec![FrameFormat::V2]);
    assert_eq!(
        Config {
            accept_legacy_frames: true,
            ..config()
        }
        .frame_formats(),
        vec![FrameFormat::V2, FrameFormat::V1]
    );
}

//! Integration tests for configuration loading.

use std::io::Write;
use std::time::Duration;

use scan_rig::config::RigConfig;

#[test]
fn loads_from_toml_file() {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    write!(
        file,
        r#"
        [application]
        name = "scan-rig"
        log_level = "debug"

        [broker]
        host = "broker.example.org"
        port = 61614

        [scan]
        topic = "gda.messages.scan"
        instrument_session = "cm40661-1"
        default_timeout = "30s"
        "#
    )
    .expect("write config");

    let config = RigConfig::load_from(file.path()).expect("config should load");
    assert_eq!(config.application.log_level, "debug");
    assert_eq!(config.broker.host, "broker.example.org");
    assert_eq!(config.broker.port, 61614);
    assert_eq!(config.scan.default_timeout, Duration::from_secs(30));
    config.validate().expect("loaded config should validate");
}

#[test]
fn missing_file_falls_back_to_defaults() {
    let dir = tempfile::tempdir().expect("temp dir");
    let config =
        RigConfig::load_from(dir.path().join("absent.toml")).expect("defaults should apply");
    assert_eq!(config.scan.topic, "gda.messages.scan");
    assert_eq!(config.broker.port, 61613);
    config.validate().expect("default config should validate");
}

#[test]
fn partial_file_keeps_defaults_for_the_rest() {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    write!(
        file,
        r#"
        [broker]
        host = "b01-1-broker"
        "#
    )
    .expect("write config");

    let config = RigConfig::load_from(file.path()).expect("config should load");
    assert_eq!(config.broker.host, "b01-1-broker");
    assert_eq!(config.broker.port, 61613);
    assert_eq!(config.application.log_level, "info");
}

#[test]
fn shipped_config_file_is_valid() {
    let config = RigConfig::load_from(concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/config/scan-rig.toml"
    ))
    .expect("shipped config should load");
    config.validate().expect("shipped config should validate");
    assert_eq!(config.scan.topic, "gda.messages.scan");
}

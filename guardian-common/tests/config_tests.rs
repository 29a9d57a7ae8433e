//! Configuration resolution tests
//!
//! Covers the Defaults ← TOML ← ENV ← CLI layering through the process
//! environment. Tests that touch `GUARDIAN_*` variables are marked
//! `#[serial]` so they do not race each other.

use guardian_common::config::{ConfigOverrides, ConfigResolver, TomlConfig, DEFAULT_PORT};
use serial_test::serial;
use std::env;
use std::io::Write;
use std::path::PathBuf;

const ENV_KEYS: &[&str] = &[
    "GUARDIAN_CONFIG",
    "GUARDIAN_PORT",
    "GUARDIAN_BIND_ADDRESS",
    "GUARDIAN_LOG_LEVEL",
    "GUARDIAN_GEMINI_API_KEY",
    "GEMINI_API_KEY",
    "GUARDIAN_SMS_GATEWAY_URL",
];

fn clear_env() {
    for key in ENV_KEYS {
        env::remove_var(key);
    }
}

fn config_file(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
#[serial]
fn test_cli_path_wins_over_env_path() {
    clear_env();
    env::set_var("GUARDIAN_CONFIG", "/tmp/guardian-from-env.toml");

    let resolver = ConfigResolver::new(Some(PathBuf::from("/tmp/guardian-from-cli.toml")));
    assert_eq!(
        resolver.config_path(),
        Some(PathBuf::from("/tmp/guardian-from-cli.toml"))
    );

    let resolver = ConfigResolver::new(None);
    assert_eq!(
        resolver.config_path(),
        Some(PathBuf::from("/tmp/guardian-from-env.toml"))
    );

    clear_env();
}

#[test]
#[serial]
fn test_missing_config_file_uses_defaults() {
    clear_env();

    let resolver = ConfigResolver::new(Some(PathBuf::from("/nonexistent/guardian.toml")));
    let config = resolver.resolve(&ConfigOverrides::default()).unwrap();

    assert_eq!(config.server.port, DEFAULT_PORT);
    assert!(!config.reasoning.is_live());
    assert!(config.gateway.endpoint().is_none());
}

#[test]
#[serial]
fn test_layering_order() {
    clear_env();
    let file = config_file(
        "[server]\nport = 6000\nbind_address = \"0.0.0.0\"\n\n[logging]\nlevel = \"debug\"\n",
    );
    env::set_var("GUARDIAN_PORT", "7000");
    env::set_var("GUARDIAN_LOG_LEVEL", "warn");

    let resolver = ConfigResolver::new(Some(file.path().to_path_buf()));
    let overrides = ConfigOverrides {
        log_level: Some("trace".to_string()),
        ..Default::default()
    };
    let config = resolver.resolve(&overrides).unwrap();

    // TOML only
    assert_eq!(config.server.bind_address, "0.0.0.0");
    // ENV over TOML
    assert_eq!(config.server.port, 7000);
    // CLI over ENV
    assert_eq!(config.logging.level, "trace");

    clear_env();
}

#[test]
#[serial]
fn test_generic_api_key_enables_live_mode() {
    clear_env();
    env::set_var("GEMINI_API_KEY", "test-key");
    env::set_var("GUARDIAN_SMS_GATEWAY_URL", "https://sms.example.test/publish");

    let config = ConfigResolver::new(Some(PathBuf::from("/nonexistent/guardian.toml")))
        .resolve(&ConfigOverrides::default())
        .unwrap();

    assert!(config.reasoning.is_live());
    assert_eq!(config.reasoning.api_key(), Some("test-key"));
    assert_eq!(
        config.gateway.endpoint(),
        Some("https://sms.example.test/publish")
    );

    clear_env();
}

#[test]
#[serial]
fn test_invalid_limits_fail_resolution() {
    clear_env();
    let file = config_file("[alert]\nmax_message_chars = 100\nsafe_message_chars = 200\n");

    let result = ConfigResolver::new(Some(file.path().to_path_buf()))
        .resolve(&ConfigOverrides::default());
    assert!(result.is_err());
}

#[test]
fn test_round_trip_through_toml() {
    let config = TomlConfig::default();
    let rendered = toml::to_string(&config).unwrap();
    assert_eq!(TomlConfig::from_toml_str(&rendered).unwrap(), config);
}

//! Integration tests for configuration loading
//!
//! Tests that touch CRS_CONFIG are marked #[serial] so they do not race on the
//! process environment.

use crs_common::config::{resolve_config_path, ConfigSource, ServiceConfig, CONFIG_ENV_VAR};
use serial_test::serial;
use std::env;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

fn write_config(dir: &TempDir, content: &str) -> PathBuf {
    let path = dir.path().join("config.toml");
    fs::write(&path, content).expect("Should write config file");
    path
}

#[test]
#[serial]
fn test_cli_path_wins_over_env_var() {
    env::set_var(CONFIG_ENV_VAR, "/tmp/crs-env-config.toml");
    let cli = PathBuf::from("/tmp/crs-cli-config.toml");

    assert_eq!(resolve_config_path(Some(&cli)), Some(cli.clone()));

    env::remove_var(CONFIG_ENV_VAR);
}

#[test]
#[serial]
fn test_env_var_used_without_cli_path() {
    env::set_var(CONFIG_ENV_VAR, "/tmp/crs-env-config.toml");

    assert_eq!(
        resolve_config_path(None),
        Some(PathBuf::from("/tmp/crs-env-config.toml"))
    );

    env::remove_var(CONFIG_ENV_VAR);
}

#[test]
#[serial]
fn test_load_from_env_var_file() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "port = 9000\nsession_idle_minutes = 5\n");
    env::set_var(CONFIG_ENV_VAR, &path);

    let (config, source) = ServiceConfig::load(None).expect("Config should load");
    assert_eq!(source, ConfigSource::File(path.clone()));
    assert_eq!(config.port, 9000);
    assert_eq!(config.session_idle_minutes, 5);
    assert_eq!(config.bind_host, "127.0.0.1");

    env::remove_var(CONFIG_ENV_VAR);
}

#[test]
#[serial]
fn test_explicit_missing_file_is_an_error() {
    env::remove_var(CONFIG_ENV_VAR);
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("nope.toml");

    let err = ServiceConfig::load(Some(&missing)).unwrap_err();
    assert!(err.to_string().contains("not found"), "{err}");

    env::set_var(CONFIG_ENV_VAR, &missing);
    assert!(ServiceConfig::load(None).is_err());
    env::remove_var(CONFIG_ENV_VAR);
}

#[test]
#[serial]
fn test_unparseable_file_is_an_error() {
    env::remove_var(CONFIG_ENV_VAR);
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "port = \"not a number\"");

    let err = ServiceConfig::load(Some(&path)).unwrap_err();
    assert!(err.to_string().contains("config.toml"), "{err}");
}

use makegood::config::{CONFIG_FILE_NAME, Config};
use std::time::Duration;

#[test]
fn test_default_config_values() {
    let config = Config::default();

    assert_eq!(config.reader.poll_interval_ms, 100);
    assert_eq!(config.reader.poll_interval(), Duration::from_millis(100));
    assert_eq!(config.launch.test_runner, "bin/testrunner");
    assert_eq!(config.launch.prepare_script, "tests/prepare.php");
    assert!(config.launch.junit_xml_dir.is_none());
    assert_eq!(config.progress.mode, "bar");
    assert!(config.progress.color);
}

#[test]
fn test_empty_file_uses_defaults() {
    let config = Config::parse("").expect("empty config is valid");
    assert_eq!(config.reader.poll_interval_ms, 100);
    assert_eq!(config.progress.mode, "bar");
}

#[test]
fn test_invalid_toml_is_rejected() {
    assert!(Config::parse("[reader\npoll_interval_ms = ").is_none());
}

#[test]
fn test_load_from_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join(CONFIG_FILE_NAME);
    std::fs::write(&path, "[launch]\ntest_runner = \"vendor/bin/runner\"\n").expect("write");

    let config = Config::load_from_file(&path).expect("config loads");
    assert_eq!(config.launch.test_runner, "vendor/bin/runner");
    assert_eq!(config.launch.prepare_script, "tests/prepare.php");
}

#[test]
fn test_load_from_missing_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    assert!(Config::load_from_file(&dir.path().join("missing.toml")).is_none());
}

//! Tests for configuration loading and validation

use std::io::Write;

use doc_chat::config::AppConfig;
use tempfile::NamedTempFile;

fn yaml_file(contents: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(".yaml")
        .tempfile()
        .expect("Failed to create temp file");
    file.write_all(contents.as_bytes())
        .expect("Failed to write config");
    file
}

#[test]
fn test_default_config_values() {
    let config = AppConfig::default();

    assert_eq!(config.server.bind_address, "127.0.0.1:8181");
    assert_eq!(config.database.url, "data/doc-chat.db");
    assert_eq!(config.database.max_connections, 10);
    assert_eq!(config.inference.server_host, None);
    assert_eq!(config.inference.qa_path, "/api/get_qa");
    assert_eq!(config.inference.timeout_secs, None);
    assert_eq!(config.pagination.page_size, 20);
    assert!(config.auth.require_login);
}

#[test]
fn test_default_logging_config() {
    let config = AppConfig::default();

    assert_eq!(config.logging.level, "info");
    assert_eq!(config.logging.file_path, None);
    assert_eq!(config.logging.format, "text");
}

#[test]
fn test_load_without_file_uses_defaults() {
    let config = AppConfig::load(None).expect("Failed to load defaults");
    assert_eq!(config.inference.qa_path, "/api/get_qa");
    assert_eq!(config.pagination.page_size, 20);
}

#[test]
fn test_load_from_yaml_file() {
    let file = yaml_file(
        "server:\n  bind_address: \"0.0.0.0:9000\"\n\
         inference:\n  server_host: \"http://infer:8000\"\n  timeout_secs: 30\n\
         pagination:\n  page_size: 5\n\
         auth:\n  require_login: false\n",
    );

    let config = AppConfig::load(Some(file.path())).expect("Failed to load config");
    assert_eq!(config.server.bind_address, "0.0.0.0:9000");
    assert_eq!(config.inference.server_host.as_deref(), Some("http://infer:8000"));
    assert_eq!(config.inference.timeout_secs, Some(30));
    assert_eq!(config.inference.qa_path, "/api/get_qa");
    assert_eq!(config.pagination.page_size, 5);
    assert!(!config.auth.require_login);
    assert_eq!(config.database.max_connections, 10);
}

#[test]
fn test_load_rejects_invalid_file_values() {
    let file = yaml_file("logging:\n  level: loud\n");
    assert!(AppConfig::load(Some(file.path())).is_err());
}

#[test]
fn test_load_requires_named_file() {
    let missing = std::path::Path::new("/nonexistent/doc-chat.yaml");
    assert!(AppConfig::load(Some(missing)).is_err());
}

#[test]
fn test_config_validation_success() {
    let config = AppConfig::default();
    assert!(config.validate().is_ok());
}

#[test]
fn test_config_validation_zero_max_connections() {
    let mut config = AppConfig::default();
    config.database.max_connections = 0;
    assert!(config.validate().is_err());
}

#[test]
fn test_config_validation_invalid_log_level() {
    let mut config = AppConfig::default();
    config.logging.level = "invalid".to_string();
    assert!(config.validate().is_err());
}

#[test]
fn test_config_validation_valid_log_levels() {
    for level in ["trace", "debug", "info", "warn", "error"] {
        let mut config = AppConfig::default();
        config.logging.level = level.to_string();
        assert!(config.validate().is_ok(), "Failed for level: {}", level);
    }
}

#[test]
fn test_config_validation_invalid_log_format() {
    let mut config = AppConfig::default();
    config.logging.format = "xml".to_string();
    assert!(config.validate().is_err());
}

#[test]
fn test_config_validation_zero_page_size() {
    let mut config = AppConfig::default();
    config.pagination.page_size = 0;
    assert!(config.validate().is_err());
}

#[test]
fn test_config_validation_relative_qa_path() {
    let mut config = AppConfig::default();
    config.inference.qa_path = "api/get_qa".to_string();
    assert!(config.validate().is_err());
}

#[test]
fn test_config_validation_zero_timeout() {
    let mut config = AppConfig::default();
    config.inference.timeout_secs = Some(0);
    assert!(config.validate().is_err());

    config.inference.timeout_secs = Some(1);
    assert!(config.validate().is_ok());
}

#[test]
fn test_config_renders_as_yaml() {
    let yaml = AppConfig::default().to_yaml().expect("Failed to render");
    assert!(yaml.contains("qa_path: /api/get_qa"));
    assert!(yaml.contains("require_login: true"));
}

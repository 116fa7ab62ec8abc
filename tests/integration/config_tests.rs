//! Integration tests for loading client configuration from disk

use std::io::Write;

use tempfile::NamedTempFile;
use tokio_test::{assert_err, assert_ok};
use wos_client_rs::{ApiKey, ClientConfig, OutputFormat, TimeSpan, WosClient, WosError};

fn config_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("Should create temp file");
    file.write_all(contents.as_bytes())
        .expect("Should write config");
    file
}

#[test]
fn test_load_config_file() {
    let file = config_file(
        r#"
restful_wos:
  wos_expanded: "0123456789abcdef"
  defaults:
    count: 25
    edition: "WOS+SSCI"
"#,
    );

    let config = assert_ok!(ClientConfig::from_yaml_file(file.path()));
    assert_eq!(
        config.api_key,
        Some(ApiKey::Expanded("0123456789abcdef".to_string()))
    );
    assert_eq!(config.search_defaults.count, 25);
    assert_eq!(config.search_defaults.edition, "WOS+SSCI");
    assert_eq!(config.format, OutputFormat::Ris);

    let client = assert_ok!(WosClient::with_config(config));
    let search = client.prepare_query("TS=water", None, &[]);
    assert_eq!(search.get("count"), Some("25"));
    assert_eq!(search.get("edition"), Some("WOS+SSCI"));
}

#[test]
fn test_missing_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = assert_err!(ClientConfig::from_yaml_file(dir.path().join("config.yml")));
    assert!(matches!(err, WosError::ConfigurationError(_)));
}

#[test]
fn test_config_file_without_key() {
    let file = config_file("restful_wos:\n  defaults:\n    count: 10\n");
    let err = assert_err!(ClientConfig::from_yaml_file(file.path()));
    assert!(err.to_string().contains("No valid API key"));
}

#[test]
fn test_invalid_yaml() {
    let file = config_file("restful_wos: [unclosed\n");
    let err = assert_err!(ClientConfig::from_yaml_file(file.path()));
    assert!(matches!(err, WosError::YamlError(_)));
}

#[test]
fn test_time_span_validation() {
    assert_ok!(TimeSpan::new("2018-01-01", "2018-01-01"));
    assert_err!(TimeSpan::new("2018-02-30", "2018-03-01"));
    assert_err!(TimeSpan::new("2018/01/01", "2018-03-01"));
    assert_err!(TimeSpan::new("2019-01-01", "2018-01-01"));
}

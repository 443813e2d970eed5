use dnswatch_domain::config::dns::{
    DEFAULT_GLOBAL_MEMCAP, DEFAULT_REQUEST_FLOOD, DEFAULT_STATE_MEMCAP,
};
use dnswatch_domain::config::ConfigError;
use dnswatch_domain::{CliOverrides, Config, DnsParserConfig};

#[test]
fn test_config_default_values() {
    let config = DnsParserConfig::default();

    assert_eq!(config.request_flood, 500);
    assert_eq!(config.state_memcap, 512 * 1024);
    assert_eq!(config.global_memcap, 16 * 1024 * 1024);
    assert_eq!(config.request_flood, DEFAULT_REQUEST_FLOOD);
    assert_eq!(config.state_memcap, DEFAULT_STATE_MEMCAP);
    assert_eq!(config.global_memcap, DEFAULT_GLOBAL_MEMCAP);
}

#[test]
fn test_empty_toml_uses_defaults() {
    let config = Config::from_toml("").unwrap();

    assert_eq!(config.dns.request_flood, DEFAULT_REQUEST_FLOOD);
    assert_eq!(config.logging.level, "info");
    assert_eq!(config.logging.format, "text");
}

#[test]
fn test_partial_dns_section() {
    let toml_str = r#"
        [dns]
        request_flood = 64

        [logging]
        format = "json"
    "#;

    let config = Config::from_toml(toml_str).unwrap();

    assert_eq!(config.dns.request_flood, 64);
    assert_eq!(config.dns.state_memcap, DEFAULT_STATE_MEMCAP);
    assert_eq!(config.logging.format, "json");
    assert!(config.validate().is_ok());
}

#[test]
fn test_deserialization_ignores_unknown_fields() {
    let toml_str = r#"
        [dns]
        global_memcap = 0
        unknown_knob = true
    "#;

    let config = Config::from_toml(toml_str).unwrap();
    assert_eq!(config.dns.global_memcap, 0);
}

#[test]
fn test_invalid_toml_is_parse_error() {
    let result = Config::from_toml("[dns\nrequest_flood = ");
    assert!(matches!(result, Err(ConfigError::Parse(_))));
}

#[test]
fn test_validate_rejects_state_above_global() {
    let mut config = Config::default();
    config.dns.state_memcap = 2048;
    config.dns.global_memcap = 1024;
    assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));

    config.dns.global_memcap = 0;
    assert!(config.validate().is_ok());
}

#[test]
fn test_validate_rejects_unknown_log_format() {
    let mut config = Config::default();
    config.logging.format = "xml".to_string();
    assert!(config.validate().is_err());
}

#[test]
fn test_load_missing_file_fails() {
    let result = Config::load(
        Some("/nonexistent/dnswatch/config.toml"),
        CliOverrides::default(),
    );
    assert!(matches!(result, Err(ConfigError::FileRead(_, _))));
}

#[test]
fn test_load_applies_cli_overrides() {
    let path = std::env::temp_dir().join(format!("dnswatch-config-{}.toml", std::process::id()));
    std::fs::write(&path, "[dns]\nrequest_flood = 10\nstate_memcap = 100\n").unwrap();

    let config = Config::load(
        path.to_str(),
        CliOverrides {
            request_flood: Some(20),
            log_level: Some("debug".to_string()),
            ..Default::default()
        },
    )
    .unwrap();
    std::fs::remove_file(&path).unwrap();

    assert_eq!(config.dns.request_flood, 20);
    assert_eq!(config.dns.state_memcap, 100);
    assert_eq!(config.logging.level, "debug");
}

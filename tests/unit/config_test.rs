//! Tests for configuration validation

use prometheus_request_gate::config::{
    SchedulerConfig, ENV_DEBUG, ENV_DEFAULT_PRIORITY, ENV_MAX_CONNECTIONS,
};

#[test]
fn test_default_config_is_valid() {
    let config = SchedulerConfig::default();
    assert!(config.validate().is_ok());
    assert_eq!(config.max_connections, 6);
    assert_eq!(config.default_priority, 5);
    assert!(config.debug);
}

#[test]
fn test_default_category_table() {
    let config = SchedulerConfig::default();
    assert_eq!(config.category("html"), Some(5));
    assert_eq!(config.category("xml"), Some(5));
    assert_eq!(config.category("script"), Some(5));
    assert_eq!(config.category("text"), Some(4));
    assert_eq!(config.category("json"), Some(0));
    assert_eq!(config.category("jsonp"), Some(0));
    assert_eq!(config.category("binary"), None);
}

#[test]
fn test_empty_category_name_is_invalid() {
    let config = SchedulerConfig::default().with_category("  ", 3);
    assert!(config.validate().is_err());
}

#[test]
fn test_with_category_replaces_entry() {
    let config = SchedulerConfig::default().with_category("json", 7);
    assert_eq!(config.category("json"), Some(7));
}

#[test]
fn test_zero_ceiling_is_valid() {
    let config = SchedulerConfig::default().with_max_connections(0);
    assert!(config.validate().is_ok());
}

#[test]
fn test_scheduler_config_from_json() {
    let json = r#"{
        "max_connections": 2,
        "category_priority": { "json": 1, "csv": 8 },
        "debug": false
    }"#;

    let config = SchedulerConfig::from_json_str(json).expect("valid json");
    assert_eq!(config.max_connections, 2);
    assert_eq!(config.default_priority, 5);
    assert_eq!(config.category("csv"), Some(8));
    assert_eq!(config.category("html"), None);
    assert!(!config.debug);
}

#[test]
fn test_scheduler_config_from_bad_json() {
    assert!(SchedulerConfig::from_json_str("{ not json").is_err());
    assert!(SchedulerConfig::from_json_str(r#"{ "category_priority": { "": 1 } }"#).is_err());
}

#[test]
fn test_overlay_env_all_variables() {
    let config = SchedulerConfig::default()
        .overlay_env(|key| match key {
            k if k == ENV_MAX_CONNECTIONS => Some("3".into()),
            k if k == ENV_DEFAULT_PRIORITY => Some(" 9 ".into()),
            k if k == ENV_DEBUG => Some("off".into()),
            _ => None,
        })
        .expect("valid overrides");
    assert_eq!(config.max_connections, 3);
    assert_eq!(config.default_priority, 9);
    assert!(!config.debug);
}

#[test]
fn test_overlay_env_without_variables_keeps_values() {
    let base = SchedulerConfig::default().with_max_connections(11);
    let config = base.clone().overlay_env(|_| None).expect("no overrides");
    assert_eq!(config, base);
}

#[test]
fn test_overlay_env_reports_variable_name() {
    let err = SchedulerConfig::default()
        .overlay_env(|key| (key == ENV_DEFAULT_PRIORITY).then(|| "-1".to_string()))
        .unwrap_err();
    assert!(format!("{err:#}").contains(ENV_DEFAULT_PRIORITY));
}

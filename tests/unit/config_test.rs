//! Tests for configuration validation

use std::collections::HashMap;

use cadence_scheduler::config::{parse_groups, SchedulerConfig};

#[test]
fn test_default_config_is_valid() {
    let cfg = SchedulerConfig::default();
    assert!(cfg.validate().is_ok());
    assert_eq!(cfg.max_sleep_chunk_secs, 7 * 24 * 60 * 60);
    assert_eq!(cfg.reference_offset_ms, 1000);
    assert!(cfg.groups.is_empty());
}

#[test]
fn test_zero_sleep_chunk_rejected() {
    let cfg = SchedulerConfig {
        max_sleep_chunk_secs: 0,
        ..SchedulerConfig::default()
    };
    assert!(cfg.validate().is_err());
}

#[test]
fn test_zero_group_concurrency_rejected() {
    let cfg = SchedulerConfig {
        groups: HashMap::from([("alerts".to_string(), 0)]),
        ..SchedulerConfig::default()
    };
    let err = cfg.validate().unwrap_err();
    assert!(err.contains("alerts"), "{err}");
}

#[test]
fn test_from_json_str_fills_defaults() {
    let cfg = SchedulerConfig::from_json_str(r#"{"groups": {"alerts": 2, "reports": 1}}"#).unwrap();
    assert_eq!(cfg.groups["alerts"], 2);
    assert_eq!(cfg.groups["reports"], 1);
    assert_eq!(cfg.reference_offset_ms, 1000);
}

#[test]
fn test_from_json_str_rejects_invalid() {
    assert!(SchedulerConfig::from_json_str("{not json").is_err());
    assert!(SchedulerConfig::from_json_str(r#"{"max_sleep_chunk_secs": 0}"#).is_err());
}

#[test]
fn test_from_lookup_reads_variables() {
    let vars = HashMap::from([
        ("SCHEDULER_MAX_SLEEP_CHUNK_SECS", "3600"),
        ("SCHEDULER_REFERENCE_OFFSET_MS", "250"),
        ("SCHEDULER_GROUPS", "alerts=2, reports=1"),
    ]);
    let cfg = SchedulerConfig::from_lookup(|key| vars.get(key).map(|v| (*v).to_string())).unwrap();

    assert_eq!(cfg.max_sleep_chunk().as_secs(), 3600);
    assert_eq!(cfg.reference_offset().as_millis(), 250);
    assert_eq!(cfg.groups.len(), 2);
}

#[test]
fn test_from_lookup_without_variables_is_default() {
    let cfg = SchedulerConfig::from_lookup(|_| None).unwrap();
    assert_eq!(cfg, SchedulerConfig::default());
}

#[test]
fn test_from_lookup_rejects_garbage() {
    let result = SchedulerConfig::from_lookup(|key| {
        (key == "SCHEDULER_MAX_SLEEP_CHUNK_SECS").then(|| "soon".to_string())
    });
    assert!(result.is_err());
}

#[test]
fn test_parse_groups() {
    let groups = parse_groups("a=1,b=3,").unwrap();
    assert_eq!(groups["a"], 1);
    assert_eq!(groups["b"], 3);
    assert!(parse_groups("").unwrap().is_empty());
    assert!(parse_groups("a").is_err());
    assert!(parse_groups("a=x").is_err());
}

use crashmon::cluster::MatchPolicy;
use crashmon::config::{ConfigError, MonitorConfig, SchedulerConfig, MAX_FIELD_WIDTH, SCHEDULER_FIELDS};

#[test]
fn defaults_request_every_field_at_max_width() {
    let cfg = MonitorConfig::default();
    assert_eq!(cfg.scheduler.delimiter, '|');
    assert_eq!(cfg.scheduler.field_width, MAX_FIELD_WIDTH);
    assert_eq!(cfg.scheduler.fields.len(), SCHEDULER_FIELDS.len());
    assert_eq!(cfg.clustering.threshold, 0.7);
    assert_eq!(cfg.clustering.policy, MatchPolicy::LastQualifying);
    assert!(cfg.validate().is_ok());
}

#[test]
fn output_format_lists_fields_with_width_then_delimiter() {
    let cfg = SchedulerConfig {
        fields: vec!["jobid".into(), "stat".into()],
        field_width: 20,
        ..SchedulerConfig::default()
    };
    assert_eq!(cfg.output_format(), "jobid:20 stat:20 delimiter='|'");

    let full = SchedulerConfig::default().output_format();
    assert!(full.starts_with("jobid:4096 stat:4096 user:4096 "));
    assert!(full.ends_with("forward_time:4096 delimiter='|'"));
}

#[test]
fn partial_json_fills_in_defaults() {
    let cfg = MonitorConfig::from_json_str(r#"{"clustering": {"threshold": 0.5, "policy": "nearest"}}"#).unwrap();
    assert_eq!(cfg.clustering.threshold, 0.5);
    assert_eq!(cfg.clustering.policy, MatchPolicy::Nearest);
    assert_eq!(cfg.scheduler, SchedulerConfig::default());
}

#[test]
fn delimiter_found_in_a_field_name_is_invalid() {
    let err = MonitorConfig::from_json_str(r#"{"scheduler": {"delimiter": "_"}}"#).unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(_)));
}

#[test]
fn whitespace_delimiter_is_invalid() {
    for delimiter in [' ', '\t'] {
        let cfg = SchedulerConfig { delimiter, ..SchedulerConfig::default() };
        assert!(matches!(cfg.validate(), Err(ConfigError::Invalid(_))), "{delimiter:?} accepted");
    }
    let err = MonitorConfig::from_json_str(r#"{"scheduler": {"delimiter": " "}}"#).unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(_)));
}

#[test]
fn non_positive_threshold_is_invalid() {
    let err = MonitorConfig::from_json_str(r#"{"clustering": {"threshold": 0}}"#).unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(_)));
}

#[test]
fn named_columns_must_be_requested() {
    let cfg = SchedulerConfig { fields: vec!["jobid".into(), "user".into()], ..SchedulerConfig::default() };
    assert!(matches!(cfg.validate(), Err(ConfigError::Invalid(_))));
}

#[test]
fn malformed_json_is_a_json_error() {
    assert!(matches!(MonitorConfig::from_json_str("{"), Err(ConfigError::Json(_))));
}

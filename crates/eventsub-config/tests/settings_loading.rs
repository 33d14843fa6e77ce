use std::{env, fs};

use eventsub_config::{ConfigError, load_settings};
use eventsub_core::ResourceKind;

#[test]
fn settings_parsing_and_env_overrides_and_validation() {
    let dir = tempfile::tempdir().expect("tmp dir");
    let path = dir.path().join("eventsub.toml");

    let toml_content = r#"
subscription_id = "00000000-0000-0000-0000-000000000000"
resource_kind = "SystemTopicEventSubscription"

[logging]
level = "debug"

[timeouts]
create_secs = 600
read_secs = 60
"#;
    fs::write(&path, toml_content).expect("write toml");

    // 1) Valid settings parse, unspecified timeouts keep their defaults
    let settings = load_settings(Some(&path)).expect("should parse settings");
    assert_eq!(settings.resource_kind, ResourceKind::SystemTopicEventSubscription);
    assert_eq!(settings.logging.level, "debug");
    assert_eq!(settings.timeouts.create_secs, 600);
    assert_eq!(settings.timeouts.read_secs, 60);
    assert_eq!(settings.timeouts.update_secs, 1800);
    assert_eq!(settings.timeouts.delete_secs, 1800);

    // 2) Env override should win over file
    unsafe {
        env::set_var("EVENTSUB__TIMEOUTS__DELETE_SECS", "90");
    }
    let with_env = load_settings(Some(&path)).expect("should parse settings with env overrides");
    assert_eq!(with_env.timeouts.delete_secs, 90);
    unsafe {
        env::remove_var("EVENTSUB__TIMEOUTS__DELETE_SECS");
    }

    // 3) Invalid settings should error
    let invalid_path = dir.path().join("invalid.toml");
    let invalid_toml = r#"
subscription_id = "0000"

[timeouts]
read_secs = 0
"#;
    fs::write(&invalid_path, invalid_toml).expect("write invalid toml");
    let err = load_settings(Some(&invalid_path)).expect_err("expected validation error");
    assert!(matches!(err, ConfigError::Settings(ref msg) if msg.contains("timeouts must be > 0")));
}

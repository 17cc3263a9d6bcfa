use std::env;
use std::fs;
use std::time::Duration;

use serial_test::serial;
use tempfile::TempDir;

use super::settings::{PartialHeartbeatSettings, PartialSettings, Settings};
use super::{load_config, validate};

#[test]
fn test_default_settings() {
    let settings = Settings::default();
    assert_eq!(settings.server.host, "127.0.0.1");
    assert_eq!(settings.server.port, 8080);
    assert_eq!(settings.identity.service_id, None);
    assert_eq!(settings.heartbeat.period(), Duration::from_secs(10));
    assert_eq!(settings.heartbeat.timeout(), Duration::from_secs(30));
    assert!(settings.heartbeat.logger);
    assert!(settings.heartbeat.ping);
    assert_eq!(settings.verifier.capacity, 10_000);
    assert_eq!(settings.verifier.ttl(), Duration::from_secs(300));
    assert_eq!(settings.broker.deliveries, 1);
    assert_eq!(settings.cluster.instances, 1);
    assert_eq!(settings.logging.level, "info");
    assert!(validate(&settings).is_ok());
}

#[test]
fn test_merge_keeps_unset_values() {
    let partial = PartialSettings {
        heartbeat: Some(PartialHeartbeatSettings {
            timeout_secs: Some(90),
            logger: Some(false),
            ..Default::default()
        }),
        ..Default::default()
    };
    let settings = Settings::default().merge(partial);
    assert_eq!(settings.heartbeat.timeout_secs, 90);
    assert!(!settings.heartbeat.logger);
    assert_eq!(settings.heartbeat.period_secs, 10);
    assert_eq!(settings.server, Settings::default().server);
}

#[test]
fn test_validate_rejects_bad_heartbeat() {
    let mut settings = Settings::default();
    settings.heartbeat.timeout_secs = 5;
    assert!(validate(&settings).is_err());

    let mut settings = Settings::default();
    settings.heartbeat.period_secs = 0;
    assert!(validate(&settings).is_err());

    let mut settings = Settings::default();
    settings.cluster.instances = 0;
    assert!(validate(&settings).is_err());
}

#[test]
#[serial]
fn load_config_from_file_overrides_defaults() {
    // Create a temporary directory and set it as current dir so load_config
    // will pick up config/default.toml from there.
    let tmp = TempDir::new().expect("create tempdir");
    let orig = env::current_dir().expect("current_dir");
    env::set_current_dir(tmp.path()).expect("set current dir");

    fs::create_dir_all("config").expect("create config dir");
    let toml = r#"
        [server]
        host = "0.0.0.0"
        port = 9000

        [identity]
        service_id = "chat"

        [heartbeat]
        period_secs = 5
        timeout_secs = 15

        [verifier]
        capacity = 64
    "#;
    fs::write("config/default.toml", toml).expect("write config file");

    let cfg = load_config();

    // restore cwd before asserting so a failure does not leak the tempdir cwd
    env::set_current_dir(orig).expect("restore cwd");

    let cfg = cfg.expect("load_config failed");
    assert_eq!(cfg.server.host, "0.0.0.0");
    assert_eq!(cfg.server.port, 9000);
    assert_eq!(cfg.identity.service_id.as_deref(), Some("chat"));
    assert_eq!(cfg.heartbeat.period_secs, 5);
    assert_eq!(cfg.heartbeat.timeout_secs, 15);
    assert_eq!(cfg.verifier.capacity, 64);
    assert_eq!(cfg.verifier.ttl_secs, 300);
}

#[test]
#[serial]
fn load_config_from_environment() {
    temp_env::with_vars(
        [
            ("CONNLB_IDENTITY__SERVICE_ID", Some("billing")),
            ("CONNLB_HEARTBEAT__TIMEOUT_SECS", Some("60")),
            ("CONNLB_CLUSTER__INSTANCES", Some("3")),
        ],
        || {
            let cfg = load_config().expect("load_config failed");
            assert_eq!(cfg.identity.service_id.as_deref(), Some("billing"));
            assert_eq!(cfg.heartbeat.timeout_secs, 60);
            assert_eq!(cfg.cluster.instances, 3);
        },
    );
}

#[test]
#[serial]
fn load_config_rejects_invalid_environment() {
    temp_env::with_vars([("CONNLB_BROKER__DELIVERIES", Some("0"))], || {
        assert!(load_config().is_err());
    });
}

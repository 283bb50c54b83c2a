use std::io::Write;

use serial_test::serial;
use space_notify::Settings;
use space_notify::TransitionDispatcher;

use crate::common::Tuple;

#[test]
#[serial]
fn test_settings_file_and_env_drive_dispatcher() {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    writeln!(
        file,
        r#"
[dispatch]
wildcard_type_name = "Any"

[reaper]
interval_ms = 500
"#
    )
    .unwrap();
    let path = file.path().to_str().unwrap().to_string();

    temp_env::with_vars(
        [
            ("SPACE_NOTIFY__REAPER__ENABLED", Some("false")),
            ("SPACE_NOTIFY_CONFIG", None),
        ],
        || {
            let settings = Settings::load(Some(&path)).unwrap();
            assert_eq!(settings.dispatch.wildcard_type_name, "Any");
            assert_eq!(settings.reaper.interval_ms, 500);
            assert!(!settings.reaper.enabled);

            let dispatcher = TransitionDispatcher::<Tuple>::new(settings.dispatch.clone());
            assert!(std::sync::Arc::ptr_eq(
                &dispatcher.bucket_for("Any"),
                &dispatcher.bucket_for("Any")
            ));
            assert_eq!(dispatcher.stats().buckets, 0);
        },
    );
}

#[test]
#[serial]
fn test_invalid_reaper_interval_is_rejected() {
    temp_env::with_vars(
        [
            ("SPACE_NOTIFY__REAPER__INTERVAL_MS", Some("1")),
            ("SPACE_NOTIFY_CONFIG", None),
        ],
        || {
            let result = Settings::load(None);
            assert!(result.is_err());
        },
    );
}

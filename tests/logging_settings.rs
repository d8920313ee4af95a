use std::{fs, thread::sleep, time::Duration};

use screen_annotate::draw::settings::DrawSettings;
use serial_test::serial;
use tempfile::tempdir;

#[test]
#[serial]
fn debug_mode_setting_enables_debug_output() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("logs").join("draw.log");

    let settings = DrawSettings {
        debug_mode: true,
        ..DrawSettings::default()
    };
    screen_annotate::logging::init_from_settings(&settings, Some(path.clone()));
    tracing::debug!("debug line from settings");

    sleep(Duration::from_millis(100));

    let contents = fs::read_to_string(path).unwrap();
    assert!(contents.contains("logging initialised"));
    assert!(contents.contains("debug_enabled=true"));
    assert!(contents.contains("debug line from settings"));
}

use std::io::Write;

use rttmon_daemon::config_manager::{load, Overrides};
use rttmon_daemon::DaemonError;

fn toml_file(body: &str) -> tempfile::NamedTempFile {
    let mut f = tempfile::NamedTempFile::new().unwrap();
    f.write_all(body.as_bytes()).unwrap();
    f
}

#[test]
fn flags_override_file_values() {
    let f = toml_file("target = \"10.0.0.1\"\nwindow_capacity = 30\nthreshold_ms = 8.0\n");
    let o = Overrides { threshold_ms: Some(9.5), target: Some("10.0.0.2".into()), ..Default::default() };
    let cfg = load(Some(f.path()), &o).unwrap();
    assert_eq!(cfg.window_capacity, 30);
    assert_eq!(cfg.threshold_ms, 9.5);
    assert_eq!(cfg.target.as_deref(), Some("10.0.0.2"));
    assert_eq!(cfg.cooldown_secs, 600);
}

#[test]
fn unparsable_file_fails_fast() {
    let f = toml_file("window_capacity = \"lots\"\n");
    let err = load(Some(f.path()), &Overrides::default()).unwrap_err();
    assert!(matches!(err, DaemonError::Config(_)), "{err}");
}

#[test]
fn missing_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.toml");
    let err = load(Some(path.as_path()), &Overrides::default()).unwrap_err();
    assert!(matches!(err, DaemonError::Io(_)));
}

#[test]
fn merged_result_is_validated() {
    let f = toml_file("window_capacity = 10\n");
    let o = Overrides { window_capacity: Some(1), ..Default::default() };
    assert!(matches!(load(Some(f.path()), &o), Err(DaemonError::Config(_))));

    let o = Overrides { webhook_url: Some("ftp://example.net".into()), ..Default::default() };
    assert!(matches!(load(Some(f.path()), &o), Err(DaemonError::Config(_))));
}

#[test]
fn no_alerts_flag_wins_over_file() {
    let f = toml_file("alerts_enabled = true\n");
    let o = Overrides { no_alerts: true, ..Default::default() };
    assert!(!load(Some(f.path()), &o).unwrap().alerts_enabled);
}

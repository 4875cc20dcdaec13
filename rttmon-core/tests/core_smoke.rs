use rttmon_core::{config::MonitorConfig, AlertMessage, AlertThrottler, Sample, StatsEngine};
use std::time::{Duration, Instant};
use std::{env, fs};

#[test]
fn config_default_is_valid_and_roundtrip_file() {
    let cfg = MonitorConfig::builder()
        .target("198.51.100.4")
        .window_capacity(60)
        .webhook_url("http://127.0.0.1:9/hook")
        .metrics_addr("127.0.0.1:9898".parse().unwrap())
        .build()
        .unwrap();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("rttmon.toml");
    cfg.write_to_file(&path).unwrap();
    let s = fs::read_to_string(&path).unwrap();
    assert!(s.contains("window_capacity = 60"));
    let loaded = MonitorConfig::load_from_file(&path).unwrap();
    assert_eq!(cfg, loaded);
}

#[test]
fn config_file_validation_errors_surface() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.toml");
    fs::write(&path, "window_capacity = 1\n").unwrap();
    let err = MonitorConfig::load_from_file(&path).unwrap_err();
    assert!(err.is_config());
    assert!(format!("{err}").contains("window_capacity"));

    fs::write(&path, "log_level = 'nope'\n").unwrap();
    let msg = format!("{}", MonitorConfig::load_from_file(&path).unwrap_err());
    assert!(msg.contains("invalid log_level"));

    fs::write(&path, "window_capacity = [\n").unwrap();
    let msg = format!("{}", MonitorConfig::load_from_file(&path).unwrap_err());
    assert!(msg.contains("toml parse error"));
}

#[test]
fn config_env_override_and_validation() {
    // Preserve and restore environment variables to avoid leaking state between tests
    let keys = ["RTTMON_TARGET", "RTTMON_WINDOW", "RTTMON_THRESHOLD_MS", "RTTMON_ALERTS"];
    let saved: Vec<Option<String>> = keys.iter().map(|k| env::var(k).ok()).collect();

    env::set_var("RTTMON_TARGET", "example.net");
    env::set_var("RTTMON_WINDOW", "30");
    env::set_var("RTTMON_THRESHOLD_MS", "12.5");
    env::set_var("RTTMON_ALERTS", "off");
    let cfg = MonitorConfig::from_env().unwrap();
    assert_eq!(cfg.target.as_deref(), Some("example.net"));
    assert_eq!(cfg.window_capacity, 30);
    assert_eq!(cfg.threshold_ms, 12.5);
    assert!(!cfg.alerts_enabled);

    env::set_var("RTTMON_WINDOW", "lots");
    assert!(MonitorConfig::from_env().unwrap_err().is_config());
    env::set_var("RTTMON_WINDOW", "1");
    assert!(MonitorConfig::from_env().unwrap_err().is_config());

    for (k, v) in keys.iter().zip(saved) {
        match v {
            Some(v) => env::set_var(k, v),
            None => env::remove_var(k),
        }
    }
}

#[test]
fn degraded_link_fires_one_alert_per_cooldown() {
    let cfg = MonitorConfig::builder().window_capacity(10).threshold_ms(5.0).build().unwrap();
    let mut engine = StatsEngine::new(cfg.window_capacity).unwrap();
    let mut throttle = AlertThrottler::new(cfg.threshold_ms, cfg.cooldown(), cfg.window_capacity).unwrap();
    let t0 = Instant::now();
    let mut fired = Vec::new();
    // healthy for 20 ticks, then degraded for 30 minutes at one probe per second
    for tick in 0..1_820u64 {
        let rtt = if tick < 20 { 1.2 } else { 9.0 };
        let now = t0 + Duration::from_secs(tick);
        let summary = engine.update(Sample::new(rtt, tick, now));
        if throttle.evaluate_summary(&summary, now) {
            let msg = AlertMessage::compose("198.51.100.4", &summary, engine.window());
            assert!(msg.body.lines().count() >= 13);
            throttle.record_fired(now);
            fired.push(tick);
        }
    }
    // mean first exceeds 5 ms when half of the 10-sample window is degraded
    assert_eq!(fired, vec![24, 625, 1226]);
}

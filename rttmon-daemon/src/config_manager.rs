#![forbid(unsafe_code)]

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use rttmon_core::MonitorConfig;

use crate::errors::Result;

/// Environment variable naming a TOML file when `--config` is absent.
pub const CONFIG_ENV: &str = "RTTMON_CONFIG";

/// Command-line values that win over every other source. `None` leaves the lower layer alone.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub target: Option<String>,
    pub interval_ms: Option<u64>,
    pub probe_timeout_ms: Option<u64>,
    pub window_capacity: Option<usize>,
    pub threshold_ms: Option<f64>,
    pub cooldown_secs: Option<u64>,
    pub interface: Option<String>,
    pub webhook_url: Option<String>,
    pub metrics_addr: Option<SocketAddr>,
    pub no_alerts: bool,
}

impl Overrides {
    pub fn apply(&self, cfg: &mut MonitorConfig) {
        if let Some(v) = &self.target { cfg.target = Some(v.clone()); }
        if let Some(v) = self.interval_ms { cfg.interval_ms = v; }
        if let Some(v) = self.probe_timeout_ms { cfg.probe_timeout_ms = v; }
        if let Some(v) = self.window_capacity { cfg.window_capacity = v; }
        if let Some(v) = self.threshold_ms { cfg.threshold_ms = v; }
        if let Some(v) = self.cooldown_secs { cfg.cooldown_secs = v; }
        if let Some(v) = &self.interface { cfg.interface = Some(v.clone()); }
        if let Some(v) = &self.webhook_url { cfg.webhook_url = Some(v.clone()); }
        if let Some(v) = self.metrics_addr { cfg.metrics_addr = Some(v); }
        if self.no_alerts { cfg.alerts_enabled = false; }
    }
}

/// The explicit path, else `RTTMON_CONFIG`, else nothing.
pub fn config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    explicit.map(Path::to_path_buf).or_else(|| {
        std::env::var(CONFIG_ENV).ok().filter(|v| !v.trim().is_empty()).map(PathBuf::from)
    })
}

/// Merge defaults, file, `RTTMON_*` environment and overrides, then validate once.
pub fn load(explicit: Option<&Path>, overrides: &Overrides) -> Result<MonitorConfig> {
    let mut cfg = match config_path(explicit) {
        Some(path) => {
            info!(path = %path.display(), "loading configuration file");
            MonitorConfig::parse_file(&path)?
        }
        None => MonitorConfig::default(),
    };
    cfg.apply_env()?;
    overrides.apply(&mut cfg);
    cfg.validate()?;
    debug!(?cfg, "effective configuration");
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overrides_replace_only_what_they_name() {
        let mut cfg = MonitorConfig::default();
        let o = Overrides { threshold_ms: Some(12.5), no_alerts: true, ..Default::default() };
        o.apply(&mut cfg);
        assert_eq!(cfg.threshold_ms, 12.5);
        assert!(!cfg.alerts_enabled);
        assert_eq!(cfg.window_capacity, 180);
        assert_eq!(cfg.interval_ms, 1_000);
    }

    #[test]
    fn explicit_path_wins_over_env() {
        let p = config_path(Some(Path::new("/etc/rttmon.toml")));
        assert_eq!(p, Some(PathBuf::from("/etc/rttmon.toml")));
    }
}

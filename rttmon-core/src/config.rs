use crate::error::{Error, Result};
use crate::types::{DEFAULT_COOLDOWN_SECS, DEFAULT_THRESHOLD_MS, DEFAULT_WINDOW_CAPACITY};
use serde::{Deserialize, Serialize};
use std::{fs, net::SocketAddr, path::Path, str::FromStr, time::Duration};

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Monitor settings. Missing keys in a TOML file fall back to the defaults.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MonitorConfig {
	/// Host name or IP literal to probe.
	pub target: Option<String>,
	pub window_capacity: usize,
	pub threshold_ms: f64,
	pub cooldown_secs: u64,
	pub interval_ms: u64,
	pub probe_timeout_ms: u64,
	pub ttl: u32,
	/// Bind probes to this network interface (Linux only).
	pub interface: Option<String>,
	pub alerts_enabled: bool,
	pub webhook_url: Option<String>,
	pub webhook_timeout_ms: u64,
	/// Serve Prometheus text on `GET /metrics` at this address.
	pub metrics_addr: Option<SocketAddr>,
	pub log_level: String,
}

impl Default for MonitorConfig {
	fn default() -> Self {
		Self {
			target: None,
			window_capacity: DEFAULT_WINDOW_CAPACITY,
			threshold_ms: DEFAULT_THRESHOLD_MS,
			cooldown_secs: DEFAULT_COOLDOWN_SECS,
			interval_ms: 1_000,
			probe_timeout_ms: 2_000,
			ttl: 64,
			interface: None,
			alerts_enabled: true,
			webhook_url: None,
			webhook_timeout_ms: 5_000,
			metrics_addr: None,
			log_level: "info".into(),
		}
	}
}

impl MonitorConfig {
	pub fn builder() -> MonitorConfigBuilder { MonitorConfigBuilder::default() }

	/// Parse and validate a TOML file.
	pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
		let cfg = Self::parse_file(path)?;
		cfg.validate()?;
		Ok(cfg)
	}

	/// Parse a TOML file without validating, for callers that layer more sources on top.
	pub fn parse_file(path: impl AsRef<Path>) -> Result<Self> {
		let path = path.as_ref();
		let data = fs::read_to_string(path)?;
		toml::from_str(&data).map_err(|e| Error::config(format!("toml parse error in {}: {e}", path.display())))
	}

	pub fn write_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
		let s = toml::to_string_pretty(self).map_err(|e| Error::config(format!("toml encode error: {e}")))?;
		fs::write(path, s)?;
		Ok(())
	}

	/// Defaults overlaid with `RTTMON_*` variables, validated.
	pub fn from_env() -> Result<Self> {
		let mut cfg = Self::default();
		cfg.apply_env()?;
		cfg.validate()?;
		Ok(cfg)
	}

	/// Overlay `RTTMON_*` environment variables onto `self`.
	pub fn apply_env(&mut self) -> Result<()> {
		if let Some(v) = env_string("RTTMON_TARGET") { self.target = Some(v); }
		if let Some(v) = env_parse("RTTMON_WINDOW")? { self.window_capacity = v; }
		if let Some(v) = env_parse("RTTMON_THRESHOLD_MS")? { self.threshold_ms = v; }
		if let Some(v) = env_parse("RTTMON_COOLDOWN_SECS")? { self.cooldown_secs = v; }
		if let Some(v) = env_parse("RTTMON_INTERVAL_MS")? { self.interval_ms = v; }
		if let Some(v) = env_parse("RTTMON_TIMEOUT_MS")? { self.probe_timeout_ms = v; }
		if let Some(v) = env_string("RTTMON_LOG_LEVEL") { self.log_level = v; }
		if let Some(v) = env_string("RTTMON_WEBHOOK_URL") { self.webhook_url = Some(v); }
		if let Some(v) = env_parse("RTTMON_METRICS_ADDR")? { self.metrics_addr = Some(v); }
		if let Some(v) = env_string("RTTMON_ALERTS") { self.alerts_enabled = parse_flag("RTTMON_ALERTS", &v)?; }
		Ok(())
	}

	pub fn validate(&self) -> Result<()> {
		if self.window_capacity < 2 {
			return Err(Error::config(format!("window_capacity must be at least 2, got {}", self.window_capacity)));
		}
		if !self.threshold_ms.is_finite() || self.threshold_ms < 0.0 {
			return Err(Error::config(format!("threshold_ms must be a finite value >= 0, got {}", self.threshold_ms)));
		}
		if self.interval_ms == 0 { return Err(Error::config("interval_ms must be > 0")); }
		if self.probe_timeout_ms == 0 { return Err(Error::config("probe_timeout_ms must be > 0")); }
		if self.webhook_timeout_ms == 0 { return Err(Error::config("webhook_timeout_ms must be > 0")); }
		if !(1..=255).contains(&self.ttl) {
			return Err(Error::config(format!("ttl must be within 1..=255, got {}", self.ttl)));
		}
		if matches!(self.target.as_deref(), Some(t) if t.trim().is_empty()) {
			return Err(Error::config("target must not be empty"));
		}
		if matches!(self.interface.as_deref(), Some(i) if i.trim().is_empty()) {
			return Err(Error::config("interface must not be empty"));
		}
		if let Some(url) = &self.webhook_url {
			if !(url.starts_with("http://") || url.starts_with("https://")) {
				return Err(Error::config(format!("webhook_url must be http(s), got {url}")));
			}
		}
		if !LOG_LEVELS.contains(&self.log_level.as_str()) {
			return Err(Error::config(format!("invalid log_level: {}", self.log_level)));
		}
		Ok(())
	}

	pub fn require_target(&self) -> Result<&str> {
		self.target.as_deref().ok_or_else(|| Error::config("no target configured"))
	}

	pub fn interval(&self) -> Duration { Duration::from_millis(self.interval_ms) }
	pub fn probe_timeout(&self) -> Duration { Duration::from_millis(self.probe_timeout_ms) }
	pub fn cooldown(&self) -> Duration { Duration::from_secs(self.cooldown_secs) }
	pub fn webhook_timeout(&self) -> Duration { Duration::from_millis(self.webhook_timeout_ms) }
}

fn env_string(key: &str) -> Option<String> {
	std::env::var(key).ok().map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn env_parse<T>(key: &str) -> Result<Option<T>>
where
	T: FromStr,
	T::Err: std::fmt::Display,
{
	match env_string(key) {
		Some(v) => v.parse::<T>().map(Some).map_err(|e| Error::config(format!("{key}={v}: {e}"))),
		None => Ok(None),
	}
}

fn parse_flag(key: &str, v: &str) -> Result<bool> {
	match v.to_ascii_lowercase().as_str() {
		"1" | "true" | "yes" | "on" => Ok(true),
		"0" | "false" | "no" | "off" => Ok(false),
		_ => Err(Error::config(format!("{key}={v}: expected a boolean"))),
	}
}

#[derive(Debug, Default)]
pub struct MonitorConfigBuilder {
	cfg: MonitorConfig,
}

impl MonitorConfigBuilder {
	pub fn target(mut self, t: impl Into<String>) -> Self { self.cfg.target = Some(t.into()); self }
	pub fn window_capacity(mut self, n: usize) -> Self { self.cfg.window_capacity = n; self }
	pub fn threshold_ms(mut self, ms: f64) -> Self { self.cfg.threshold_ms = ms; self }
	pub fn cooldown_secs(mut self, s: u64) -> Self { self.cfg.cooldown_secs = s; self }
	pub fn interval_ms(mut self, ms: u64) -> Self { self.cfg.interval_ms = ms; self }
	pub fn probe_timeout_ms(mut self, ms: u64) -> Self { self.cfg.probe_timeout_ms = ms; self }
	pub fn ttl(mut self, ttl: u32) -> Self { self.cfg.ttl = ttl; self }
	pub fn interface(mut self, i: impl Into<String>) -> Self { self.cfg.interface = Some(i.into()); self }
	pub fn alerts_enabled(mut self, on: bool) -> Self { self.cfg.alerts_enabled = on; self }
	pub fn webhook_url(mut self, u: impl Into<String>) -> Self { self.cfg.webhook_url = Some(u.into()); self }
	pub fn metrics_addr(mut self, a: SocketAddr) -> Self { self.cfg.metrics_addr = Some(a); self }
	pub fn log_level(mut self, l: impl Into<String>) -> Self { self.cfg.log_level = l.into(); self }

	pub fn build(self) -> Result<MonitorConfig> {
		self.cfg.validate()?;
		Ok(self.cfg)
	}
}

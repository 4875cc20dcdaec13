#![forbid(unsafe_code)]

use tracing_subscriber::EnvFilter;

pub mod metrics;

pub use metrics::{counter_value, dump_prometheus, gauge_value, record_counter, register_defaults, set_gauge};

#[derive(thiserror::Error, Debug)]
pub enum Error { #[error("telemetry init failed: {0}")] Init(String) }
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exporter { None, Prometheus }

#[derive(Debug, Clone)]
pub struct Config { pub log_level: String, pub exporter: Exporter }

impl Default for Config { fn default() -> Self { Self { log_level: "info".into(), exporter: Exporter::None } } }

/// Install the global tracing subscriber (stderr). `RUST_LOG` wins over `log_level`.
pub fn init_tracing(log_level: &str) -> Result<()> {
	let filter = match std::env::var("RUST_LOG") {
		Ok(v) if !v.trim().is_empty() => EnvFilter::try_new(v),
		_ => EnvFilter::try_new(log_level),
	}
	.map_err(|e| Error::Init(format!("bad log filter: {e}")))?;
	tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(std::io::stderr)
		.try_init()
		.map_err(|e| Error::Init(e.to_string()))
}

pub fn init(cfg: &Config) -> Result<()> {
	init_tracing(&cfg.log_level)?;
	match cfg.exporter {
		Exporter::None => Ok(()),
		Exporter::Prometheus => { register_defaults(); Ok(()) }
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn default_config_exports_nothing() {
		let cfg = Config::default();
		assert_eq!(cfg.exporter, Exporter::None);
		assert_eq!(cfg.log_level, "info");
	}
}

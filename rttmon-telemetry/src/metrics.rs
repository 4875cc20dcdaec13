//! Metrics utilities and Prometheus exposition.

use once_cell::sync::Lazy;
use parking_lot::Mutex;
use prometheus::{Encoder, Gauge, IntCounter, Registry, TextEncoder};
use std::collections::HashMap;
use tracing::debug;

pub const PROBES_SENT: &str = "rttmon_probes_sent_total";
pub const PROBES_LOST: &str = "rttmon_probes_lost_total";
pub const TRANSPORT_ERRORS: &str = "rttmon_transport_errors_total";
pub const ALERTS_FIRED: &str = "rttmon_alerts_fired_total";
pub const NOTIFY_FAILURES: &str = "rttmon_notify_failures_total";
pub const RTT_LAST_MS: &str = "rttmon_rtt_last_ms";
pub const RTT_MEAN_MS: &str = "rttmon_rtt_mean_ms";
pub const RTT_STDEV_MS: &str = "rttmon_rtt_stdev_ms";
pub const WINDOW_LEN: &str = "rttmon_window_len";

const COUNTER_HELP: [(&str, &str); 5] = [
	(PROBES_SENT, "Echo probes sent"),
	(PROBES_LOST, "Probes without a matching reply"),
	(TRANSPORT_ERRORS, "Probes that failed in the transport"),
	(ALERTS_FIRED, "Latency alerts dispatched"),
	(NOTIFY_FAILURES, "Alert deliveries that failed"),
];

const GAUGE_HELP: [(&str, &str); 4] = [
	(RTT_LAST_MS, "Most recent round-trip time in milliseconds"),
	(RTT_MEAN_MS, "Mean round-trip time over the window"),
	(RTT_STDEV_MS, "Sample standard deviation of round-trip time over the window"),
	(WINDOW_LEN, "Samples currently held in the window"),
];

pub(crate) static REGISTRY: Lazy<Registry> = Lazy::new(Registry::new);
static COUNTERS: Lazy<Mutex<HashMap<String, IntCounter>>> = Lazy::new(|| Mutex::new(HashMap::new()));
static GAUGES: Lazy<Mutex<HashMap<String, Gauge>>> = Lazy::new(|| Mutex::new(HashMap::new()));

fn help_for(name: &str, table: &[(&str, &str)]) -> String {
	table.iter().find(|(n, _)| *n == name).map(|(_, h)| (*h).to_string()).unwrap_or_else(|| format!("metric {name}"))
}

/// Record into an IntCounter, creating and registering it on first use.
pub fn record_counter(name: &str, v: u64) {
	let mut map = COUNTERS.lock();
	if let Some(c) = map.get(name) {
		c.inc_by(v);
		return;
	}
	match IntCounter::new(name, help_for(name, &COUNTER_HELP)) {
		Ok(c) => {
			// Best-effort register; a clash only means the metric is not exported.
			if let Err(e) = REGISTRY.register(Box::new(c.clone())) { debug!("register counter {name}: {e}"); }
			c.inc_by(v);
			map.insert(name.to_string(), c);
		}
		Err(e) => debug!("invalid counter {name}: {e}"),
	}
}

pub fn set_gauge(name: &str, v: f64) {
	let mut map = GAUGES.lock();
	if let Some(g) = map.get(name) {
		g.set(v);
		return;
	}
	match Gauge::new(name, help_for(name, &GAUGE_HELP)) {
		Ok(g) => {
			if let Err(e) = REGISTRY.register(Box::new(g.clone())) { debug!("register gauge {name}: {e}"); }
			g.set(v);
			map.insert(name.to_string(), g);
		}
		Err(e) => debug!("invalid gauge {name}: {e}"),
	}
}

pub fn counter_value(name: &str) -> u64 { COUNTERS.lock().get(name).map(IntCounter::get).unwrap_or(0) }

pub fn gauge_value(name: &str) -> Option<f64> { GAUGES.lock().get(name).map(Gauge::get) }

/// Register every rttmon metric at zero so a scrape before the first tick is complete.
pub fn register_defaults() {
	for (name, _) in COUNTER_HELP { record_counter(name, 0); }
	for (name, _) in GAUGE_HELP {
		if gauge_value(name).is_none() { set_gauge(name, 0.0); }
	}
}

/// Dump metrics in Prometheus text exposition format.
pub fn dump_prometheus() -> String {
	let mf = REGISTRY.gather();
	let enc = TextEncoder::new();
	let mut buf = Vec::new();
	if enc.encode(&mf, &mut buf).is_ok() {
		String::from_utf8(buf).unwrap_or_default()
	} else {
		String::new()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn counters_accumulate_and_export() {
		let before = counter_value("rttmon_test_counter_total");
		record_counter("rttmon_test_counter_total", 2);
		record_counter("rttmon_test_counter_total", 3);
		assert_eq!(counter_value("rttmon_test_counter_total"), before + 5);
		assert!(dump_prometheus().contains("rttmon_test_counter_total"));
	}

	#[test]
	fn gauges_hold_last_value() {
		set_gauge("rttmon_test_gauge", 1.5);
		set_gauge("rttmon_test_gauge", 4.25);
		assert_eq!(gauge_value("rttmon_test_gauge"), Some(4.25));
	}

	#[test]
	fn defaults_are_exported_with_help() {
		register_defaults();
		let text = dump_prometheus();
		assert!(text.contains("# HELP rttmon_probes_lost_total Probes without a matching reply"));
		assert!(text.contains("rttmon_rtt_mean_ms"));
	}

	#[test]
	fn invalid_names_are_ignored() {
		record_counter("not a metric name", 1);
		assert_eq!(counter_value("not a metric name"), 0);
	}
}

use std::time::{Duration, Instant};

use crate::error::{Error, Result};
use crate::stats::Summary;

/// Gate for latency alerts: fires only on a full window whose mean is above the
/// threshold, and at most once per cooldown.
///
/// The throttler never sends anything itself. The caller dispatches the alert and
/// then calls [`AlertThrottler::record_fired`], whether or not delivery worked.
///
/// ```rust
/// use rttmon_core::throttle::AlertThrottler;
/// use std::time::{Duration, Instant};
/// let mut t = AlertThrottler::new(5.0, Duration::from_secs(600), 3).unwrap();
/// let now = Instant::now();
/// assert!(t.evaluate(9.0, 1.0, 3, now));
/// t.record_fired(now);
/// assert!(!t.evaluate(9.0, 1.0, 3, now + Duration::from_secs(60)));
/// assert!(t.evaluate(9.0, 1.0, 3, now + Duration::from_secs(601)));
/// ```
#[derive(Debug, Clone)]
pub struct AlertThrottler {
	threshold_ms: f64,
	cooldown: Duration,
	capacity: usize,
	last_alert_at: Option<Instant>,
}

impl AlertThrottler {
	pub fn new(threshold_ms: f64, cooldown: Duration, capacity: usize) -> Result<Self> {
		if !threshold_ms.is_finite() || threshold_ms < 0.0 {
			return Err(Error::config(format!("threshold_ms must be a finite value >= 0, got {threshold_ms}")));
		}
		if capacity < 2 {
			return Err(Error::config(format!("window capacity must be at least 2, got {capacity}")));
		}
		Ok(Self { threshold_ms, cooldown, capacity, last_alert_at: None })
	}

	/// Whether an alert should fire now. Does not change state.
	pub fn evaluate(&self, mean: f64, variance: f64, sample_count: usize, now: Instant) -> bool {
		// NaN statistics never trip the alarm.
		if mean.is_nan() || variance.is_nan() { return false; }
		if mean <= self.threshold_ms { return false; }
		if sample_count != self.capacity { return false; }
		match self.last_alert_at {
			None => true,
			Some(last) => now.saturating_duration_since(last) > self.cooldown,
		}
	}

	pub fn evaluate_summary(&self, summary: &Summary, now: Instant) -> bool {
		self.evaluate(summary.mean, summary.variance, summary.count, now)
	}

	/// Anchor the cooldown at `now`.
	pub fn record_fired(&mut self, now: Instant) { self.last_alert_at = Some(now); }

	pub fn last_alert_at(&self) -> Option<Instant> { self.last_alert_at }
	pub fn threshold_ms(&self) -> f64 { self.threshold_ms }
	pub fn cooldown(&self) -> Duration { self.cooldown }

	/// Time left before another alert may fire; zero when none is pending.
	pub fn cooldown_remaining(&self, now: Instant) -> Duration {
		match self.last_alert_at {
			Some(last) => self.cooldown.saturating_sub(now.saturating_duration_since(last)),
			None => Duration::ZERO,
		}
	}
}

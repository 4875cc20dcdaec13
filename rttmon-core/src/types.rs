use std::time::{Duration, Instant};

/// Tick counter assigned by the probe loop; one per probe sent.
pub type Sequence = u64;

/// Default number of samples kept in the sliding window.
pub const DEFAULT_WINDOW_CAPACITY: usize = 180;

/// Default mean latency (ms) above which an alert may fire.
pub const DEFAULT_THRESHOLD_MS: f64 = 5.0;

/// Default minimum gap between two alerts.
pub const DEFAULT_COOLDOWN_SECS: u64 = 600;

/// One answered probe. Immutable once created.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
	value_ms: f64,
	sequence: Sequence,
	observed_at: Instant,
}

impl Sample {
	/// Negative or non-finite values are clamped to zero; a round trip cannot be shorter than nothing.
	pub fn new(value_ms: f64, sequence: Sequence, observed_at: Instant) -> Self {
		let value_ms = if value_ms.is_finite() && value_ms > 0.0 { value_ms } else { 0.0 };
		Self { value_ms, sequence, observed_at }
	}

	pub fn from_rtt(rtt: Duration, sequence: Sequence, observed_at: Instant) -> Self {
		Self::new(rtt.as_secs_f64() * 1_000.0, sequence, observed_at)
	}

	pub fn value_ms(&self) -> f64 { self.value_ms }
	pub fn sequence(&self) -> Sequence { self.sequence }
	pub fn observed_at(&self) -> Instant { self.observed_at }
}

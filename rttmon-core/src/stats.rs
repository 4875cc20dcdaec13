//! Windowed RTT statistics.
//!
//! [`StatsEngine`] owns the [`SlidingWindow`] and keeps mean and sample variance
//! (Bessel-corrected, divisor `n - 1`) in step with it:
//!
//! - while the window is filling every insertion recomputes both values with a
//!   full pass, so small sample counts never carry accumulated rounding error;
//! - once the window is full each insertion evicts one sample and both values are
//!   updated in O(1) by replacing the evicted value with the new one.

use std::num::NonZeroUsize;

use tracing::trace;

use crate::error::{Error, Result};
use crate::types::Sample;
use crate::window::SlidingWindow;

/// Aggregate over the current window contents.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RunningStats {
	count: usize,
	mean: f64,
	// Already divided by (n - 1): this is the sample variance itself.
	var_acc: f64,
}

impl RunningStats {
	/// Exact two-pass statistics over `values`.
	pub fn from_values<I>(values: I) -> Self
	where
		I: IntoIterator<Item = f64>,
		I::IntoIter: Clone,
	{
		let it = values.into_iter();
		let (count, sum) = it.clone().fold((0usize, 0.0f64), |(n, s), v| (n + 1, s + v));
		if count == 0 { return Self::default(); }
		let mean = sum / count as f64;
		let var_acc = if count > 1 {
			it.map(|v| (v - mean) * (v - mean)).sum::<f64>() / (count - 1) as f64
		} else {
			0.0
		};
		Self { count, mean, var_acc }
	}

	pub fn count(&self) -> usize { self.count }

	/// 0.0 while empty.
	pub fn mean(&self) -> f64 { self.mean }

	/// Sample variance; 0.0 below two samples. Rounding residue below zero is reported as 0.0.
	pub fn variance(&self) -> f64 { self.var_acc.max(0.0) }

	pub fn stdev(&self) -> f64 { self.variance().sqrt() }
}

/// Snapshot handed to callers after each update.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Summary {
	pub count: usize,
	pub capacity: usize,
	pub mean: f64,
	pub variance: f64,
}

impl Summary {
	pub fn stdev(&self) -> f64 { self.variance.sqrt() }
	pub fn is_window_full(&self) -> bool { self.count == self.capacity }
}

#[derive(Debug, Clone)]
pub struct StatsEngine {
	window: SlidingWindow,
	stats: RunningStats,
}

impl StatsEngine {
	/// Capacities below two leave sample variance undefined and are rejected.
	pub fn new(capacity: usize) -> Result<Self> {
		let cap = NonZeroUsize::new(capacity)
			.filter(|c| c.get() >= 2)
			.ok_or_else(|| Error::config(format!("window capacity must be at least 2, got {capacity}")))?;
		Ok(Self { window: SlidingWindow::new(cap), stats: RunningStats::default() })
	}

	pub fn update(&mut self, sample: Sample) -> Summary {
		let new = sample.value_ms();
		match self.window.push(sample) {
			None => {
				self.stats = RunningStats::from_values(self.window.values());
			}
			Some(evicted) => {
				let n = self.window.capacity() as f64;
				let old = evicted.value_ms();
				let mean_old = self.stats.mean;
				let mean_new = mean_old + (new - old) / n;
				self.stats.var_acc += (new - old) * (new - mean_new + old - mean_old) / (n - 1.0);
				self.stats.mean = mean_new;
				trace!(evicted = evicted.sequence(), mean = mean_new, var = self.stats.var_acc, "rolling update");
			}
		}
		self.summary()
	}

	pub fn summary(&self) -> Summary {
		Summary {
			count: self.stats.count,
			capacity: self.window.capacity(),
			mean: self.stats.mean(),
			variance: self.stats.variance(),
		}
	}

	pub fn stats(&self) -> &RunningStats { &self.stats }
	pub fn window(&self) -> &SlidingWindow { &self.window }
	pub fn capacity(&self) -> usize { self.window.capacity() }

	pub fn mean(&self) -> f64 { self.stats.mean() }
	pub fn variance(&self) -> f64 { self.stats.variance() }
	pub fn stdev(&self) -> f64 { self.stats.stdev() }

	/// Full-pass statistics of the current window, independent of the running values.
	pub fn recompute(&self) -> RunningStats { RunningStats::from_values(self.window.values()) }
}

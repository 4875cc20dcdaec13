use std::collections::VecDeque;
use std::num::NonZeroUsize;

use crate::types::Sample;

/// Fixed-capacity FIFO of the most recent samples, oldest first.
#[derive(Debug, Clone)]
pub struct SlidingWindow {
	samples: VecDeque<Sample>,
	cap: usize,
}

impl SlidingWindow {
	pub fn new(cap: NonZeroUsize) -> Self {
		let cap = cap.get();
		Self { samples: VecDeque::with_capacity(cap), cap }
	}

	/// Append `sample`; when that overflows the capacity the oldest sample is
	/// removed and returned. Length never exceeds `capacity()` after the call.
	pub fn push(&mut self, sample: Sample) -> Option<Sample> {
		let evicted = if self.samples.len() == self.cap { self.samples.pop_front() } else { None };
		self.samples.push_back(sample);
		evicted
	}

	pub fn len(&self) -> usize { self.samples.len() }
	pub fn is_empty(&self) -> bool { self.samples.is_empty() }
	pub fn is_full(&self) -> bool { self.samples.len() == self.cap }
	pub fn capacity(&self) -> usize { self.cap }

	/// Oldest to newest.
	pub fn iter(&self) -> impl ExactSizeIterator<Item = &Sample> + '_ { self.samples.iter() }

	pub fn values(&self) -> impl ExactSizeIterator<Item = f64> + Clone + '_ { self.samples.iter().map(Sample::value_ms) }

	pub fn newest(&self) -> Option<&Sample> { self.samples.back() }
	pub fn oldest(&self) -> Option<&Sample> { self.samples.front() }
}

impl<'a> IntoIterator for &'a SlidingWindow {
	type Item = &'a Sample;
	type IntoIter = std::collections::vec_deque::Iter<'a, Sample>;
	fn into_iter(self) -> Self::IntoIter { self.samples.iter() }
}

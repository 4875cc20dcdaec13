use std::fmt::Write as _;

use crate::stats::Summary;
use crate::window::SlidingWindow;

/// Subject and body handed to a notifier when an alert fires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertMessage {
	pub subject: String,
	pub body: String,
}

impl AlertMessage {
	/// Lists every sample of `window`, latest at the bottom.
	pub fn compose(target: &str, summary: &Summary, window: &SlidingWindow) -> Self {
		let subject = format!("RTT-Mon to {target}: Warning (RTT Avg: {:.3} ms)", summary.mean);
		let mut body = String::with_capacity(64 + window.len() * 20);
		// Writing into a String cannot fail.
		let _ = writeln!(body, "Sample stdev is: {:.3}", summary.stdev());
		let _ = writeln!(body);
		let _ = writeln!(body, "Last {} samples (latest at bottom):", window.len());
		for v in window.values() {
			let _ = writeln!(body, "RTT: {v:.3} ms");
		}
		Self { subject, body }
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::stats::StatsEngine;
	use crate::types::Sample;
	use std::time::Instant;

	#[test]
	fn message_layout() {
		let mut e = StatsEngine::new(3).unwrap();
		let mut s = e.summary();
		for (i, v) in [6.0, 7.0, 8.5].into_iter().enumerate() {
			s = e.update(Sample::new(v, i as u64, Instant::now()));
		}
		let msg = AlertMessage::compose("192.0.2.7", &s, e.window());
		assert_eq!(msg.subject, "RTT-Mon to 192.0.2.7: Warning (RTT Avg: 7.167 ms)");
		let lines: Vec<&str> = msg.body.lines().collect();
		assert_eq!(lines[0], format!("Sample stdev is: {:.3}", s.stdev()));
		assert_eq!(lines[1], "");
		assert_eq!(lines[2], "Last 3 samples (latest at bottom):");
		assert_eq!(&lines[3..], &["RTT: 6.000 ms", "RTT: 7.000 ms", "RTT: 8.500 ms"]);
	}
}

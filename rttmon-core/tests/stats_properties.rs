use proptest::prelude::*;
use rttmon_core::{RunningStats, Sample, StatsEngine};
use std::time::Instant;

fn close(a: f64, b: f64, tol: f64) -> bool {
    (a - b).abs() <= tol * a.abs().max(b.abs()).max(1.0)
}

proptest! {
    #[test]
    fn rolling_stats_track_exact_window(
        cap in 2usize..40,
        values in prop::collection::vec(0.0f64..500.0, 0..400),
    ) {
        let mut engine = StatsEngine::new(cap).unwrap();
        let now = Instant::now();
        for (i, v) in values.iter().enumerate() {
            let s = engine.update(Sample::new(*v, i as u64, now));
            prop_assert!(engine.window().len() <= cap);
            let start = (i + 1).saturating_sub(cap);
            let exact = RunningStats::from_values(values[start..=i].iter().copied());
            prop_assert_eq!(s.count, exact.count());
            prop_assert!(close(s.mean, exact.mean(), 1e-9), "mean {} vs {}", s.mean, exact.mean());
            // rounding in the variance recurrence scales with mean², not with the variance
            prop_assert!(close(s.variance, exact.variance(), 1e-6), "var {} vs {}", s.variance, exact.variance());
        }
        if values.len() >= cap {
            prop_assert_eq!(engine.window().len(), cap);
        }
    }
}

use rttmon_core::{AlertMessage, AlertThrottler, Sample, StatsEngine};
use std::time::{Duration, Instant};

fn main() {
    let mut engine = StatsEngine::new(5).expect("capacity");
    let throttle = AlertThrottler::new(5.0, Duration::from_secs(600), 5).expect("throttle");
    let now = Instant::now();
    for (seq, rtt) in [2.1, 3.4, 7.9, 8.8, 9.6, 11.2].into_iter().enumerate() {
        let s = engine.update(Sample::new(rtt, seq as u64, now));
        println!("RTT: {rtt:.3} ms\t; Avg: {:.3}\t; Stdev: {:.3}", s.mean, s.stdev());
        if throttle.evaluate_summary(&s, now) {
            let msg = AlertMessage::compose("192.0.2.1", &s, engine.window());
            println!("{}\n{}", msg.subject, msg.body);
        }
    }
}

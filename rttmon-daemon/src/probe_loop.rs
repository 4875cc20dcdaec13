//! The monitoring loop: one probe per tick, statistics, alert gating, status output.

use std::fmt;
use std::net::IpAddr;
use std::time::{Duration, Instant};

use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, trace, warn, Level};

use rttmon_core::{AlertMessage, AlertThrottler, MonitorConfig, Sample, Sequence, StatsEngine, Summary};
use rttmon_telemetry::metrics::{
    ALERTS_FIRED, NOTIFY_FAILURES, PROBES_LOST, PROBES_SENT, RTT_LAST_MS, RTT_MEAN_MS, RTT_STDEV_MS,
    TRANSPORT_ERRORS, WINDOW_LEN,
};
use rttmon_telemetry::{record_counter, set_gauge};
use rttmon_transport::ProbeTransport;

use crate::errors::Result;
use crate::notifier::Notifier;

/// What a single tick produced.
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    Matched { sample: Sample, summary: Summary, alerted: bool },
    Unmatched { sequence: Sequence },
    TransportFailed { sequence: Sequence, reason: String },
}

impl TickOutcome {
    pub fn sequence(&self) -> Sequence {
        match self {
            Self::Matched { sample, .. } => sample.sequence(),
            Self::Unmatched { sequence } | Self::TransportFailed { sequence, .. } => *sequence,
        }
    }

    pub fn status_line<'a>(&'a self, target: &'a str) -> StatusLine<'a> {
        StatusLine { outcome: self, target }
    }
}

/// Console line for a tick, e.g. `RTT: 1.234 ms\t; Avg: 1.100\t; Stdev: 0.250`.
pub struct StatusLine<'a> {
    outcome: &'a TickOutcome,
    target: &'a str,
}

impl fmt::Display for StatusLine<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.outcome {
            TickOutcome::Matched { sample, summary, .. } => write!(
                f,
                "RTT: {:.3} ms\t; Avg: {:.3}\t; Stdev: {:.3}",
                sample.value_ms(),
                summary.mean,
                summary.stdev()
            ),
            TickOutcome::Unmatched { sequence } => {
                write!(f, "No response from {} (seq {})", self.target, sequence)
            }
            TickOutcome::TransportFailed { sequence, reason } => {
                write!(f, "Probe to {} failed (seq {}): {}", self.target, sequence, reason)
            }
        }
    }
}

/// Owns the statistics and the alert state; drives one probe per tick.
pub struct ProbeLoop<T, N> {
    transport: T,
    notifier: N,
    target: IpAddr,
    label: String,
    engine: StatsEngine,
    throttle: Option<AlertThrottler>,
    interval: Duration,
    probe_timeout: Duration,
    next_seq: Sequence,
}

impl<T: ProbeTransport, N: Notifier> ProbeLoop<T, N> {
    /// `label` is the target as the operator wrote it; it appears in alerts and status lines.
    pub fn new(cfg: &MonitorConfig, target: IpAddr, label: impl Into<String>, transport: T, notifier: N) -> Result<Self> {
        cfg.validate()?;
        let engine = StatsEngine::new(cfg.window_capacity)?;
        let throttle = if cfg.alerts_enabled {
            Some(AlertThrottler::new(cfg.threshold_ms, cfg.cooldown(), cfg.window_capacity)?)
        } else {
            info!("alerts disabled; probing and reporting only");
            None
        };
        Ok(Self {
            transport,
            notifier,
            target,
            label: label.into(),
            engine,
            throttle,
            interval: cfg.interval(),
            probe_timeout: cfg.probe_timeout(),
            next_seq: 0,
        })
    }

    pub fn engine(&self) -> &StatsEngine {
        &self.engine
    }

    pub fn throttle(&self) -> Option<&AlertThrottler> {
        self.throttle.as_ref()
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn target(&self) -> IpAddr {
        self.target
    }

    /// Send one probe and fold its outcome into the statistics.
    pub async fn tick(&mut self) -> TickOutcome {
        self.next_seq += 1;
        let sequence = self.next_seq;
        record_counter(PROBES_SENT, 1);

        match self.transport.probe(self.target, self.probe_timeout).await {
            Ok(Some(rtt)) => {
                let now = clock_now();
                let sample = Sample::from_rtt(rtt, sequence, now);
                let summary = self.engine.update(sample);
                set_gauge(RTT_LAST_MS, sample.value_ms());
                set_gauge(RTT_MEAN_MS, summary.mean);
                set_gauge(RTT_STDEV_MS, summary.stdev());
                set_gauge(WINDOW_LEN, summary.count as f64);
                if tracing::enabled!(Level::TRACE) {
                    let exact = self.engine.recompute();
                    trace!(
                        mean_drift = summary.mean - exact.mean(),
                        var_drift = summary.variance - exact.variance(),
                        "rolling vs exact statistics"
                    );
                }
                let alerted = self.maybe_alert(&summary, now).await;
                TickOutcome::Matched { sample, summary, alerted }
            }
            Ok(None) => {
                record_counter(PROBES_LOST, 1);
                debug!(seq = sequence, addr = %self.target, "probe lost");
                TickOutcome::Unmatched { sequence }
            }
            Err(e) => {
                record_counter(TRANSPORT_ERRORS, 1);
                error!(seq = sequence, addr = %self.target, "probe failed: {e}");
                TickOutcome::TransportFailed { sequence, reason: e.to_string() }
            }
        }
    }

    async fn maybe_alert(&mut self, summary: &Summary, now: Instant) -> bool {
        let Some(throttle) = self.throttle.as_mut() else { return false };
        if !throttle.evaluate_summary(summary, now) {
            return false;
        }
        warn!(
            mean = summary.mean,
            threshold = throttle.threshold_ms(),
            host = %self.label,
            "mean RTT above threshold; sending alert"
        );
        // The cooldown starts at the attempt, whatever the delivery outcome.
        throttle.record_fired(now);
        record_counter(ALERTS_FIRED, 1);
        let msg = AlertMessage::compose(&self.label, summary, self.engine.window());
        if let Err(e) = self.notifier.notify(&msg.subject, &msg.body).await {
            record_counter(NOTIFY_FAILURES, 1);
            warn!("alert delivery failed: {e}");
        }
        true
    }

    /// Tick until `shutdown` turns true or its sender goes away. Returns the number of ticks run.
    ///
    /// The flag is checked between ticks only; a probe in flight always finishes.
    pub async fn run(&mut self, mut shutdown: watch::Receiver<bool>) -> u64 {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut ticks = 0u64;
        info!(host = %self.label, addr = %self.target, window = self.engine.capacity(), "probe loop started");
        loop {
            if *shutdown.borrow_and_update() {
                break;
            }
            tokio::select! {
                _ = ticker.tick() => {}
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    continue;
                }
            }
            let outcome = self.tick().await;
            println!("{}", outcome.status_line(&self.label));
            ticks += 1;
        }
        info!(ticks, "probe loop stopped");
        ticks
    }
}

// Follows tokio's clock so paused-time tests can step through cooldowns.
fn clock_now() -> Instant {
    tokio::time::Instant::now().into_std()
}

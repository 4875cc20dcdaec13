#![forbid(unsafe_code)]

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tokio::sync::watch;
use tracing::{info, warn};

use rttmon_daemon::config_manager::{self, Overrides};
use rttmon_daemon::startup::{self, ProbeTarget};
use rttmon_daemon::{notifier, prometheus_exporter, ProbeLoop};

/// Probe a host with ICMP echo and alert when its mean round-trip time stays high.
#[derive(Debug, Parser)]
#[command(name = "rttmon", version, about)]
struct Cli {
    /// Host name or IP address to probe
    target: Option<String>,
    /// TOML configuration file (defaults to $RTTMON_CONFIG)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
    /// Time between probes
    #[arg(long, value_name = "N")]
    interval_ms: Option<u64>,
    /// How long to wait for each echo reply
    #[arg(long, value_name = "N")]
    timeout_ms: Option<u64>,
    /// Samples kept in the sliding window
    #[arg(long, value_name = "N")]
    window: Option<usize>,
    /// Mean RTT (ms) above which an alert fires
    #[arg(long, value_name = "X")]
    threshold_ms: Option<f64>,
    /// Minimum seconds between two alerts
    #[arg(long, value_name = "N")]
    cooldown_secs: Option<u64>,
    /// Send probes through this interface (Linux)
    #[arg(long, value_name = "IF")]
    interface: Option<String>,
    /// POST alerts as JSON to this URL instead of logging them
    #[arg(long, value_name = "URL")]
    webhook: Option<String>,
    /// Serve Prometheus metrics on this address
    #[arg(long, value_name = "ADDR")]
    metrics_addr: Option<SocketAddr>,
    /// Probe and report without sending alerts
    #[arg(long)]
    no_alerts: bool,
}

impl Cli {
    fn overrides(&self) -> Overrides {
        Overrides {
            target: self.target.clone(),
            interval_ms: self.interval_ms,
            probe_timeout_ms: self.timeout_ms,
            window_capacity: self.window,
            threshold_ms: self.threshold_ms,
            cooldown_secs: self.cooldown_secs,
            interface: self.interface.clone(),
            webhook_url: self.webhook.clone(),
            metrics_addr: self.metrics_addr,
            no_alerts: self.no_alerts,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = config_manager::load(cli.config.as_deref(), &cli.overrides()).context("invalid configuration")?;

    startup::init_telemetry(&cfg).context("failed to initialise logging")?;

    let ProbeTarget { label, addr: target } = startup::resolve(&cfg).context("no usable target")?;
    let transport = startup::open_transport(&cfg, target).context("cannot open ICMP socket")?;
    let notifier = notifier::from_config(&cfg, &label).context("cannot set up alert notifier")?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        wait_for_signal().await;
        info!("shutdown requested");
        let _ = shutdown_tx.send(true);
    });

    let metrics_server = match cfg.metrics_addr {
        Some(addr) => Some(
            prometheus_exporter::start_server(addr, shutdown_rx.clone())
                .await
                .context("cannot start metrics endpoint")?,
        ),
        None => None,
    };

    let mut probe_loop = ProbeLoop::new(&cfg, target, label, transport, notifier)?;
    println!("Calculating stats over a sliding window of {} samples", cfg.window_capacity);
    probe_loop.run(shutdown_rx).await;

    if let Some((handle, _)) = metrics_server {
        if let Err(e) = handle.await {
            warn!("metrics server task failed: {e}");
        }
    }
    Ok(())
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{signal, SignalKind};
    match signal(SignalKind::terminate()) {
        Ok(mut term) => {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {}
                _ = term.recv() => {}
            }
        }
        Err(e) => {
            warn!("cannot listen for SIGTERM: {e}");
            let _ = tokio::signal::ctrl_c().await;
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

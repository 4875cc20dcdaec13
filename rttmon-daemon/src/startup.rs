//! Start-up steps that must succeed before the probe loop runs.

use std::net::IpAddr;

use tracing::info;

use rttmon_core::MonitorConfig;
use rttmon_telemetry::{Config as TelemetryConfig, Exporter};
use rttmon_transport::{resolve_target, Family, IcmpOptions, IcmpTransport};

use crate::errors::Result;

/// Logging always; the Prometheus registry only when a metrics address is set.
pub fn init_telemetry(cfg: &MonitorConfig) -> Result<()> {
    let exporter = if cfg.metrics_addr.is_some() { Exporter::Prometheus } else { Exporter::None };
    rttmon_telemetry::init(&TelemetryConfig { log_level: cfg.log_level.clone(), exporter })?;
    Ok(())
}

/// The configured target as written by the operator, and the address it resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeTarget {
    pub label: String,
    pub addr: IpAddr,
}

pub fn resolve(cfg: &MonitorConfig) -> Result<ProbeTarget> {
    let label = cfg.require_target()?.to_string();
    let addr = resolve_target(&label)?;
    Ok(ProbeTarget { label, addr })
}

pub fn open_transport(cfg: &MonitorConfig, addr: IpAddr) -> Result<IcmpTransport> {
    let opts = IcmpOptions { ttl: cfg.ttl, interface: cfg.interface.clone(), ..IcmpOptions::default() };
    let transport = IcmpTransport::open(Family::of(addr), &opts)?;
    info!(kind = ?transport.kind(), "ICMP transport ready");
    Ok(transport)
}

#![forbid(unsafe_code)]

//! rttmon daemon library: the probe loop and its collaborators.
//!
//! The `rttmon` binary wires these together; tests drive them directly with
//! scripted transports and recording notifiers.

pub mod config_manager;
pub mod errors;
pub mod notifier;
pub mod probe_loop;
pub mod prometheus_exporter;
pub mod startup;

pub use errors::{DaemonError, Result};
pub use notifier::{LogNotifier, Notifier, NotifyError, WebhookNotifier};
pub use probe_loop::{ProbeLoop, StatusLine, TickOutcome};

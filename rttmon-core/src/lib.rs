#![forbid(unsafe_code)]

//! Latency statistics and alert gating for rttmon.
//!
//! - [`window::SlidingWindow`]: bounded FIFO of recent samples
//! - [`stats::StatsEngine`]: running mean / sample variance over the window
//! - [`throttle::AlertThrottler`]: threshold + full-window + cooldown gate
//! - [`alert::AlertMessage`]: subject/body for notifiers
//! - [`config::MonitorConfig`]: TOML / env configuration

pub mod alert;
pub mod config;
pub mod error;
pub mod stats;
pub mod throttle;
pub mod types;
pub mod window;

pub use alert::AlertMessage;
pub use config::MonitorConfig;
pub use error::{Error, Result};
pub use stats::{RunningStats, StatsEngine, Summary};
pub use throttle::AlertThrottler;
pub use types::{Sample, Sequence};
pub use window::SlidingWindow;

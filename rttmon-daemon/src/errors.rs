/// Error types for the rttmon daemon
use thiserror::Error;

pub type Result<T, E = DaemonError> = core::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum DaemonError {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("config: {0}")]
    Config(String),
    #[error("transport: {0}")]
    Transport(#[from] rttmon_transport::Error),
    #[error("telemetry: {0}")]
    Telemetry(#[from] rttmon_telemetry::Error),
    #[error("notifier: {0}")]
    Notifier(String),
    #[error("metrics exporter: {0}")]
    Exporter(String),
}

impl From<rttmon_core::Error> for DaemonError {
    fn from(e: rttmon_core::Error) -> Self {
        match e {
            rttmon_core::Error::Io(io) => Self::Io(io),
            rttmon_core::Error::Config(msg) => Self::Config(msg),
        }
    }
}

impl DaemonError {
    pub fn notifier(msg: impl Into<String>) -> Self {
        Self::Notifier(msg.into())
    }

    pub fn exporter(msg: impl Into<String>) -> Self {
        Self::Exporter(msg.into())
    }
}

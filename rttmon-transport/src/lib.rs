//! rttmon probe transport.
//!
//! The monitor only needs one thing from the network: "send one echo to this
//! address and tell me how long the reply took, or that none came back in time".
//! [`ProbeTransport`] is that seam. [`icmp::IcmpTransport`] implements it with
//! ICMP / ICMPv6 echo, preferring unprivileged datagram sockets and falling back
//! to raw sockets.

#![forbid(unsafe_code)]

use std::net::IpAddr;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

pub mod echo;
pub mod icmp;
pub mod target;

pub use echo::{EchoReply, Family};
pub use icmp::{IcmpOptions, IcmpTransport, SocketKind};
pub use target::resolve_target;

/// Transport failures. A missing reply is not an error; see [`ProbeTransport`].
#[derive(Error, Debug)]
pub enum Error {
    /// Generic transport failure.
    #[error("transport: {0}")]
    Msg(String),
    /// Socket I/O failure.
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    /// The target name did not resolve.
    #[error("cannot resolve {host}: {reason}")]
    Resolve {
        /// Name as given.
        host: String,
        /// Resolver message.
        reason: String,
    },
    /// A received datagram could not be parsed.
    #[error("malformed ICMP packet: {0}")]
    Malformed(String),
    /// Requested feature is not available on this platform.
    #[error("unsupported: {0}")]
    Unsupported(String),
}

/// Result alias for transport operations.
pub type Result<T> = std::result::Result<T, Error>;

/// One round trip per call.
///
/// `Ok(Some(rtt))` is a matched reply, `Ok(None)` means nothing matching arrived
/// within `timeout`, and `Err` is a failure of the transport itself.
#[async_trait]
pub trait ProbeTransport: Send {
    /// Send one echo to `target` and wait at most `timeout` for its reply.
    async fn probe(&mut self, target: IpAddr, timeout: Duration) -> Result<Option<Duration>>;
}

#[async_trait]
impl<T: ProbeTransport + ?Sized> ProbeTransport for Box<T> {
    async fn probe(&mut self, target: IpAddr, timeout: Duration) -> Result<Option<Duration>> {
        (**self).probe(target, timeout).await
    }
}

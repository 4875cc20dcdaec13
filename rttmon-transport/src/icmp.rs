//! ICMP echo transport over a blocking socket driven from `spawn_blocking`.

use std::io::ErrorKind;
use std::net::{IpAddr, SocketAddr, UdpSocket};
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use socket2::{Domain, Protocol, Socket, Type};
use tracing::{debug, info, trace};

use crate::echo::{self, EchoReply, Family};
use crate::{Error, ProbeTransport, Result};

const RECV_BUF_LEN: usize = 1500;
const DEFAULT_PAYLOAD: &[u8] = b"rttmon-echo-probe-0123456789abcd";

/// How the ICMP socket was opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SocketKind {
    /// `SOCK_DGRAM` ping socket (no privileges; the kernel owns the identifier). IPv4
    /// replies keep their IP header outside Linux.
    Datagram,
    /// `SOCK_RAW`; needs CAP_NET_RAW. IPv4 replies arrive with their IP header.
    Raw,
}

/// Socket settings for [`IcmpTransport::open`].
#[derive(Debug, Clone)]
pub struct IcmpOptions {
    /// IPv4 TTL or IPv6 hop limit of outgoing requests.
    pub ttl: u32,
    /// Bind to this interface (Linux only).
    pub interface: Option<String>,
    /// Fixed identifier; random when absent.
    pub ident: Option<u16>,
    /// Bytes carried after the echo header.
    pub payload: Vec<u8>,
}

impl Default for IcmpOptions {
    fn default() -> Self {
        Self { ttl: 64, interface: None, ident: None, payload: DEFAULT_PAYLOAD.to_vec() }
    }
}

/// The one probe in flight. Only a single record exists because the monitor
/// never overlaps probes.
#[derive(Debug, Clone, Copy)]
pub struct PendingProbe {
    /// Identifier written into the request.
    pub ident: u16,
    /// Sequence number written into the request.
    pub sequence: u16,
    /// When the request left.
    pub sent_at: Instant,
}

impl PendingProbe {
    /// Datagram sockets rewrite the identifier, so only the sequence is compared there.
    pub fn matches(&self, reply: &EchoReply, kind: SocketKind) -> bool {
        match kind {
            SocketKind::Datagram => reply.sequence == self.sequence,
            SocketKind::Raw => reply.sequence == self.sequence && reply.ident == self.ident,
        }
    }
}

/// [`ProbeTransport`] over an ICMP or ICMPv6 echo socket.
pub struct IcmpTransport {
    sock: Arc<UdpSocket>,
    kind: SocketKind,
    family: Family,
    ident: u16,
    next_seq: u16,
    payload: Arc<[u8]>,
}

impl std::fmt::Debug for IcmpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IcmpTransport")
            .field("kind", &self.kind)
            .field("family", &self.family)
            .field("ident", &self.ident)
            .field("next_seq", &self.next_seq)
            .finish()
    }
}

impl IcmpTransport {
    /// Open a socket for the address family of `target`.
    pub fn open(family: Family, opts: &IcmpOptions) -> Result<Self> {
        let (sock, kind) = open_socket(family, opts)?;
        let ident = opts.ident.unwrap_or_else(rand::random);
        info!(?family, ?kind, ident, "ICMP socket opened");
        Ok(Self {
            sock: Arc::new(sock),
            kind,
            family,
            ident,
            next_seq: 1,
            payload: Arc::from(opts.payload.as_slice()),
        })
    }

    /// Which socket type `open` obtained.
    pub fn kind(&self) -> SocketKind {
        self.kind
    }

    /// Address family this transport can probe.
    pub fn family(&self) -> Family {
        self.family
    }
}

fn open_socket(family: Family, opts: &IcmpOptions) -> Result<(UdpSocket, SocketKind)> {
    let (domain, proto) = match family {
        Family::V4 => (Domain::IPV4, Protocol::ICMPV4),
        Family::V6 => (Domain::IPV6, Protocol::ICMPV6),
    };
    let (sock, kind) = match Socket::new(domain, Type::DGRAM, Some(proto)) {
        Ok(s) => (s, SocketKind::Datagram),
        Err(dgram_err) => {
            debug!("datagram ICMP socket unavailable ({dgram_err}), trying raw");
            match Socket::new(domain, Type::RAW, Some(proto)) {
                Ok(s) => (s, SocketKind::Raw),
                Err(raw_err) => {
                    return Err(Error::Msg(format!(
                        "cannot open ICMP socket (datagram: {dgram_err}; raw: {raw_err}); \
                         grant CAP_NET_RAW or widen net.ipv4.ping_group_range"
                    )))
                }
            }
        }
    };
    match family {
        Family::V4 => sock.set_ttl(opts.ttl)?,
        Family::V6 => sock.set_unicast_hops_v6(opts.ttl)?,
    }
    if let Some(ifname) = opts.interface.as_deref() {
        bind_interface(&sock, ifname)?;
    }
    Ok((sock.into(), kind))
}

#[cfg(any(target_os = "linux", target_os = "android", target_os = "fuchsia"))]
fn bind_interface(sock: &Socket, ifname: &str) -> Result<()> {
    sock.bind_device(Some(ifname.as_bytes()))
        .map_err(|e| Error::Msg(format!("bind to interface {ifname}: {e}")))
}

#[cfg(not(any(target_os = "linux", target_os = "android", target_os = "fuchsia")))]
fn bind_interface(_sock: &Socket, ifname: &str) -> Result<()> {
    Err(Error::Unsupported(format!("binding to interface {ifname} is only available on Linux")))
}

// Linux strips the IP header on datagram ping sockets; the BSDs and macOS keep it.
const DATAGRAM_KEEPS_IPV4_HEADER: bool = !cfg!(any(target_os = "linux", target_os = "android"));

/// Whether IPv4 replies read from this socket start with the IP header.
pub fn reply_has_ipv4_header(kind: SocketKind, family: Family) -> bool {
    family == Family::V4 && (kind == SocketKind::Raw || DATAGRAM_KEEPS_IPV4_HEADER)
}

/// Send one request and wait for its reply until `timeout` runs out.
fn exchange(
    sock: &UdpSocket,
    kind: SocketKind,
    family: Family,
    target: IpAddr,
    pending: &mut PendingProbe,
    packet: &[u8],
    timeout: Duration,
) -> Result<Option<Duration>> {
    pending.sent_at = Instant::now();
    sock.send_to(packet, SocketAddr::new(target, 0))?;
    let deadline = pending.sent_at + timeout;
    let strip_ip = reply_has_ipv4_header(kind, family);
    let mut buf = [0u8; RECV_BUF_LEN];
    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return Ok(None);
        }
        sock.set_read_timeout(Some(remaining))?;
        let (n, from) = match sock.recv_from(&mut buf) {
            Ok(r) => r,
            Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => return Ok(None),
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        };
        let received_at = Instant::now();
        if from.ip() != target {
            trace!(%from, "ignoring ICMP from another host");
            continue;
        }
        match echo::decode_reply(family, &buf[..n], strip_ip) {
            Ok(Some(reply)) if pending.matches(&reply, kind) => {
                return Ok(Some(received_at.saturating_duration_since(pending.sent_at)));
            }
            Ok(Some(reply)) => trace!(seq = reply.sequence, want = pending.sequence, "stale echo reply"),
            Ok(None) => trace!("ignoring non-reply ICMP message"),
            Err(e) => debug!("dropping datagram: {e}"),
        }
    }
}

#[async_trait]
impl ProbeTransport for IcmpTransport {
    async fn probe(&mut self, target: IpAddr, timeout: Duration) -> Result<Option<Duration>> {
        if Family::of(target) != self.family {
            return Err(Error::Msg(format!("{target} does not match socket family {:?}", self.family)));
        }
        let sequence = self.next_seq;
        self.next_seq = self.next_seq.wrapping_add(1);
        let packet = echo::encode_request(self.family, self.ident, sequence, &self.payload);
        let mut pending = PendingProbe { ident: self.ident, sequence, sent_at: Instant::now() };

        let sock = Arc::clone(&self.sock);
        let (kind, family) = (self.kind, self.family);
        tokio::task::spawn_blocking(move || exchange(&sock, kind, family, target, &mut pending, &packet, timeout))
            .await
            .map_err(|e| Error::Msg(format!("probe task failed: {e}")))?
    }
}

//! ICMP / ICMPv6 echo packet codec.

use std::net::IpAddr;

use nom::number::complete::{be_u16, be_u8};
use nom::sequence::tuple;
use nom::IResult;

use crate::{Error, Result};

/// ICMPv4 echo request type.
pub const ECHO_REQUEST_V4: u8 = 8;
/// ICMPv4 echo reply type.
pub const ECHO_REPLY_V4: u8 = 0;
/// ICMPv6 echo request type.
pub const ECHO_REQUEST_V6: u8 = 128;
/// ICMPv6 echo reply type.
pub const ECHO_REPLY_V6: u8 = 129;

/// Size of the ICMP echo header (type, code, checksum, identifier, sequence).
pub const HEADER_LEN: usize = 8;

/// Address family of the probed host; selects ICMP or ICMPv6.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Family {
    /// ICMP over IPv4.
    V4,
    /// ICMPv6.
    V6,
}

impl Family {
    /// Family of `addr`.
    pub fn of(addr: IpAddr) -> Self {
        match addr {
            IpAddr::V4(_) => Family::V4,
            IpAddr::V6(_) => Family::V6,
        }
    }

    fn request_type(self) -> u8 {
        match self {
            Family::V4 => ECHO_REQUEST_V4,
            Family::V6 => ECHO_REQUEST_V6,
        }
    }

    fn reply_type(self) -> u8 {
        match self {
            Family::V4 => ECHO_REPLY_V4,
            Family::V6 => ECHO_REPLY_V6,
        }
    }
}

/// Fixed eight-byte echo header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EchoHeader {
    /// Message type.
    pub ty: u8,
    /// Message code; zero for echo.
    pub code: u8,
    /// Internet checksum as received.
    pub checksum: u16,
    /// Echo identifier.
    pub ident: u16,
    /// Echo sequence number.
    pub sequence: u16,
}

/// A decoded echo reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EchoReply {
    /// Identifier echoed back by the peer (or rewritten by the kernel).
    pub ident: u16,
    /// Sequence number echoed back by the peer.
    pub sequence: u16,
    /// Bytes following the header.
    pub payload_len: usize,
}

/// RFC 1071 internet checksum.
pub fn checksum(data: &[u8]) -> u16 {
    let mut sum: u32 = 0;
    let mut chunks = data.chunks_exact(2);
    for pair in &mut chunks {
        sum += u32::from(u16::from_be_bytes([pair[0], pair[1]]));
    }
    if let [last] = chunks.remainder() {
        sum += u32::from(*last) << 8;
    }
    while sum >> 16 != 0 {
        sum = (sum & 0xffff) + (sum >> 16);
    }
    !(sum as u16)
}

/// Build an echo request. The ICMPv6 checksum covers a pseudo-header only the
/// kernel knows, so it is left zero for the kernel to fill in.
pub fn encode_request(family: Family, ident: u16, sequence: u16, payload: &[u8]) -> Vec<u8> {
    let mut pkt = Vec::with_capacity(HEADER_LEN + payload.len());
    pkt.push(family.request_type());
    pkt.push(0);
    pkt.extend_from_slice(&[0, 0]);
    pkt.extend_from_slice(&ident.to_be_bytes());
    pkt.extend_from_slice(&sequence.to_be_bytes());
    pkt.extend_from_slice(payload);
    if family == Family::V4 {
        let sum = checksum(&pkt);
        pkt[2..4].copy_from_slice(&sum.to_be_bytes());
    }
    pkt
}

fn header(input: &[u8]) -> IResult<&[u8], EchoHeader> {
    let (rest, (ty, code, checksum, ident, sequence)) = tuple((be_u8, be_u8, be_u16, be_u16, be_u16))(input)?;
    Ok((rest, EchoHeader { ty, code, checksum, ident, sequence }))
}

/// Split `buf` into the echo header and the bytes after it.
pub fn parse_header(buf: &[u8]) -> Result<(EchoHeader, &[u8])> {
    header(buf)
        .map(|(rest, h)| (h, rest))
        .map_err(|_| Error::Malformed(format!("truncated ICMP header ({} bytes)", buf.len())))
}

/// Skip the IPv4 header delivered in front of the ICMP message (raw sockets, and
/// datagram ping sockets outside Linux).
pub fn strip_ipv4_header(buf: &[u8]) -> Result<&[u8]> {
    let first = *buf.first().ok_or_else(|| Error::Malformed("empty datagram".into()))?;
    if first >> 4 != 4 {
        return Err(Error::Malformed(format!("not an IPv4 packet (version {})", first >> 4)));
    }
    let ihl = usize::from(first & 0x0f) * 4;
    if ihl < 20 || buf.len() < ihl {
        return Err(Error::Malformed(format!("bad IPv4 header length {ihl} for {} bytes", buf.len())));
    }
    Ok(&buf[ihl..])
}

/// Decode a received datagram. `Ok(None)` for well-formed ICMP that is not an
/// echo reply (our own requests on a raw socket, unreachables, ...).
pub fn decode_reply(family: Family, buf: &[u8], has_ip_header: bool) -> Result<Option<EchoReply>> {
    let icmp = if has_ip_header { strip_ipv4_header(buf)? } else { buf };
    let (h, payload) = parse_header(icmp)?;
    if h.ty != family.reply_type() || h.code != 0 {
        return Ok(None);
    }
    Ok(Some(EchoReply { ident: h.ident, sequence: h.sequence, payload_len: payload.len() }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn v4_request_layout_and_checksum() {
        let pkt = encode_request(Family::V4, 0x1234, 1, &[]);
        assert_eq!(pkt, vec![8, 0, 0xe5, 0xca, 0x12, 0x34, 0x00, 0x01]);
        // a correct checksum makes the whole message sum to zero
        assert_eq!(checksum(&pkt), 0);
    }

    #[test]
    fn odd_length_payload_checksums_to_zero() {
        let pkt = encode_request(Family::V4, 7, 300, b"rttmon!");
        assert_eq!(pkt.len(), HEADER_LEN + 7);
        assert_eq!(checksum(&pkt), 0);
    }

    #[test]
    fn v6_request_leaves_checksum_to_kernel() {
        let pkt = encode_request(Family::V6, 0xbeef, 9, b"ab");
        assert_eq!(&pkt[..4], &[128, 0, 0, 0]);
        assert_eq!(&pkt[4..8], &[0xbe, 0xef, 0, 9]);
    }

    #[test]
    fn decode_reply_after_ipv4_header() {
        let mut reply = encode_request(Family::V4, 42, 77, b"xyz");
        reply[0] = ECHO_REPLY_V4;
        let mut dgram = vec![0x45, 0, 0, 0, 0, 0, 0, 0, 64, 1, 0, 0, 127, 0, 0, 1, 127, 0, 0, 1];
        dgram.extend_from_slice(&reply);
        let r = decode_reply(Family::V4, &dgram, true).unwrap().unwrap();
        assert_eq!(r, EchoReply { ident: 42, sequence: 77, payload_len: 3 });
    }

    #[test]
    fn datagram_reply_with_ipv4_header_decodes() {
        // BSD-style ping sockets hand back the IP header too; the kernel rewrote the identifier.
        let mut reply = encode_request(Family::V4, 0x0bad, 5, &[0u8; 32]);
        reply[0] = ECHO_REPLY_V4;
        let mut dgram = vec![0x45, 0, 0, 60, 0, 0, 0, 0, 64, 1, 0, 0, 192, 0, 2, 1, 10, 0, 0, 2];
        dgram.extend_from_slice(&reply);

        // Without stripping, 0x45 is read as the ICMP type and the reply is missed.
        assert_eq!(decode_reply(Family::V4, &dgram, false).unwrap(), None);
        let r = decode_reply(Family::V4, &dgram, true).unwrap().unwrap();
        assert_eq!(r, EchoReply { ident: 0x0bad, sequence: 5, payload_len: 32 });
    }

    #[test]
    fn own_request_is_not_a_reply() {
        let req = encode_request(Family::V4, 1, 1, &[]);
        assert_eq!(decode_reply(Family::V4, &req, false).unwrap(), None);
        let mut v6 = encode_request(Family::V6, 1, 1, &[]);
        v6[0] = ECHO_REPLY_V6;
        assert!(decode_reply(Family::V6, &v6, false).unwrap().is_some());
    }

    #[test]
    fn truncated_input_is_malformed() {
        assert!(matches!(decode_reply(Family::V4, &[0, 0, 0], false), Err(Error::Malformed(_))));
        assert!(matches!(strip_ipv4_header(&[0x45, 0, 0]), Err(Error::Malformed(_))));
        assert!(matches!(strip_ipv4_header(&[0x60; 40]), Err(Error::Malformed(_))));
    }
}

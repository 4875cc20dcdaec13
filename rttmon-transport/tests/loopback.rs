use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::time::Duration;

use rttmon_transport::{Family, IcmpOptions, IcmpTransport, ProbeTransport};

// ICMP sockets need either ping_group_range or CAP_NET_RAW; without either the
// environment cannot run this test and it returns early.
fn open_or_skip(family: Family) -> Option<IcmpTransport> {
    match IcmpTransport::open(family, &IcmpOptions::default()) {
        Ok(t) => Some(t),
        Err(e) => {
            eprintln!("skipping: {e}");
            None
        }
    }
}

#[tokio::test]
async fn loopback_echo_is_answered_within_timeout() {
    let Some(mut t) = open_or_skip(Family::V4) else { return };
    let timeout = Duration::from_secs(2);
    let rtt = t.probe(IpAddr::V4(Ipv4Addr::LOCALHOST), timeout).await.expect("transport error");
    if let Some(rtt) = rtt {
        assert!(rtt < timeout);
    }
}

#[tokio::test]
async fn family_mismatch_is_a_transport_error() {
    let Some(mut t) = open_or_skip(Family::V4) else { return };
    let res = t.probe(IpAddr::V6(Ipv6Addr::LOCALHOST), Duration::from_millis(50)).await;
    assert!(matches!(res, Err(rttmon_transport::Error::Msg(_))));
}

#[tokio::test]
async fn boxed_transport_delegates() {
    let Some(t) = open_or_skip(Family::V4) else { return };
    let mut boxed: Box<dyn ProbeTransport> = Box::new(t);
    let res = boxed.probe(IpAddr::V4(Ipv4Addr::LOCALHOST), Duration::from_secs(1)).await;
    assert!(res.is_ok());
}

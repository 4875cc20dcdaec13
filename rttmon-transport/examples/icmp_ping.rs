use std::time::Duration;

use rttmon_transport::{resolve_target, Family, IcmpOptions, IcmpTransport, ProbeTransport};

#[tokio::main(flavor = "current_thread")]
async fn main() -> rttmon_transport::Result<()> {
    let host = std::env::args().nth(1).unwrap_or_else(|| "127.0.0.1".into());
    let target = resolve_target(&host)?;
    let mut t = IcmpTransport::open(Family::of(target), &IcmpOptions::default())?;
    for _ in 0..3 {
        match t.probe(target, Duration::from_secs(1)).await? {
            Some(rtt) => println!("reply from {target}: {:.3} ms", rtt.as_secs_f64() * 1e3),
            None => println!("no reply from {target}"),
        }
        tokio::time::sleep(Duration::from_secs(1)).await;
    }
    Ok(())
}

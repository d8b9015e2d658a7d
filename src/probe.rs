use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;

use async_trait::async_trait;
use surge_ping::{Client, Config, PingIdentifier, PingSequence, SurgeError};
use tracing::debug;

use crate::deadline::{within, Settled};
use crate::error::{ProbeError, ScanError};

const ECHO_PAYLOAD: [u8; 56] = [0; 56];

/// Sends one echo request and waits for its reply.
///
/// Implementations may fail in any way they like; [`probe`] folds every
/// failure into "not alive".
#[async_trait]
pub trait EchoTransport: Send + Sync {
    async fn echo(&self, address: Ipv4Addr) -> Result<(), ProbeError>;
}

/// ICMP echo over a shared raw/dgram socket. Each call gets its own pinger.
#[derive(Clone)]
pub struct IcmpTransport {
    client: Client,
    reply_wait: Duration,
}

impl IcmpTransport {
    /// Open the ICMP socket. Fails when the process lacks permission to do so,
    /// which is a configuration problem rather than a per-host one.
    pub fn new(reply_wait: Duration) -> Result<Self, ScanError> {
        let client = Client::new(&Config::default()).map_err(ScanError::TransportUnavailable)?;
        Ok(Self { client, reply_wait })
    }
}

#[async_trait]
impl EchoTransport for IcmpTransport {
    async fn echo(&self, address: Ipv4Addr) -> Result<(), ProbeError> {
        let mut pinger = self
            .client
            .pinger(IpAddr::V4(address), PingIdentifier(rand::random()))
            .await;
        pinger.timeout(self.reply_wait);
        match pinger.ping(PingSequence(0), &ECHO_PAYLOAD).await {
            Ok(_) => Ok(()),
            Err(SurgeError::Timeout { .. }) => Err(ProbeError::Unreachable),
            Err(e) => Err(ProbeError::Echo(e.to_string())),
        }
    }
}

/// Is `address` answering echo requests within `timeout`?
///
/// Never fails: errors and elapsed deadlines both read as `false`.
pub async fn probe(transport: &dyn EchoTransport, address: Ipv4Addr, timeout: Duration) -> bool {
    match within(timeout, transport.echo(address)).await {
        Settled::Completed(Ok(())) => true,
        Settled::Completed(Err(e)) => {
            debug!(%address, error = %e, "probe failed");
            false
        }
        Settled::TimedOut => {
            debug!(%address, ?timeout, "probe timed out");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Scripted;

    #[async_trait]
    impl EchoTransport for Scripted {
        async fn echo(&self, address: Ipv4Addr) -> Result<(), ProbeError> {
            match address.octets()[3] {
                1 => Ok(()),
                2 => Err(ProbeError::Unreachable),
                3 => Err(ProbeError::Echo("network is down".into())),
                _ => std::future::pending().await,
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn reply_means_alive() {
        assert!(probe(&Scripted, Ipv4Addr::new(10, 0, 0, 1), Duration::from_secs(2)).await);
    }

    #[tokio::test(start_paused = true)]
    async fn errors_mean_not_alive() {
        assert!(!probe(&Scripted, Ipv4Addr::new(10, 0, 0, 2), Duration::from_secs(2)).await);
        assert!(!probe(&Scripted, Ipv4Addr::new(10, 0, 0, 3), Duration::from_secs(2)).await);
    }

    #[tokio::test(start_paused = true)]
    async fn silence_means_not_alive_after_timeout() {
        let start = tokio::time::Instant::now();
        let alive = probe(&Scripted, Ipv4Addr::new(10, 0, 0, 9), Duration::from_secs(2)).await;
        assert!(!alive);
        assert!(start.elapsed() >= Duration::from_secs(2));
        assert!(start.elapsed() < Duration::from_secs(3));
    }
}

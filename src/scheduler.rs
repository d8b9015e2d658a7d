use std::net::Ipv4Addr;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info};

use crate::classify::{classify, QueryTransport};
use crate::config::ClassifierConfig;
use crate::error::ScanError;
use crate::probe::{probe, EchoTransport};
use crate::types::{ClassificationResult, ProbeResult, ScanRange};

/// Sweep `range` in batches and return the addresses that answered.
///
/// Each batch of `range.batch_size` probes runs concurrently and must fully
/// settle before the next one starts. The result keeps generation order
/// regardless of which probe finished first.
pub async fn scan_addresses(
    range: &ScanRange,
    transport: Arc<dyn EchoTransport>,
    timeout: Duration,
) -> Result<Vec<Ipv4Addr>, ScanError> {
    let addresses = range.addresses()?;
    let mut live = Vec::new();

    for (batch_no, batch) in addresses.chunks(range.batch_size).enumerate() {
        let results = probe_batch(batch, &transport, timeout).await?;
        let before = live.len();
        live.extend(results.into_iter().filter(|r| r.alive).map(|r| r.address));
        debug!(
            batch = batch_no,
            probed = batch.len(),
            alive = live.len() - before,
            "batch settled"
        );
    }

    info!(probed = addresses.len(), alive = live.len(), "liveness sweep finished");
    Ok(live)
}

async fn probe_batch(
    batch: &[Ipv4Addr],
    transport: &Arc<dyn EchoTransport>,
    timeout: Duration,
) -> Result<Vec<ProbeResult>, ScanError> {
    let mut set = JoinSet::new();
    for (idx, &address) in batch.iter().enumerate() {
        let transport = transport.clone();
        set.spawn(async move {
            let alive = probe(transport.as_ref(), address, timeout).await;
            (idx, ProbeResult { address, alive })
        });
    }

    let mut slots: Vec<Option<ProbeResult>> = vec![None; batch.len()];
    while let Some(res) = set.join_next().await {
        let (idx, result) = res?;
        slots[idx] = Some(result);
    }
    Ok(slots.into_iter().flatten().collect())
}

/// Classify every live address and return those that are printers.
///
/// At most `concurrency` queries are in flight; `1` runs them one after
/// another. Output order follows `live`, not completion order.
pub async fn classify_all(
    live: &[Ipv4Addr],
    transport: Arc<dyn QueryTransport>,
    config: &ClassifierConfig,
    concurrency: usize,
) -> Result<Vec<Ipv4Addr>, ScanError> {
    let sem = Arc::new(Semaphore::new(concurrency.max(1)));
    let mut set = JoinSet::new();

    for (idx, &address) in live.iter().enumerate() {
        let Ok(permit) = sem.clone().acquire_owned().await else {
            break;
        };
        let transport = transport.clone();
        let config = config.clone();
        set.spawn(async move {
            let _permit = permit;
            let is_printer = classify(transport.as_ref(), address, &config).await;
            (idx, ClassificationResult { address, is_printer })
        });
    }

    let mut slots: Vec<Option<ClassificationResult>> = vec![None; live.len()];
    while let Some(res) = set.join_next().await {
        let (idx, result) = res?;
        slots[idx] = Some(result);
    }

    let printers: Vec<Ipv4Addr> = slots
        .into_iter()
        .flatten()
        .filter(|r| r.is_printer)
        .map(|r| r.address)
        .collect();
    info!(classified = live.len(), printers = printers.len(), "classification finished");
    Ok(printers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProbeError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Odd hosts answer; later hosts in a batch answer sooner.
    struct OddHosts {
        in_flight: AtomicUsize,
        peak: AtomicUsize,
    }

    #[async_trait]
    impl EchoTransport for OddHosts {
        async fn echo(&self, address: Ipv4Addr) -> Result<(), ProbeError> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            let host = address.octets()[3];
            tokio::time::sleep(Duration::from_millis(100 - host as u64)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            if host % 2 == 1 {
                Ok(())
            } else {
                Err(ProbeError::Unreachable)
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn batches_bound_concurrency_and_keep_order() {
        let transport = Arc::new(OddHosts {
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        });
        let range = ScanRange::new("10.1.1", 1, 10, 3);
        let live = scan_addresses(&range, transport.clone(), Duration::from_secs(1))
            .await
            .unwrap();
        let hosts: Vec<u8> = live.iter().map(|a| a.octets()[3]).collect();
        assert_eq!(hosts, vec![1, 3, 5, 7, 9]);
        assert_eq!(transport.peak.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn invalid_range_is_an_error() {
        let transport = Arc::new(OddHosts {
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        });
        let range = ScanRange::new("10.1.1", 9, 3, 3);
        let err = scan_addresses(&range, transport, Duration::from_secs(1)).await;
        assert!(matches!(err, Err(ScanError::InvalidRange(_))));
    }
}

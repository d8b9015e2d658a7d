use std::sync::Arc;

use ::time::{format_description::well_known, OffsetDateTime};
use tracing::{info, instrument};

use crate::classify::{self, QueryTransport};
use crate::config::ScanConfig;
use crate::error::ScanError;
use crate::probe::{EchoTransport, IcmpTransport};
use crate::scheduler;
use crate::types::{ScanOutcome, ScanRange, ScanReport};

/// Runs the two-phase printer discovery: liveness sweep, then classification.
///
/// Holds only configuration and transports; every scan builds and returns its
/// own results, so one `Scanner` can serve overlapping calls.
#[derive(Clone)]
pub struct Scanner {
    config: ScanConfig,
    echo: Arc<dyn EchoTransport>,
    query: Arc<dyn QueryTransport>,
}

impl Scanner {
    pub fn new(
        config: ScanConfig,
        echo: Arc<dyn EchoTransport>,
        query: Arc<dyn QueryTransport>,
    ) -> Self {
        Self {
            config,
            echo,
            query,
        }
    }

    /// Build a scanner over ICMP echo and SNMP. Fails if the configuration is
    /// invalid or the ICMP socket cannot be opened.
    pub fn with_system_transports(config: ScanConfig) -> Result<Self, ScanError> {
        config.validate()?;
        let echo = IcmpTransport::new(config.probe_timeout)?;
        let query = classify::system_transport(&config.classifier)?;
        Ok(Self::new(config, Arc::new(echo), Arc::new(query)))
    }

    /// Discover printers in `range`.
    ///
    /// `Ok` with an empty list means the scan ran and found nothing; `Err`
    /// means it could not run.
    pub async fn run_scan(&self, range: &ScanRange) -> Result<ScanOutcome, ScanError> {
        self.run_scan_report(range).await.map(|r| r.outcome())
    }

    /// Like [`run_scan`](Self::run_scan) but keeps the live hosts and timings.
    #[instrument(skip(self), fields(prefix = %range.prefix, start = range.start, end = range.end))]
    pub async fn run_scan_report(&self, range: &ScanRange) -> Result<ScanReport, ScanError> {
        self.config.validate()?;
        range.validate()?;
        let started_at = now_rfc3339();
        info!(batch_size = range.batch_size, "scan started");

        let live =
            scheduler::scan_addresses(range, self.echo.clone(), self.config.probe_timeout).await?;

        let printers = if live.is_empty() {
            Vec::new()
        } else {
            scheduler::classify_all(
                &live,
                self.query.clone(),
                &self.config.classifier,
                self.config.classify_concurrency,
            )
            .await?
        };

        info!(live = live.len(), printers = printers.len(), "scan finished");
        Ok(ScanReport {
            started_at,
            finished_at: now_rfc3339(),
            range: range.clone(),
            live,
            printers,
        })
    }
}

fn now_rfc3339() -> String {
    let now = OffsetDateTime::now_utc();
    now.format(&well_known::Rfc3339)
        .unwrap_or_else(|_| String::from("1970-01-01T00:00:00Z"))
}

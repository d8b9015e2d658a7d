use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::Duration;

use printer_scan_rs::config::{
    ClassifierConfig, ScanConfig, SnmpVersion, DEFAULT_BATCH_SIZE, DEFAULT_CLASSIFY_CONCURRENCY,
};
use printer_scan_rs::netdetect;
use printer_scan_rs::scan::Scanner;
use printer_scan_rs::server::{self, AppState};
use printer_scan_rs::types::{ScanRange, ScanReport, MAX_HOST};

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// printer-scan-rs — Find printers on the local network via ICMP + SNMP.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "printer-scan-rs",
    version,
    about = "Find printers on the local network: ICMP liveness sweep, then one SNMP device-type query per live host.",
    long_about = None
)]
struct Cli {
    /// Subnet prefix, first three octets (e.g., 192.168.1). If omitted, auto-detect the local /24.
    #[arg(long)]
    prefix: Option<String>,

    /// First host number to scan.
    #[arg(long, default_value_t = 1)]
    start: u8,

    /// Last host number to scan (inclusive).
    #[arg(long, default_value_t = MAX_HOST)]
    end: u8,

    /// Number of echo probes in flight per batch.
    #[arg(long = "batch-size", default_value_t = DEFAULT_BATCH_SIZE)]
    batch_size: usize,

    /// Echo probe timeout in milliseconds.
    #[arg(long = "probe-timeout-ms", default_value_t = 2_000)]
    probe_timeout_ms: u64,

    /// SNMP classification timeout in milliseconds.
    #[arg(long = "classify-timeout-ms", default_value_t = 20_000)]
    classify_timeout_ms: u64,

    /// Max concurrent SNMP queries (1 = sequential).
    #[arg(long = "classify-concurrency", default_value_t = DEFAULT_CLASSIFY_CONCURRENCY)]
    classify_concurrency: usize,

    /// SNMP community string. The default is readable by anyone on the LAN.
    #[arg(long, default_value = "public")]
    community: String,

    /// SNMP version: v1 or v2c.
    #[arg(long = "snmp-version", default_value = "v2c")]
    snmp_version: SnmpVersion,

    /// Write the scan report as pretty JSON to this path (optional).
    #[arg(long)]
    output: Option<PathBuf>,

    /// Serve the scan API on this address instead of scanning once (e.g., 127.0.0.1:3000).
    #[arg(long)]
    serve: Option<String>,
}

impl Cli {
    fn scan_config(&self) -> ScanConfig {
        ScanConfig {
            probe_timeout: Duration::from_millis(self.probe_timeout_ms),
            classifier: ClassifierConfig {
                community: self.community.clone(),
                version: self.snmp_version,
                timeout: Duration::from_millis(self.classify_timeout_ms),
                ..ClassifierConfig::default()
            },
            classify_concurrency: self.classify_concurrency,
        }
    }

    fn scan_range(&self) -> Result<ScanRange> {
        let prefix = match &self.prefix {
            Some(p) => p.clone(),
            None => netdetect::detect_local_prefix()
                .context("failed to detect local network; pass --prefix")?,
        };
        Ok(ScanRange::new(prefix, self.start, self.end, self.batch_size))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let range = cli.scan_range()?;
    let config = cli.scan_config();

    info!(
        prefix = %range.prefix,
        start = range.start,
        end = range.end,
        batch_size = range.batch_size,
        probe_timeout_ms = cli.probe_timeout_ms,
        classify_timeout_ms = cli.classify_timeout_ms,
        snmp_version = %cli.snmp_version,
        "printer-scan-rs configuration"
    );

    let scanner = Scanner::with_system_transports(config)
        .context("scanner could not start (ICMP usually needs root or CAP_NET_RAW)")?;

    if let Some(bind) = cli.serve.as_deref() {
        return server::spawn_server(bind, AppState::new(scanner, range)).await;
    }

    let report = scanner.run_scan_report(&range).await?;
    print_report(&report);
    if let Some(path) = cli.output.as_deref() {
        match write_report_json(path, &report) {
            Ok(()) => info!("wrote JSON report to {}", path.display()),
            Err(e) => warn!("failed to write JSON to {}: {e}", path.display()),
        }
    }
    Ok(())
}

fn print_report(report: &ScanReport) {
    println!(
        "\n{}.{}-{}: live hosts: {}, printers: {}",
        report.range.prefix,
        report.range.start,
        report.range.end,
        report.live.len(),
        report.printers.len()
    );
    let ip_w = report
        .live
        .iter()
        .map(|ip| ip.to_string().len())
        .max()
        .unwrap_or(0)
        .max("ip".len());
    println!("{:<ip_w$}  {:<7}", "ip", "printer", ip_w = ip_w);
    println!("{:-<ip_w$}  {:-<7}", "", "", ip_w = ip_w);
    for ip in &report.live {
        let mark = if report.printers.contains(ip) { "yes" } else { "no" };
        println!("{:<ip_w$}  {:<7}", ip.to_string(), mark, ip_w = ip_w);
    }
}

fn write_report_json(path: &Path, report: &ScanReport) -> Result<()> {
    let file = File::create(path)?;
    serde_json::to_writer_pretty(file, report)?;
    Ok(())
}

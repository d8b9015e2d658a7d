use std::net::Ipv4Addr;

use serde::{Deserialize, Serialize};

use crate::error::ScanError;

/// Highest host number scanned on a /24 (the broadcast address is skipped).
pub const MAX_HOST: u8 = 254;

/// The slice of a /24 to sweep, plus the probe batch size.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ScanRange {
    /// First three octets, e.g. `192.168.1`.
    pub prefix: String,
    pub start: u8,
    pub end: u8,
    pub batch_size: usize,
}

impl ScanRange {
    pub fn new(prefix: impl Into<String>, start: u8, end: u8, batch_size: usize) -> Self {
        Self {
            prefix: prefix.into(),
            start,
            end,
            batch_size,
        }
    }

    /// Check range bounds and parse the prefix into its three octets.
    pub fn validate(&self) -> Result<[u8; 3], ScanError> {
        if self.start == 0 || self.end > MAX_HOST {
            return Err(ScanError::InvalidRange(format!(
                "host numbers must lie within 1..={MAX_HOST}, got {}..={}",
                self.start, self.end
            )));
        }
        if self.start > self.end {
            return Err(ScanError::InvalidRange(format!(
                "start {} is greater than end {}",
                self.start, self.end
            )));
        }
        if self.batch_size == 0 {
            return Err(ScanError::InvalidRange("batch size must be at least 1".into()));
        }
        parse_prefix(&self.prefix)
    }

    /// Addresses `start..=end` in generation order.
    pub fn addresses(&self) -> Result<Vec<Ipv4Addr>, ScanError> {
        let [a, b, c] = self.validate()?;
        Ok((self.start..=self.end)
            .map(|host| Ipv4Addr::new(a, b, c, host))
            .collect())
    }
}

fn parse_prefix(prefix: &str) -> Result<[u8; 3], ScanError> {
    let invalid = || ScanError::InvalidRange(format!("invalid subnet prefix: {prefix:?}"));
    let mut octets = [0u8; 3];
    let mut parts = prefix.trim().trim_end_matches('.').split('.');
    for slot in octets.iter_mut() {
        *slot = parts
            .next()
            .and_then(|p| p.parse::<u8>().ok())
            .ok_or_else(invalid)?;
    }
    if parts.next().is_some() {
        return Err(invalid());
    }
    Ok(octets)
}

/// Liveness verdict for one address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeResult {
    pub address: Ipv4Addr,
    pub alive: bool,
}

/// Printer verdict for one live address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassificationResult {
    pub address: Ipv4Addr,
    pub is_printer: bool,
}

/// Addresses classified as printers, in generation order.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanOutcome {
    pub printers: Vec<Ipv4Addr>,
}

/// Everything one scan learned, with RFC3339 timestamps. Written by the CLI.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ScanReport {
    pub started_at: String,
    pub finished_at: String,
    pub range: ScanRange,
    pub live: Vec<Ipv4Addr>,
    pub printers: Vec<Ipv4Addr>,
}

impl ScanReport {
    pub fn outcome(&self) -> ScanOutcome {
        ScanOutcome {
            printers: self.printers.clone(),
        }
    }
}

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::error::ScanError;

/// hrDeviceType column in the host-resources device table.
pub const DEVICE_TYPE_OID: &str = "1.3.6.1.2.1.25.3.2.1.3";
/// hrDevicePrinter device-type value.
pub const PRINTER_TYPE_VALUE: &str = "1.3.6.1.2.1.25.3.1.5";
/// Read-only community most agents ship with. Only suitable on a trusted LAN.
pub const DEFAULT_COMMUNITY: &str = "public";

pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(2);
pub const DEFAULT_CLASSIFY_TIMEOUT: Duration = Duration::from_secs(20);
pub const DEFAULT_BATCH_SIZE: usize = 32;
pub const DEFAULT_CLASSIFY_CONCURRENCY: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SnmpVersion {
    V1,
    #[default]
    V2c,
}

impl FromStr for SnmpVersion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "1" | "v1" => Ok(SnmpVersion::V1),
            "2c" | "v2c" => Ok(SnmpVersion::V2c),
            other => Err(format!("unsupported SNMP version: {other} (expected v1 or v2c)")),
        }
    }
}

impl fmt::Display for SnmpVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SnmpVersion::V1 => f.write_str("v1"),
            SnmpVersion::V2c => f.write_str("v2c"),
        }
    }
}

/// How the classifier talks to a device and what it expects back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifierConfig {
    pub community: String,
    pub version: SnmpVersion,
    pub device_type_oid: String,
    pub printer_type_value: String,
    pub timeout: Duration,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            community: DEFAULT_COMMUNITY.to_string(),
            version: SnmpVersion::default(),
            device_type_oid: DEVICE_TYPE_OID.to_string(),
            printer_type_value: PRINTER_TYPE_VALUE.to_string(),
            timeout: DEFAULT_CLASSIFY_TIMEOUT,
        }
    }
}

/// Tunables for one scan. The range itself travels separately.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanConfig {
    pub probe_timeout: Duration,
    pub classifier: ClassifierConfig,
    /// Upper bound on in-flight classifications; `1` runs them one by one.
    pub classify_concurrency: usize,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
            classifier: ClassifierConfig::default(),
            classify_concurrency: DEFAULT_CLASSIFY_CONCURRENCY,
        }
    }
}

impl ScanConfig {
    pub fn validate(&self) -> Result<(), ScanError> {
        if self.probe_timeout.is_zero() || self.classifier.timeout.is_zero() {
            return Err(ScanError::InvalidConfig("timeouts must be non-zero".into()));
        }
        if self.classify_concurrency == 0 {
            return Err(ScanError::InvalidConfig(
                "classify concurrency must be at least 1".into(),
            ));
        }
        if self.classifier.community.is_empty() {
            return Err(ScanError::InvalidConfig("community must not be empty".into()));
        }
        parse_oid(&self.classifier.device_type_oid)?;
        parse_oid(&self.classifier.printer_type_value)?;
        Ok(())
    }
}

/// Parse a dotted object identifier (`1.3.6.1...`) into its numeric arcs.
pub fn parse_oid(s: &str) -> Result<Vec<u64>, ScanError> {
    let trimmed = s.trim().trim_start_matches('.');
    let arcs = trimmed
        .split('.')
        .map(|arc| arc.parse::<u64>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| ScanError::InvalidConfig(format!("invalid OID {s:?}: {e}")))?;
    if arcs.len() < 2 || arcs[0] > 2 {
        return Err(ScanError::InvalidConfig(format!("invalid OID {s:?}")));
    }
    Ok(arcs)
}

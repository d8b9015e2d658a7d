use std::net::Ipv4Addr;
use std::time::Duration;

use async_trait::async_trait;
use snmp2::{Oid, SyncSession, Value};
use tracing::debug;

use crate::config::{parse_oid, ClassifierConfig, SnmpVersion};
use crate::deadline::{within, Settled};
use crate::error::{QueryError, ScanError};

const SNMP_PORT: u16 = 161;

/// Issues a single get-request and returns the value rendered as text.
///
/// Object identifiers come back in dotted form, octet strings as lossy UTF-8
/// with no trimming, so the printer comparison stays exact.
#[async_trait]
pub trait QueryTransport: Send + Sync {
    async fn get(&self, address: Ipv4Addr, oid: &[u64]) -> Result<String, QueryError>;
}

/// SNMP v1/v2c get over UDP. One session per call, dropped when the call ends.
#[derive(Debug, Clone)]
pub struct SnmpTransport {
    community: Vec<u8>,
    version: SnmpVersion,
    socket_timeout: Duration,
}

impl SnmpTransport {
    pub fn new(config: &ClassifierConfig) -> Self {
        Self {
            community: config.community.as_bytes().to_vec(),
            version: config.version,
            socket_timeout: config.timeout,
        }
    }
}

#[async_trait]
impl QueryTransport for SnmpTransport {
    async fn get(&self, address: Ipv4Addr, oid: &[u64]) -> Result<String, QueryError> {
        let transport = self.clone();
        let arcs = oid.to_vec();
        // The session is blocking; it lives and dies inside the worker. Its
        // socket timeout bounds the worker even if the caller stops waiting.
        tokio::task::spawn_blocking(move || transport.get_blocking(address, &arcs))
            .await
            .map_err(|e| QueryError::Worker(e.to_string()))?
    }
}

impl SnmpTransport {
    fn get_blocking(&self, address: Ipv4Addr, arcs: &[u64]) -> Result<String, QueryError> {
        let target = (address, SNMP_PORT);
        let timeout = Some(self.socket_timeout);
        let mut session = match self.version {
            SnmpVersion::V1 => SyncSession::new_v1(target, &self.community, timeout, 0),
            SnmpVersion::V2c => SyncSession::new_v2c(target, &self.community, timeout, 0),
        }
        .map_err(QueryError::Session)?;

        let oid = Oid::from(arcs).map_err(|e| QueryError::Protocol(format!("{e:?}")))?;
        let response = session
            .get(&oid)
            .map_err(|e| QueryError::Protocol(format!("{e:?}")))?;
        if response.error_status != 0 {
            return Err(QueryError::Protocol(format!(
                "agent returned error status {}",
                response.error_status
            )));
        }
        let mut varbinds = response.varbinds;
        let (_, value) = varbinds.next().ok_or(QueryError::EmptyResponse)?;
        render_value(value)
    }
}

fn render_value(value: Value<'_>) -> Result<String, QueryError> {
    match value {
        Value::ObjectIdentifier(oid) => Ok(oid.to_id_string()),
        Value::OctetString(bytes) => Ok(String::from_utf8_lossy(bytes).into_owned()),
        Value::NoSuchObject | Value::NoSuchInstance | Value::EndOfMibView => {
            Err(QueryError::UnexpectedValue("object not present on agent".into()))
        }
        _ => Err(QueryError::UnexpectedValue(
            "neither an object identifier nor a string".into(),
        )),
    }
}

/// Is the device at `address` a printer?
///
/// Queries the configured device-type object once and compares the answer
/// with the configured printer value. Never fails: session, protocol and
/// timeout errors all read as `false`.
pub async fn classify(
    transport: &dyn QueryTransport,
    address: Ipv4Addr,
    config: &ClassifierConfig,
) -> bool {
    let oid = match parse_oid(&config.device_type_oid) {
        Ok(oid) => oid,
        Err(e) => {
            debug!(%address, error = %e, "classification skipped");
            return false;
        }
    };
    match within(config.timeout, transport.get(address, &oid)).await {
        Settled::Completed(Ok(value)) => {
            let is_printer = value == config.printer_type_value;
            debug!(%address, %value, is_printer, "device type");
            is_printer
        }
        Settled::Completed(Err(e)) => {
            debug!(%address, error = %e, "classification failed");
            false
        }
        Settled::TimedOut => {
            debug!(%address, timeout = ?config.timeout, "classification timed out");
            false
        }
    }
}

/// Validate that a classifier config can build a real transport.
pub fn system_transport(config: &ClassifierConfig) -> Result<SnmpTransport, ScanError> {
    parse_oid(&config.device_type_oid)?;
    Ok(SnmpTransport::new(config))
}

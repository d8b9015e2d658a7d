use thiserror::Error;

/// Failures that stop a scan from running at all.
///
/// These are kept apart from an empty [`ScanOutcome`](crate::types::ScanOutcome)
/// so callers can tell "no printers found" from "scan could not run".
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("invalid scan range: {0}")]
    InvalidRange(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("network transport unavailable: {0}")]
    TransportUnavailable(#[source] std::io::Error),

    #[error("scan task failed: {0}")]
    TaskFailed(#[from] tokio::task::JoinError),
}

/// Why an echo probe did not get a reply. Never escapes the prober.
#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("echo request failed: {0}")]
    Echo(String),

    #[error("host unreachable")]
    Unreachable,
}

/// Why a device-type query failed. Never escapes the classifier.
#[derive(Error, Debug)]
pub enum QueryError {
    #[error("could not open session: {0}")]
    Session(#[source] std::io::Error),

    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("response carried no value")]
    EmptyResponse,

    #[error("unexpected value type: {0}")]
    UnexpectedValue(String),

    #[error("query worker failed: {0}")]
    Worker(String),
}

//! Library crate for printer-scan-rs exposing reusable modules.
pub mod classify;
pub mod config;
pub mod deadline;
pub mod error;
pub mod netdetect;
pub mod probe;
pub mod scan;
pub mod scheduler;
pub mod server;
pub mod types;

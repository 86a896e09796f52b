use std::net::SocketAddr;
use thiserror::Error;

/// Failure of one diagnostic stage. Recorded in the report, never fatal.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProbeStageError {
    #[error("DNS lookup for {host} failed: {reason}")]
    Dns { host: String, reason: String },

    #[error("TCP probe of {address} failed: {reason}")]
    Port { address: SocketAddr, reason: String },

    #[error("ping {host} failed: {reason}")]
    Ping { host: String, reason: String },

    #[error("interface enumeration failed: {0}")]
    Interfaces(String),
}

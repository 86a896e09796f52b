//! Connection prober: explains why a database host cannot be reached
//!
//! The prober runs a fixed sequence of independent checks against the host
//! named in a connection string and collects the results in a
//! [`DiagnosticReport`]. A failing stage never stops the stages after it.
//!
//! # Example
//!
//! ```ignore
//! use docqr_connection::probe::Prober;
//!
//! let report = Prober::new().diagnose("mongodb://db.internal:27017/app").await?;
//! println!("{report}");
//! ```

mod error;
mod interfaces;
mod ping;
mod report;


pub use error::ProbeStageError;
pub use ping::{Pinger, SystemPinger};
pub use report::{DiagnosticReport, InterfaceInfo};

use docqr_core::{ConnectionTarget, Result, sanitize_uri};
use std::io::ErrorKind;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;

/// Timeout for the TCP probe
pub const DEFAULT_TCP_TIMEOUT: Duration = Duration::from_secs(5);

/// Echo requests sent by the ping stage
pub const DEFAULT_PING_COUNT: u32 = 3;

/// Runs network diagnostics against the host of a connection string.
#[derive(Clone)]
pub struct Prober {
    pinger: Arc<dyn Pinger>,
    tcp_timeout: Duration,
    ping_count: u32,
}

impl Prober {
    /// Create a prober using the system `ping` command
    pub fn new() -> Self {
        Self::with_pinger(Arc::new(SystemPinger::new()))
    }

    /// Create a prober with a custom ping implementation
    pub fn with_pinger(pinger: Arc<dyn Pinger>) -> Self {
        Self {
            pinger,
            tcp_timeout: DEFAULT_TCP_TIMEOUT,
            ping_count: DEFAULT_PING_COUNT,
        }
    }

    pub fn with_tcp_timeout(mut self, timeout: Duration) -> Self {
        self.tcp_timeout = timeout;
        self
    }

    pub fn with_ping_count(mut self, count: u32) -> Self {
        self.ping_count = count.max(1);
        self
    }

    /// Diagnose the path to the host named in `uri`.
    ///
    /// Fails only when `uri` cannot be parsed. Every stage failure after
    /// that is recorded in the returned report.
    #[tracing::instrument(skip(self, uri), fields(uri = %sanitize_uri(uri)))]
    pub async fn diagnose(&self, uri: &str) -> Result<DiagnosticReport> {
        let target = ConnectionTarget::parse(uri)?;
        let mut report =
            DiagnosticReport::new(sanitize_uri(uri), target.host.clone(), target.port);

        tracing::info!(target = %target, "running connection diagnostics");

        match resolve(&target).await {
            Ok(address) => {
                report.set_resolved_address(address);

                let socket = SocketAddr::new(address, target.port);
                let (reachable, error) = probe_port(socket, self.tcp_timeout).await;
                report.set_port_reachable(reachable);
                if let Some(error) = error {
                    report.record_error(error);
                }
            }
            Err(error) => report.record_error(error),
        }

        match self.pinger.ping(&target.host, self.ping_count).await {
            Ok(output) => report.set_ping_output(output),
            Err(error) => report.record_error(error),
        }

        match interfaces::list_interfaces() {
            Ok(list) => report.set_interfaces(list),
            Err(error) => report.record_error(error),
        }

        tracing::info!(
            resolved = report.resolved_address().is_some(),
            port_reachable = ?report.port_reachable(),
            errors = report.errors().len(),
            "connection diagnostics finished"
        );

        Ok(report)
    }
}

impl Default for Prober {
    fn default() -> Self {
        Self::new()
    }
}

async fn resolve(target: &ConnectionTarget) -> std::result::Result<IpAddr, ProbeStageError> {
    let failed = |reason: String| ProbeStageError::Dns {
        host: target.host.clone(),
        reason,
    };

    let mut addresses = tokio::net::lookup_host((target.host.as_str(), target.port))
        .await
        .map_err(|e| failed(e.to_string()))?;

    match addresses.next() {
        Some(address) => {
            tracing::debug!(address = %address.ip(), "host resolved");
            Ok(address.ip())
        }
        None => Err(failed("no addresses returned".to_string())),
    }
}

/// Attempt one TCP connection. Refusal and timeout mean "closed" rather than
/// a stage error; other I/O failures are reported as well.
async fn probe_port(
    address: SocketAddr,
    timeout: Duration,
) -> (bool, Option<ProbeStageError>) {
    match tokio::time::timeout(timeout, TcpStream::connect(address)).await {
        Ok(Ok(_stream)) => {
            tracing::debug!(%address, "port open");
            (true, None)
        }
        Ok(Err(e)) if e.kind() == ErrorKind::ConnectionRefused => {
            tracing::debug!(%address, "connection refused");
            (false, None)
        }
        Ok(Err(e)) => (
            false,
            Some(ProbeStageError::Port {
                address,
                reason: e.to_string(),
            }),
        ),
        Err(_) => {
            tracing::debug!(%address, ?timeout, "port probe timed out");
            (false, None)
        }
    }
}

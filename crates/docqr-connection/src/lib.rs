//! DocQR Connection - Connection lifecycle and connection diagnostics
//!
//! This crate owns the database connection of the service. The
//! [`ConnectionManager`] connects with bounded retry and tracks liveness
//! from driver events; the [`Prober`] explains connection failures to an
//! operator.

mod manager;
pub mod probe;
pub mod retry;

pub use manager::ConnectionManager;
pub use probe::{DiagnosticReport, InterfaceInfo, Pinger, ProbeStageError, Prober, SystemPinger};
pub use retry::RetryPolicy;

//! Diagnostic report produced by the prober

use serde::Serialize;
use std::fmt;
use std::net::IpAddr;

use super::ProbeStageError;

/// One local network interface and the IP addresses bound to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InterfaceInfo {
    pub name: String,
    pub addresses: Vec<IpAddr>,
    pub is_up: bool,
    pub is_loopback: bool,
}

/// What the prober found out about the path to a database host.
///
/// Built once per [`Prober::diagnose`](super::Prober::diagnose) call. A
/// stage that did not run leaves its field as `None`; a stage that failed
/// adds a line to [`errors`](Self::errors).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiagnosticReport {
    uri: String,
    target_host: String,
    target_port: u16,
    resolved_address: Option<IpAddr>,
    port_reachable: Option<bool>,
    ping_output: Option<String>,
    interfaces: Option<Vec<InterfaceInfo>>,
    errors: Vec<String>,
}

impl DiagnosticReport {
    pub(crate) fn new(sanitized_uri: String, target_host: String, target_port: u16) -> Self {
        Self {
            uri: sanitized_uri,
            target_host,
            target_port,
            resolved_address: None,
            port_reachable: None,
            ping_output: None,
            interfaces: None,
            errors: Vec::new(),
        }
    }

    /// Connection string with credentials masked
    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn target_host(&self) -> &str {
        &self.target_host
    }

    pub fn target_port(&self) -> u16 {
        self.target_port
    }

    pub fn resolved_address(&self) -> Option<IpAddr> {
        self.resolved_address
    }

    /// `None` when the TCP stage was skipped
    pub fn port_reachable(&self) -> Option<bool> {
        self.port_reachable
    }

    pub fn ping_output(&self) -> Option<&str> {
        self.ping_output.as_deref()
    }

    pub fn interfaces(&self) -> Option<&[InterfaceInfo]> {
        self.interfaces.as_deref()
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Render the report as pretty-printed JSON
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub(crate) fn set_resolved_address(&mut self, address: IpAddr) {
        self.resolved_address = Some(address);
    }

    pub(crate) fn set_port_reachable(&mut self, reachable: bool) {
        self.port_reachable = Some(reachable);
    }

    pub(crate) fn set_ping_output(&mut self, output: String) {
        self.ping_output = Some(output);
    }

    pub(crate) fn set_interfaces(&mut self, interfaces: Vec<InterfaceInfo>) {
        self.interfaces = Some(interfaces);
    }

    pub(crate) fn record_error(&mut self, error: ProbeStageError) {
        tracing::warn!(error = %error, "diagnostic stage failed");
        self.errors.push(error.to_string());
    }
}

impl fmt::Display for DiagnosticReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Connection diagnostics for {}", self.uri)?;
        writeln!(f, "  target:   {}:{}", self.target_host, self.target_port)?;

        match self.resolved_address {
            Some(address) => writeln!(f, "  dns:      {address}")?,
            None => writeln!(f, "  dns:      not resolved")?,
        }

        match self.port_reachable {
            Some(true) => writeln!(f, "  tcp:      port {} open", self.target_port)?,
            Some(false) => writeln!(f, "  tcp:      port {} unreachable", self.target_port)?,
            None => writeln!(f, "  tcp:      skipped")?,
        }

        match &self.ping_output {
            Some(output) => {
                writeln!(f, "  ping:")?;
                for line in output.lines().filter(|l| !l.trim().is_empty()) {
                    writeln!(f, "    {line}")?;
                }
            }
            None => writeln!(f, "  ping:     no output")?,
        }

        if let Some(interfaces) = &self.interfaces {
            writeln!(f, "  interfaces:")?;
            for interface in interfaces {
                let addresses: Vec<String> =
                    interface.addresses.iter().map(ToString::to_string).collect();
                writeln!(
                    f,
                    "    {} [{}] {}",
                    interface.name,
                    if interface.is_up { "up" } else { "down" },
                    addresses.join(", ")
                )?;
            }
        }

        if !self.errors.is_empty() {
            writeln!(f, "  errors:")?;
            for error in &self.errors {
                writeln!(f, "    - {error}")?;
            }
        }

        Ok(())
    }
}

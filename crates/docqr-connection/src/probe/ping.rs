//! ICMP reachability check through the system `ping` utility

use async_trait::async_trait;
use std::time::Duration;
use tokio::process::Command;

use super::ProbeStageError;

/// Something that can send echo requests to a host and report the output.
#[async_trait]
pub trait Pinger: Send + Sync {
    /// Send `count` echo requests to `host` and return the raw output
    async fn ping(&self, host: &str, count: u32) -> Result<String, ProbeStageError>;
}

/// Runs the platform `ping` command.
///
/// Uses `ping -c N` on Unix and `ping -n N` on Windows. Fails if the
/// command cannot be spawned, exits non-zero, or runs past its deadline.
/// Hosts that would be read as a `ping` option are refused up front.
#[derive(Debug, Clone)]
pub struct SystemPinger {
    /// Extra time allowed on top of one second per echo request
    grace: Duration,
}

impl SystemPinger {
    pub fn new() -> Self {
        Self {
            grace: Duration::from_secs(5),
        }
    }

    fn deadline(&self, count: u32) -> Duration {
        Duration::from_secs(u64::from(count)) + self.grace
    }
}

impl Default for SystemPinger {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Pinger for SystemPinger {
    async fn ping(&self, host: &str, count: u32) -> Result<String, ProbeStageError> {
        let count_flag = if cfg!(windows) { "-n" } else { "-c" };
        let failed = |reason: String| ProbeStageError::Ping {
            host: host.to_string(),
            reason,
        };

        if host.is_empty() || host.starts_with('-') {
            return Err(failed("not a valid host name".to_string()));
        }

        let mut command = Command::new("ping");
        command
            .arg(count_flag)
            .arg(count.max(1).to_string())
            .arg(host)
            .kill_on_drop(true);

        tracing::debug!(host, count, "running system ping");

        let output = tokio::time::timeout(self.deadline(count), command.output())
            .await
            .map_err(|_| failed(format!("no result within {:?}", self.deadline(count))))?
            .map_err(|e| failed(format!("could not run ping: {e}")))?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        if output.status.success() {
            return Ok(stdout);
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        let detail = stderr
            .lines()
            .chain(stdout.lines())
            .rev()
            .find(|line| !line.trim().is_empty())
            .unwrap_or("no output")
            .trim()
            .to_string();

        Err(failed(format!("{} ({detail})", output.status)))
    }
}

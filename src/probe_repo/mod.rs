// Probing the OS: interface discovery and source-bound ping

pub mod parse;

use std::collections::BTreeMap;
use std::path::PathBuf;

use async_trait::async_trait;
use thiserror::Error;
use tokio::process::Command;

use crate::models::PingReport;

/// Probe invocation failure. Unparsable output is not an error; it degrades
/// to absent fields in the parsed report instead.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("failed to run probe command: {0}")]
    Spawn(#[from] std::io::Error),
}

/// Seam between the connectivity state machine and the operating system.
#[async_trait]
pub trait Prober: Send + Sync {
    /// Interface name -> ip, as reported by the discovery tool.
    async fn list_interfaces(&self) -> Result<BTreeMap<String, String>, ProbeError>;

    /// Runs the platform ping utility bound to `source_ip` against `target`.
    async fn ping(&self, target: &str, source_ip: &str) -> Result<PingReport, ProbeError>;
}

/// Real prober: shells out to the discovery tool and the platform ping.
pub struct ProbeRepo {
    discovery_exe: PathBuf,
    ping_count: u32,
}

impl ProbeRepo {
    pub fn new(discovery_exe: impl Into<PathBuf>, ping_count: u32) -> Self {
        Self {
            discovery_exe: discovery_exe.into(),
            ping_count,
        }
    }
}

#[async_trait]
impl Prober for ProbeRepo {
    async fn list_interfaces(&self) -> Result<BTreeMap<String, String>, ProbeError> {
        let output = Command::new(&self.discovery_exe)
            .arg("list")
            .output()
            .await?;
        let text = String::from_utf8_lossy(&output.stdout);
        Ok(parse::parse_interface_table(&text))
    }

    async fn ping(&self, target: &str, source_ip: &str) -> Result<PingReport, ProbeError> {
        // ping exits non-zero on packet loss; the transcript is parsed regardless.
        let output = Command::new("ping")
            .arg(target)
            .args(["-S", source_ip])
            .args(["-n", &self.ping_count.to_string()])
            .output()
            .await?;
        let text = String::from_utf8_lossy(&output.stdout);
        Ok(parse::parse_ping_output(target, &text))
    }
}

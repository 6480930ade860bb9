// Shared test helpers: scripted prober and ping report builders

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;
use dispatchmon::models::{PacketCounts, PingReport};
use dispatchmon::probe_repo::{ProbeError, Prober};

/// Prober whose answers are set by the test; records every ping issued.
#[derive(Default)]
pub struct ScriptedProber {
    table: Mutex<BTreeMap<String, String>>,
    responses: Mutex<BTreeMap<String, PingReport>>,
    ping_log: Mutex<Vec<(String, String)>>,
}

impl ScriptedProber {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_interface(&self, name: &str, ip: &str) {
        self.table.lock().unwrap().insert(name.into(), ip.into());
    }

    pub fn clear_interfaces(&self) {
        self.table.lock().unwrap().clear();
    }

    pub fn set_response(&self, target: &str, report: PingReport) {
        self.responses.lock().unwrap().insert(target.into(), report);
    }

    pub fn clear_responses(&self) {
        self.responses.lock().unwrap().clear();
    }

    pub fn pings(&self) -> Vec<(String, String)> {
        self.ping_log.lock().unwrap().clone()
    }
}

#[async_trait]
impl Prober for ScriptedProber {
    async fn list_interfaces(&self) -> Result<BTreeMap<String, String>, ProbeError> {
        Ok(self.table.lock().unwrap().clone())
    }

    async fn ping(&self, target: &str, source_ip: &str) -> Result<PingReport, ProbeError> {
        self.ping_log
            .lock()
            .unwrap()
            .push((target.into(), source_ip.into()));
        let responses = self.responses.lock().unwrap();
        Ok(responses
            .get(target)
            .copied()
            .unwrap_or_else(PingReport::unparsed))
    }
}

/// Report with `received` of 4 packets back and the given resolution flag.
pub fn report(dns_resolved: bool, received: u64) -> PingReport {
    PingReport {
        dns_resolved,
        packets: Some(PacketCounts {
            sent: 4,
            received,
            lost: 4u64.saturating_sub(received),
        }),
        round_trip: None,
    }
}

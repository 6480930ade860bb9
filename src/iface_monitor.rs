// Per-interface connectivity state machine

use std::time::{Duration, Instant};

use tokio::time;

use crate::models::Level;
use crate::probe_repo::Prober;

/// Probe targets and debounce shared by every interface monitor.
#[derive(Debug, Clone)]
pub struct ProbePolicy {
    /// Target reachable even on filtered networks.
    pub whitelisted_target: String,
    /// Target only reachable with unrestricted access.
    pub not_whitelisted_target: String,
    /// Window during which only the cheap presence check runs.
    pub debounce: Duration,
}

/// Owns one interface's connectivity level and ratchets it one probe at a
/// time toward (or away from) full access on each tick.
pub struct InterfaceMonitor {
    name: String,
    weight: u32,
    policy: ProbePolicy,
    ip: Option<String>,
    level: Level,
    previous_level: Level,
    last_check: Option<Instant>,
}

impl InterfaceMonitor {
    pub fn new(name: impl Into<String>, weight: u32, policy: ProbePolicy) -> Self {
        Self {
            name: name.into(),
            weight,
            policy,
            ip: None,
            level: Level::Offline,
            previous_level: Level::Offline,
            last_check: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn weight(&self) -> u32 {
        self.weight
    }

    pub fn ip(&self) -> Option<&str> {
        self.ip.as_deref()
    }

    pub fn level(&self) -> Level {
        self.level
    }

    /// Level as of the start of the most recent `update` call.
    pub fn previous_level(&self) -> Level {
        self.previous_level
    }

    /// Advances the state machine by one tick. Within the debounce window
    /// only device presence is re-checked; once the window has elapsed the
    /// current level is re-probed and ratcheted one step at a time, up on
    /// success until a probe fails, down on failure until one succeeds.
    pub async fn update<P: Prober + ?Sized>(&mut self, prober: &P) -> Level {
        self.previous_level = self.level;
        let now = time::Instant::now().into_std();

        let within_debounce = self
            .last_check
            .is_some_and(|checked| now.duration_since(checked) < self.policy.debounce);
        if within_debounce {
            let present = self.probe_level(prober, Level::DevicePresent).await;
            if present {
                if self.level == Level::Offline {
                    // Device just appeared; its ip is recorded but the full
                    // chain waits for the next elapsed check.
                    self.level = Level::DevicePresent;
                }
            } else if self.level > Level::Offline {
                self.level = Level::Offline;
            }
            return self.level;
        }

        self.last_check = Some(now);
        let mut level = self.level;
        if self.probe_level(prober, level).await {
            if level == Level::Offline {
                level = Level::DevicePresent;
            }
            while level < Level::FullAccess {
                let next = level.promote();
                if !self.probe_level(prober, next).await {
                    break;
                }
                level = next;
            }
        } else {
            loop {
                if level <= Level::DevicePresent {
                    level = Level::Offline;
                    break;
                }
                level = level.demote();
                if self.probe_level(prober, level).await {
                    break;
                }
            }
        }
        self.level = level;
        self.level
    }

    /// Transition predicate: is connectivity at `level` currently provable?
    /// Probe errors count as a failed probe so a broken tool ratchets the
    /// interface down instead of aborting the tick.
    async fn probe_level<P: Prober + ?Sized>(&mut self, prober: &P, level: Level) -> bool {
        match level {
            Level::Offline | Level::DevicePresent => match prober.list_interfaces().await {
                Ok(interfaces) => {
                    let wanted = self.name.to_lowercase();
                    for (name, ip) in &interfaces {
                        if name.to_lowercase() == wanted {
                            self.ip = Some(ip.clone());
                            return true;
                        }
                    }
                    false
                }
                Err(e) => {
                    tracing::debug!(interface = %self.name, error = %e, "interface discovery failed");
                    false
                }
            },
            Level::DnsOnly => match self.ping_from_own_ip(prober, true).await {
                Some(report) => report.dns_resolved || report.any_received(),
                None => false,
            },
            Level::WhitelistedReachable => match self.ping_from_own_ip(prober, true).await {
                Some(report) => report.any_received(),
                None => false,
            },
            Level::FullAccess => match self.ping_from_own_ip(prober, false).await {
                Some(report) => report.any_received(),
                None => false,
            },
        }
    }

    async fn ping_from_own_ip<P: Prober + ?Sized>(
        &self,
        prober: &P,
        whitelisted: bool,
    ) -> Option<crate::models::PingReport> {
        let ip = self.ip.as_deref()?;
        let target = if whitelisted {
            &self.policy.whitelisted_target
        } else {
            &self.policy.not_whitelisted_target
        };
        match prober.ping(target, ip).await {
            Ok(report) => Some(report),
            Err(e) => {
                tracing::debug!(interface = %self.name, target = %target, error = %e, "ping failed");
                None
            }
        }
    }
}

use std::collections::BTreeMap;

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub dispatcher: DispatcherConfig,
    pub probing: ProbingConfig,
    pub monitoring: MonitoringConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DispatcherConfig {
    /// Path to the dispatch executable; also the interface discovery tool.
    pub executable: String,
    /// Interface name -> dispatch weight. May be empty, in which case the
    /// dispatcher never starts until the configuration is corrected.
    #[serde(default)]
    pub interfaces: BTreeMap<String, u32>,
    /// Seconds `start` waits before declaring a spawn healthy.
    #[serde(default = "default_spawn_settle_secs")]
    pub spawn_settle_secs: u64,
    /// Grace period before a stop escalates to a forced kill.
    #[serde(default = "default_stop_grace_secs")]
    pub stop_grace_secs: u64,
    /// Whether the dispatcher is meant to run as soon as interfaces qualify,
    /// without waiting for a start command.
    #[serde(default = "default_autostart")]
    pub autostart: bool,
}

fn default_spawn_settle_secs() -> u64 {
    2
}

fn default_stop_grace_secs() -> u64 {
    10
}

fn default_autostart() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProbingConfig {
    /// Reachable even on filtered networks.
    pub whitelisted_target: String,
    /// Only reachable with unrestricted access.
    pub not_whitelisted_target: String,
    #[serde(default = "default_ping_count")]
    pub ping_count: u32,
    /// Window during which only the cheap presence check runs.
    #[serde(default = "default_debounce_secs")]
    pub debounce_secs: u64,
}

fn default_ping_count() -> u32 {
    4
}

fn default_debounce_secs() -> u64 {
    30
}

#[derive(Debug, Clone, Deserialize)]
pub struct MonitoringConfig {
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
    /// Max number of events kept in the broadcast channel for presentation
    /// consumers (slow consumers may lag).
    #[serde(default = "default_broadcast_capacity")]
    pub broadcast_capacity: usize,
    /// How often to log app stats at INFO level.
    #[serde(default = "default_stats_log_interval_secs")]
    pub stats_log_interval_secs: u64,
}

fn default_tick_interval_ms() -> u64 {
    1000
}

fn default_broadcast_capacity() -> usize {
    64
}

fn default_stats_log_interval_secs() -> u64 {
    60
}

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        let path = std::env::var("CONFIG_FILE").unwrap_or_else(|_| "config.toml".into());
        let s = std::fs::read_to_string(&path)?;
        Self::load_from_str(&s)
    }

    /// Parse and validate config from a string (e.g. for tests).
    pub fn load_from_str(s: &str) -> anyhow::Result<Self> {
        let config: AppConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            !self.dispatcher.executable.is_empty(),
            "dispatcher.executable must be non-empty"
        );
        anyhow::ensure!(
            !self.probing.whitelisted_target.is_empty(),
            "probing.whitelisted_target must be non-empty"
        );
        anyhow::ensure!(
            !self.probing.not_whitelisted_target.is_empty(),
            "probing.not_whitelisted_target must be non-empty"
        );
        anyhow::ensure!(
            self.probing.ping_count > 0,
            "probing.ping_count must be > 0, got {}",
            self.probing.ping_count
        );
        anyhow::ensure!(
            self.monitoring.tick_interval_ms > 0,
            "monitoring.tick_interval_ms must be > 0, got {}",
            self.monitoring.tick_interval_ms
        );
        anyhow::ensure!(
            self.monitoring.broadcast_capacity > 0,
            "monitoring.broadcast_capacity must be > 0, got {}",
            self.monitoring.broadcast_capacity
        );
        anyhow::ensure!(
            self.monitoring.stats_log_interval_secs > 0,
            "monitoring.stats_log_interval_secs must be > 0, got {}",
            self.monitoring.stats_log_interval_secs
        );
        Ok(())
    }
}

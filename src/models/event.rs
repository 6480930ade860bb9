// Events and commands exchanged with presentation consumers

use serde::{Deserialize, Serialize};

use super::Level;

/// Per-interface state as of the last tick, for presentation consumers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterfaceSnapshot {
    pub name: String,
    pub ip: Option<String>,
    pub level: Level,
    pub weight: u32,
    pub status: String,
    pub color: String,
}

/// Emitted by the monitor loop over the broadcast channel. Consumers drain
/// on their own schedule; the loop never blocks on them.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum MonitorEvent {
    InterfacesUpdated { interfaces: Vec<InterfaceSnapshot> },
    LevelsChanged,
    LogLine { text: String },
    DispatcherStopped,
}

/// Accepted from presentation consumers, marshaled onto the loop task via
/// its command queue so all dispatcher mutation stays on one task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatcherCommand {
    Start,
    Stop,
}

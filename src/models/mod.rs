// Domain models

mod event;
mod level;
mod ping;

pub use event::{DispatcherCommand, InterfaceSnapshot, MonitorEvent};
pub use level::Level;
pub use ping::{PacketCounts, PingReport, RoundTrip};

// Parsed ping transcript

/// Sent/received/lost counters from the ping summary line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacketCounts {
    pub sent: u64,
    pub received: u64,
    pub lost: u64,
}

/// Min/avg/max round-trip milliseconds from the ping summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoundTrip {
    pub min_ms: u64,
    pub avg_ms: u64,
    pub max_ms: u64,
}

/// One ping invocation's parsed output. Absent fields mean the
/// corresponding line was missing or written in an unrecognized locale;
/// downstream treats an all-absent report as a failed probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PingReport {
    pub dns_resolved: bool,
    pub packets: Option<PacketCounts>,
    pub round_trip: Option<RoundTrip>,
}

impl PingReport {
    /// The degradation value for command failure or unparsable output.
    pub fn unparsed() -> Self {
        Self {
            dns_resolved: false,
            packets: None,
            round_trip: None,
        }
    }

    /// True when at least one probe packet came back.
    pub fn any_received(&self) -> bool {
        self.packets.is_some_and(|p| p.received > 0)
    }
}

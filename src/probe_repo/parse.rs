// Parsing of discovery-table and ping transcripts

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::models::{PacketCounts, PingReport, RoundTrip};

static ANSI_ESCAPES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\x1b\[[0-9;]*m").expect("static regex"));

/// Box-drawing characters that mark divider rows in the discovery table.
const DIVIDER_CHARS: &[char] = &['═', '╦', '╩', '╬', '╠', '╣', '╔', '╗', '╚', '╝'];

pub fn strip_ansi(text: &str) -> String {
    ANSI_ESCAPES.replace_all(text, "").into_owned()
}

/// Parses the bordered table printed by `<discovery-tool> list`. Data rows
/// have the form `║ name ║ ip ║ …`. Divider rows consist of box-drawing
/// characters and are skipped, as is any row whose second field does not
/// look like an address (no dot or colon). The first ip seen per name wins.
pub fn parse_interface_table(text: &str) -> BTreeMap<String, String> {
    let text = strip_ansi(text);
    let mut interfaces = BTreeMap::new();
    for line in text.lines() {
        if !line.contains('║') {
            continue;
        }
        let parts: Vec<&str> = line.split('║').collect();
        if parts.len() < 3 {
            continue;
        }
        let name = parts[1].trim();
        let ip = parts[2].trim();
        if name.is_empty() || ip.is_empty() || name.contains(DIVIDER_CHARS) {
            continue;
        }
        if !ip.contains('.') && !ip.contains(':') {
            continue;
        }
        interfaces
            .entry(name.to_string())
            .or_insert_with(|| ip.to_string());
    }
    interfaces
}

/// Parses a ping transcript. Recognized lines: the `Pinging <target> [addr]`
/// resolution header, the `Packets:` counter summary, and the round-trip
/// summary in its English ("Minimum") or Russian ("Минимальное") phrasing.
/// Unrecognized content leaves the corresponding fields absent.
pub fn parse_ping_output(target: &str, text: &str) -> PingReport {
    let mut report = PingReport::unparsed();
    let resolved_prefix = format!("Pinging {target} [");
    for line in text.lines() {
        if line.contains("Packets:") {
            let runs = integer_runs(line);
            if runs.len() >= 3 {
                report.packets = Some(PacketCounts {
                    sent: runs[0],
                    received: runs[1],
                    lost: runs[2],
                });
            }
        } else if line.contains("Pinging") {
            // A bracketed address after the literal target means resolution
            // succeeded; a bare-ip header has no brackets.
            report.dns_resolved = line.trim_start().starts_with(&resolved_prefix);
        } else if line.contains("Minimum") || line.contains("Минимальное") {
            let runs = integer_runs(line);
            if runs.len() >= 3 {
                // Line order on the platform is Minimum, Maximum, Average.
                report.round_trip = Some(RoundTrip {
                    min_ms: runs[0],
                    avg_ms: runs[2],
                    max_ms: runs[1],
                });
            }
        }
    }
    report
}

/// Maximal runs of ASCII digits in the line, in order of appearance.
fn integer_runs(line: &str) -> Vec<u64> {
    let mut runs = Vec::new();
    let mut current = String::new();
    for ch in line.chars() {
        if ch.is_ascii_digit() {
            current.push(ch);
        } else if !current.is_empty() {
            if let Ok(value) = current.parse() {
                runs.push(value);
            }
            current.clear();
        }
    }
    if !current.is_empty()
        && let Ok(value) = current.parse()
    {
        runs.push(value);
    }
    runs
}

#[cfg(test)]
mod tests {
    use super::*;

    const LIST_OUTPUT: &str = "\
╔═══════════════════╦══════════════════╗
║ Interface         ║ IP Address       ║
╠═══════════════════╬══════════════════╣
║ Ethernet          ║ 192.168.1.10     ║
║ Wi-Fi             ║ 10.0.0.23        ║
╠═══════════════════╬══════════════════╣
║ Loopback          ║ 127.0.0.1        ║
╚═══════════════════╩══════════════════╝
";

    const PING_OUTPUT_EN: &str = "\
Pinging google.com [142.250.186.78] with 32 bytes of data:
Reply from 142.250.186.78: bytes=32 time=20ms TTL=115
Reply from 142.250.186.78: bytes=32 time=24ms TTL=115

Ping statistics for 142.250.186.78:
    Packets: Sent = 4, Received = 4, Lost = 0 (0% loss),
Approximate round trip times in milli-seconds:
    Minimum = 19ms, Maximum = 24ms, Average = 21ms
";

    #[test]
    fn strip_ansi_removes_color_codes() {
        let colored = "\x1b[32m║ Ethernet ║\x1b[0m";
        assert_eq!(strip_ansi(colored), "║ Ethernet ║");
    }

    #[test]
    fn table_parses_rows_and_skips_dividers() {
        let interfaces = parse_interface_table(LIST_OUTPUT);
        assert_eq!(interfaces.len(), 3);
        assert_eq!(interfaces["Ethernet"], "192.168.1.10");
        assert_eq!(interfaces["Wi-Fi"], "10.0.0.23");
        assert_eq!(interfaces["Loopback"], "127.0.0.1");
    }

    #[test]
    fn table_skips_header_row_without_address() {
        let interfaces = parse_interface_table(LIST_OUTPUT);
        assert!(!interfaces.contains_key("Interface"));
    }

    #[test]
    fn table_parses_colored_output() {
        let colored = LIST_OUTPUT.replace("Ethernet", "\x1b[36mEthernet\x1b[0m");
        let interfaces = parse_interface_table(&colored);
        assert_eq!(interfaces["Ethernet"], "192.168.1.10");
    }

    #[test]
    fn table_keeps_first_ip_per_interface() {
        let doubled = "\
║ Ethernet ║ 192.168.1.10 ║
║ Ethernet ║ fe80::1      ║
";
        let interfaces = parse_interface_table(doubled);
        assert_eq!(interfaces["Ethernet"], "192.168.1.10");
    }

    #[test]
    fn table_accepts_ipv6_values() {
        let row = "║ Tunnel ║ fe80::ab12 ║";
        let interfaces = parse_interface_table(row);
        assert_eq!(interfaces["Tunnel"], "fe80::ab12");
    }

    #[test]
    fn ping_parses_english_transcript() {
        let report = parse_ping_output("google.com", PING_OUTPUT_EN);
        assert!(report.dns_resolved);
        assert_eq!(
            report.packets,
            Some(PacketCounts {
                sent: 4,
                received: 4,
                lost: 0
            })
        );
        assert_eq!(
            report.round_trip,
            Some(RoundTrip {
                min_ms: 19,
                avg_ms: 21,
                max_ms: 24
            })
        );
    }

    #[test]
    fn ping_parses_russian_round_trip_line() {
        let text = "    Минимальное = 18мсек, Максимальное = 25 мсек, Среднее = 21 мсек\n";
        let report = parse_ping_output("ya.ru", text);
        assert_eq!(
            report.round_trip,
            Some(RoundTrip {
                min_ms: 18,
                avg_ms: 21,
                max_ms: 25
            })
        );
        assert!(report.packets.is_none());
    }

    #[test]
    fn ping_header_without_brackets_means_unresolved() {
        let text = "Pinging 192.168.1.1 with 32 bytes of data:\n";
        let report = parse_ping_output("192.168.1.1", text);
        assert!(!report.dns_resolved);
    }

    #[test]
    fn ping_header_for_other_target_means_unresolved() {
        let report = parse_ping_output("other.example", PING_OUTPUT_EN);
        assert!(!report.dns_resolved);
    }

    #[test]
    fn ping_garbage_degrades_to_absent_fields() {
        let report = parse_ping_output("google.com", "no route to host\nwhatsoever\n");
        assert_eq!(report, PingReport::unparsed());
    }

    #[test]
    fn ping_empty_output_degrades_to_absent_fields() {
        let report = parse_ping_output("google.com", "");
        assert_eq!(report, PingReport::unparsed());
    }
}

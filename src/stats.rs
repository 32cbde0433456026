use std::net::Ipv4Addr;
use std::time::Duration;

use crate::icmp::ProbeOutcome;
use crate::ping::EchoReport;
use crate::trace::HopRecord;
use crate::utils::format_time;

#[derive(Debug, Clone, Default)]
pub struct PingStatistics {
    pub packets_sent: u32,
    pub packets_received: u32,
    pub packets_lost: u32,
    pub min_time: Option<Duration>,
    pub max_time: Duration,
    pub total_time: Duration,
}

impl PingStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Only a matched reply counts as received.
    pub fn record(&mut self, outcome: &ProbeOutcome) {
        self.packets_sent += 1;

        match outcome {
            ProbeOutcome::Matched { rtt, .. } => {
                self.packets_received += 1;
                self.total_time += *rtt;
                self.min_time = Some(self.min_time.map_or(*rtt, |min| min.min(*rtt)));
                self.max_time = self.max_time.max(*rtt);
            }
            _ => self.packets_lost += 1,
        }
    }

    pub fn loss_percentage(&self) -> f64 {
        if self.packets_sent == 0 {
            return 0.0;
        }
        (self.packets_lost as f64 / self.packets_sent as f64) * 100.0
    }

    pub fn average_time(&self) -> Duration {
        if self.packets_received == 0 {
            return Duration::ZERO;
        }
        self.total_time / self.packets_received
    }

    pub fn format_summary(&self, target: Ipv4Addr) -> String {
        let mut summary = format!(
            "\nPing statistics for {}:\n    Packets: Sent = {}, Received = {}, Lost = {} ({:.0}% loss),\n",
            target,
            self.packets_sent,
            self.packets_received,
            self.packets_lost,
            self.loss_percentage()
        );

        if self.packets_received > 0 {
            summary.push_str(&format!(
                "Approximate round trip times in milli-seconds:\n    Minimum = {}, Maximum = {}, Average = {}\n",
                format_time(self.min_time.unwrap_or_default()),
                format_time(self.max_time),
                format_time(self.average_time())
            ));
        }

        summary
    }
}

fn format_address(address: Ipv4Addr, resolved_name: Option<&str>) -> String {
    match resolved_name {
        Some(name) => format!("{} [{}]", name, address),
        None => address.to_string(),
    }
}

pub fn format_ping_header(target: &str, resolved_ip: Ipv4Addr, payload_size: usize) -> String {
    if target == resolved_ip.to_string() {
        format!("Pinging {} with {} bytes of data:", target, payload_size)
    } else {
        format!("Pinging {} [{}] with {} bytes of data:", target, resolved_ip, payload_size)
    }
}

pub fn format_reply(report: &EchoReport, resolved_name: Option<&str>) -> String {
    format!(
        "Reply from {}: {}",
        format_address(report.source, resolved_name),
        report.outcome
    )
}

pub fn format_trace_header(target: &str, resolved_ip: Ipv4Addr, max_hops: u8) -> String {
    format!(
        "Tracing route to {} [{}]\nover a maximum of {} hops:\n",
        target, resolved_ip, max_hops
    )
}

/// One traceroute row: hop index, a column per attempt, then the responder.
pub fn format_hop(hop: &HopRecord, resolved_name: Option<&str>) -> String {
    let mut line = format!("{:>2}", hop.hop);

    for attempt in &hop.attempts {
        let column = match attempt {
            ProbeOutcome::TimedOut => "*".to_string(),
            other => match other.rtt() {
                Some(rtt) => format!("{} ms", rtt.as_millis()),
                None => String::new(),
            },
        };
        line.push_str(&format!("{:>10}", column));
    }

    match hop.responder {
        Some(address) if !hop.is_timed_out() => {
            line.push_str(&format!("  {}", format_address(address, resolved_name)));
        }
        _ => line.push_str("  Request timed out."),
    }

    line
}

pub mod checksum;
pub mod packet;
pub mod socket;
pub mod transport;

pub use packet::*;
pub use socket::*;
pub use transport::*;

use std::time::Duration;

/// Result of one request/reply attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    Matched {
        rtt: Duration,
        ttl: u8,
        reply_size: usize,
    },
    IdentityMismatch,
    ChecksumInvalid,
    /// The transport failed to deliver a reply. Covers both a receive
    /// timeout and a destination-unreachable signalled by the transport.
    Unreachable,
    TimedOut,
    /// A datagram arrived whose ICMP type is neither Echo Reply nor
    /// Time Exceeded; no response time is recorded for it.
    Unclassified { icmp_type: Option<u8> },
}

impl ProbeOutcome {
    pub fn rtt(&self) -> Option<Duration> {
        match self {
            ProbeOutcome::Matched { rtt, .. } => Some(*rtt),
            _ => None,
        }
    }

    pub fn is_matched(&self) -> bool {
        matches!(self, ProbeOutcome::Matched { .. })
    }

    pub fn is_timed_out(&self) -> bool {
        matches!(self, ProbeOutcome::TimedOut)
    }
}

impl std::fmt::Display for ProbeOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProbeOutcome::Matched { rtt, ttl, reply_size } => write!(
                f,
                "bytes={} time={} TTL={}",
                reply_size,
                crate::utils::format_time(*rtt),
                ttl
            ),
            ProbeOutcome::IdentityMismatch => write!(f, "wrong identifier or sequence number"),
            ProbeOutcome::ChecksumInvalid => write!(f, "INCORRECT CHECKSUM"),
            ProbeOutcome::Unreachable => write!(f, "Destination host unreachable."),
            ProbeOutcome::TimedOut => write!(f, "Request timed out."),
            ProbeOutcome::Unclassified { icmp_type: Some(t) } => write!(f, "unexpected ICMP type {}", t),
            ProbeOutcome::Unclassified { icmp_type: None } => write!(f, "unrecognized reply"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_display() {
        let matched = ProbeOutcome::Matched {
            rtt: Duration::from_micros(15_700),
            ttl: 64,
            reply_size: 32,
        };
        assert_eq!(matched.to_string(), "bytes=32 time=15ms TTL=64");
        assert_eq!(ProbeOutcome::ChecksumInvalid.to_string(), "INCORRECT CHECKSUM");
        assert_eq!(ProbeOutcome::Unreachable.to_string(), "Destination host unreachable.");
    }

    #[test]
    fn test_outcome_accessors() {
        let matched = ProbeOutcome::Matched {
            rtt: Duration::from_millis(3),
            ttl: 1,
            reply_size: 0,
        };
        assert_eq!(matched.rtt(), Some(Duration::from_millis(3)));
        assert!(matched.is_matched());
        assert!(ProbeOutcome::TimedOut.is_timed_out());
        assert_eq!(ProbeOutcome::Unclassified { icmp_type: Some(3) }.rtt(), None);
    }
}

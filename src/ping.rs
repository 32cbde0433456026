//! Echo request/reply exchange driving the `ping` subcommand.

use std::net::Ipv4Addr;
use std::time::{Duration, Instant};

use crate::icmp::{self, DecodeError, ICMP_HEADER_SIZE, IP_HEADER_SIZE, ProbeOutcome, Transport, TransportError};

/// Smallest receive buffer; grown to fit the configured payload.
const MIN_RECEIVE_BUFFER_SIZE: usize = 1024;

#[derive(Debug, Clone)]
pub struct PingConfig {
    /// Echo identifier, constant for the whole session.
    pub identifier: u16,
    pub count: u32,
    pub payload_size: usize,
    pub fill: u8,
    pub timeout: Duration,
    /// Minimum spacing between the start of consecutive probes.
    pub interval: Duration,
    pub ttl: Option<u8>,
}

impl Default for PingConfig {
    fn default() -> Self {
        Self {
            identifier: 1,
            count: 4,
            payload_size: 32,
            fill: b'0',
            timeout: Duration::from_millis(1000),
            interval: Duration::from_secs(1),
            ttl: None,
        }
    }
}

/// One classified ping attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EchoReport {
    pub sequence: u16,
    /// Sender of the reply, or the destination when nothing arrived.
    pub source: Ipv4Addr,
    pub outcome: ProbeOutcome,
}

pub struct EchoSession<T: Transport> {
    transport: T,
    destination: Ipv4Addr,
    config: PingConfig,
    payload: Vec<u8>,
}

impl<T: Transport> EchoSession<T> {
    pub fn new(mut transport: T, destination: Ipv4Addr, config: PingConfig) -> Result<Self, TransportError> {
        transport.set_receive_timeout(config.timeout)?;
        if let Some(ttl) = config.ttl {
            transport.set_ttl(ttl)?;
        }

        let payload = vec![config.fill; config.payload_size];
        Ok(Self {
            transport,
            destination,
            config,
            payload,
        })
    }

    /// Large enough for an Echo Reply carrying the whole request payload.
    fn receive_buffer_size(&self) -> usize {
        (IP_HEADER_SIZE + ICMP_HEADER_SIZE + self.config.payload_size).max(MIN_RECEIVE_BUFFER_SIZE)
    }

    /// Send one Echo Request and classify whatever comes back.
    pub fn probe(&mut self, sequence: u16) -> EchoReport {
        let request = icmp::encode_echo_request(self.config.identifier, sequence, &self.payload);
        let mut reply = vec![0u8; self.receive_buffer_size()];

        let started = Instant::now();
        let received = self
            .transport
            .send(self.destination, &request)
            .and_then(|()| self.transport.receive(&mut reply));

        let (received, source) = match received {
            Ok(received) => received,
            Err(e) => {
                log::debug!("seq={} transport failure: {}", sequence, e);
                return EchoReport {
                    sequence,
                    source: self.destination,
                    outcome: ProbeOutcome::Unreachable,
                };
            }
        };
        let rtt = started.elapsed();

        let datagram = &reply[..received];
        let outcome = match icmp::decode(datagram, IP_HEADER_SIZE) {
            Err(DecodeError::ChecksumInvalid) => ProbeOutcome::ChecksumInvalid,
            Err(e @ DecodeError::Truncated { .. }) => {
                log::debug!("seq={} {}", sequence, e);
                ProbeOutcome::ChecksumInvalid
            }
            Ok(packet) if packet.identifier() != self.config.identifier || packet.sequence() != sequence => {
                log::debug!(
                    "seq={} reply type={} code={} carries id={} seq={}",
                    sequence,
                    packet.icmp_type(),
                    packet.code(),
                    packet.identifier(),
                    packet.sequence()
                );
                ProbeOutcome::IdentityMismatch
            }
            Ok(_) => ProbeOutcome::Matched {
                rtt,
                ttl: icmp::ip_ttl(datagram).unwrap_or_default(),
                reply_size: received.saturating_sub(IP_HEADER_SIZE + ICMP_HEADER_SIZE),
            },
        };

        EchoReport {
            sequence,
            source,
            outcome,
        }
    }

    /// Run `count` probes, handing each report to `on_report` as it completes.
    pub fn run<F>(&mut self, mut on_report: F)
    where
        F: FnMut(&EchoReport),
    {
        for attempt in 0..self.config.count {
            let started = Instant::now();
            // Sequence numbers wrap past 65535 on long runs.
            let report = self.probe(attempt as u16);
            on_report(&report);

            let elapsed = started.elapsed();
            if attempt + 1 < self.config.count && elapsed < self.config.interval {
                std::thread::sleep(self.config.interval - elapsed);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::icmp::mock::{MockTransport, echo_reply, ipv4_datagram};

    const TARGET: Ipv4Addr = Ipv4Addr::new(192, 0, 2, 1);

    fn fast_config() -> PingConfig {
        PingConfig {
            interval: Duration::ZERO,
            ..PingConfig::default()
        }
    }

    #[test]
    fn test_matched_reply() {
        let payload = [b'0'; 32];
        let datagram = echo_reply(1, 0, &payload, 64);
        let received = datagram.len();
        let mut transport = MockTransport::new().reply(datagram, TARGET);

        let mut session = EchoSession::new(&mut transport, TARGET, fast_config()).unwrap();
        let report = session.probe(0);

        assert_eq!(report.source, TARGET);
        match report.outcome {
            ProbeOutcome::Matched { ttl, reply_size, .. } => {
                assert_eq!(ttl, 64);
                assert_eq!(reply_size, received - 28);
                assert_eq!(reply_size, 32);
            }
            other => panic!("unexpected outcome {:?}", other),
        }
    }

    #[test]
    fn test_request_on_the_wire() {
        let mut transport = MockTransport::new().timeout();
        let mut session = EchoSession::new(&mut transport, TARGET, fast_config()).unwrap();
        session.probe(3);

        assert_eq!(transport.timeouts, vec![Duration::from_millis(1000)]);
        let (destination, bytes) = &transport.sent[0];
        assert_eq!(*destination, TARGET);
        assert_eq!(bytes.len(), 8 + 32);
        let sent = icmp::decode(bytes, 0).unwrap();
        assert_eq!(sent.icmp_type(), icmp::ICMP_ECHO_REQUEST);
        assert_eq!(sent.identifier(), 1);
        assert_eq!(sent.sequence(), 3);
        assert!(sent.payload().iter().all(|&b| b == b'0'));
    }

    #[test]
    fn test_timeout_is_unreachable() {
        let mut transport = MockTransport::new().timeout();
        let mut session = EchoSession::new(&mut transport, TARGET, fast_config()).unwrap();

        let report = session.probe(0);
        assert_eq!(report.outcome, ProbeOutcome::Unreachable);
        assert_eq!(report.source, TARGET);
    }

    #[test]
    fn test_send_failure_is_unreachable() {
        let mut transport = MockTransport::new().reply(echo_reply(1, 0, &[b'0'; 32], 64), TARGET);
        transport.fail_send = true;
        let mut session = EchoSession::new(&mut transport, TARGET, fast_config()).unwrap();

        assert_eq!(session.probe(0).outcome, ProbeOutcome::Unreachable);
        // No receive attempted after the failed send.
        assert_eq!(transport.remaining(), 1);
    }

    #[test]
    fn test_large_payload_fits_receive_buffer() {
        let config = PingConfig {
            payload_size: 2000,
            ..fast_config()
        };
        let mut transport = MockTransport::new().reply(echo_reply(1, 0, &[b'0'; 2000], 64), TARGET);
        let mut session = EchoSession::new(&mut transport, TARGET, config).unwrap();

        match session.probe(0).outcome {
            ProbeOutcome::Matched { reply_size, ttl, .. } => {
                assert_eq!(reply_size, 2000);
                assert_eq!(ttl, 64);
            }
            other => panic!("unexpected outcome {:?}", other),
        }
    }

    #[test]
    fn test_reply_larger_than_buffer_is_rejected() {
        // Default buffer holds 1024 bytes; the rest of the datagram is dropped.
        let mut transport = MockTransport::new().reply(echo_reply(1, 0, &[b'0'; 1500], 64), TARGET);
        let mut session = EchoSession::new(&mut transport, TARGET, fast_config()).unwrap();

        assert_eq!(session.probe(0).outcome, ProbeOutcome::ChecksumInvalid);
    }

    #[test]
    fn test_identity_mismatch() {
        let mut transport = MockTransport::new()
            .reply(echo_reply(2, 0, &[b'0'; 32], 64), TARGET)
            .reply(echo_reply(1, 5, &[b'0'; 32], 64), TARGET);
        let mut session = EchoSession::new(&mut transport, TARGET, fast_config()).unwrap();

        assert_eq!(session.probe(0).outcome, ProbeOutcome::IdentityMismatch);
        assert_eq!(session.probe(0).outcome, ProbeOutcome::IdentityMismatch);
    }

    #[test]
    fn test_corrupted_reply() {
        let mut datagram = echo_reply(1, 0, &[b'0'; 32], 64);
        datagram[40] ^= 0x10;
        let mut transport = MockTransport::new()
            .reply(datagram, TARGET)
            .reply(ipv4_datagram(&[0, 0, 0], 64), TARGET);
        let mut session = EchoSession::new(&mut transport, TARGET, fast_config()).unwrap();

        assert_eq!(session.probe(0).outcome, ProbeOutcome::ChecksumInvalid);
        assert_eq!(session.probe(1).outcome, ProbeOutcome::ChecksumInvalid);
    }

    #[test]
    fn test_run_reports_every_attempt() {
        let payload = [b'0'; 32];
        let mut transport = MockTransport::new()
            .reply(echo_reply(1, 0, &payload, 57), TARGET)
            .timeout()
            .reply(echo_reply(1, 9, &payload, 57), TARGET)
            .reply(echo_reply(1, 3, &payload, 57), TARGET);
        let mut session = EchoSession::new(&mut transport, TARGET, fast_config()).unwrap();

        let mut reports = Vec::new();
        session.run(|report| reports.push(report.clone()));

        let sequences: Vec<u16> = reports.iter().map(|r| r.sequence).collect();
        assert_eq!(sequences, vec![0, 1, 2, 3]);
        assert!(reports[0].outcome.is_matched());
        assert_eq!(reports[1].outcome, ProbeOutcome::Unreachable);
        assert_eq!(reports[2].outcome, ProbeOutcome::IdentityMismatch);
        assert!(reports[3].outcome.is_matched());
        assert_eq!(transport.sent.len(), 4);
    }

    #[test]
    fn test_pacing_spaces_probes() {
        let config = PingConfig {
            count: 3,
            interval: Duration::from_millis(30),
            ..PingConfig::default()
        };
        let mut transport = MockTransport::new();
        let mut session = EchoSession::new(&mut transport, TARGET, config).unwrap();

        let started = Instant::now();
        session.run(|_| {});
        // Two gaps, none after the last probe.
        assert!(started.elapsed() >= Duration::from_millis(60));
    }

    #[test]
    fn test_configured_ttl_is_applied() {
        let config = PingConfig {
            ttl: Some(12),
            ..fast_config()
        };
        let mut transport = MockTransport::new();
        EchoSession::new(&mut transport, TARGET, config).unwrap();
        assert_eq!(transport.ttls, vec![12]);
    }
}

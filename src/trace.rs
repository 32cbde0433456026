//! TTL sweep driving the `traceroute` subcommand.

use std::net::Ipv4Addr;
use std::time::{Duration, Instant};

use crate::icmp::{
    self, ICMP_ECHO_REPLY, ICMP_HEADER_SIZE, ICMP_TIME_EXCEEDED, IP_HEADER_SIZE, IcmpPacket, ProbeOutcome, Transport,
    TransportError,
};

const PROBE_SIZE: usize = 64;
const RECEIVE_BUFFER_SIZE: usize = 512;

#[derive(Debug, Clone)]
pub struct TraceConfig {
    pub max_hops: u8,
    pub attempts_per_hop: u32,
    pub timeout: Duration,
}

impl Default for TraceConfig {
    fn default() -> Self {
        Self {
            max_hops: 30,
            attempts_per_hop: 3,
            timeout: Duration::from_millis(3000),
        }
    }
}

/// One traceroute row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HopRecord {
    pub hop: u32,
    pub attempts: Vec<ProbeOutcome>,
    pub reached: bool,
    /// Last address that answered during this hop.
    pub responder: Option<Ipv4Addr>,
}

impl HopRecord {
    fn new(hop: u32) -> Self {
        Self {
            hop,
            attempts: Vec::new(),
            reached: false,
            responder: None,
        }
    }

    /// Number of attempts that got no answer.
    pub fn timeouts(&self) -> usize {
        self.attempts.iter().filter(|a| a.is_timed_out()).count()
    }

    pub fn is_timed_out(&self) -> bool {
        !self.attempts.is_empty() && self.timeouts() == self.attempts.len()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SweepResult {
    pub reached: bool,
    pub hops: u32,
}

/// The fixed Echo Request sent at every hop: type 8, all other bytes zero
/// apart from the checksum (`F7 FF`).
pub fn probe_packet() -> Vec<u8> {
    IcmpPacket::echo_request(0, 0, &[0u8; PROBE_SIZE - ICMP_HEADER_SIZE]).to_bytes()
}

pub struct HopDiscovery<T: Transport> {
    transport: T,
    destination: Ipv4Addr,
    config: TraceConfig,
    probe: Vec<u8>,
}

impl<T: Transport> HopDiscovery<T> {
    pub fn new(mut transport: T, destination: Ipv4Addr, config: TraceConfig) -> Result<Self, TransportError> {
        transport.set_receive_timeout(config.timeout)?;
        Ok(Self {
            transport,
            destination,
            config,
            probe: probe_packet(),
        })
    }

    /// Probe a single TTL. Only a failure to configure the TTL is an error;
    /// per-attempt failures are recorded in the returned row.
    pub fn discover_hop(&mut self, ttl: u8) -> Result<HopRecord, TransportError> {
        self.transport.set_ttl(ttl)?;

        let mut record = HopRecord::new(ttl as u32);
        for attempt in 0..self.config.attempts_per_hop {
            let mut buffer = vec![0u8; RECEIVE_BUFFER_SIZE];
            let started = Instant::now();
            let received = self
                .transport
                .send(self.destination, &self.probe)
                .and_then(|()| self.transport.receive(&mut buffer));

            let (received, source) = match received {
                Ok(received) => received,
                Err(e) => {
                    log::debug!("ttl={} attempt={} {}", ttl, attempt, e);
                    record.attempts.push(ProbeOutcome::TimedOut);
                    continue;
                }
            };
            let rtt = started.elapsed();
            record.responder = Some(source);

            let datagram = &buffer[..received];
            let outcome = match icmp::icmp_type_of(datagram, IP_HEADER_SIZE) {
                Some(icmp_type @ (ICMP_ECHO_REPLY | ICMP_TIME_EXCEEDED)) => {
                    if icmp_type == ICMP_ECHO_REPLY {
                        record.reached = true;
                    }
                    ProbeOutcome::Matched {
                        rtt,
                        ttl: icmp::ip_ttl(datagram).unwrap_or_default(),
                        reply_size: received.saturating_sub(IP_HEADER_SIZE + ICMP_HEADER_SIZE),
                    }
                }
                icmp_type => {
                    log::warn!("ttl={} unexpected reply from {}: type {:?}", ttl, source, icmp_type);
                    ProbeOutcome::Unclassified { icmp_type }
                }
            };
            log::debug!("ttl={} attempt={} from {}: {}", ttl, attempt, source, outcome);
            record.attempts.push(outcome);
        }

        Ok(record)
    }

    /// Sweep TTL 1..=max_hops, handing each finished row to `on_hop`, and
    /// stop after the first hop where the destination answered.
    pub fn run<F>(&mut self, mut on_hop: F) -> Result<SweepResult, TransportError>
    where
        F: FnMut(&HopRecord),
    {
        let mut hops = 0;
        for ttl in 1..=self.config.max_hops {
            let record = self.discover_hop(ttl)?;
            hops += 1;
            on_hop(&record);

            if record.reached {
                return Ok(SweepResult { reached: true, hops });
            }
        }

        log::info!("{} not reached within {} hops", self.destination, self.config.max_hops);
        Ok(SweepResult { reached: false, hops })
    }
}

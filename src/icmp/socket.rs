use socket2::{Domain, Protocol, Socket, Type};
use std::mem::MaybeUninit;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::time::Duration;

use crate::icmp::{Transport, TransportError};

/// Raw ICMPv4 socket. Received datagrams carry the IPv4 header.
pub struct IcmpSocket {
    socket: Socket,
}

impl IcmpSocket {
    pub fn new() -> anyhow::Result<Self> {
        let socket = Socket::new(Domain::IPV4, Type::RAW, Some(Protocol::ICMPV4)).map_err(|e| {
            anyhow::anyhow!("Failed to create raw socket: {}. Administrator privileges may be required.", e)
        })?;

        socket.set_nonblocking(false)?;

        Ok(Self { socket })
    }

    /// Restrict the socket to datagrams from `target`.
    pub fn connect(&self, target: Ipv4Addr) -> anyhow::Result<()> {
        let addr = SocketAddr::V4(SocketAddrV4::new(target, 0));
        self.socket
            .connect(&addr.into())
            .map_err(|e| anyhow::anyhow!("Failed to connect raw socket to {}: {}", target, e))
    }
}

impl Transport for IcmpSocket {
    fn send(&mut self, destination: Ipv4Addr, bytes: &[u8]) -> Result<(), TransportError> {
        let addr = SocketAddr::V4(SocketAddrV4::new(destination, 0));
        log::debug!("Sending ICMP packet to {}: {} bytes", destination, bytes.len());
        self.socket.send_to(bytes, &addr.into())?;
        Ok(())
    }

    fn receive(&mut self, buffer: &mut [u8]) -> Result<(usize, Ipv4Addr), TransportError> {
        // SAFETY: recv_from only writes initialized bytes into the slice, and
        // `buffer` is already initialized, so viewing it as MaybeUninit is sound.
        let uninit = unsafe { &mut *(buffer as *mut [u8] as *mut [MaybeUninit<u8>]) };
        let (received, source) = self.socket.recv_from(uninit)?;

        let source = match source.as_socket_ipv4() {
            Some(addr) => *addr.ip(),
            None => Ipv4Addr::UNSPECIFIED,
        };
        log::debug!("Received {} bytes from {}", received, source);

        Ok((received, source))
    }

    fn set_ttl(&mut self, ttl: u8) -> Result<(), TransportError> {
        self.socket.set_ttl(ttl as u32)?;
        Ok(())
    }

    fn set_receive_timeout(&mut self, timeout: Duration) -> Result<(), TransportError> {
        self.socket.set_read_timeout(Some(timeout))?;
        Ok(())
    }
}

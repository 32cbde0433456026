use std::net::Ipv4Addr;
use std::time::Duration;

/// Failure at the datagram transport boundary.
#[derive(Debug)]
pub enum TransportError {
    /// Nothing arrived within the receive timeout.
    TimedOut,
    Io(std::io::Error),
}

impl std::fmt::Display for TransportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransportError::TimedOut => write!(f, "Request timed out"),
            TransportError::Io(e) => write!(f, "transport error: {}", e),
        }
    }
}

impl std::error::Error for TransportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TransportError::TimedOut => None,
            TransportError::Io(e) => Some(e),
        }
    }
}

impl From<std::io::Error> for TransportError {
    fn from(e: std::io::Error) -> Self {
        match e.kind() {
            std::io::ErrorKind::WouldBlock | std::io::ErrorKind::TimedOut => TransportError::TimedOut,
            _ => TransportError::Io(e),
        }
    }
}

/// A raw IPv4 datagram channel carrying ICMP.
///
/// Received datagrams include the IP header. `receive` blocks for at most
/// the timeout last passed to `set_receive_timeout`.
pub trait Transport {
    fn send(&mut self, destination: Ipv4Addr, bytes: &[u8]) -> Result<(), TransportError>;

    /// Returns the number of bytes written into `buffer` and the sender.
    fn receive(&mut self, buffer: &mut [u8]) -> Result<(usize, Ipv4Addr), TransportError>;

    fn set_ttl(&mut self, ttl: u8) -> Result<(), TransportError>;

    fn set_receive_timeout(&mut self, timeout: Duration) -> Result<(), TransportError>;
}

impl<T: Transport + ?Sized> Transport for &mut T {
    fn send(&mut self, destination: Ipv4Addr, bytes: &[u8]) -> Result<(), TransportError> {
        (**self).send(destination, bytes)
    }

    fn receive(&mut self, buffer: &mut [u8]) -> Result<(usize, Ipv4Addr), TransportError> {
        (**self).receive(buffer)
    }

    fn set_ttl(&mut self, ttl: u8) -> Result<(), TransportError> {
        (**self).set_ttl(ttl)
    }

    fn set_receive_timeout(&mut self, timeout: Duration) -> Result<(), TransportError> {
        (**self).set_receive_timeout(timeout)
    }
}

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{Cursor, Read};

use crate::icmp::checksum;

pub const ICMP_ECHO_REPLY: u8 = 0;
pub const ICMP_ECHO_REQUEST: u8 = 8;
pub const ICMP_TIME_EXCEEDED: u8 = 11;

pub const ICMP_HEADER_SIZE: usize = 8;
/// IPv4 header without options.
pub const IP_HEADER_SIZE: usize = 20;
/// Offset of the TTL byte inside the IPv4 header.
pub const IP_TTL_OFFSET: usize = 8;

/// Why a received datagram could not be decoded.
///
/// The ping output has no separate line for a short datagram: a `Truncated`
/// reply is printed as `INCORRECT CHECKSUM`, the same as `ChecksumInvalid`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    ChecksumInvalid,
    /// Fewer bytes than an IP header plus an ICMP header.
    Truncated { len: usize },
}

impl std::fmt::Display for DecodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DecodeError::ChecksumInvalid => write!(f, "ICMP checksum is invalid"),
            DecodeError::Truncated { len } => write!(f, "datagram too short: {} bytes", len),
        }
    }
}

impl std::error::Error for DecodeError {}

/// One ICMP message, header and payload, without the IP header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IcmpPacket {
    icmp_type: u8,
    code: u8,
    checksum: u16,
    identifier: u16,
    sequence: u16,
    payload: Vec<u8>,
}

impl IcmpPacket {
    pub fn new(icmp_type: u8, code: u8, identifier: u16, sequence: u16, payload: &[u8]) -> Self {
        let mut packet = Self {
            icmp_type,
            code,
            checksum: 0,
            identifier,
            sequence,
            payload: payload.to_vec(),
        };
        packet.checksum = checksum::compute(&packet.to_bytes());
        packet
    }

    pub fn echo_request(identifier: u16, sequence: u16, payload: &[u8]) -> Self {
        Self::new(ICMP_ECHO_REQUEST, 0, identifier, sequence, payload)
    }

    pub fn icmp_type(&self) -> u8 {
        self.icmp_type
    }

    pub fn code(&self) -> u8 {
        self.code
    }

    pub fn checksum(&self) -> u16 {
        self.checksum
    }

    pub fn identifier(&self) -> u16 {
        self.identifier
    }

    pub fn sequence(&self) -> u16 {
        self.sequence
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Size on the wire: header plus payload.
    pub fn wire_len(&self) -> usize {
        ICMP_HEADER_SIZE + self.payload.len()
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.wire_len());
        // Writes into a Vec cannot fail.
        let written = self.write_header(&mut bytes);
        debug_assert!(written.is_ok());
        bytes.extend_from_slice(&self.payload);
        bytes
    }

    fn write_header<W: WriteBytesExt>(&self, out: &mut W) -> std::io::Result<()> {
        out.write_u8(self.icmp_type)?;
        out.write_u8(self.code)?;
        out.write_u16::<LittleEndian>(self.checksum)?;
        out.write_u16::<LittleEndian>(self.identifier)?;
        out.write_u16::<LittleEndian>(self.sequence)?;
        Ok(())
    }

    /// Parse the ICMP message that follows `ip_header_len` bytes of IP header.
    pub fn from_bytes(buffer: &[u8], ip_header_len: usize) -> Result<Self, DecodeError> {
        if buffer.len() < ip_header_len + ICMP_HEADER_SIZE {
            return Err(DecodeError::Truncated { len: buffer.len() });
        }

        let icmp = &buffer[ip_header_len..];
        if !checksum::validate(icmp) {
            log::trace!("checksum self-check failed over {} bytes", icmp.len());
            return Err(DecodeError::ChecksumInvalid);
        }

        let truncated = |_| DecodeError::Truncated { len: buffer.len() };
        let mut cursor = Cursor::new(icmp);
        let icmp_type = cursor.read_u8().map_err(truncated)?;
        let code = cursor.read_u8().map_err(truncated)?;
        let checksum = cursor.read_u16::<LittleEndian>().map_err(truncated)?;
        let identifier = cursor.read_u16::<LittleEndian>().map_err(truncated)?;
        let sequence = cursor.read_u16::<LittleEndian>().map_err(truncated)?;

        let mut payload = Vec::new();
        cursor.read_to_end(&mut payload).map_err(truncated)?;

        Ok(Self {
            icmp_type,
            code,
            checksum,
            identifier,
            sequence,
            payload,
        })
    }
}

pub fn encode_echo_request(identifier: u16, sequence: u16, payload: &[u8]) -> Vec<u8> {
    IcmpPacket::echo_request(identifier, sequence, payload).to_bytes()
}

pub fn decode(buffer: &[u8], ip_header_len: usize) -> Result<IcmpPacket, DecodeError> {
    IcmpPacket::from_bytes(buffer, ip_header_len)
}

/// ICMP type byte of a raw datagram, read without checksum validation.
pub fn icmp_type_of(buffer: &[u8], ip_header_len: usize) -> Option<u8> {
    buffer.get(ip_header_len).copied()
}

/// TTL byte of the IPv4 header at the front of a raw datagram.
pub fn ip_ttl(buffer: &[u8]) -> Option<u8> {
    buffer.get(IP_TTL_OFFSET).copied()
}

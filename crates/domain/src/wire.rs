//! Fixed-layout pieces of the DNS wire format.

use crate::errors::DecodeError;

pub const HEADER_LEN: usize = 12;
/// `type:u16, class:u16` following a question name.
pub const QUERY_TRAILER_LEN: usize = 4;
/// `type:u16, class:u16, ttl:u32, rdlength:u16` following a record name.
pub const ANSWER_HEADER_LEN: usize = 10;
/// DNS-over-TCP length prefix.
pub const TCP_LENGTH_PREFIX_LEN: usize = 2;

const FLAG_QR: u16 = 0x8000;
const FLAG_AA: u16 = 0x0400;
const FLAG_TC: u16 = 0x0200;
const FLAG_RD: u16 = 0x0100;
const FLAG_RA: u16 = 0x0080;
const FLAG_Z: u16 = 0x0040;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WireHeader {
    pub tx_id: u16,
    pub flags: u16,
    pub questions: u16,
    pub answer_rr: u16,
    pub authority_rr: u16,
    pub additional_rr: u16,
}

impl WireHeader {
    pub fn parse(buf: &[u8]) -> Result<Self, DecodeError> {
        if buf.len() < HEADER_LEN {
            return Err(DecodeError::MalformedData(format!(
                "header needs {} bytes, got {}",
                HEADER_LEN,
                buf.len()
            )));
        }

        Ok(Self {
            tx_id: u16::from_be_bytes([buf[0], buf[1]]),
            flags: u16::from_be_bytes([buf[2], buf[3]]),
            questions: u16::from_be_bytes([buf[4], buf[5]]),
            answer_rr: u16::from_be_bytes([buf[6], buf[7]]),
            authority_rr: u16::from_be_bytes([buf[8], buf[9]]),
            additional_rr: u16::from_be_bytes([buf[10], buf[11]]),
        })
    }

    pub fn is_response(&self) -> bool {
        self.flags & FLAG_QR != 0
    }

    pub fn opcode(&self) -> Opcode {
        Opcode::from_u8(((self.flags >> 11) & 0x0F) as u8)
    }

    pub fn authoritative(&self) -> bool {
        self.flags & FLAG_AA != 0
    }

    pub fn truncated(&self) -> bool {
        self.flags & FLAG_TC != 0
    }

    pub fn recursion_desired(&self) -> bool {
        self.flags & FLAG_RD != 0
    }

    pub fn recursion_available(&self) -> bool {
        self.flags & FLAG_RA != 0
    }

    /// The reserved Z bit. Must be zero (RFC 1035 §4.1.1).
    pub fn z_flag(&self) -> bool {
        self.flags & FLAG_Z != 0
    }

    /// The 4-bit RCODE field; extended RCODE bits from OPT are not merged.
    pub fn rcode(&self) -> u8 {
        (self.flags & 0x000F) as u8
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
    Query,
    IQuery,
    Status,
    Notify,
    Update,
    Unassigned(u8),
}

impl Opcode {
    pub fn from_u8(code: u8) -> Self {
        match code {
            0 => Opcode::Query,
            1 => Opcode::IQuery,
            2 => Opcode::Status,
            4 => Opcode::Notify,
            5 => Opcode::Update,
            other => Opcode::Unassigned(other),
        }
    }

    pub fn to_u8(&self) -> u8 {
        match self {
            Opcode::Query => 0,
            Opcode::IQuery => 1,
            Opcode::Status => 2,
            Opcode::Notify => 4,
            Opcode::Update => 5,
            Opcode::Unassigned(code) => *code,
        }
    }

    pub fn is_supported(&self) -> bool {
        !matches!(self, Opcode::Unassigned(_))
    }
}

/// Reads a big-endian `u16` at `offset`, or `None` when it would run past `buf`.
#[inline]
pub fn read_u16(buf: &[u8], offset: usize) -> Option<u16> {
    let bytes = buf.get(offset..offset.checked_add(2)?)?;
    Some(u16::from_be_bytes([bytes[0], bytes[1]]))
}

#[inline]
pub fn read_u32(buf: &[u8], offset: usize) -> Option<u32> {
    let bytes = buf.get(offset..offset.checked_add(4)?)?;
    Some(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

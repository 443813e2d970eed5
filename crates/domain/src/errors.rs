use std::fmt;
use thiserror::Error;

use crate::decoder_event::DecoderEvent;

/// Which budget rejected an allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemcapScope {
    State,
    Global,
}

impl fmt::Display for MemcapScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MemcapScope::State => write!(f, "state"),
            MemcapScope::Global => write!(f, "global"),
        }
    }
}

/// Header-level inconsistencies found while validating a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Violation {
    NotARequest,
    NotAResponse,
    ZFlagSet,
    UnsupportedOpcode { opcode: u8, response: bool },
}

impl Violation {
    pub fn event(&self) -> DecoderEvent {
        match self {
            Violation::NotARequest => DecoderEvent::NotARequest,
            Violation::NotAResponse => DecoderEvent::NotAResponse,
            Violation::ZFlagSet => DecoderEvent::ZFlagSet,
            Violation::UnsupportedOpcode { response: false, .. } => DecoderEvent::NotARequest,
            Violation::UnsupportedOpcode { response: true, .. } => DecoderEvent::NotAResponse,
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::NotARequest => write!(f, "QR flag set on a to-server message"),
            Violation::NotAResponse => write!(f, "QR flag clear on a to-client message"),
            Violation::ZFlagSet => write!(f, "reserved Z flag set"),
            Violation::UnsupportedOpcode { opcode, .. } => {
                write!(f, "unsupported opcode {}", opcode)
            }
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("Malformed DNS data: {0}")]
    MalformedData(String),

    #[error("Protocol violation: {0}")]
    ProtocolViolation(Violation),

    #[error("Unsolicited response for transaction id {0:#06x}")]
    UnsolicitedResponse(u16),

    #[error("Request flood: {0} unreplied requests")]
    Flooded(u32),

    #[error("Memory cap reached ({0})")]
    MemcapReached(MemcapScope),
}

impl DecodeError {
    pub fn malformed(msg: impl Into<String>) -> Self {
        DecodeError::MalformedData(msg.into())
    }

    /// The decoder event recorded for this error.
    pub fn event(&self) -> DecoderEvent {
        match self {
            DecodeError::MalformedData(_) => DecoderEvent::MalformedData,
            DecodeError::ProtocolViolation(violation) => violation.event(),
            DecodeError::UnsolicitedResponse(_) => DecoderEvent::UnsolicitedResponse,
            DecodeError::Flooded(_) => DecoderEvent::Flooded,
            DecodeError::MemcapReached(_) => DecoderEvent::StateMemcapReached,
        }
    }
}

//! dnswatch domain layer: wire types, decoder events, errors and configuration.
pub mod config;
pub mod decoder_event;
pub mod dns_record;
pub mod errors;
pub mod transport;
pub mod wire;

pub use config::{CliOverrides, Config, DnsParserConfig};
pub use decoder_event::DecoderEvent;
pub use dns_record::{rcode_string, type_string, RecordSection, RecordType, ResponseCode};
pub use errors::{DecodeError, MemcapScope, Violation};
pub use transport::{Direction, Transport};
pub use wire::{Opcode, WireHeader};

//! dnswatch infrastructure: the passive DNS parser engine.
pub mod dns;

pub use dns::{DnsContext, DnsState, DnsTransaction, ParseOutcome, TcpOutcome};

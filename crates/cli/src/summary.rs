use dnswatch_domain::{rcode_string, type_string, RecordType};
use dnswatch_infrastructure::dns::{AnswerEntry, DnsState, DnsTransaction, EventSet};
use serde::Serialize;
use std::net::{Ipv4Addr, Ipv6Addr};

#[derive(Debug, Serialize)]
pub struct QuerySummary {
    pub name: String,
    pub rrtype: String,
}

#[derive(Debug, Serialize)]
pub struct AnswerSummary {
    pub name: String,
    pub rrtype: String,
    pub ttl: u32,
    pub data: String,
}

#[derive(Debug, Serialize)]
pub struct TransactionSummary {
    pub seq: u64,
    pub tx_id: u16,
    pub replied: bool,
    pub reply_lost: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rcode: Option<String>,
    pub queries: Vec<QuerySummary>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub answers: Vec<AnswerSummary>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub authorities: Vec<AnswerSummary>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub events: Vec<&'static str>,
}

#[derive(Debug, Serialize)]
pub struct FlowSummary {
    pub transport: String,
    pub transactions: u64,
    pub unreplied: u32,
    pub memory: u64,
    pub events: Vec<&'static str>,
}

impl TransactionSummary {
    pub fn new(tx: &DnsTransaction) -> Self {
        Self {
            seq: tx.seq(),
            tx_id: tx.tx_id(),
            replied: tx.replied(),
            reply_lost: tx.reply_lost(),
            rcode: tx.replied().then(|| rcode_string(tx.rcode())),
            queries: tx
                .queries()
                .iter()
                .map(|query| QuerySummary {
                    name: query.name_lossy(),
                    rrtype: type_string(query.rtype),
                })
                .collect(),
            answers: tx.answers().iter().map(AnswerSummary::new).collect(),
            authorities: tx.authorities().iter().map(AnswerSummary::new).collect(),
            events: event_names(tx.events()),
        }
    }
}

impl AnswerSummary {
    fn new(entry: &AnswerEntry) -> Self {
        Self {
            name: entry.name_lossy(),
            rrtype: entry.type_string(),
            ttl: entry.ttl,
            data: render_data(entry),
        }
    }
}

impl FlowSummary {
    pub fn new(state: &DnsState) -> Self {
        Self {
            transport: state.transport().to_string(),
            transactions: state.tx_count(),
            unreplied: state.unreplied(),
            memory: state.memory_in_use(),
            events: event_names(state.events()),
        }
    }
}

fn event_names(events: &EventSet) -> Vec<&'static str> {
    events.iter().map(|event| event.as_str()).collect()
}

fn render_data(entry: &AnswerEntry) -> String {
    let data = entry.data.as_ref();
    match entry.record_type() {
        Some(RecordType::A) if data.len() == 4 => {
            Ipv4Addr::new(data[0], data[1], data[2], data[3]).to_string()
        }
        Some(RecordType::AAAA) if data.len() == 16 => {
            let mut octets = [0u8; 16];
            octets.copy_from_slice(data);
            Ipv6Addr::from(octets).to_string()
        }
        Some(rtype) if rtype.has_name_rdata() => String::from_utf8_lossy(data).into_owned(),
        _ => hex::encode(data),
    }
}

#![allow(dead_code)]
use dnswatch_domain::DnsParserConfig;
use dnswatch_infrastructure::dns::DnsContext;
use std::sync::Arc;

pub const FLAG_RESPONSE: u16 = 0x8000;
pub const FLAG_RD: u16 = 0x0100;
pub const FLAG_RA: u16 = 0x0080;
pub const FLAG_Z: u16 = 0x0040;

pub fn context(request_flood: u32, state_memcap: u64, global_memcap: u64) -> Arc<DnsContext> {
    DnsContext::new(&DnsParserConfig {
        request_flood,
        state_memcap,
        global_memcap,
    })
}

pub fn default_context() -> Arc<DnsContext> {
    DnsContext::new(&DnsParserConfig::default())
}

/// Encodes a dotted name without compression. `""` is the root.
pub fn encode_name(name: &str) -> Vec<u8> {
    let mut buf = Vec::with_capacity(name.len() + 2);
    for label in name.split('.').filter(|l| !l.is_empty()) {
        buf.push(label.len() as u8);
        buf.extend_from_slice(label.as_bytes());
    }
    buf.push(0);
    buf
}

/// Prepends the 2-byte DNS-over-TCP length.
pub fn tcp_frame(message: &[u8]) -> Vec<u8> {
    let mut buf = (message.len() as u16).to_be_bytes().to_vec();
    buf.extend_from_slice(message);
    buf
}

struct RawRecord {
    name: Vec<u8>,
    rtype: u16,
    ttl: u32,
    rdata: Vec<u8>,
}

impl RawRecord {
    fn write(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(&self.name);
        buf.extend_from_slice(&self.rtype.to_be_bytes());
        buf.extend_from_slice(&1u16.to_be_bytes());
        buf.extend_from_slice(&self.ttl.to_be_bytes());
        buf.extend_from_slice(&(self.rdata.len() as u16).to_be_bytes());
        buf.extend_from_slice(&self.rdata);
    }
}

/// Builds uncompressed DNS messages for feeding the parser.
pub struct MessageBuilder {
    tx_id: u16,
    flags: u16,
    questions: Vec<(Vec<u8>, u16)>,
    answers: Vec<RawRecord>,
    authorities: Vec<RawRecord>,
    additionals: Vec<RawRecord>,
}

impl MessageBuilder {
    pub fn query(tx_id: u16) -> Self {
        Self {
            tx_id,
            flags: FLAG_RD,
            questions: Vec::new(),
            answers: Vec::new(),
            authorities: Vec::new(),
            additionals: Vec::new(),
        }
    }

    pub fn response(tx_id: u16) -> Self {
        Self {
            flags: FLAG_RESPONSE | FLAG_RD | FLAG_RA,
            ..Self::query(tx_id)
        }
    }

    pub fn flags(mut self, flags: u16) -> Self {
        self.flags = flags;
        self
    }

    pub fn rcode(mut self, rcode: u8) -> Self {
        self.flags = (self.flags & !0x000F) | u16::from(rcode & 0x0F);
        self
    }

    pub fn question(mut self, name: &str, rtype: u16) -> Self {
        self.questions.push((encode_name(name), rtype));
        self
    }

    pub fn answer(mut self, name: &str, rtype: u16, ttl: u32, rdata: &[u8]) -> Self {
        self.answers.push(RawRecord {
            name: encode_name(name),
            rtype,
            ttl,
            rdata: rdata.to_vec(),
        });
        self
    }

    pub fn authority(mut self, name: &str, rtype: u16, ttl: u32, rdata: &[u8]) -> Self {
        self.authorities.push(RawRecord {
            name: encode_name(name),
            rtype,
            ttl,
            rdata: rdata.to_vec(),
        });
        self
    }

    pub fn additional(mut self, name: &str, rtype: u16, ttl: u32, rdata: &[u8]) -> Self {
        self.additionals.push(RawRecord {
            name: encode_name(name),
            rtype,
            ttl,
            rdata: rdata.to_vec(),
        });
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(512);
        buf.extend_from_slice(&self.tx_id.to_be_bytes());
        buf.extend_from_slice(&self.flags.to_be_bytes());
        buf.extend_from_slice(&(self.questions.len() as u16).to_be_bytes());
        buf.extend_from_slice(&(self.answers.len() as u16).to_be_bytes());
        buf.extend_from_slice(&(self.authorities.len() as u16).to_be_bytes());
        buf.extend_from_slice(&(self.additionals.len() as u16).to_be_bytes());

        for (name, rtype) in &self.questions {
            buf.extend_from_slice(name);
            buf.extend_from_slice(&rtype.to_be_bytes());
            buf.extend_from_slice(&1u16.to_be_bytes());
        }
        for record in self
            .answers
            .iter()
            .chain(&self.authorities)
            .chain(&self.additionals)
        {
            record.write(&mut buf);
        }
        buf
    }
}

use dnswatch_domain::{
    type_string, DecodeError, DecoderEvent, Direction, RecordSection, RecordType, ResponseCode,
};
use smallvec::SmallVec;
use std::any::Any;
use std::mem::size_of;

use super::events::EventSet;
use super::memcap::MemoryBudget;

/// Opaque per-transaction state owned by the detection engine.
pub type DetectState = Box<dyn Any + Send>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryEntry {
    pub rtype: u16,
    pub class: u16,
    pub name: Box<[u8]>,
}

impl QueryEntry {
    pub fn record_type(&self) -> Option<RecordType> {
        RecordType::from_u16(self.rtype)
    }

    pub fn name_lossy(&self) -> String {
        String::from_utf8_lossy(&self.name).into_owned()
    }

    fn cost(name_len: usize) -> u64 {
        (size_of::<QueryEntry>() + name_len) as u64
    }
}

/// One answer or authority record. `data` holds raw rdata, except for the
/// name-carrying types where it is the decompressed target name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerEntry {
    pub rtype: u16,
    pub class: u16,
    pub ttl: u32,
    pub name: Box<[u8]>,
    pub data: Box<[u8]>,
}

impl AnswerEntry {
    pub fn record_type(&self) -> Option<RecordType> {
        RecordType::from_u16(self.rtype)
    }

    pub fn type_string(&self) -> String {
        type_string(self.rtype)
    }

    pub fn name_lossy(&self) -> String {
        String::from_utf8_lossy(&self.name).into_owned()
    }

    fn cost(name_len: usize, data_len: usize) -> u64 {
        (size_of::<AnswerEntry>() + name_len + data_len) as u64
    }
}

/// A request and, once seen, its response.
pub struct DnsTransaction {
    seq: u64,
    tx_id: u16,
    pub(crate) replied: bool,
    pub(crate) reply_lost: bool,
    rcode: u8,
    recursion_desired: bool,

    queries: SmallVec<[QueryEntry; 1]>,
    answers: Vec<AnswerEntry>,
    authorities: Vec<AnswerEntry>,

    events: EventSet,
    detect_state: Option<DetectState>,

    /// Every byte charged on behalf of this transaction, released in one go.
    charged: u64,
}

impl DnsTransaction {
    /// Bytes charged for the transaction itself before any entry is stored.
    pub const OVERHEAD: u64 = size_of::<DnsTransaction>() as u64;

    pub(crate) fn new(seq: u64, tx_id: u16) -> Self {
        Self {
            seq,
            tx_id,
            replied: false,
            reply_lost: false,
            rcode: 0,
            recursion_desired: false,
            queries: SmallVec::new(),
            answers: Vec::new(),
            authorities: Vec::new(),
            events: EventSet::new(),
            detect_state: None,
            charged: Self::OVERHEAD,
        }
    }

    /// Internal sequence number; unique and increasing within a flow.
    pub fn seq(&self) -> u64 {
        self.seq
    }

    /// Wire transaction id. Not unique.
    pub fn tx_id(&self) -> u16 {
        self.tx_id
    }

    pub fn replied(&self) -> bool {
        self.replied
    }

    pub fn reply_lost(&self) -> bool {
        self.reply_lost
    }

    pub fn rcode(&self) -> u8 {
        self.rcode
    }

    pub fn response_code(&self) -> Option<ResponseCode> {
        ResponseCode::from_u8(self.rcode)
    }

    pub fn recursion_desired(&self) -> bool {
        self.recursion_desired
    }

    pub fn queries(&self) -> &[QueryEntry] {
        &self.queries
    }

    pub fn answers(&self) -> &[AnswerEntry] {
        &self.answers
    }

    pub fn authorities(&self) -> &[AnswerEntry] {
        &self.authorities
    }

    pub fn list(&self, section: RecordSection) -> &[AnswerEntry] {
        match section {
            RecordSection::Answer => &self.answers,
            RecordSection::Authority => &self.authorities,
        }
    }

    pub fn events(&self) -> &EventSet {
        &self.events
    }

    pub fn detect_state(&self) -> Option<&(dyn Any + Send)> {
        self.detect_state.as_deref()
    }

    pub fn detect_state_mut(&mut self) -> Option<&mut (dyn Any + Send + 'static)> {
        self.detect_state.as_deref_mut()
    }

    pub fn charged(&self) -> u64 {
        self.charged
    }

    /// 1 once this direction has everything it will ever get, 0 otherwise.
    ///
    /// The request side is complete as soon as the transaction exists; the
    /// response side when a reply was stored or declared lost.
    pub fn progress(&self, direction: Direction) -> u8 {
        match direction {
            Direction::ToServer => 1,
            Direction::ToClient => u8::from(self.replied || self.reply_lost),
        }
    }

    pub(crate) fn push_event(&mut self, event: DecoderEvent) {
        self.events.push(event);
    }

    pub(crate) fn set_detect_state(&mut self, state: DetectState) -> Option<DetectState> {
        self.detect_state.replace(state)
    }

    pub(crate) fn take_detect_state(&mut self) -> Option<DetectState> {
        self.detect_state.take()
    }

    pub(crate) fn mark_replied(&mut self, rcode: u8, recursion_desired: bool) {
        self.replied = true;
        self.rcode = rcode;
        self.recursion_desired = recursion_desired;
    }

    /// Appends a question. Nothing is stored if the charge is refused.
    pub fn append_query(
        &mut self,
        budget: &mut MemoryBudget<'_>,
        rtype: u16,
        class: u16,
        name: &[u8],
    ) -> Result<(), DecodeError> {
        let cost = QueryEntry::cost(name.len());
        budget.charge(cost).map_err(DecodeError::MemcapReached)?;
        self.charged += cost;

        self.queries.push(QueryEntry {
            rtype,
            class,
            name: name.into(),
        });
        Ok(())
    }

    /// Appends an answer or authority record. Nothing is stored if the charge
    /// is refused.
    #[allow(clippy::too_many_arguments)]
    pub fn append_answer(
        &mut self,
        budget: &mut MemoryBudget<'_>,
        section: RecordSection,
        rtype: u16,
        class: u16,
        ttl: u32,
        name: &[u8],
        data: &[u8],
    ) -> Result<(), DecodeError> {
        let cost = AnswerEntry::cost(name.len(), data.len());
        budget.charge(cost).map_err(DecodeError::MemcapReached)?;
        self.charged += cost;

        let entry = AnswerEntry {
            rtype,
            class,
            ttl,
            name: name.into(),
            data: data.into(),
        };
        match section {
            RecordSection::Answer => self.answers.push(entry),
            RecordSection::Authority => self.authorities.push(entry),
        }
        Ok(())
    }
}

impl std::fmt::Debug for DnsTransaction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DnsTransaction")
            .field("seq", &self.seq)
            .field("tx_id", &format_args!("{:#06x}", self.tx_id))
            .field("replied", &self.replied)
            .field("reply_lost", &self.reply_lost)
            .field("rcode", &self.rcode)
            .field("queries", &self.queries.len())
            .field("answers", &self.answers.len())
            .field("authorities", &self.authorities.len())
            .field("events", &self.events)
            .field("detect_state", &self.detect_state.is_some())
            .finish()
    }
}

//! Per-flow DNS state: the transaction list and everything that drives it.

use dnswatch_domain::wire::HEADER_LEN;
use dnswatch_domain::{
    DecodeError, DecoderEvent, Direction, RecordSection, Transport, Violation, WireHeader,
};
use smallvec::SmallVec;
use std::any::Any;
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::debug;

use super::context::DnsContext;
use super::events::EventSet;
use super::memcap::{FlowMemory, MemoryBudget};
use super::parser::{parse_question, parse_record, skip_record};
use super::tcp::{RecordSink, TcpFramer, TcpOutcome};
use super::transaction::{DetectState, DnsTransaction};

type Violations = SmallVec<[Violation; 3]>;

/// Result of handing one message to a [`DnsState`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseOutcome {
    /// Bytes of the message taken; 0 when nothing could be used.
    pub consumed: usize,
    /// Transaction created or answered by this message.
    pub tx: Option<u64>,
    /// Why parsing stopped early, if it did. Already recorded as an event.
    pub error: Option<DecodeError>,
}

impl ParseOutcome {
    pub(crate) fn done(consumed: usize, tx: Option<u64>) -> Self {
        Self {
            consumed,
            tx,
            error: None,
        }
    }

    pub(crate) fn aborted(consumed: usize, tx: Option<u64>, error: DecodeError) -> Self {
        Self {
            consumed,
            tx,
            error: Some(error),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// DNS state of one network flow.
///
/// Owned by a single worker and mutated through `&mut self`. Transactions are
/// addressed by their sequence number, which starts at 1 and is never reused.
pub struct DnsState {
    ctx: Arc<DnsContext>,
    transport: Transport,

    /// Live transactions, ascending by sequence number.
    transactions: VecDeque<DnsTransaction>,
    curr: Option<u64>,
    transaction_max: u64,
    unreplied: u32,
    given_up: bool,
    tx_with_detect_state_cnt: u64,

    memory: FlowMemory,
    events: EventSet,

    to_server: TcpFramer,
    to_client: TcpFramer,
}

impl DnsState {
    pub(crate) fn new(ctx: Arc<DnsContext>, transport: Transport) -> Self {
        Self {
            ctx,
            transport,
            transactions: VecDeque::new(),
            curr: None,
            transaction_max: 0,
            unreplied: 0,
            given_up: false,
            tx_with_detect_state_cnt: 0,
            memory: FlowMemory::default(),
            events: EventSet::new(),
            to_server: TcpFramer::new(),
            to_client: TcpFramer::new(),
        }
    }

    pub fn transport(&self) -> Transport {
        self.transport
    }

    /// Parses one complete message seen in `direction`.
    pub fn parse_message(&mut self, direction: Direction, input: &[u8]) -> ParseOutcome {
        match direction {
            Direction::ToServer => self.parse_request(input),
            Direction::ToClient => self.parse_response(input),
        }
    }

    /// Feeds a TCP segment seen in `direction` through that direction's framer.
    pub fn parse_tcp(&mut self, direction: Direction, input: &[u8]) -> TcpOutcome {
        let mut framer = std::mem::take(self.framer_mut(direction));
        let outcome = framer.feed(
            input,
            &mut DirectedSink {
                state: &mut *self,
                direction,
            },
        );
        *self.framer_mut(direction) = framer;
        outcome
    }

    pub fn framer(&self, direction: Direction) -> &TcpFramer {
        match direction {
            Direction::ToServer => &self.to_server,
            Direction::ToClient => &self.to_client,
        }
    }

    fn framer_mut(&mut self, direction: Direction) -> &mut TcpFramer {
        match direction {
            Direction::ToServer => &mut self.to_server,
            Direction::ToClient => &mut self.to_client,
        }
    }

    pub fn parse_request(&mut self, input: &[u8]) -> ParseOutcome {
        let header = match WireHeader::parse(input) {
            Ok(header) => header,
            Err(err) => return self.abort(0, None, err),
        };
        let violations = request_violations(&header);

        if self.given_up {
            self.raise_all(&violations);
            debug!(
                tx_id = header.tx_id,
                unreplied = self.unreplied,
                "Flow flooded, request not tracked"
            );
            return ParseOutcome::aborted(input.len(), None, DecodeError::Flooded(self.unreplied));
        }

        let seq = self.transaction_max + 1;
        let mut tx = DnsTransaction::new(seq, header.tx_id);

        let mut budget = MemoryBudget::new(self.ctx.memcap(), &mut self.memory);
        if let Err(scope) = budget.charge(DnsTransaction::OVERHEAD) {
            self.raise_all(&violations);
            return self.abort(0, None, DecodeError::MemcapReached(scope));
        }
        for violation in &violations {
            attach(&mut self.events, Some(&mut tx), violation.event());
        }

        let stored = store_questions(&mut tx, &mut budget, input, &header);

        self.transaction_max = seq;
        self.transactions.push_back(tx);
        self.curr = Some(seq);
        self.bump_unreplied();

        match stored {
            Ok(end) => {
                debug!(seq, tx_id = header.tx_id, questions = header.questions, "Request stored");
                ParseOutcome::done(end, Some(seq))
            }
            Err((pos, err)) => self.abort(pos, Some(seq), err),
        }
    }

    pub fn parse_response(&mut self, input: &[u8]) -> ParseOutcome {
        let header = match WireHeader::parse(input) {
            Ok(header) => header,
            Err(err) => return self.abort(0, None, err),
        };
        let violations = response_violations(&header);

        let Some(index) = self.position_by_wire_id(header.tx_id) else {
            self.raise_all(&violations);
            debug!(tx_id = header.tx_id, "Unsolicited response discarded");
            return self.abort(
                input.len(),
                None,
                DecodeError::UnsolicitedResponse(header.tx_id),
            );
        };

        let tx = &mut self.transactions[index];
        let seq = tx.seq();
        tx.mark_replied(header.rcode(), header.recursion_desired());
        for violation in &violations {
            attach(&mut self.events, Some(&mut *tx), violation.event());
        }
        self.curr = Some(seq);
        self.drop_unreplied();

        let mut budget = MemoryBudget::new(self.ctx.memcap(), &mut self.memory);
        let stored = store_records(&mut self.transactions[index], &mut budget, input, &header);

        match stored {
            Ok(end) => {
                debug!(
                    seq,
                    tx_id = header.tx_id,
                    rcode = header.rcode(),
                    answers = header.answer_rr,
                    "Response matched"
                );
                ParseOutcome::done(end, Some(seq))
            }
            Err((pos, err)) => self.abort(pos, Some(seq), err),
        }
    }

    /// Oldest transaction still waiting for a reply with this wire id.
    pub fn find_by_wire_id(&self, tx_id: u16) -> Option<&DnsTransaction> {
        self.position_by_wire_id(tx_id)
            .map(|index| &self.transactions[index])
    }

    fn position_by_wire_id(&self, tx_id: u16) -> Option<usize> {
        self.transactions
            .iter()
            .position(|tx| !tx.replied && tx.tx_id() == tx_id)
    }

    fn position(&self, seq: u64) -> Option<usize> {
        self.transactions
            .binary_search_by_key(&seq, DnsTransaction::seq)
            .ok()
    }

    fn bump_unreplied(&mut self) {
        let previous = self.unreplied;
        self.unreplied += 1;

        let threshold = self.ctx.request_flood();
        if threshold != 0 && previous < threshold && self.unreplied >= threshold {
            self.given_up = true;
            for tx in self.transactions.iter_mut().filter(|tx| !tx.replied) {
                tx.reply_lost = true;
            }
            self.raise(DecoderEvent::Flooded);
            debug!(
                unreplied = self.unreplied,
                threshold, "Request flood, outstanding transactions marked lost"
            );
        }
    }

    fn drop_unreplied(&mut self) {
        self.unreplied = self.unreplied.saturating_sub(1);

        let threshold = self.ctx.request_flood();
        if self.given_up && (threshold == 0 || self.unreplied < threshold) {
            self.given_up = false;
            debug!(unreplied = self.unreplied, "Flow no longer flooded");
        }
    }

    fn raise(&mut self, event: DecoderEvent) {
        attach(&mut self.events, None, event);
    }

    fn raise_all(&mut self, violations: &[Violation]) {
        for violation in violations {
            self.raise(violation.event());
        }
    }

    /// Records `err` against the flow and stops the current message.
    fn abort(&mut self, consumed: usize, tx: Option<u64>, err: DecodeError) -> ParseOutcome {
        debug!(error = %err, consumed, "DNS message aborted");
        self.raise(err.event());
        ParseOutcome::aborted(consumed, tx, err)
    }

    /// Highest sequence number handed out so far.
    pub fn tx_count(&self) -> u64 {
        self.transaction_max
    }

    pub fn live_tx_count(&self) -> usize {
        self.transactions.len()
    }

    pub fn transactions(&self) -> impl Iterator<Item = &DnsTransaction> + '_ {
        self.transactions.iter()
    }

    pub fn tx_get(&self, seq: u64) -> Option<&DnsTransaction> {
        self.position(seq)
            .and_then(|index| self.transactions.get(index))
    }

    pub fn tx_get_mut(&mut self, seq: u64) -> Option<&mut DnsTransaction> {
        let index = self.position(seq)?;
        self.transactions.get_mut(index)
    }

    pub fn curr(&self) -> Option<&DnsTransaction> {
        self.curr.and_then(|seq| self.tx_get(seq))
    }

    pub fn unreplied(&self) -> u32 {
        self.unreplied
    }

    pub fn given_up(&self) -> bool {
        self.given_up
    }

    pub fn memory_in_use(&self) -> u64 {
        self.memory.in_use()
    }

    pub fn tx_progress(&self, seq: u64, direction: Direction) -> Option<u8> {
        self.tx_get(seq).map(|tx| tx.progress(direction))
    }

    /// Progress value at which a direction counts as complete.
    pub fn progress_completion_status(_direction: Direction) -> u8 {
        1
    }

    /// Destroys a transaction and credits its memory back in one release.
    pub fn tx_free(&mut self, seq: u64) -> bool {
        let Some(mut tx) = self
            .position(seq)
            .and_then(|index| self.transactions.remove(index))
        else {
            return false;
        };

        self.ctx.memcap().release(&mut self.memory, tx.charged());
        if tx.take_detect_state().is_some() {
            self.tx_with_detect_state_cnt -= 1;
        }
        if self.curr == Some(seq) {
            self.curr = None;
        }
        if !tx.replied {
            self.drop_unreplied();
        }
        true
    }

    pub fn detect_state(&self, seq: u64) -> Option<&(dyn Any + Send)> {
        self.tx_get(seq).and_then(DnsTransaction::detect_state)
    }

    pub fn detect_state_mut(&mut self, seq: u64) -> Option<&mut (dyn Any + Send + 'static)> {
        self.tx_get_mut(seq)
            .and_then(DnsTransaction::detect_state_mut)
    }

    /// Attaches engine state to a transaction, replacing any previous value.
    /// Returns false when the transaction does not exist.
    pub fn set_detect_state(&mut self, seq: u64, state: DetectState) -> bool {
        let Some(tx) = self.tx_get_mut(seq) else {
            return false;
        };
        if tx.set_detect_state(state).is_none() {
            self.tx_with_detect_state_cnt += 1;
        }
        true
    }

    pub fn has_tx_detect_state(&self) -> bool {
        self.tx_with_detect_state_cnt > 0
    }

    /// Events raised against the flow itself.
    pub fn events(&self) -> &EventSet {
        &self.events
    }

    pub fn tx_events(&self, seq: u64) -> Option<&EventSet> {
        self.tx_get(seq).map(DnsTransaction::events)
    }

    pub fn has_events(&self) -> bool {
        !self.events.is_empty() || self.transactions.iter().any(|tx| !tx.events().is_empty())
    }
}

impl std::fmt::Debug for DnsState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DnsState")
            .field("transport", &self.transport)
            .field("transactions", &self.transactions.len())
            .field("transaction_max", &self.transaction_max)
            .field("unreplied", &self.unreplied)
            .field("given_up", &self.given_up)
            .field("memory", &self.memory.in_use())
            .field("events", &self.events)
            .finish()
    }
}

impl Drop for DnsState {
    fn drop(&mut self) {
        self.ctx.memcap().release_all(&mut self.memory);
    }
}

struct DirectedSink<'a> {
    state: &'a mut DnsState,
    direction: Direction,
}

impl RecordSink for DirectedSink<'_> {
    fn reserve_buffer(&mut self, size: u64) -> Result<(), DecodeError> {
        let state = &mut *self.state;
        match state.ctx.memcap().charge(&mut state.memory, size) {
            Ok(()) => Ok(()),
            Err(scope) => {
                state.raise(DecoderEvent::StateMemcapReached);
                Err(DecodeError::MemcapReached(scope))
            }
        }
    }

    fn handle_record(&mut self, record: &[u8]) -> ParseOutcome {
        self.state.parse_message(self.direction, record)
    }
}

fn request_violations(header: &WireHeader) -> Violations {
    let mut violations = Violations::new();
    if header.is_response() {
        violations.push(Violation::NotARequest);
    }
    if header.z_flag() {
        violations.push(Violation::ZFlagSet);
    }
    let opcode = header.opcode();
    if !opcode.is_supported() {
        violations.push(Violation::UnsupportedOpcode {
            opcode: opcode.to_u8(),
            response: false,
        });
    }
    violations
}

fn response_violations(header: &WireHeader) -> Violations {
    let mut violations = Violations::new();
    if !header.is_response() {
        violations.push(Violation::NotAResponse);
    }
    if header.z_flag() {
        violations.push(Violation::ZFlagSet);
    }
    let opcode = header.opcode();
    if !opcode.is_supported() {
        violations.push(Violation::UnsupportedOpcode {
            opcode: opcode.to_u8(),
            response: true,
        });
    }
    violations
}

/// Stores every question of a request. On failure returns the offset of the
/// question that could not be handled.
fn store_questions(
    tx: &mut DnsTransaction,
    budget: &mut MemoryBudget<'_>,
    input: &[u8],
    header: &WireHeader,
) -> Result<usize, (usize, DecodeError)> {
    let mut pos = HEADER_LEN;
    for _ in 0..header.questions {
        let (question, next) = parse_question(input, pos).map_err(|err| (pos, err))?;
        tx.append_query(budget, question.rtype, question.class, question.name.as_bytes())
            .map_err(|err| (pos, err))?;
        pos = next;
    }
    Ok(pos)
}

/// Walks a response after its header: questions are skipped, answer and
/// authority records stored, additional records only bounds-checked.
fn store_records(
    tx: &mut DnsTransaction,
    budget: &mut MemoryBudget<'_>,
    input: &[u8],
    header: &WireHeader,
) -> Result<usize, (usize, DecodeError)> {
    let mut pos = HEADER_LEN;
    for _ in 0..header.questions {
        let (_, next) = parse_question(input, pos).map_err(|err| (pos, err))?;
        pos = next;
    }

    let sections = [
        (RecordSection::Answer, header.answer_rr),
        (RecordSection::Authority, header.authority_rr),
    ];
    for (section, count) in sections {
        for _ in 0..count {
            let (record, next) = parse_record(input, pos).map_err(|err| (pos, err))?;
            tx.append_answer(
                budget,
                section,
                record.rtype,
                record.class,
                record.ttl,
                record.name.as_bytes(),
                record.data.as_bytes(),
            )
            .map_err(|err| (pos, err))?;
            pos = next;
        }
    }

    for _ in 0..header.additional_rr {
        pos = skip_record(input, pos).map_err(|err| (pos, err))?;
    }
    Ok(pos)
}

/// Flow-wide events always go to the flow. The rest go to the transaction
/// they were found in, or to the flow when there is none.
fn attach(flow: &mut EventSet, tx: Option<&mut DnsTransaction>, event: DecoderEvent) {
    match tx {
        Some(tx) if !event.is_flow_level() => tx.push_event(event),
        _ => flow.push(event),
    }
}

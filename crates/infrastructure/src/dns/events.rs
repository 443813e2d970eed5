use dnswatch_domain::DecoderEvent;
use smallvec::SmallVec;

/// Decoder events raised against a flow or a transaction, in raise order.
///
/// At most [`EventSet::CAPACITY`] events are kept. Later ones are counted in
/// [`EventSet::dropped`] but still show up in [`EventSet::contains`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventSet {
    events: SmallVec<[DecoderEvent; 2]>,
    /// One bit per event id.
    seen: u8,
    dropped: u32,
}

impl EventSet {
    pub const CAPACITY: usize = u8::MAX as usize;

    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: DecoderEvent) {
        self.seen |= 1 << event.id();
        if self.events.len() < Self::CAPACITY {
            self.events.push(event);
        } else {
            self.dropped = self.dropped.saturating_add(1);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.seen == 0
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn contains(&self, event: DecoderEvent) -> bool {
        self.seen & (1 << event.id()) != 0
    }

    /// Occurrences of `event` among the stored entries.
    pub fn count(&self, event: DecoderEvent) -> usize {
        self.events.iter().filter(|e| **e == event).count()
    }

    /// Events raised after the set was full.
    pub fn dropped(&self) -> u32 {
        self.dropped
    }

    pub fn as_slice(&self) -> &[DecoderEvent] {
        &self.events
    }

    pub fn iter(&self) -> impl Iterator<Item = DecoderEvent> + '_ {
        self.events.iter().copied()
    }
}

/// Resolves a rule-language event name to its numeric id.
pub fn event_id_by_name(name: &str) -> Option<u8> {
    DecoderEvent::from_name(name).map(|event| event.id())
}

use std::fmt;

/// Anomalies the DNS decoder reports to the rule engine.
///
/// The numeric ids and names are part of the rule language (`app-layer-event:
/// dns.<name>`) and must stay stable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum DecoderEvent {
    UnsolicitedResponse = 1,
    MalformedData = 2,
    NotARequest = 3,
    NotAResponse = 4,
    ZFlagSet = 5,
    Flooded = 6,
    StateMemcapReached = 7,
}

impl DecoderEvent {
    pub const ALL: [DecoderEvent; 7] = [
        DecoderEvent::UnsolicitedResponse,
        DecoderEvent::MalformedData,
        DecoderEvent::NotARequest,
        DecoderEvent::NotAResponse,
        DecoderEvent::ZFlagSet,
        DecoderEvent::Flooded,
        DecoderEvent::StateMemcapReached,
    ];

    pub fn id(&self) -> u8 {
        *self as u8
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            // Historical spelling; rules in the wild reference it.
            DecoderEvent::UnsolicitedResponse => "UNSOLLICITED_RESPONSE",
            DecoderEvent::MalformedData => "MALFORMED_DATA",
            DecoderEvent::NotARequest => "NOT_A_REQUEST",
            DecoderEvent::NotAResponse => "NOT_A_RESPONSE",
            DecoderEvent::ZFlagSet => "Z_FLAG_SET",
            DecoderEvent::Flooded => "FLOODED",
            DecoderEvent::StateMemcapReached => "STATE_MEMCAP_REACHED",
        }
    }

    pub fn from_id(id: u8) -> Option<Self> {
        Self::ALL.iter().copied().find(|event| event.id() == id)
    }

    /// Case-insensitive lookup by rule-language name. The corrected spelling
    /// `UNSOLICITED_RESPONSE` is accepted as well.
    pub fn from_name(name: &str) -> Option<Self> {
        if name.eq_ignore_ascii_case("UNSOLICITED_RESPONSE") {
            return Some(DecoderEvent::UnsolicitedResponse);
        }
        Self::ALL
            .iter()
            .copied()
            .find(|event| event.as_str().eq_ignore_ascii_case(name))
    }

    /// Flow-wide anomalies, always attached to the state. Other events go to
    /// the transaction they were found in, or to the state when there is none.
    pub fn is_flow_level(&self) -> bool {
        matches!(
            self,
            DecoderEvent::Flooded
                | DecoderEvent::StateMemcapReached
                | DecoderEvent::UnsolicitedResponse
                | DecoderEvent::MalformedData
        )
    }
}

impl fmt::Display for DecoderEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

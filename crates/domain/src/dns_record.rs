pub mod record_type;
pub mod response_code;

pub use record_type::{type_string, RecordType};
pub use response_code::{rcode_string, ResponseCode};

/// Which resource-record list of a response an answer entry belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordSection {
    Answer,
    Authority,
}

impl RecordSection {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordSection::Answer => "answer",
            RecordSection::Authority => "authority",
        }
    }
}

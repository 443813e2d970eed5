pub mod context;
pub mod events;
pub mod memcap;
pub mod name;
pub mod parser;
pub mod state;
pub mod tcp;
pub mod transaction;

pub use context::DnsContext;
pub use events::{event_id_by_name, EventSet};
pub use memcap::{FlowMemory, MemcapTracker, MemoryBudget};
pub use name::{decode_name, skip_name, DecodedName, MAX_NAME_LEN};
pub use parser::{
    parse_question, parse_record, probe, skip_record, Question, RecordData, ResourceRecord,
};
pub use state::{DnsState, ParseOutcome};
pub use tcp::{RecordSink, TcpFramer, TcpOutcome};
pub use transaction::{AnswerEntry, DetectState, DnsTransaction, QueryEntry};

use serde::{Deserialize, Serialize};

pub const DEFAULT_REQUEST_FLOOD: u32 = 500;
pub const DEFAULT_STATE_MEMCAP: u64 = 512 * 1024;
pub const DEFAULT_GLOBAL_MEMCAP: u64 = 16 * 1024 * 1024;

/// Limits applied by the DNS parser. A value of 0 disables the limit.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DnsParserConfig {
    /// Unreplied requests tolerated on one flow before `FLOODED` is raised.
    #[serde(default = "default_request_flood")]
    pub request_flood: u32,

    /// Bytes a single flow may hold.
    #[serde(default = "default_state_memcap")]
    pub state_memcap: u64,

    /// Bytes all flows together may hold.
    #[serde(default = "default_global_memcap")]
    pub global_memcap: u64,
}

impl Default for DnsParserConfig {
    fn default() -> Self {
        Self {
            request_flood: default_request_flood(),
            state_memcap: default_state_memcap(),
            global_memcap: default_global_memcap(),
        }
    }
}

fn default_request_flood() -> u32 {
    DEFAULT_REQUEST_FLOOD
}

fn default_state_memcap() -> u64 {
    DEFAULT_STATE_MEMCAP
}

fn default_global_memcap() -> u64 {
    DEFAULT_GLOBAL_MEMCAP
}

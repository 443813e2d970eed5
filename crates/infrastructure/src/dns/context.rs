use dnswatch_domain::{DnsParserConfig, Transport};
use std::sync::atomic::{AtomicU32, Ordering as AtomicOrdering};
use std::sync::Arc;
use tracing::{info, warn};

use super::events::event_id_by_name;
use super::memcap::MemcapTracker;
use super::state::DnsState;

/// Parser-wide settings and accounting shared by every flow.
///
/// Limits can be changed at runtime through the setters; flows read them on
/// each check, so a change takes effect on the next message.
#[derive(Debug)]
pub struct DnsContext {
    memcap: MemcapTracker,
    request_flood: AtomicU32,
}

impl DnsContext {
    pub fn new(config: &DnsParserConfig) -> Arc<Self> {
        info!(
            request_flood = config.request_flood,
            state_memcap = config.state_memcap,
            global_memcap = config.global_memcap,
            "DNS parser context created"
        );

        Arc::new(Self {
            memcap: MemcapTracker::new(config.state_memcap, config.global_memcap),
            request_flood: AtomicU32::new(config.request_flood),
        })
    }

    pub fn alloc_state(self: &Arc<Self>, transport: Transport) -> DnsState {
        DnsState::new(Arc::clone(self), transport)
    }

    pub fn memcap(&self) -> &MemcapTracker {
        &self.memcap
    }

    pub fn request_flood(&self) -> u32 {
        self.request_flood.load(AtomicOrdering::Relaxed)
    }

    pub fn set_request_flood(&self, threshold: u32) {
        self.request_flood.store(threshold, AtomicOrdering::Relaxed);
    }

    pub fn set_state_memcap(&self, bytes: u64) {
        self.memcap.set_state_memcap(bytes);
    }

    pub fn set_global_memcap(&self, bytes: u64) {
        self.memcap.set_global_memcap(bytes);
    }

    pub fn event_id_by_name(name: &str) -> Option<u8> {
        event_id_by_name(name)
    }
}

impl Drop for DnsContext {
    fn drop(&mut self) {
        let memuse = self.memcap.memuse();
        if memuse != 0 {
            warn!(memuse, "DNS parser context dropped with memory still charged");
        }
    }
}

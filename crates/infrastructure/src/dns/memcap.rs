use dnswatch_domain::MemcapScope;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};

/// Process-wide memory accounting for DNS parser state.
///
/// Shared by every flow through an `Arc`; all counters and limits are atomics
/// so workers can charge concurrently. Per-flow usage lives in [`FlowMemory`],
/// owned by the flow and only touched by its owner.
///
/// A limit of 0 disables that check.
#[derive(Debug, Default)]
pub struct MemcapTracker {
    state_memcap: AtomicU64,
    global_memcap: AtomicU64,

    memuse: AtomicU64,
    memcap_state_hits: AtomicU64,
    memcap_global_hits: AtomicU64,
}

/// Bytes charged to a single flow.
///
/// Not `Clone`: every charged byte has exactly one owner.
#[derive(Debug, Default)]
pub struct FlowMemory {
    in_use: u64,
}

impl FlowMemory {
    pub fn in_use(&self) -> u64 {
        self.in_use
    }
}

impl MemcapTracker {
    pub fn new(state_memcap: u64, global_memcap: u64) -> Self {
        Self {
            state_memcap: AtomicU64::new(state_memcap),
            global_memcap: AtomicU64::new(global_memcap),
            ..Default::default()
        }
    }

    pub fn set_state_memcap(&self, bytes: u64) {
        self.state_memcap.store(bytes, AtomicOrdering::Relaxed);
    }

    pub fn set_global_memcap(&self, bytes: u64) {
        self.global_memcap.store(bytes, AtomicOrdering::Relaxed);
    }

    pub fn state_memcap(&self) -> u64 {
        self.state_memcap.load(AtomicOrdering::Relaxed)
    }

    pub fn global_memcap(&self) -> u64 {
        self.global_memcap.load(AtomicOrdering::Relaxed)
    }

    /// Which budget, if any, `size` more bytes would overflow. Read-only: hit
    /// counters are not bumped.
    pub fn check(&self, flow: &FlowMemory, size: u64) -> Result<(), MemcapScope> {
        if exceeds(flow.in_use, size, self.state_memcap()) {
            return Err(MemcapScope::State);
        }
        if exceeds(self.memuse(), size, self.global_memcap()) {
            return Err(MemcapScope::Global);
        }
        Ok(())
    }

    pub fn would_exceed(&self, flow: &FlowMemory, size: u64) -> bool {
        self.check(flow, size).is_err()
    }

    /// Charges `size` bytes to `flow` and the global counter.
    ///
    /// Either both counters move or neither does. The global side is a CAS
    /// loop so concurrent charges can never push it past the limit.
    pub fn charge(&self, flow: &mut FlowMemory, size: u64) -> Result<(), MemcapScope> {
        if exceeds(flow.in_use, size, self.state_memcap()) {
            self.memcap_state_hits.fetch_add(1, AtomicOrdering::Relaxed);
            return Err(MemcapScope::State);
        }

        let global_memcap = self.global_memcap();
        let reserved = self
            .memuse
            .fetch_update(AtomicOrdering::AcqRel, AtomicOrdering::Acquire, |current| {
                if exceeds(current, size, global_memcap) {
                    None
                } else {
                    Some(current + size)
                }
            });

        if reserved.is_err() {
            self.memcap_global_hits.fetch_add(1, AtomicOrdering::Relaxed);
            return Err(MemcapScope::Global);
        }

        flow.in_use += size;
        Ok(())
    }

    /// Credits `size` bytes back. Never underflows either counter.
    pub fn release(&self, flow: &mut FlowMemory, size: u64) {
        let size = size.min(flow.in_use);
        flow.in_use -= size;
        let _ = self
            .memuse
            .fetch_update(AtomicOrdering::AcqRel, AtomicOrdering::Acquire, |current| {
                Some(current.saturating_sub(size))
            });
    }

    /// Releases everything a flow still holds; used on state teardown.
    pub fn release_all(&self, flow: &mut FlowMemory) {
        let size = flow.in_use;
        self.release(flow, size);
    }

    pub fn memuse(&self) -> u64 {
        self.memuse.load(AtomicOrdering::Acquire)
    }

    pub fn memcap_state_hits(&self) -> u64 {
        self.memcap_state_hits.load(AtomicOrdering::Relaxed)
    }

    pub fn memcap_global_hits(&self) -> u64 {
        self.memcap_global_hits.load(AtomicOrdering::Relaxed)
    }
}

#[inline]
fn exceeds(current: u64, size: u64, limit: u64) -> bool {
    limit != 0 && current.saturating_add(size) > limit
}

/// A flow's view of the tracker: its own counter plus the shared one.
pub struct MemoryBudget<'a> {
    tracker: &'a MemcapTracker,
    flow: &'a mut FlowMemory,
}

impl<'a> MemoryBudget<'a> {
    pub fn new(tracker: &'a MemcapTracker, flow: &'a mut FlowMemory) -> Self {
        Self { tracker, flow }
    }

    pub fn charge(&mut self, size: u64) -> Result<(), MemcapScope> {
        self.tracker.charge(self.flow, size)
    }

    pub fn release(&mut self, size: u64) {
        self.tracker.release(self.flow, size);
    }
}

use crate::common::{AgentId, LocalFrame};
use std::collections::BTreeMap;

#[derive(Debug, Clone)]
struct CachedFrame {
    frame: LocalFrame,
    age: f64,
}

/// Most recent frame advertised by each peer.
///
/// Without a TTL entries never expire; with one, an entry older than the TTL
/// is reported as absent but kept until overwritten.
#[derive(Debug, Clone, Default)]
pub struct PeerFrameCache {
    time_to_live: Option<f64>,
    entries: BTreeMap<AgentId, CachedFrame>,
}

impl PeerFrameCache {
    pub fn new(time_to_live: Option<f64>) -> Self {
        Self {
            time_to_live,
            entries: BTreeMap::new(),
        }
    }

    pub fn insert(&mut self, peer: AgentId, frame: LocalFrame) {
        self.entries.insert(peer, CachedFrame { frame, age: 0.0 });
    }

    pub fn age_all(&mut self, delta: f64) {
        if !delta.is_finite() || delta <= 0.0 {
            return;
        }
        for entry in self.entries.values_mut() {
            entry.age += delta;
        }
    }

    fn is_fresh(&self, entry: &CachedFrame) -> bool {
        self.time_to_live.map_or(true, |ttl| entry.age <= ttl)
    }

    pub fn get(&self, peer: AgentId) -> Option<&LocalFrame> {
        self.entries
            .get(&peer)
            .filter(|entry| self.is_fresh(entry))
            .map(|entry| &entry.frame)
    }

    pub fn age(&self, peer: AgentId) -> Option<f64> {
        self.entries.get(&peer).map(|entry| entry.age)
    }

    /// Snapshot of every non-expired peer frame.
    pub fn fresh_frames(&self) -> BTreeMap<AgentId, LocalFrame> {
        self.entries
            .iter()
            .filter(|(_, entry)| self.is_fresh(entry))
            .map(|(id, entry)| (*id, entry.frame.clone()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

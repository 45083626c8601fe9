use crate::common::AgentId;
use std::collections::{BTreeMap, HashMap};

/// Sentinel for a pair that has never been measured. Never fed to geometry.
pub const UNKNOWN_DISTANCE: f64 = -1.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DistanceObservation {
    pub from: AgentId,
    pub to: AgentId,
    pub distance: f64,
    pub age: f64,
}

#[derive(Debug, Clone, Copy)]
struct Entry {
    distance: f64,
    age: f64,
}

/// Per-agent table of pairwise distance observations with TTL-style aging.
///
/// Observations are symmetric: the pair is stored once under its ordered key,
/// so `distance(a, b) == distance(b, a)` always holds.
#[derive(Debug, Clone)]
pub struct DistanceGossipStore {
    owner: AgentId,
    time_to_live: f64,
    clock: f64,
    entries: HashMap<(AgentId, AgentId), Entry>,
}

fn pair_key(a: AgentId, b: AgentId) -> (AgentId, AgentId) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

impl DistanceGossipStore {
    pub fn new(owner: AgentId, time_to_live: f64) -> Self {
        Self {
            owner,
            time_to_live,
            clock: 0.0,
            entries: HashMap::new(),
        }
    }

    pub fn owner(&self) -> AgentId {
        self.owner
    }

    pub fn time_to_live(&self) -> f64 {
        self.time_to_live
    }

    /// Total time advanced through `age_all` since creation.
    pub fn clock(&self) -> f64 {
        self.clock
    }

    /// Stores or overwrites an observation and resets its age.
    ///
    /// Negative, non-finite and self-pair distances are dropped; returns
    /// whether the observation was kept. Use [`mark_unknown`](Self::mark_unknown)
    /// to deliberately forget a pair.
    pub fn record(&mut self, observer: AgentId, subject: AgentId, distance: f64) -> bool {
        if observer == subject || !distance.is_finite() || distance < 0.0 {
            tracing::debug!(
                %observer, %subject, distance,
                "dropping unusable distance observation"
            );
            return false;
        }

        self.entries
            .insert(pair_key(observer, subject), Entry { distance, age: 0.0 });
        true
    }

    pub fn mark_unknown(&mut self, observer: AgentId, subject: AgentId) {
        self.entries.remove(&pair_key(observer, subject));
    }

    /// Advances every observation's age; called once per communication tick.
    pub fn age_all(&mut self, delta: f64) {
        if !delta.is_finite() || delta <= 0.0 {
            return;
        }

        self.clock += delta;
        for entry in self.entries.values_mut() {
            entry.age += delta;
        }
    }

    /// Forgets every observation older than `ttl`, keeping the table bounded
    /// to recent data. Returns how many were dropped.
    pub fn prune_stale(&mut self, ttl: f64) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.age <= ttl);
        before - self.entries.len()
    }

    pub fn distance(&self, a: AgentId, b: AgentId) -> Option<f64> {
        self.entries.get(&pair_key(a, b)).map(|e| e.distance)
    }

    /// Distance or the `-1` sentinel, the encoding the sub-matrix uses.
    pub fn distance_or_unknown(&self, a: AgentId, b: AgentId) -> f64 {
        self.distance(a, b).unwrap_or(UNKNOWN_DISTANCE)
    }

    pub fn observation(&self, observer: AgentId, subject: AgentId) -> Option<DistanceObservation> {
        self.entries
            .get(&pair_key(observer, subject))
            .map(|e| DistanceObservation {
                from: observer,
                to: subject,
                distance: e.distance,
                age: e.age,
            })
    }

    pub fn is_stale(&self, observer: AgentId, subject: AgentId, ttl: f64) -> bool {
        match self.entries.get(&pair_key(observer, subject)) {
            Some(entry) => entry.age > ttl,
            None => true,
        }
    }

    /// Non-stale distances between the owner and every other agent, ready to
    /// attach to an outgoing gossip payload.
    pub fn snapshot_for_sending(&self) -> BTreeMap<AgentId, f64> {
        self.entries
            .iter()
            .filter(|(_, entry)| entry.age <= self.time_to_live)
            .filter_map(|(&(a, b), entry)| {
                if a == self.owner {
                    Some((b, entry.distance))
                } else if b == self.owner {
                    Some((a, entry.distance))
                } else {
                    None
                }
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

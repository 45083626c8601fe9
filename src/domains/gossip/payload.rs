use crate::common::{AgentId, LocalFrame};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// What an agent advertises to peers that contact it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayloadMode {
    DistancesOnly,
    #[default]
    DistancesAndFrame,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GossipPayload {
    pub sender: AgentId,
    pub distances: Option<BTreeMap<AgentId, f64>>,
    pub frame: Option<LocalFrame>,
}

impl GossipPayload {
    pub fn empty(sender: AgentId) -> Self {
        Self {
            sender,
            distances: None,
            frame: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.distances.as_ref().map_or(true, |d| d.is_empty())
            && self.frame.as_ref().map_or(true, |f| f.is_empty())
    }

    /// Advertised distances with malformed entries (negative, non-finite,
    /// or the sender itself) filtered out.
    pub fn usable_distances(&self) -> impl Iterator<Item = (AgentId, f64)> + '_ {
        let sender = self.sender;
        self.distances
            .iter()
            .flat_map(|d| d.iter())
            .filter(move |(id, d)| **id != sender && d.is_finite() && **d >= 0.0)
            .map(|(id, d)| (*id, *d))
    }

    /// Advertised frame with non-finite points removed; `None` when nothing
    /// usable remains.
    pub fn usable_frame(&self) -> Option<LocalFrame> {
        let mut frame = self.frame.clone()?;
        frame.retain_finite();
        (!frame.is_empty()).then_some(frame)
    }
}

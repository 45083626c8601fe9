use crate::common::AgentId;
use crate::domains::gossip::GossipPayload;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use super::ports::GroundTruth;
use super::roster::{AgentHandle, Roster};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyKind {
    #[default]
    Global,
    DistanceLimited,
    Delaunay,
    ProximityWeighted,
    Silent,
}

/// Why a communication tick ended without an exchange. All of these are
/// ordinary outcomes, not errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoExchangeReason {
    /// The per-tick exchange draw failed.
    Declined,
    EmptyRoster,
    NoPeerInRange,
    /// The oracle has no distance for the chosen pair.
    UnknownDistance,
    /// The policy needs true positions and the oracle has none for us.
    MissingPositions,
    Silent,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Exchange {
    Established {
        peer_id: AgentId,
        distance: f64,
        payload: GossipPayload,
    },
    NoExchange(NoExchangeReason),
}

impl Exchange {
    pub fn is_established(&self) -> bool {
        matches!(self, Exchange::Established { .. })
    }

    pub fn peer_id(&self) -> Option<AgentId> {
        match self {
            Exchange::Established { peer_id, .. } => Some(*peer_id),
            Exchange::NoExchange(_) => None,
        }
    }
}

/// Who to gossip with this tick, and what is learned from them.
pub trait CommunicationPolicy: Send {
    fn kind(&self) -> PolicyKind;

    fn select_peer_and_payload(
        &mut self,
        own: AgentId,
        roster: &Roster,
        oracle: &dyn GroundTruth,
    ) -> Exchange;
}

/// Completes an exchange with an already chosen peer.
pub fn exchange_with(own: AgentId, peer: &AgentHandle, oracle: &dyn GroundTruth) -> Exchange {
    match oracle.distance(own, peer.id()) {
        Some(distance) if distance.is_finite() && distance >= 0.0 => Exchange::Established {
            peer_id: peer.id(),
            distance,
            payload: peer.published_payload(),
        },
        _ => Exchange::NoExchange(NoExchangeReason::UnknownDistance),
    }
}

pub fn policy_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

/// Never talks to anyone.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentCommunication;

impl CommunicationPolicy for SilentCommunication {
    fn kind(&self) -> PolicyKind {
        PolicyKind::Silent
    }

    fn select_peer_and_payload(&mut self, _own: AgentId, _roster: &Roster, _oracle: &dyn GroundTruth) -> Exchange {
        Exchange::NoExchange(NoExchangeReason::Silent)
    }
}

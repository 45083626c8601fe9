use crate::common::AgentId;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use super::delaunay_graph::delaunay_graph;
use super::policy::{exchange_with, CommunicationPolicy, Exchange, NoExchangeReason, PolicyKind};
use super::ports::GroundTruth;
use super::roster::{AgentHandle, Roster};

/// Talks only to Delaunay neighbours in the triangulation of everyone's
/// true positions, a stand-in for "close enough for a reliable link".
#[derive(Debug, Clone)]
pub struct DelaunayNetworkCommunication {
    rng: StdRng,
}

impl DelaunayNetworkCommunication {
    pub fn new(rng: StdRng) -> Self {
        Self { rng }
    }

    /// Neighbours of `own` that are also on the roster, in ascending id order.
    pub fn neighbours(own: AgentId, roster: &Roster, oracle: &dyn GroundTruth) -> Option<Vec<AgentId>> {
        let positions = oracle.positions();
        if !positions.iter().any(|(id, _)| *id == own) {
            return None;
        }

        let graph = delaunay_graph(&positions);
        let mut neighbours: Vec<AgentId> = graph
            .neighbors(own)
            .filter(|id| *id != own && roster.get(*id).is_some())
            .collect();
        neighbours.sort();
        neighbours.dedup();
        Some(neighbours)
    }
}

impl CommunicationPolicy for DelaunayNetworkCommunication {
    fn kind(&self) -> PolicyKind {
        PolicyKind::Delaunay
    }

    fn select_peer_and_payload(
        &mut self,
        own: AgentId,
        roster: &Roster,
        oracle: &dyn GroundTruth,
    ) -> Exchange {
        let Some(neighbours) = Self::neighbours(own, roster, oracle) else {
            return Exchange::NoExchange(NoExchangeReason::MissingPositions);
        };

        let candidates: Vec<&AgentHandle> = neighbours
            .iter()
            .filter_map(|id| roster.get(*id))
            .collect();

        match candidates.choose(&mut self.rng) {
            Some(peer) => exchange_with(own, peer, oracle),
            None => Exchange::NoExchange(NoExchangeReason::NoPeerInRange),
        }
    }
}

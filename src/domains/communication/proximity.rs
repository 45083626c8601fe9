use crate::common::AgentId;
use rand::distributions::{Distribution, WeightedIndex};
use rand::rngs::StdRng;

use super::policy::{exchange_with, CommunicationPolicy, Exchange, NoExchangeReason, PolicyKind};
use super::ports::GroundTruth;
use super::roster::{AgentHandle, Roster};

/// Talks to anyone, but closer agents are picked more often (weight `1/d`).
#[derive(Debug, Clone)]
pub struct ProximityWeightedCommunication {
    rng: StdRng,
}

impl ProximityWeightedCommunication {
    pub fn new(rng: StdRng) -> Self {
        Self { rng }
    }
}

impl CommunicationPolicy for ProximityWeightedCommunication {
    fn kind(&self) -> PolicyKind {
        PolicyKind::ProximityWeighted
    }

    fn select_peer_and_payload(
        &mut self,
        own: AgentId,
        roster: &Roster,
        oracle: &dyn GroundTruth,
    ) -> Exchange {
        // Co-located agents (d == 0) would get infinite weight; leave them out.
        let (peers, weights): (Vec<&AgentHandle>, Vec<f64>) = roster
            .others(own)
            .filter_map(|peer| {
                let d = oracle.distance(own, peer.id())?;
                (d.is_finite() && d > 0.0).then_some((peer, 1.0 / d))
            })
            .unzip();

        if peers.is_empty() {
            return Exchange::NoExchange(NoExchangeReason::NoPeerInRange);
        }

        match WeightedIndex::new(&weights) {
            Ok(index) => exchange_with(own, peers[index.sample(&mut self.rng)], oracle),
            Err(_) => Exchange::NoExchange(NoExchangeReason::NoPeerInRange),
        }
    }
}

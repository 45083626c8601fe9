use crate::common::AgentId;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use super::policy::{exchange_with, CommunicationPolicy, Exchange, NoExchangeReason, PolicyKind};
use super::ports::GroundTruth;
use super::roster::{AgentHandle, Roster};

/// Talks to a uniformly chosen agent within `radius` (true distance).
#[derive(Debug, Clone)]
pub struct DistanceLimitedCommunication {
    radius: f64,
    rng: StdRng,
}

impl DistanceLimitedCommunication {
    pub fn new(radius: f64, rng: StdRng) -> Self {
        Self { radius, rng }
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }
}

impl CommunicationPolicy for DistanceLimitedCommunication {
    fn kind(&self) -> PolicyKind {
        PolicyKind::DistanceLimited
    }

    fn select_peer_and_payload(
        &mut self,
        own: AgentId,
        roster: &Roster,
        oracle: &dyn GroundTruth,
    ) -> Exchange {
        let in_range: Vec<&AgentHandle> = roster
            .others(own)
            .filter(|peer| {
                oracle
                    .distance(own, peer.id())
                    .is_some_and(|d| d.is_finite() && d >= 0.0 && d <= self.radius)
            })
            .collect();

        match in_range.choose(&mut self.rng) {
            Some(peer) => exchange_with(own, peer, oracle),
            None => Exchange::NoExchange(NoExchangeReason::NoPeerInRange),
        }
    }
}

use crate::common::AgentId;
use rand::rngs::StdRng;
use rand::seq::IteratorRandom;
use rand::Rng;

use super::policy::{exchange_with, CommunicationPolicy, Exchange, NoExchangeReason, PolicyKind};
use super::ports::GroundTruth;
use super::roster::Roster;

/// Each tick, with probability `refresh_rate / communication_frequency`,
/// talk to a uniformly chosen other agent anywhere in the swarm.
#[derive(Debug, Clone)]
pub struct GlobalCommunication {
    exchange_probability: f64,
    rng: StdRng,
}

impl GlobalCommunication {
    pub fn new(refresh_rate: f64, communication_frequency: f64, rng: StdRng) -> Self {
        Self {
            exchange_probability: (refresh_rate / communication_frequency).clamp(0.0, 1.0),
            rng,
        }
    }

    pub fn exchange_probability(&self) -> f64 {
        self.exchange_probability
    }
}

impl CommunicationPolicy for GlobalCommunication {
    fn kind(&self) -> PolicyKind {
        PolicyKind::Global
    }

    fn select_peer_and_payload(
        &mut self,
        own: AgentId,
        roster: &Roster,
        oracle: &dyn GroundTruth,
    ) -> Exchange {
        if self.rng.gen::<f64>() >= self.exchange_probability {
            return Exchange::NoExchange(NoExchangeReason::Declined);
        }

        match roster.others(own).choose(&mut self.rng) {
            Some(peer) => exchange_with(own, peer, oracle),
            None => Exchange::NoExchange(NoExchangeReason::EmptyRoster),
        }
    }
}

use crate::common::{AgentId, DomainError, DomainResult, LocalFrame};
use crate::config::SimulationConfig;
use crate::domains::communication::{
    policy_rng, AgentHandle, CommunicationPolicy, DelaunayNetworkCommunication,
    DistanceLimitedCommunication, Exchange, GlobalCommunication, GroundTruth, PolicyKind,
    ProximityWeightedCommunication, Publisher, Roster, SilentCommunication,
};
use crate::domains::gossip::{DistanceGossipStore, GossipPayload, PayloadMode};
use crate::domains::logger::{AgentScopedLogger, DynLogger};
use crate::domains::reconstruction::ReconstructTriangulation;
use crate::domains::triangulation::{SubTriangulation, Triangulation};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use super::events::AgentEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AgentStatus {
    Running,
    Paused,
}

/// One simulated swarm member: its gossip store, its triangulation and its
/// communication policy, plus the state it publishes to everyone else.
///
/// Both ticks are plain synchronous methods; scheduling lives in the actors.
pub struct AgentNode {
    id: AgentId,
    status: AgentStatus,
    settings: SimulationConfig,
    store: DistanceGossipStore,
    triangulation: Box<dyn Triangulation>,
    policy: Box<dyn CommunicationPolicy>,
    publisher: Publisher,
    frame: LocalFrame,
    /// Seconds since the frame was last recomputed; `None` until the first success.
    frame_age: Option<f64>,
    exchanges: u64,
    logger: DynLogger,
    events: Option<mpsc::Sender<AgentEvent>>,
}

impl AgentNode {
    pub fn new(
        id: AgentId,
        settings: SimulationConfig,
        policy: Box<dyn CommunicationPolicy>,
        triangulation: Box<dyn Triangulation>,
        logger: DynLogger,
    ) -> Self {
        Self {
            id,
            status: AgentStatus::Running,
            store: DistanceGossipStore::new(id, settings.time_to_live),
            settings,
            triangulation,
            policy,
            publisher: Publisher::new(id),
            frame: LocalFrame::anchored(id),
            frame_age: None,
            exchanges: 0,
            logger: AgentScopedLogger::wrap(id, logger),
            events: None,
        }
    }

    /// Policy and triangulation picked from `settings`.
    pub fn from_config(id: AgentId, settings: &SimulationConfig, logger: DynLogger) -> Self {
        Self::new(
            id,
            settings.clone(),
            build_policy(id, settings),
            build_triangulation(id, settings),
            logger,
        )
    }

    pub fn with_events(mut self, events: mpsc::Sender<AgentEvent>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn id(&self) -> AgentId {
        self.id
    }

    pub fn status(&self) -> AgentStatus {
        self.status
    }

    pub fn is_paused(&self) -> bool {
        self.status == AgentStatus::Paused
    }

    pub fn settings(&self) -> &SimulationConfig {
        &self.settings
    }

    pub fn store(&self) -> &DistanceGossipStore {
        &self.store
    }

    pub fn policy_kind(&self) -> PolicyKind {
        self.policy.kind()
    }

    /// Current position estimate; the anchored single-point frame until the
    /// first triangulation succeeds.
    pub fn frame(&self) -> &LocalFrame {
        &self.frame
    }

    pub fn frame_age(&self) -> Option<f64> {
        self.frame_age
    }

    pub fn exchanges(&self) -> u64 {
        self.exchanges
    }

    /// Read side handed to the roster.
    pub fn handle(&self) -> AgentHandle {
        self.publisher.handle()
    }

    pub fn pause(&mut self) {
        self.set_status(AgentStatus::Paused);
    }

    pub fn resume(&mut self) {
        self.set_status(AgentStatus::Running);
    }

    fn set_status(&mut self, status: AgentStatus) {
        if self.status == status {
            return;
        }
        self.status = status;
        self.logger.info(&format!("status changed to {:?}", status));
        self.emit(AgentEvent::StatusChanged {
            agent_id: self.id,
            status,
            timestamp: Utc::now(),
        });
    }

    /// What peers receive when they contact this agent: non-stale owned
    /// distances and, depending on the payload mode, the frame while it is
    /// younger than `time_to_live`.
    pub fn payload(&self) -> GossipPayload {
        let distances = self.store.snapshot_for_sending();
        let frame = match self.settings.payload {
            PayloadMode::DistancesOnly => None,
            PayloadMode::DistancesAndFrame => self
                .frame_age
                .filter(|age| *age <= self.settings.time_to_live)
                .map(|_| self.frame.clone()),
        };
        GossipPayload {
            sender: self.id,
            distances: (!distances.is_empty()).then_some(distances),
            frame,
        }
    }

    /// One communication period. Returns `None` when the tick was skipped
    /// because the agent is paused.
    pub fn communication_tick(&mut self, roster: &Roster, oracle: &dyn GroundTruth) -> Option<Exchange> {
        if self.is_paused() {
            return None;
        }

        let exchange = self.policy.select_peer_and_payload(self.id, roster, oracle);
        if let Exchange::Established {
            peer_id,
            distance,
            payload,
        } = &exchange
        {
            self.absorb(*peer_id, *distance, payload);
        }

        let delta = self.settings.refresh_rate;
        self.store.age_all(delta);
        self.store.prune_stale(self.settings.time_to_live);
        self.triangulation.age(delta);
        if let Some(age) = self.frame_age.as_mut() {
            *age += delta;
        }

        self.publisher.publish_payload(self.payload());
        Some(exchange)
    }

    fn absorb(&mut self, peer: AgentId, distance: f64, payload: &GossipPayload) {
        if !self.store.record(self.id, peer, distance) {
            return;
        }
        // The peer's view of us never overrides our own measurement.
        for (subject, d) in payload.usable_distances() {
            if subject != self.id {
                self.store.record(peer, subject, d);
            }
        }

        if let Err(e) = self.triangulation.update_information(peer, distance, payload) {
            self.report_failure("exchange", &e);
        }

        self.exchanges += 1;
        tracing::debug!(agent = %self.id, peer = %peer, distance, "exchange completed");
        self.emit(AgentEvent::ExchangeCompleted {
            agent_id: self.id,
            peer_id: peer,
            distance,
            received_frame: payload.frame.is_some(),
            timestamp: Utc::now(),
        });
    }

    /// One triangulation period. `None` when paused; otherwise the newly
    /// published frame or the reason nothing changed. On error the previous
    /// frame stays published untouched.
    pub fn triangulation_tick(&mut self) -> Option<DomainResult<LocalFrame>> {
        if self.is_paused() {
            return None;
        }

        match self.triangulation.update_triangulation() {
            Ok(output) => {
                self.frame = output.frame;
                self.frame_age = Some(0.0);
                self.publisher.publish_frame(self.frame.clone());
                self.publisher.publish_payload(self.payload());
                tracing::debug!(agent = %self.id, points = self.frame.len(), "frame updated");
                self.emit(AgentEvent::FrameUpdated {
                    agent_id: self.id,
                    frame: self.frame.clone(),
                    timestamp: Utc::now(),
                });
                Some(Ok(self.frame.clone()))
            }
            Err(e) => {
                self.report_failure("triangulation", &e);
                self.emit(AgentEvent::TriangulationSkipped {
                    agent_id: self.id,
                    reason: e.to_string(),
                    timestamp: Utc::now(),
                });
                Some(Err(e))
            }
        }
    }

    fn report_failure(&self, stage: &str, error: &DomainError) {
        if error.is_recoverable() {
            tracing::debug!(agent = %self.id, stage, %error, "no update");
        } else {
            self.logger.error(&format!("{} aborted: {}", stage, error));
        }
    }

    fn emit(&self, event: AgentEvent) {
        if let Some(events) = &self.events {
            if events.try_send(event).is_err() {
                tracing::debug!(agent = %self.id, "telemetry channel full or closed, event dropped");
            }
        }
    }
}

impl std::fmt::Debug for AgentNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentNode")
            .field("id", &self.id)
            .field("status", &self.status)
            .field("policy", &self.policy.kind())
            .field("frame", &self.frame)
            .field("exchanges", &self.exchanges)
            .finish()
    }
}

/// Per-agent seed so agents sharing a run seed still draw different streams.
fn agent_seed(id: AgentId, seed: Option<u64>) -> Option<u64> {
    seed.map(|s| s.wrapping_add(u64::from(id.0).wrapping_mul(0x9E37_79B9_7F4A_7C15)))
}

pub fn build_policy(id: AgentId, settings: &SimulationConfig) -> Box<dyn CommunicationPolicy> {
    let rng = policy_rng(agent_seed(id, settings.seed));
    match settings.policy {
        PolicyKind::Global => Box::new(GlobalCommunication::new(
            settings.refresh_rate,
            settings.communication_frequency,
            rng,
        )),
        PolicyKind::DistanceLimited => Box::new(DistanceLimitedCommunication::new(
            settings.communication_radius,
            rng,
        )),
        PolicyKind::Delaunay => Box::new(DelaunayNetworkCommunication::new(rng)),
        PolicyKind::ProximityWeighted => Box::new(ProximityWeightedCommunication::new(rng)),
        PolicyKind::Silent => Box::new(SilentCommunication),
    }
}

pub fn build_triangulation(id: AgentId, settings: &SimulationConfig) -> Box<dyn Triangulation> {
    let local = SubTriangulation::new(
        id,
        settings.triangulation_precision,
        settings.max_constellations,
    );
    if settings.reconstruct {
        Box::new(ReconstructTriangulation::new(local, settings.peer_frame_ttl))
    } else {
        Box::new(local)
    }
}

use crate::common::{AgentId, DomainEvent, LocalFrame};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::events::AgentEvent;
use super::node::AgentStatus;

/// Latest known state of one agent as seen by telemetry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentOverview {
    pub agent_id: AgentId,
    pub status: AgentStatus,
    pub frame: LocalFrame,
    pub exchanges: u64,
    pub frames_received: u64,
    pub frame_updates: u64,
    pub skipped_triangulations: u64,
    pub last_skip_reason: Option<String>,
    pub last_activity: DateTime<Utc>,
}

impl AgentOverview {
    pub fn new(agent_id: AgentId, seen_at: DateTime<Utc>) -> Self {
        Self {
            agent_id,
            status: AgentStatus::Running,
            frame: LocalFrame::anchored(agent_id),
            exchanges: 0,
            frames_received: 0,
            frame_updates: 0,
            skipped_triangulations: 0,
            last_skip_reason: None,
            last_activity: seen_at,
        }
    }

    pub fn apply_event(&mut self, event: &AgentEvent) {
        match event {
            AgentEvent::ExchangeCompleted {
                received_frame,
                timestamp,
                ..
            } => {
                self.exchanges += 1;
                if *received_frame {
                    self.frames_received += 1;
                }
                self.last_activity = *timestamp;
            }
            AgentEvent::FrameUpdated {
                frame, timestamp, ..
            } => {
                self.frame = frame.clone();
                self.frame_updates += 1;
                self.last_activity = *timestamp;
            }
            AgentEvent::TriangulationSkipped {
                reason, timestamp, ..
            } => {
                self.skipped_triangulations += 1;
                self.last_skip_reason = Some(reason.clone());
                self.last_activity = *timestamp;
            }
            AgentEvent::StatusChanged {
                status, timestamp, ..
            } => {
                self.status = *status;
                self.last_activity = *timestamp;
            }
        }
    }
}

/// Swarm-wide read model fed by the telemetry actor.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SwarmProjection {
    pub agents: BTreeMap<AgentId, AgentOverview>,
    pub events_applied: u64,
}

impl SwarmProjection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply_event(&mut self, event: &AgentEvent) {
        let agent_id = event.agent_id();
        self.agents
            .entry(agent_id)
            .or_insert_with(|| AgentOverview::new(agent_id, event.occurred_at()))
            .apply_event(event);
        self.events_applied += 1;
    }

    pub fn overview(&self, agent_id: AgentId) -> Option<&AgentOverview> {
        self.agents.get(&agent_id)
    }

    pub fn total_exchanges(&self) -> u64 {
        self.agents.values().map(|a| a.exchanges).sum()
    }

    pub fn frames(&self) -> BTreeMap<AgentId, LocalFrame> {
        self.agents
            .iter()
            .map(|(id, overview)| (*id, overview.frame.clone()))
            .collect()
    }
}

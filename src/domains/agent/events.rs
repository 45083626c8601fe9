use crate::common::{AgentId, DomainEvent, LocalFrame};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::node::AgentStatus;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AgentEvent {
    ExchangeCompleted {
        agent_id: AgentId,
        peer_id: AgentId,
        distance: f64,
        /// Whether the peer advertised a frame worth caching.
        received_frame: bool,
        timestamp: DateTime<Utc>,
    },
    FrameUpdated {
        agent_id: AgentId,
        frame: LocalFrame,
        timestamp: DateTime<Utc>,
    },
    TriangulationSkipped {
        agent_id: AgentId,
        reason: String,
        timestamp: DateTime<Utc>,
    },
    StatusChanged {
        agent_id: AgentId,
        status: AgentStatus,
        timestamp: DateTime<Utc>,
    },
}

impl DomainEvent for AgentEvent {
    fn event_type(&self) -> &'static str {
        match self {
            AgentEvent::ExchangeCompleted { .. } => "ExchangeCompleted",
            AgentEvent::FrameUpdated { .. } => "FrameUpdated",
            AgentEvent::TriangulationSkipped { .. } => "TriangulationSkipped",
            AgentEvent::StatusChanged { .. } => "StatusChanged",
        }
    }

    fn agent_id(&self) -> AgentId {
        match self {
            AgentEvent::ExchangeCompleted { agent_id, .. }
            | AgentEvent::FrameUpdated { agent_id, .. }
            | AgentEvent::TriangulationSkipped { agent_id, .. }
            | AgentEvent::StatusChanged { agent_id, .. } => *agent_id,
        }
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            AgentEvent::ExchangeCompleted { timestamp, .. }
            | AgentEvent::FrameUpdated { timestamp, .. }
            | AgentEvent::TriangulationSkipped { timestamp, .. }
            | AgentEvent::StatusChanged { timestamp, .. } => *timestamp,
        }
    }
}

use crate::common::AgentId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub trait DomainEvent: Send + Sync + Clone {
    fn event_type(&self) -> &'static str;
    fn agent_id(&self) -> AgentId;
    fn occurred_at(&self) -> DateTime<Utc>;
}

/// Serializable wrapper used when events leave the process (telemetry files).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventEnvelope {
    pub event_id: Uuid,
    pub agent_id: AgentId,
    pub event_type: String,
    pub sequence: u64,
    pub event_data: serde_json::Value,
    pub metadata: EventMetadata,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventMetadata {
    pub run_id: Uuid,
    pub source: String,
}

impl EventEnvelope {
    pub fn new<E: DomainEvent + Serialize>(
        event: &E,
        sequence: u64,
        metadata: EventMetadata,
    ) -> Result<Self, serde_json::Error> {
        Ok(Self {
            event_id: Uuid::new_v4(),
            agent_id: event.agent_id(),
            event_type: event.event_type().to_string(),
            sequence,
            event_data: serde_json::to_value(event)?,
            metadata,
            occurred_at: event.occurred_at(),
        })
    }
}

/// Outbound port for telemetry consumers (visualisation, experiment logs).
#[async_trait::async_trait]
pub trait TelemetrySink {
    async fn publish(&self, envelopes: Vec<EventEnvelope>) -> Result<(), String>;
}

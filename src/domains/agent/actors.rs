use crate::common::{
    AgentId, ApplicationError, ApplicationResult, EventEnvelope, EventMetadata, TelemetrySink,
};
use crate::domains::communication::{GroundTruth, Roster};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch, Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use uuid::Uuid;

use super::events::AgentEvent;
use super::node::AgentNode;
use super::projections::SwarmProjection;

/// Per-agent critical section shared by both tick tasks.
pub type SharedNode = Arc<Mutex<AgentNode>>;

/// An agent whose communication and triangulation ticks run as two tokio
/// tasks. Ticks never queue up: a late tick is skipped, and a paused agent
/// simply returns from each tick immediately.
pub struct RunningAgent {
    id: AgentId,
    node: SharedNode,
    shutdown: watch::Sender<bool>,
    communication: JoinHandle<()>,
    triangulation: JoinHandle<()>,
}

impl RunningAgent {
    pub fn spawn(node: AgentNode, roster: Arc<Roster>, oracle: Arc<dyn GroundTruth>) -> Self {
        let id = node.id();
        let communication_period = Duration::from_secs_f64(node.settings().refresh_rate);
        let triangulation_period =
            Duration::from_secs_f64(node.settings().triangulation_refresh_rate);

        let node = Arc::new(Mutex::new(node));
        let (shutdown, shutdown_rx) = watch::channel(false);

        let communication = tokio::spawn(tick_loop(
            communication_period,
            shutdown_rx.clone(),
            node.clone(),
            move |node: &mut AgentNode| {
                node.communication_tick(&roster, oracle.as_ref());
            },
        ));
        let triangulation = tokio::spawn(tick_loop(
            triangulation_period,
            shutdown_rx,
            node.clone(),
            |node: &mut AgentNode| {
                node.triangulation_tick();
            },
        ));

        tracing::info!(agent = %id, "agent started");
        Self {
            id,
            node,
            shutdown,
            communication,
            triangulation,
        }
    }

    pub fn id(&self) -> AgentId {
        self.id
    }

    pub fn node(&self) -> SharedNode {
        self.node.clone()
    }

    pub async fn pause(&self) {
        self.node.lock().await.pause();
    }

    pub async fn resume(&self) {
        self.node.lock().await.resume();
    }

    /// Signals both ticks and waits for them. A tick already in progress
    /// finishes first.
    pub async fn stop(self) -> ApplicationResult<()> {
        let _ = self.shutdown.send(true);
        let communication = self.communication.await;
        let triangulation = self.triangulation.await;
        tracing::info!(agent = %self.id, "agent stopped");

        communication
            .and(triangulation)
            .map_err(|e| ApplicationError::AgentTask(format!("{}: {}", self.id, e)))
    }
}

async fn tick_loop<F>(
    period: Duration,
    mut shutdown: watch::Receiver<bool>,
    node: SharedNode,
    mut tick: F,
) where
    F: FnMut(&mut AgentNode) + Send + 'static,
{
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = interval.tick() => {
                let mut guard = node.lock().await;
                tick(&mut guard);
            }
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
            }
        }
    }
}

/// Folds agent events into the swarm projection and forwards them to an
/// optional telemetry sink.
pub struct TelemetryActor {
    projection: Arc<RwLock<SwarmProjection>>,
    sink: Option<Arc<dyn TelemetrySink + Send + Sync>>,
    event_receiver: mpsc::Receiver<AgentEvent>,
    metadata: EventMetadata,
    sequence: u64,
}

impl TelemetryActor {
    pub fn new(
        event_receiver: mpsc::Receiver<AgentEvent>,
        sink: Option<Arc<dyn TelemetrySink + Send + Sync>>,
    ) -> Self {
        Self {
            projection: Arc::new(RwLock::new(SwarmProjection::new())),
            sink,
            event_receiver,
            metadata: EventMetadata {
                run_id: Uuid::new_v4(),
                source: "TelemetryActor".to_string(),
            },
            sequence: 0,
        }
    }

    pub fn projection(&self) -> Arc<RwLock<SwarmProjection>> {
        self.projection.clone()
    }

    pub fn run_id(&self) -> Uuid {
        self.metadata.run_id
    }

    /// Runs until every event sender is dropped.
    pub async fn run(&mut self) {
        while let Some(event) = self.event_receiver.recv().await {
            if let Err(e) = self.handle_event(event).await {
                tracing::error!("Failed to handle agent event: {}", e);
            }
        }
        tracing::debug!(events = self.sequence, "telemetry actor drained");
    }

    async fn handle_event(&mut self, event: AgentEvent) -> Result<(), String> {
        self.projection.write().await.apply_event(&event);
        self.sequence += 1;

        if let Some(sink) = &self.sink {
            let envelope = EventEnvelope::new(&event, self.sequence, self.metadata.clone())
                .map_err(|e| format!("Failed to create event envelope: {}", e))?;
            sink.publish(vec![envelope]).await?;
        }
        Ok(())
    }
}

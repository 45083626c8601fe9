use crate::adapters::inbound::SharedPositions;
use crate::common::{
    AgentId, ApplicationError, ApplicationResult, LocalFrame, Position2D, TelemetrySink,
};
use crate::config::Config;
use crate::domains::agent::{AgentEvent, AgentNode, RunningAgent, SwarmProjection, TelemetryActor};
use crate::domains::communication::{GroundTruth, Roster};
use crate::domains::logger::DynLogger;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, RwLock};
use tokio::task::JoinHandle;

const EVENT_CHANNEL_CAPACITY: usize = 4096;
const TELEMETRY_DRAIN_TIMEOUT: Duration = Duration::from_secs(2);

/// Simulation-level controller: builds one agent per placement, owns the
/// roster and the ground truth, and starts, pauses and stops them together.
pub struct SimulationService {
    config: Config,
    logger: DynLogger,
    oracle: Arc<SharedPositions>,
    roster: Arc<Roster>,
    pending: Vec<AgentNode>,
    running: Vec<RunningAgent>,
    telemetry: Option<TelemetryActor>,
    telemetry_task: Option<JoinHandle<()>>,
    projection: Arc<RwLock<SwarmProjection>>,
}

impl SimulationService {
    /// Validates `config` before anything is built; invalid configurations
    /// never get as far as creating agents.
    pub fn new(
        config: Config,
        logger: DynLogger,
        sink: Option<Arc<dyn TelemetrySink + Send + Sync>>,
    ) -> ApplicationResult<Self> {
        config.validate()?;

        let placements = config.placements();
        let oracle = Arc::new(SharedPositions::from_placements(
            placements.iter().map(|p| (p.agent_id(), p.position())),
        ));

        let (events, receiver) = mpsc::channel::<AgentEvent>(EVENT_CHANNEL_CAPACITY);
        let telemetry = TelemetryActor::new(receiver, sink);
        let projection = telemetry.projection();

        let pending: Vec<AgentNode> = placements
            .iter()
            .map(|p| {
                AgentNode::from_config(p.agent_id(), &config.simulation, logger.clone())
                    .with_events(events.clone())
            })
            .collect();
        let roster = Arc::new(Roster::new(pending.iter().map(|n| n.handle()).collect()));

        logger.info(&format!(
            "simulation prepared: {} agents, {:?} policy, reconstruct={}",
            pending.len(),
            config.simulation.policy,
            config.simulation.reconstruct
        ));

        Ok(Self {
            config,
            logger,
            oracle,
            roster,
            pending,
            running: Vec::new(),
            telemetry: Some(telemetry),
            telemetry_task: None,
            projection,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn roster(&self) -> Arc<Roster> {
        self.roster.clone()
    }

    pub fn oracle(&self) -> Arc<SharedPositions> {
        self.oracle.clone()
    }

    pub fn is_running(&self) -> bool {
        !self.running.is_empty()
    }

    /// Spawns the telemetry actor and both ticks of every agent.
    pub fn start(&mut self) -> ApplicationResult<()> {
        if self.pending.is_empty() {
            return Err(ApplicationError::AgentTask(
                "simulation already started or has no agents".to_string(),
            ));
        }

        if let Some(mut actor) = self.telemetry.take() {
            self.telemetry_task = Some(tokio::spawn(async move { actor.run().await }));
        }

        let oracle: Arc<dyn GroundTruth> = self.oracle.clone();
        for node in self.pending.drain(..) {
            self.running
                .push(RunningAgent::spawn(node, self.roster.clone(), oracle.clone()));
        }

        self.logger
            .info(&format!("simulation started with {} agents", self.running.len()));
        Ok(())
    }

    pub async fn pause(&self) {
        for agent in &self.running {
            agent.pause().await;
        }
        self.logger.info("simulation paused");
    }

    pub async fn resume(&self) {
        for agent in &self.running {
            agent.resume().await;
        }
        self.logger.info("simulation resumed");
    }

    pub async fn pause_agent(&self, id: AgentId) -> ApplicationResult<()> {
        self.running_agent(id)?.pause().await;
        Ok(())
    }

    pub async fn resume_agent(&self, id: AgentId) -> ApplicationResult<()> {
        self.running_agent(id)?.resume().await;
        Ok(())
    }

    fn running_agent(&self, id: AgentId) -> ApplicationResult<&RunningAgent> {
        self.running
            .iter()
            .find(|a| a.id() == id)
            .ok_or_else(|| ApplicationError::AgentTask(format!("{} is not running", id)))
    }

    /// Moves an agent's true position; later exchanges see the new distances.
    pub fn move_agent(&self, id: AgentId, position: Position2D) -> ApplicationResult<()> {
        if self.roster.get(id).is_none() {
            return Err(ApplicationError::AgentTask(format!("unknown agent {}", id)));
        }
        self.oracle.move_agent(id, position)?;
        Ok(())
    }

    /// Every agent's currently published frame.
    pub fn published_frames(&self) -> BTreeMap<AgentId, LocalFrame> {
        self.roster
            .iter()
            .map(|handle| (handle.id(), handle.published_frame()))
            .collect()
    }

    pub async fn projection(&self) -> SwarmProjection {
        self.projection.read().await.clone()
    }

    /// Stops every agent (joining both ticks), then lets the telemetry actor
    /// drain, and returns the final projection.
    pub async fn stop(mut self) -> ApplicationResult<SwarmProjection> {
        let mut first_error = None;
        for agent in self.running.drain(..) {
            if let Err(e) = agent.stop().await {
                self.logger.error(&format!("agent did not stop cleanly: {}", e));
                first_error.get_or_insert(e);
            }
        }

        // Dropping the remaining senders closes the event channel.
        self.pending.clear();
        self.telemetry = None;

        if let Some(task) = self.telemetry_task.take() {
            let abort = task.abort_handle();
            match tokio::time::timeout(TELEMETRY_DRAIN_TIMEOUT, task).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    first_error.get_or_insert(ApplicationError::Telemetry(e.to_string()));
                }
                Err(_) => {
                    self.logger
                        .warn("telemetry actor still had open senders, aborting it");
                    abort.abort();
                }
            }
        }

        self.logger.info("simulation stopped");
        match first_error {
            Some(e) => Err(e),
            None => Ok(self.projection.read().await.clone()),
        }
    }
}

use crate::common::{AgentId, ApplicationError, ApplicationResult, Position2D};
use crate::domains::communication::PolicyKind;
use crate::domains::gossip::PayloadMode;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

/// Prefix for environment overrides, e.g. `SWARM__SIMULATION__REFRESH_RATE=0.02`.
pub const ENV_PREFIX: &str = "SWARM";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub simulation: SimulationConfig,
    pub logging: LoggingConfig,
    pub agents: Vec<AgentPlacement>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Communication tick period, seconds.
    pub refresh_rate: f64,
    /// Triangulation tick period, seconds.
    pub triangulation_refresh_rate: f64,
    /// Tolerance for candidate placement, in distance units.
    pub triangulation_precision: f64,
    /// Mean seconds between successful exchanges.
    pub communication_frequency: f64,
    pub communication_radius: f64,
    /// Staleness threshold for gossiped distances and the advertised frame.
    pub time_to_live: f64,
    /// Expiry for cached peer frames; `None` keeps them until overwritten.
    pub peer_frame_ttl: Option<f64>,
    pub policy: PolicyKind,
    pub payload: PayloadMode,
    /// Merge peer frames into the local sub-triangulation.
    pub reconstruct: bool,
    pub seed: Option<u64>,
    pub max_constellations: usize,
    pub duration_secs: f64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            refresh_rate: 0.01,
            triangulation_refresh_rate: 0.05,
            triangulation_precision: 0.1,
            communication_frequency: 0.5,
            communication_radius: 15.0,
            time_to_live: 10.0,
            peer_frame_ttl: None,
            policy: PolicyKind::Global,
            payload: PayloadMode::DistancesAndFrame,
            reconstruct: true,
            seed: None,
            max_constellations: 64,
            duration_secs: 10.0,
        }
    }
}

impl SimulationConfig {
    pub fn validate(&self) -> ApplicationResult<()> {
        tick_period("simulation.refresh_rate", self.refresh_rate)?;
        tick_period(
            "simulation.triangulation_refresh_rate",
            self.triangulation_refresh_rate,
        )?;
        positive(
            "simulation.triangulation_precision",
            self.triangulation_precision,
        )?;
        positive(
            "simulation.communication_frequency",
            self.communication_frequency,
        )?;
        positive("simulation.time_to_live", self.time_to_live)?;
        if let Some(ttl) = self.peer_frame_ttl {
            positive("simulation.peer_frame_ttl", ttl)?;
        }
        if !self.communication_radius.is_finite() || self.communication_radius < 0.0 {
            return Err(ApplicationError::invalid_config(
                "simulation.communication_radius",
                format!("must be a non-negative number, got {}", self.communication_radius),
            ));
        }
        if self.max_constellations == 0 {
            return Err(ApplicationError::invalid_config(
                "simulation.max_constellations",
                "must allow at least one constellation",
            ));
        }
        if Duration::try_from_secs_f64(self.duration_secs).is_err() {
            return Err(ApplicationError::invalid_config(
                "simulation.duration_secs",
                format!("must be a non-negative number of seconds, got {}", self.duration_secs),
            ));
        }
        Ok(())
    }
}

fn positive(field: &str, value: f64) -> ApplicationResult<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ApplicationError::invalid_config(
            field,
            format!("must be greater than zero, got {}", value),
        ))
    }
}

/// A period the tick timers can actually be built from: positive, no
/// shorter than a nanosecond and within `Duration` range.
fn tick_period(field: &str, value: f64) -> ApplicationResult<()> {
    positive(field, value)?;
    match Duration::try_from_secs_f64(value) {
        Ok(period) if !period.is_zero() => Ok(()),
        _ => Err(ApplicationError::invalid_config(
            field,
            format!("{} seconds cannot be scheduled as a tick period", value),
        )),
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `tracing` filter used when `RUST_LOG` is unset.
    pub level: String,
    /// Domain log file; console only when absent.
    pub file: Option<String>,
    /// Channel size of the buffered domain logger.
    pub buffer_capacity: usize,
    /// JSON-lines telemetry output.
    pub telemetry_file: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
            buffer_capacity: 1024,
            telemetry_file: None,
        }
    }
}

/// True starting position of one simulated agent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AgentPlacement {
    pub id: u32,
    pub x: f64,
    pub y: f64,
}

impl AgentPlacement {
    pub fn agent_id(&self) -> AgentId {
        AgentId(self.id)
    }

    pub fn position(&self) -> Position2D {
        Position2D::new(self.x, self.y)
    }
}

impl Config {
    pub async fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = tokio::fs::read_to_string(path).await?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        Ok(config)
    }

    /// Optional file layered under `SWARM__*` environment overrides.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::from(path.as_ref()).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;
        Ok(settings.try_deserialize()?)
    }

    /// Rejects anything periodic scheduling cannot be defined for. Must pass
    /// before any agent starts.
    pub fn validate(&self) -> ApplicationResult<()> {
        self.simulation.validate()?;

        let mut seen = HashSet::new();
        for placement in &self.agents {
            if !seen.insert(placement.id) {
                return Err(ApplicationError::invalid_config(
                    "agents",
                    format!("agent id {} appears more than once", placement.id),
                ));
            }
            if !placement.position().is_finite() {
                return Err(ApplicationError::invalid_config(
                    "agents",
                    format!("agent {} has a non-finite position", placement.id),
                ));
            }
        }
        Ok(())
    }

    /// The configured agents, or four agents on a 10 x 10 square.
    pub fn placements(&self) -> Vec<AgentPlacement> {
        if !self.agents.is_empty() {
            return self.agents.clone();
        }
        [(0.0, 0.0), (0.0, 10.0), (10.0, 0.0), (10.0, 10.0)]
            .iter()
            .enumerate()
            .map(|(i, (x, y))| AgentPlacement {
                id: i as u32,
                x: *x,
                y: *y,
            })
            .collect()
    }
}

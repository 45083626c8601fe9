use crate::common::AgentId;
use chrono::Utc;
use log::{error as log_error, info as log_info, warn as log_warn};
use std::sync::Arc;

/// Domain-level logging port.
/// Non-fallible from the domain perspective; adapters decide where messages go.
pub trait DomainLogger: Send + Sync + 'static {
    fn info(&self, msg: &str);
    fn warn(&self, msg: &str);
    fn error(&self, msg: &str);
}

pub type DynLogger = Arc<dyn DomainLogger>;

/// A file-based adapter using `fast_log` for file writing.
pub struct FileLogger;

impl FileLogger {
    /// Initialize the fast_log file logger at `path`. `level` follows the
    /// `log` crate names (`error`, `warn`, `info`, `debug`, `trace`); anything
    /// else falls back to `info`.
    pub fn init(path: &str, level: &str) -> Result<(), Box<dyn std::error::Error>> {
        let level = level.parse::<log::LevelFilter>().unwrap_or(log::LevelFilter::Info);
        fast_log::init(fast_log::config::Config::new().file(path).level(level))?;
        Ok(())
    }
}

impl DomainLogger for FileLogger {
    fn info(&self, msg: &str) {
        log_info!("{} - {}", Utc::now().to_rfc3339(), msg);
    }

    fn warn(&self, msg: &str) {
        log_warn!("{} - {}", Utc::now().to_rfc3339(), msg);
    }

    fn error(&self, msg: &str) {
        log_error!("{} - {}", Utc::now().to_rfc3339(), msg);
    }
}

/// Prefixes every message with the owning agent, e.g. `agent 3: frame updated`.
pub struct AgentScopedLogger {
    agent: AgentId,
    inner: DynLogger,
}

impl AgentScopedLogger {
    pub fn new(agent: AgentId, inner: DynLogger) -> Self {
        Self { agent, inner }
    }

    pub fn wrap(agent: AgentId, inner: DynLogger) -> DynLogger {
        Arc::new(Self::new(agent, inner))
    }
}

impl DomainLogger for AgentScopedLogger {
    fn info(&self, msg: &str) {
        self.inner.info(&format!("agent {}: {}", self.agent.0, msg));
    }

    fn warn(&self, msg: &str) {
        self.inner.warn(&format!("agent {}: {}", self.agent.0, msg));
    }

    fn error(&self, msg: &str) {
        self.inner.error(&format!("agent {}: {}", self.agent.0, msg));
    }
}

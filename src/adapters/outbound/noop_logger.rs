use crate::domains::logger::{DomainLogger, DynLogger};
use std::sync::Arc;

pub struct NoopLogger;

impl DomainLogger for NoopLogger {
    fn info(&self, _msg: &str) {}
    fn warn(&self, _msg: &str) {}
    fn error(&self, _msg: &str) {}
}

/// Discards everything; the default for agents built in tests.
pub fn init_noop_logger() -> DynLogger {
    Arc::new(NoopLogger)
}

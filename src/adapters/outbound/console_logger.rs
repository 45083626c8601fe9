use crate::domains::logger::{DomainLogger, DynLogger};
use chrono::Utc;
use std::sync::Arc;

/// Writes domain messages to stdout, warnings and errors to stderr.
pub struct ConsoleLogger;

impl DomainLogger for ConsoleLogger {
    fn info(&self, msg: &str) {
        println!("{} INFO  {}", Utc::now().format("%H:%M:%S%.3f"), msg);
    }

    fn warn(&self, msg: &str) {
        eprintln!("{} WARN  {}", Utc::now().format("%H:%M:%S%.3f"), msg);
    }

    fn error(&self, msg: &str) {
        eprintln!("{} ERROR {}", Utc::now().format("%H:%M:%S%.3f"), msg);
    }
}

/// Console-backed DomainLogger, also the fallback when no log file is usable.
pub fn init_console_logger() -> DynLogger {
    Arc::new(ConsoleLogger)
}

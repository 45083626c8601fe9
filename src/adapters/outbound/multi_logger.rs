use crate::domains::logger::{DomainLogger, DynLogger};
use std::sync::Arc;

use super::console_logger::init_console_logger;
use super::file_logger::init_file_logger;

/// Fans every message out to all inner loggers, in order.
pub struct MultiLogger {
    targets: Vec<DynLogger>,
}

impl MultiLogger {
    pub fn new(targets: Vec<DynLogger>) -> Self {
        Self { targets }
    }
}

impl DomainLogger for MultiLogger {
    fn info(&self, msg: &str) {
        self.targets.iter().for_each(|t| t.info(msg));
    }

    fn warn(&self, msg: &str) {
        self.targets.iter().for_each(|t| t.warn(msg));
    }

    fn error(&self, msg: &str) {
        self.targets.iter().for_each(|t| t.error(msg));
    }
}

/// File plus console; console alone when the file logger cannot start.
pub fn init_combined_logger(path: &str, level: &str) -> DynLogger {
    let console = init_console_logger();
    match init_file_logger(path, level) {
        Ok(file) => Arc::new(MultiLogger::new(vec![file, console])),
        Err(e) => {
            console.warn(&format!("{}; logging to console only", e));
            console
        }
    }
}

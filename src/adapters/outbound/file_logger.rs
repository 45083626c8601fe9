use crate::domains::logger::{DomainLogger, DynLogger, FileLogger};
use std::sync::Arc;

/// Forwards to the `log` facade once `fast_log` owns it.
struct LogBridge;

impl DomainLogger for LogBridge {
    fn info(&self, msg: &str) {
        log::info!("{}", msg);
    }

    fn warn(&self, msg: &str) {
        log::warn!("{}", msg);
    }

    fn error(&self, msg: &str) {
        log::error!("{}", msg);
    }
}

/// Installs `fast_log` writing to `path`. Only the first call in a process
/// can succeed since it claims the global `log` logger.
pub fn init_file_logger(path: &str, level: &str) -> Result<DynLogger, String> {
    FileLogger::init(path, level)
        .map_err(|e| format!("Failed to initialize fast_log at {}: {}", path, e))?;
    Ok(Arc::new(LogBridge))
}

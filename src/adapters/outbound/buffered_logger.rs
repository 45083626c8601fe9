use crate::domains::logger::{DomainLogger, DynLogger};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Level {
    Info,
    Warn,
    Error,
}

struct LogMessage {
    level: Level,
    msg: String,
}

/// Never blocks a tick: messages go through a bounded channel to a
/// background task and are dropped (and counted) when the channel is full.
pub struct BufferedLogger {
    sender: mpsc::Sender<LogMessage>,
    dropped: AtomicU64,
}

impl BufferedLogger {
    /// Must be called inside a tokio runtime.
    pub fn spawn(bridge: DynLogger, capacity: usize) -> Arc<Self> {
        let (sender, mut rx) = mpsc::channel::<LogMessage>(capacity.max(1));

        tokio::spawn(async move {
            while let Some(message) = rx.recv().await {
                match message.level {
                    Level::Info => bridge.info(&message.msg),
                    Level::Warn => bridge.warn(&message.msg),
                    Level::Error => bridge.error(&message.msg),
                }
            }
        });

        Arc::new(Self {
            sender,
            dropped: AtomicU64::new(0),
        })
    }

    /// Messages lost to a full or closed channel.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    fn push(&self, level: Level, msg: &str) {
        let message = LogMessage {
            level,
            msg: msg.to_string(),
        };
        if self.sender.try_send(message).is_err() {
            self.dropped.fetch_add(1, Ordering::Relaxed);
        }
    }
}

impl DomainLogger for BufferedLogger {
    fn info(&self, msg: &str) {
        self.push(Level::Info, msg);
    }

    fn warn(&self, msg: &str) {
        self.push(Level::Warn, msg);
    }

    fn error(&self, msg: &str) {
        self.push(Level::Error, msg);
    }
}

pub fn init_buffered_logger(bridge: DynLogger, capacity: usize) -> DynLogger {
    BufferedLogger::spawn(bridge, capacity)
}

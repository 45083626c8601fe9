use crate::common::{EventEnvelope, TelemetrySink};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::Mutex;

/// Appends telemetry envelopes to a JSON Lines file (one envelope per line),
/// for offline plotting of a run.
pub struct JsonLinesTelemetrySink {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonLinesTelemetrySink {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads back every envelope written so far; a missing file is empty.
    pub async fn read_all(&self) -> Result<Vec<EventEnvelope>, String> {
        if !self.path.exists() {
            return Ok(vec![]);
        }

        let file = File::open(&self.path)
            .await
            .map_err(|e| format!("Failed to open telemetry file {}: {}", self.path.display(), e))?;
        let mut lines = BufReader::new(file).lines();
        let mut envelopes = Vec::new();
        let mut line_number = 0u64;

        while let Some(line) = lines
            .next_line()
            .await
            .map_err(|e| format!("Failed to read line: {}", e))?
        {
            line_number += 1;
            if line.trim().is_empty() {
                continue;
            }
            let envelope: EventEnvelope = serde_json::from_str(&line).map_err(|e| {
                format!("Failed to deserialize envelope at line {}: {}", line_number, e)
            })?;
            envelopes.push(envelope);
        }

        Ok(envelopes)
    }
}

#[async_trait]
impl TelemetrySink for JsonLinesTelemetrySink {
    async fn publish(&self, envelopes: Vec<EventEnvelope>) -> Result<(), String> {
        if envelopes.is_empty() {
            return Ok(());
        }

        let mut buffer = String::new();
        for envelope in &envelopes {
            let line = serde_json::to_string(envelope)
                .map_err(|e| format!("Failed to serialize envelope: {}", e))?;
            buffer.push_str(&line);
            buffer.push('\n');
        }

        let _guard = self.write_lock.lock().await;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| format!("Failed to create telemetry directory: {}", e))?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|e| format!("Failed to open telemetry file {}: {}", self.path.display(), e))?;
        file.write_all(buffer.as_bytes())
            .await
            .map_err(|e| format!("Failed to write envelopes: {}", e))?;
        file.flush()
            .await
            .map_err(|e| format!("Failed to flush telemetry file: {}", e))?;

        Ok(())
    }
}

//! Telemetry sinks.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};

use assessor_core::events::LearningEvent;
use assessor_core::traits::TelemetrySink;

/// Appends each event as one JSON line.
pub struct JsonlSink {
    path: PathBuf,
    file: Mutex<File>,
}

impl JsonlSink {
    pub fn create(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("failed to open telemetry log {}", path.display()))?;
        Ok(Self {
            path: path.to_path_buf(),
            file: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TelemetrySink for JsonlSink {
    fn record(&self, event: &LearningEvent) -> Result<()> {
        let line = serde_json::to_string(event).context("failed to serialize event")?;
        let mut file = self
            .file
            .lock()
            .map_err(|_| anyhow::anyhow!("telemetry log lock poisoned"))?;
        writeln!(file, "{line}")
            .with_context(|| format!("failed to append to {}", self.path.display()))?;
        Ok(())
    }
}

/// Emits events as structured tracing records under `assessor::telemetry`.
pub struct TracingSink;

impl TelemetrySink for TracingSink {
    fn record(&self, event: &LearningEvent) -> Result<()> {
        let payload = serde_json::to_string(event)?;
        tracing::info!(
            target: "assessor::telemetry",
            event = event.name(),
            session = %event.session_id(),
            "{payload}"
        );
        Ok(())
    }
}

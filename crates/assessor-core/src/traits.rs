//! Seams to the engine's external collaborators.
//!
//! - [`QuestionSource`]: asynchronous, fallible question-set acquisition
//! - [`TelemetrySink`]: fire-and-forget learning events
//! - [`Notifier`]: learner-facing "show message" surface
//!
//! Concrete sources and sinks live in `assessor-sources`; the in-memory
//! implementations here serve embedding hosts and tests.

use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::SourceError;
use crate::events::{LearningEvent, Notice};
use crate::model::{Mode, Question};
use crate::selector::select_questions;

// ---------------------------------------------------------------------------
// Question source
// ---------------------------------------------------------------------------

/// Supplies the ordered question set for a new session.
#[async_trait]
pub trait QuestionSource: Send + Sync {
    /// Human-readable source name (e.g. "bank", "http").
    fn name(&self) -> &str;

    /// Fetch questions for `mode`, optionally restricted to `topic`.
    async fn fetch(&self, mode: Mode, topic: Option<&str>) -> Result<Vec<Question>, SourceError>;
}

/// Serves questions from memory through the standard selector.
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    questions: Vec<Question>,
    limit: Option<usize>,
}

impl StaticSource {
    pub fn new(questions: Vec<Question>) -> Self {
        Self {
            questions,
            limit: None,
        }
    }

    pub fn with_limit(mut self, limit: Option<usize>) -> Self {
        self.limit = limit;
        self
    }
}

#[async_trait]
impl QuestionSource for StaticSource {
    fn name(&self) -> &str {
        "static"
    }

    async fn fetch(&self, mode: Mode, topic: Option<&str>) -> Result<Vec<Question>, SourceError> {
        let selected = select_questions(&self.questions, mode, topic, self.limit);
        if selected.is_empty() {
            return Err(SourceError::Empty(describe_request(mode, topic)));
        }
        Ok(selected)
    }
}

/// Describe a `(mode, topic)` request for error messages.
pub fn describe_request(mode: Mode, topic: Option<&str>) -> String {
    match topic {
        Some(topic) => format!("{mode} mode, topic '{topic}'"),
        None => format!("{mode} mode"),
    }
}

// ---------------------------------------------------------------------------
// Telemetry sink
// ---------------------------------------------------------------------------

/// Records learning events. Errors are logged by the session and never
/// interrupt it.
pub trait TelemetrySink: Send + Sync {
    fn record(&self, event: &LearningEvent) -> anyhow::Result<()>;
}

/// Drops every event.
pub struct NoopTelemetry;

impl TelemetrySink for NoopTelemetry {
    fn record(&self, _: &LearningEvent) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Keeps events in memory, in arrival order.
#[derive(Default)]
pub struct MemoryTelemetry {
    events: Mutex<Vec<LearningEvent>>,
}

impl MemoryTelemetry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<LearningEvent> {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Number of recorded events with the given name.
    pub fn count(&self, name: &str) -> usize {
        self.events().iter().filter(|e| e.name() == name).count()
    }
}

impl TelemetrySink for MemoryTelemetry {
    fn record(&self, event: &LearningEvent) -> anyhow::Result<()> {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(event.clone());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Notification surface
// ---------------------------------------------------------------------------

/// Shows short messages to the learner.
pub trait Notifier: Send + Sync {
    fn notify(&self, notice: &Notice);
}

/// Discards every notice.
pub struct NoopNotifier;

impl Notifier for NoopNotifier {
    fn notify(&self, _: &Notice) {}
}

/// Keeps notices in memory, in arrival order.
#[derive(Default)]
pub struct MemoryNotifier {
    notices: Mutex<Vec<Notice>>,
}

impl MemoryNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notices(&self) -> Vec<Notice> {
        self.notices
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl Notifier for MemoryNotifier {
    fn notify(&self, notice: &Notice) {
        self.notices
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(notice.clone());
    }
}

//! The assessment session state machine.
//!
//! A session moves `NotStarted -> Running -> Finished`. Every transition is a
//! method returning an outcome value; calls that do not apply in the current
//! state are rejected through that value rather than by panicking. The finish
//! transition is guarded so the last submission and clock expiry can race
//! without producing two reports.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::answer::{Answer, AnswerRecord, ConfidenceScale, Grade};
use crate::clock::{SessionClock, Tick};
use crate::error::{SourceError, ValidationError};
use crate::evaluator::evaluate;
use crate::events::{LearningEvent, Notice};
use crate::model::{Mode, Question};
use crate::recommendations::{
    PhraseRotation, CORRECT_PHRASES, INCORRECT_PHRASES, UNGRADED_PHRASES,
};
use crate::report::{AssessmentReport, FinishReason};
use crate::scoring::aggregate;
use crate::traits::{
    describe_request, NoopNotifier, NoopTelemetry, Notifier, QuestionSource, TelemetrySink,
};

/// A session shared between the host and its [`ClockDriver`](crate::clock::ClockDriver).
pub type SharedSession = Arc<tokio::sync::Mutex<AssessmentSession>>;

/// Clock budget per mode, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModeDurations {
    pub practice: u64,
    pub assessment: u64,
    pub adaptive: u64,
}

impl Default for ModeDurations {
    fn default() -> Self {
        Self {
            practice: 30 * 60,
            assessment: 10 * 60,
            adaptive: 15 * 60,
        }
    }
}

impl ModeDurations {
    pub fn for_mode(&self, mode: Mode) -> u64 {
        match mode {
            Mode::Practice => self.practice,
            Mode::Assessment => self.assessment,
            Mode::Adaptive => self.adaptive,
        }
    }
}

/// Session settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub durations: ModeDurations,
    /// Cap on the number of questions taken from the source.
    pub max_questions: Option<usize>,
    pub confidence_scale: ConfidenceScale,
}

/// Externally visible lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    NotStarted,
    Running,
    Finished,
}

/// Why a submission was not recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    NotRunning,
    /// The current record was sealed when the learner moved past it.
    Sealed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    Advanced { grade: Grade, next_index: usize },
    /// The last question was answered and the session finished.
    Finished { grade: Grade },
    Rejected(Rejection),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavOutcome {
    Moved { index: usize },
    OutOfBounds,
    NotRunning,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// Nothing is running.
    Idle,
    Counted { remaining: u64 },
    QuestionTimeUp { question_id: String, remaining: u64 },
    /// Time ran out and the session was force-finished.
    Expired,
}

enum Phase {
    NotStarted { last_error: Option<SourceError> },
    Running(Box<RunningSession>),
    Finished(Box<AssessmentReport>),
}

struct RunningSession {
    id: Uuid,
    mode: Mode,
    topic: Option<String>,
    started_at: DateTime<Utc>,
    questions: Vec<Question>,
    current_index: usize,
    answers: HashMap<String, AnswerRecord>,
    hints: HashMap<String, u32>,
    confidence: HashMap<String, u32>,
    /// Seconds spent on each question over earlier visits.
    carried_time: HashMap<String, u64>,
    flagged: BTreeSet<String>,
    timed_out: HashSet<String>,
    clock: SessionClock,
}

impl RunningSession {
    fn current(&self) -> &Question {
        &self.questions[self.current_index]
    }

    fn current_id(&self) -> String {
        self.current().id.clone()
    }

    /// Time on the current question, earlier visits included.
    fn current_time(&self) -> u64 {
        let carried = self
            .carried_time
            .get(&self.current().id)
            .copied()
            .unwrap_or(0);
        carried + self.clock.question_elapsed()
    }

    /// Seal the current record and bank this visit's time.
    fn leave_current(&mut self) {
        let id = self.current_id();
        *self.carried_time.entry(id.clone()).or_insert(0) += self.clock.question_elapsed();
        if let Some(record) = self.answers.get_mut(&id) {
            record.sealed = true;
        }
    }

    fn enter(&mut self, index: usize) {
        self.current_index = index;
        let question = &self.questions[index];
        let limit = if self.timed_out.contains(&question.id) {
            None
        } else {
            question.time_limit_seconds.map(u64::from)
        };
        self.clock.reset_question(limit);
    }

    fn move_to(&mut self, index: usize) -> NavOutcome {
        if index >= self.questions.len() {
            return NavOutcome::OutOfBounds;
        }
        if index != self.current_index {
            self.leave_current();
            self.enter(index);
        }
        NavOutcome::Moved { index }
    }

    fn hints_used(&self, question_id: &str) -> u32 {
        self.hints.get(question_id).copied().unwrap_or(0)
    }

    fn set_hints(&mut self, question_id: &str, count: u32) {
        self.hints.insert(question_id.to_string(), count);
        if let Some(record) = self.answers.get_mut(question_id) {
            if !record.sealed {
                record.hints_used = count;
            }
        }
    }
}

/// Feedback phrase rotations, one per grade.
struct Feedback {
    correct: PhraseRotation,
    incorrect: PhraseRotation,
    ungraded: PhraseRotation,
}

impl Default for Feedback {
    fn default() -> Self {
        Self {
            correct: PhraseRotation::new(CORRECT_PHRASES),
            incorrect: PhraseRotation::new(INCORRECT_PHRASES),
            ungraded: PhraseRotation::new(UNGRADED_PHRASES),
        }
    }
}

impl Feedback {
    fn phrase(&mut self, grade: Grade) -> &'static str {
        match grade {
            Grade::Correct => self.correct.next_phrase(),
            Grade::Incorrect => self.incorrect.next_phrase(),
            Grade::Ungraded => self.ungraded.next_phrase(),
        }
    }
}

/// One learner's pass through a question set.
pub struct AssessmentSession {
    config: SessionConfig,
    phase: Phase,
    telemetry: Arc<dyn TelemetrySink>,
    notifier: Arc<dyn Notifier>,
    feedback: Feedback,
}

impl AssessmentSession {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            phase: Phase::NotStarted { last_error: None },
            telemetry: Arc::new(NoopTelemetry),
            notifier: Arc::new(NoopNotifier),
            feedback: Feedback::default(),
        }
    }

    pub fn with_telemetry(mut self, telemetry: Arc<dyn TelemetrySink>) -> Self {
        self.telemetry = telemetry;
        self
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    /// Wrap the session for sharing with a clock driver.
    pub fn into_shared(self) -> SharedSession {
        Arc::new(tokio::sync::Mutex::new(self))
    }

    // -----------------------------------------------------------------------
    // Transitions
    // -----------------------------------------------------------------------

    /// Acquire questions and begin. On failure the session stays
    /// `NotStarted` and the error is kept in [`last_error`](Self::last_error).
    /// Starting while already running is a no-op.
    pub async fn start(
        &mut self,
        source: &dyn QuestionSource,
        mode: Mode,
        topic: Option<&str>,
    ) -> Result<(), SourceError> {
        if matches!(self.phase, Phase::Running(_)) {
            tracing::warn!("start ignored: session already running");
            return Ok(());
        }

        let fetched = source.fetch(mode, topic).await.and_then(|mut questions| {
            if let Some(max) = self.config.max_questions {
                questions.truncate(max);
            }
            if questions.is_empty() {
                return Err(SourceError::Empty(describe_request(mode, topic)));
            }
            let duplicate = {
                let mut seen = HashSet::new();
                questions
                    .iter()
                    .find(|q| !seen.insert(q.id.as_str()))
                    .map(|q| q.id.clone())
            };
            if let Some(id) = duplicate {
                return Err(SourceError::Malformed(format!("duplicate question id '{id}'")));
            }
            Ok(questions)
        });

        let questions = match fetched {
            Ok(questions) => questions,
            Err(e) => {
                tracing::warn!(
                    source = source.name(),
                    retryable = e.is_retryable(),
                    "failed to acquire questions: {e}"
                );
                self.phase = Phase::NotStarted {
                    last_error: Some(e.clone()),
                };
                return Err(e);
            }
        };

        let duration = self.config.durations.for_mode(mode);
        let mut clock = SessionClock::new(duration);
        clock.start();

        let mut running = RunningSession {
            id: Uuid::new_v4(),
            mode,
            topic: topic.map(str::to_string),
            started_at: Utc::now(),
            questions,
            current_index: 0,
            answers: HashMap::new(),
            hints: HashMap::new(),
            confidence: HashMap::new(),
            carried_time: HashMap::new(),
            flagged: BTreeSet::new(),
            timed_out: HashSet::new(),
            clock,
        };
        running.enter(0);

        tracing::info!(
            session = %running.id,
            %mode,
            questions = running.questions.len(),
            duration,
            "session started"
        );

        self.emit(LearningEvent::SessionStarted {
            session_id: running.id,
            mode,
            topic: running.topic.clone(),
            question_count: running.questions.len(),
            time_limit_seconds: duration,
            at: running.started_at,
        });
        self.notifier.notify(&Notice::SessionStarted {
            mode,
            question_count: running.questions.len(),
            time_limit_seconds: duration,
        });

        self.phase = Phase::Running(Box::new(running));
        Ok(())
    }

    /// Grade `answer` for the current question, record it, then advance or
    /// finish on the last question. A record may be overwritten until the
    /// learner moves past it.
    pub fn submit_answer(&mut self, answer: Answer) -> SubmitOutcome {
        let Phase::Running(running) = &mut self.phase else {
            return SubmitOutcome::Rejected(Rejection::NotRunning);
        };

        let question = running.current().clone();
        if running
            .answers
            .get(&question.id)
            .is_some_and(|r| r.sealed)
        {
            tracing::debug!(question = %question.id, "submission rejected: record sealed");
            return SubmitOutcome::Rejected(Rejection::Sealed);
        }

        let grade = evaluate(&question, Some(&answer));
        let record = AnswerRecord {
            question_id: question.id.clone(),
            answer,
            grade,
            points_awarded: if grade.is_correct() { question.points } else { 0 },
            confidence: running.confidence.get(&question.id).copied(),
            hints_used: running.hints_used(&question.id),
            time_spent_seconds: running.current_time(),
            sealed: false,
        };
        let event = LearningEvent::AnswerSubmitted {
            session_id: running.id,
            mode: running.mode,
            topic: question.topic.clone(),
            question_id: question.id.clone(),
            question_type: question.type_name().to_string(),
            difficulty: question.difficulty,
            grade,
            time_spent_seconds: record.time_spent_seconds,
            confidence: record.confidence,
            hints_used: record.hints_used,
            at: Utc::now(),
        };
        running.answers.insert(question.id.clone(), record);

        let is_last = running.current_index + 1 >= running.questions.len();
        let next_index = running.current_index + 1;
        if !is_last {
            running.leave_current();
            running.enter(next_index);
        }

        tracing::debug!(question = %question.id, %grade, "answer recorded");
        self.emit(event);
        let message = self.feedback.phrase(grade).to_string();
        self.notifier.notify(&Notice::AnswerFeedback {
            question_id: question.id,
            grade,
            message,
        });

        if is_last {
            self.finish(FinishReason::Completed);
            SubmitOutcome::Finished { grade }
        } else {
            SubmitOutcome::Advanced { grade, next_index }
        }
    }

    pub fn go_previous(&mut self) -> NavOutcome {
        match &mut self.phase {
            Phase::Running(running) if running.current_index == 0 => NavOutcome::OutOfBounds,
            Phase::Running(running) => {
                let index = running.current_index - 1;
                running.move_to(index)
            }
            _ => NavOutcome::NotRunning,
        }
    }

    pub fn go_next(&mut self) -> NavOutcome {
        match &mut self.phase {
            Phase::Running(running) => {
                let index = running.current_index + 1;
                running.move_to(index)
            }
            _ => NavOutcome::NotRunning,
        }
    }

    /// Jump to a zero-based question index.
    pub fn go_to(&mut self, index: usize) -> NavOutcome {
        match &mut self.phase {
            Phase::Running(running) => running.move_to(index),
            _ => NavOutcome::NotRunning,
        }
    }

    /// Clear the seal on the current question's record so it can be
    /// answered again. Returns `false` when there is nothing to re-open.
    pub fn reopen(&mut self) -> bool {
        let Phase::Running(running) = &mut self.phase else {
            return false;
        };
        let id = running.current_id();
        match running.answers.get_mut(&id) {
            Some(record) if record.sealed => {
                record.sealed = false;
                tracing::debug!(question = %id, "record re-opened");
                true
            }
            _ => false,
        }
    }

    /// Reveal the next hint for the current question, if any remain.
    pub fn use_hint(&mut self) -> Option<String> {
        let Phase::Running(running) = &mut self.phase else {
            return None;
        };
        let question = running.current();
        let used = running.hints_used(&question.id);
        if used >= question.hint_count() {
            return None;
        }
        let hint = question.hints[used as usize].clone();
        let id = question.id.clone();
        running.set_hints(&id, used + 1);
        Some(hint)
    }

    /// Record confidence for the current question. Out-of-scale levels are
    /// rejected; `Ok(false)` means no session is running.
    pub fn set_confidence(&mut self, level: u32) -> Result<bool, ValidationError> {
        let level = self.config.confidence_scale.validate(level)?;
        let Phase::Running(running) = &mut self.phase else {
            return Ok(false);
        };
        let id = running.current_id();
        running.confidence.insert(id.clone(), level);
        if let Some(record) = running.answers.get_mut(&id) {
            if !record.sealed {
                record.confidence = Some(level);
            }
        }
        Ok(true)
    }

    /// Toggle the review flag on a question. Returns the new flag state, or
    /// `None` for an unknown question or a session that is not running.
    pub fn toggle_flag(&mut self, question_id: &str) -> Option<bool> {
        let Phase::Running(running) = &mut self.phase else {
            return None;
        };
        if !running.questions.iter().any(|q| q.id == question_id) {
            return None;
        }
        if running.flagged.remove(question_id) {
            Some(false)
        } else {
            running.flagged.insert(question_id.to_string());
            Some(true)
        }
    }

    /// Advance the countdown by one second.
    pub fn tick(&mut self) -> TickOutcome {
        let Phase::Running(running) = &mut self.phase else {
            return TickOutcome::Idle;
        };

        match running.clock.tick() {
            Tick::Idle => TickOutcome::Idle,
            Tick::Counted { remaining } => TickOutcome::Counted { remaining },
            Tick::QuestionTimeUp { remaining } => {
                let question = running.current();
                let id = question.id.clone();
                let count = question.hint_count();
                running.timed_out.insert(id.clone());
                running.set_hints(&id, count);
                tracing::debug!(question = %id, "question time limit reached");
                self.notifier.notify(&Notice::QuestionTimeUp {
                    question_id: id.clone(),
                });
                TickOutcome::QuestionTimeUp {
                    question_id: id,
                    remaining,
                }
            }
            Tick::Expired => {
                let answered = running.answers.len();
                let total = running.questions.len();
                tracing::info!(answered, total, "session time expired");
                self.notifier.notify(&Notice::TimeExpired { answered, total });
                self.finish(FinishReason::TimeExpired);
                TickOutcome::Expired
            }
        }
    }

    /// Submit the whole assessment now with the answers given so far.
    pub fn finish_now(&mut self) -> bool {
        self.finish(FinishReason::SubmittedEarly).is_some()
    }

    /// Discard the session, running or finished, without producing a report.
    pub fn abandon(&mut self) -> bool {
        match std::mem::replace(&mut self.phase, Phase::NotStarted { last_error: None }) {
            Phase::Running(running) => {
                tracing::info!(session = %running.id, "session abandoned");
                true
            }
            Phase::Finished(_) => true,
            not_started @ Phase::NotStarted { .. } => {
                self.phase = not_started;
                false
            }
        }
    }

    /// Single exit from `Running`. Later calls are no-ops.
    fn finish(&mut self, reason: FinishReason) -> Option<&AssessmentReport> {
        let placeholder = Phase::NotStarted { last_error: None };
        let mut running = match std::mem::replace(&mut self.phase, placeholder) {
            Phase::Running(running) => *running,
            other => {
                self.phase = other;
                return None;
            }
        };

        running.clock.stop();
        running.leave_current();

        let time_spent = running.clock.elapsed();
        let results = aggregate(&running.questions, &running.answers, time_spent);
        let answers = running
            .questions
            .iter()
            .filter_map(|q| running.answers.remove(&q.id))
            .collect();

        let report = AssessmentReport {
            id: Uuid::new_v4(),
            session_id: running.id,
            created_at: Utc::now(),
            started_at: running.started_at,
            mode: running.mode,
            topic: running.topic.clone(),
            reason,
            questions: running.questions,
            answers,
            flagged: running.flagged.into_iter().collect(),
            results,
        };

        tracing::info!(
            session = %report.session_id,
            ?reason,
            score = report.results.score_percent,
            "session finished"
        );

        self.emit(LearningEvent::SessionCompleted {
            session_id: report.session_id,
            mode: report.mode,
            topic: report.topic.clone(),
            reason,
            score_percent: report.results.score_percent,
            correct: report.results.correct_count,
            total: report.results.total_questions,
            time_spent_seconds: time_spent,
            at: report.created_at,
        });
        self.notifier.notify(&Notice::FinalScore {
            score_percent: report.results.score_percent,
            correct: report.results.correct_count,
            total: report.results.total_questions,
        });

        self.phase = Phase::Finished(Box::new(report));
        self.report()
    }

    fn emit(&self, event: LearningEvent) {
        if let Err(e) = self.telemetry.record(&event) {
            tracing::warn!(event = event.name(), "telemetry sink failed: {e:#}");
        }
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn state(&self) -> SessionState {
        match self.phase {
            Phase::NotStarted { .. } => SessionState::NotStarted,
            Phase::Running(_) => SessionState::Running,
            Phase::Finished(_) => SessionState::Finished,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// The acquisition error from the last failed `start`, if any.
    pub fn last_error(&self) -> Option<&SourceError> {
        match &self.phase {
            Phase::NotStarted { last_error } => last_error.as_ref(),
            _ => None,
        }
    }

    pub fn report(&self) -> Option<&AssessmentReport> {
        match &self.phase {
            Phase::Finished(report) => Some(report),
            _ => None,
        }
    }

    /// Take the finished report, resetting the session to `NotStarted`.
    pub fn take_report(&mut self) -> Option<AssessmentReport> {
        match std::mem::replace(&mut self.phase, Phase::NotStarted { last_error: None }) {
            Phase::Finished(report) => Some(*report),
            other => {
                self.phase = other;
                None
            }
        }
    }

    fn running(&self) -> Option<&RunningSession> {
        match &self.phase {
            Phase::Running(running) => Some(running),
            _ => None,
        }
    }

    pub fn session_id(&self) -> Option<Uuid> {
        match &self.phase {
            Phase::Running(running) => Some(running.id),
            Phase::Finished(report) => Some(report.session_id),
            Phase::NotStarted { .. } => None,
        }
    }

    pub fn mode(&self) -> Option<Mode> {
        self.running().map(|r| r.mode)
    }

    pub fn questions(&self) -> &[Question] {
        self.running().map(|r| r.questions.as_slice()).unwrap_or(&[])
    }

    pub fn current_index(&self) -> Option<usize> {
        self.running().map(|r| r.current_index)
    }

    pub fn current_question(&self) -> Option<&Question> {
        self.running().map(|r| r.current())
    }

    pub fn time_remaining(&self) -> Option<u64> {
        self.running().map(|r| r.clock.remaining())
    }

    /// Seconds on the current question during this visit.
    pub fn question_elapsed(&self) -> Option<u64> {
        self.running().map(|r| r.clock.question_elapsed())
    }

    pub fn answer_for(&self, question_id: &str) -> Option<&AnswerRecord> {
        self.running().and_then(|r| r.answers.get(question_id))
    }

    pub fn answered_count(&self) -> usize {
        self.running().map(|r| r.answers.len()).unwrap_or(0)
    }

    /// Hints revealed so far for the current question.
    pub fn revealed_hints(&self) -> &[String] {
        match self.running() {
            Some(r) => {
                let question = r.current();
                let used = r.hints_used(&question.id) as usize;
                &question.hints[..used.min(question.hints.len())]
            }
            None => &[],
        }
    }

    pub fn is_flagged(&self, question_id: &str) -> bool {
        self.running()
            .is_some_and(|r| r.flagged.contains(question_id))
    }

    pub fn is_timed_out(&self, question_id: &str) -> bool {
        self.running()
            .is_some_and(|r| r.timed_out.contains(question_id))
    }
}

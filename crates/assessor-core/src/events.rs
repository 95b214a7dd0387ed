//! Learning events for telemetry and notices for the learner.
//!
//! Events are serialized with an `event` tag so sinks can write them as JSON
//! lines; notices render through `Display`.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::answer::Grade;
use crate::model::{Difficulty, Mode};
use crate::report::FinishReason;

/// Learning events handed to the telemetry sink.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum LearningEvent {
    SessionStarted {
        session_id: Uuid,
        mode: Mode,
        topic: Option<String>,
        question_count: usize,
        time_limit_seconds: u64,
        at: DateTime<Utc>,
    },
    AnswerSubmitted {
        session_id: Uuid,
        mode: Mode,
        topic: String,
        question_id: String,
        question_type: String,
        difficulty: Difficulty,
        grade: Grade,
        time_spent_seconds: u64,
        confidence: Option<u32>,
        hints_used: u32,
        at: DateTime<Utc>,
    },
    SessionCompleted {
        session_id: Uuid,
        mode: Mode,
        topic: Option<String>,
        reason: FinishReason,
        score_percent: u32,
        correct: u32,
        total: u32,
        time_spent_seconds: u64,
        at: DateTime<Utc>,
    },
}

impl LearningEvent {
    pub fn session_id(&self) -> Uuid {
        match self {
            LearningEvent::SessionStarted { session_id, .. }
            | LearningEvent::AnswerSubmitted { session_id, .. }
            | LearningEvent::SessionCompleted { session_id, .. } => *session_id,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            LearningEvent::SessionStarted { .. } => "session_started",
            LearningEvent::AnswerSubmitted { .. } => "answer_submitted",
            LearningEvent::SessionCompleted { .. } => "session_completed",
        }
    }
}

/// Messages for the learner-facing notification surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Notice {
    SessionStarted {
        mode: Mode,
        question_count: usize,
        time_limit_seconds: u64,
    },
    AnswerFeedback {
        question_id: String,
        grade: Grade,
        message: String,
    },
    QuestionTimeUp {
        question_id: String,
    },
    TimeExpired {
        answered: usize,
        total: usize,
    },
    FinalScore {
        score_percent: u32,
        correct: u32,
        total: u32,
    },
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::SessionStarted {
                mode,
                question_count,
                time_limit_seconds,
            } => write!(
                f,
                "Started {mode} session: {question_count} questions, {} min {} s",
                time_limit_seconds / 60,
                time_limit_seconds % 60
            ),
            Notice::AnswerFeedback { message, .. } => write!(f, "{message}"),
            Notice::QuestionTimeUp { question_id } => {
                write!(f, "Time is up for question {question_id}; all hints revealed")
            }
            Notice::TimeExpired { answered, total } => write!(
                f,
                "Time expired. Submitted automatically with {answered} of {total} answered"
            ),
            Notice::FinalScore {
                score_percent,
                correct,
                total,
            } => write!(f, "Final score: {score_percent}% ({correct}/{total} correct)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_json_is_tagged() {
        let event = LearningEvent::SessionStarted {
            session_id: Uuid::nil(),
            mode: Mode::Assessment,
            topic: Some("rust".into()),
            question_count: 3,
            time_limit_seconds: 600,
            at: Utc::now(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "session_started");
        assert_eq!(json["mode"], "assessment");
        assert_eq!(event.name(), "session_started");
    }

    #[test]
    fn notice_text() {
        let notice = Notice::FinalScore {
            score_percent: 67,
            correct: 1,
            total: 2,
        };
        assert_eq!(notice.to_string(), "Final score: 67% (1/2 correct)");
        let started = Notice::SessionStarted {
            mode: Mode::Practice,
            question_count: 5,
            time_limit_seconds: 90,
        };
        assert_eq!(
            started.to_string(),
            "Started practice session: 5 questions, 1 min 30 s"
        );
    }
}

//! Error types for the assessment engine.
//!
//! `SourceError` covers question-set acquisition failures and is classified
//! so callers can decide whether re-invoking `start` makes sense.
//! `ValidationError` covers learner input rejected at the boundary, before
//! it reaches the session state machine.

use thiserror::Error;

/// Errors that can occur while acquiring a question set.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SourceError {
    /// The question service could not be reached.
    #[error("question service unavailable: {0}")]
    Unavailable(String),

    /// The question service returned an error response.
    #[error("question service error (HTTP {status}): {message}")]
    Http { status: u16, message: String },

    /// The request timed out.
    #[error("question request timed out after {0}s")]
    Timeout(u64),

    /// The payload could not be decoded into questions.
    #[error("malformed question set: {0}")]
    Malformed(String),

    /// No questions matched the requested mode/topic.
    #[error("no questions available for {0}")]
    Empty(String),
}

impl SourceError {
    /// Returns `true` if re-invoking `start` may succeed without changes.
    pub fn is_retryable(&self) -> bool {
        match self {
            SourceError::Unavailable(_) | SourceError::Timeout(_) => true,
            SourceError::Http { status, .. } => *status == 429 || *status >= 500,
            SourceError::Malformed(_) | SourceError::Empty(_) => false,
        }
    }
}

/// Learner input rejected before it reaches the session.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("answer is empty")]
    Empty,

    #[error("option {0} does not exist")]
    UnknownOption(String),

    #[error("expected a number, got '{0}'")]
    NotANumber(String),

    #[error("value {value} is outside the range {min}..={max}")]
    OutOfRange { value: f64, min: f64, max: f64 },

    #[error("expected true or false, got '{0}'")]
    NotABoolean(String),

    #[error("expected {expected} blanks, got {got}")]
    BlankCount { expected: usize, got: usize },

    #[error("confidence {level} is outside {min}..={max}")]
    Confidence { level: u32, min: u32, max: u32 },

    #[error("question type '{0}' cannot be answered")]
    Unsupported(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_classification() {
        assert!(SourceError::Unavailable("down".into()).is_retryable());
        assert!(SourceError::Timeout(10).is_retryable());
        assert!(SourceError::Http {
            status: 503,
            message: "busy".into()
        }
        .is_retryable());
        assert!(!SourceError::Http {
            status: 404,
            message: "missing".into()
        }
        .is_retryable());
        assert!(!SourceError::Malformed("bad json".into()).is_retryable());
        assert!(!SourceError::Empty("topic 'x'".into()).is_retryable());
    }

    #[test]
    fn messages_are_readable() {
        let err = ValidationError::OutOfRange {
            value: 120.0,
            min: 0.0,
            max: 100.0,
        };
        assert_eq!(err.to_string(), "value 120 is outside the range 0..=100");
    }
}

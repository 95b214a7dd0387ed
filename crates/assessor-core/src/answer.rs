//! Learner answers and per-question answer records.
//!
//! [`Answer`] is the typed payload a learner submits; its variant follows the
//! question kind. [`Answer::parse`] is the input boundary: it turns raw text
//! into the right variant and rejects malformed input with a
//! [`ValidationError`] before anything reaches the session.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::model::{parse_bool, Question, QuestionKind};

/// A typed learner answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "kebab-case")]
pub enum Answer {
    /// One selected option (multiple-choice, scenario).
    Choice(String),
    /// A set of selected options (multiple-select).
    Selection(BTreeSet<String>),
    Boolean(bool),
    /// Free text (short-answer, essay, scenario).
    Text(String),
    /// Slider position.
    Number(f64),
    /// Positional blank values (fill-blank).
    Blanks(Vec<String>),
}

impl fmt::Display for Answer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Answer::Choice(s) | Answer::Text(s) => write!(f, "{s}"),
            Answer::Selection(set) => {
                let items: Vec<&str> = set.iter().map(String::as_str).collect();
                write!(f, "{}", items.join(", "))
            }
            Answer::Boolean(b) => write!(f, "{b}"),
            Answer::Number(n) => write!(f, "{n}"),
            Answer::Blanks(values) => write!(f, "{}", values.join(" | ")),
        }
    }
}

impl Answer {
    /// Parse learner text into the answer shape `question` expects.
    ///
    /// - choice kinds accept a 1-based option number or the option text
    /// - multiple-select takes a comma-separated list of numbers or texts
    /// - true-false accepts true/false/yes/no/t/f/y/n
    /// - slider takes a number within the slider bounds
    /// - fill-blank takes `|`-separated values, one per blank
    pub fn parse(question: &Question, input: &str) -> Result<Answer, ValidationError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(ValidationError::Empty);
        }

        match &question.kind {
            QuestionKind::MultipleChoice { options, .. } => {
                resolve_option(options, input).map(Answer::Choice)
            }
            QuestionKind::Scenario { options, .. } if !options.is_empty() => {
                resolve_option(options, input).map(Answer::Choice)
            }
            QuestionKind::Scenario { .. } | QuestionKind::Essay => {
                Ok(Answer::Text(input.to_string()))
            }
            QuestionKind::ShortAnswer { .. } => Ok(Answer::Text(input.to_string())),
            QuestionKind::MultipleSelect { options, .. } => {
                let selected = input
                    .split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(|s| resolve_option(options, s))
                    .collect::<Result<BTreeSet<_>, _>>()?;
                if selected.is_empty() {
                    return Err(ValidationError::Empty);
                }
                Ok(Answer::Selection(selected))
            }
            QuestionKind::TrueFalse { .. } => parse_bool(input)
                .map(Answer::Boolean)
                .ok_or_else(|| ValidationError::NotABoolean(input.to_string())),
            QuestionKind::Slider { min, max, .. } => {
                let value: f64 = input
                    .parse()
                    .map_err(|_| ValidationError::NotANumber(input.to_string()))?;
                if !value.is_finite() || value < *min || value > *max {
                    return Err(ValidationError::OutOfRange {
                        value,
                        min: *min,
                        max: *max,
                    });
                }
                Ok(Answer::Number(value))
            }
            QuestionKind::FillBlank { blanks, answers } => {
                let values: Vec<String> = input.split('|').map(|s| s.to_string()).collect();
                let expected = if blanks.is_empty() {
                    answers.len()
                } else {
                    blanks.len()
                };
                if expected > 0 && values.len() != expected {
                    return Err(ValidationError::BlankCount {
                        expected,
                        got: values.len(),
                    });
                }
                if values.iter().all(|v| v.trim().is_empty()) {
                    return Err(ValidationError::Empty);
                }
                Ok(Answer::Blanks(values))
            }
            QuestionKind::Unsupported { type_name } => {
                Err(ValidationError::Unsupported(type_name.clone()))
            }
        }
    }
}

/// Match input against options by 1-based number, then by case-insensitive text.
fn resolve_option(options: &[String], input: &str) -> Result<String, ValidationError> {
    if let Ok(n) = input.parse::<usize>() {
        if n >= 1 && n <= options.len() {
            return Ok(options[n - 1].clone());
        }
    }
    options
        .iter()
        .find(|o| o.trim().eq_ignore_ascii_case(input))
        .cloned()
        .ok_or_else(|| ValidationError::UnknownOption(input.to_string()))
}

/// Outcome of evaluating one answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Grade {
    Correct,
    Incorrect,
    /// Needs an external rubric (essay, scenario).
    Ungraded,
}

impl Grade {
    pub fn is_correct(self) -> bool {
        self == Grade::Correct
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Grade::Correct => write!(f, "correct"),
            Grade::Incorrect => write!(f, "incorrect"),
            Grade::Ungraded => write!(f, "ungraded"),
        }
    }
}

/// The evaluated outcome of one question within a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerRecord {
    pub question_id: String,
    pub answer: Answer,
    pub grade: Grade,
    pub points_awarded: u32,
    #[serde(default)]
    pub confidence: Option<u32>,
    pub hints_used: u32,
    pub time_spent_seconds: u64,
    /// Set once the session moves past this question; cleared only by an
    /// explicit re-open.
    #[serde(default)]
    pub sealed: bool,
}

impl AnswerRecord {
    pub fn is_correct(&self) -> bool {
        self.grade.is_correct()
    }
}

/// Range learners use to rate their confidence.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConfidenceScale {
    /// 1 to 5.
    #[default]
    FivePoint,
    /// 0 to 100.
    Percent,
}

impl ConfidenceScale {
    pub fn bounds(self) -> (u32, u32) {
        match self {
            ConfidenceScale::FivePoint => (1, 5),
            ConfidenceScale::Percent => (0, 100),
        }
    }

    pub fn validate(self, level: u32) -> Result<u32, ValidationError> {
        let (min, max) = self.bounds();
        if level < min || level > max {
            return Err(ValidationError::Confidence { level, min, max });
        }
        Ok(level)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Difficulty;

    fn question(kind: QuestionKind) -> Question {
        Question {
            id: "q".into(),
            prompt: "?".into(),
            kind,
            points: 1,
            difficulty: Difficulty::Medium,
            topic: "t".into(),
            time_limit_seconds: None,
            hints: vec![],
        }
    }

    fn choices() -> Vec<String> {
        vec!["Red".into(), "Green".into(), "Blue".into()]
    }

    #[test]
    fn choice_by_number_or_text() {
        let q = question(QuestionKind::MultipleChoice {
            options: choices(),
            correct: Some("Green".into()),
        });
        assert_eq!(Answer::parse(&q, "2").unwrap(), Answer::Choice("Green".into()));
        assert_eq!(Answer::parse(&q, " blue ").unwrap(), Answer::Choice("Blue".into()));
        assert_eq!(
            Answer::parse(&q, "7"),
            Err(ValidationError::UnknownOption("7".into()))
        );
    }

    #[test]
    fn empty_input_rejected() {
        let q = question(QuestionKind::Essay);
        assert_eq!(Answer::parse(&q, "   "), Err(ValidationError::Empty));
    }

    #[test]
    fn selection_is_a_set() {
        let q = question(QuestionKind::MultipleSelect {
            options: choices(),
            correct: vec![],
        });
        let a = Answer::parse(&q, "3, 1, Red").unwrap();
        let expected: BTreeSet<String> = ["Blue".to_string(), "Red".to_string()].into();
        assert_eq!(a, Answer::Selection(expected));
    }

    #[test]
    fn slider_bounds_enforced() {
        let q = question(QuestionKind::Slider {
            min: 0.0,
            max: 100.0,
            target: Some(50.0),
        });
        assert_eq!(Answer::parse(&q, "47").unwrap(), Answer::Number(47.0));
        assert!(matches!(
            Answer::parse(&q, "101"),
            Err(ValidationError::OutOfRange { .. })
        ));
        assert!(matches!(
            Answer::parse(&q, "lots"),
            Err(ValidationError::NotANumber(_))
        ));
    }

    #[test]
    fn true_false_spellings() {
        let q = question(QuestionKind::TrueFalse {
            correct: Some(true),
        });
        assert_eq!(Answer::parse(&q, "Yes").unwrap(), Answer::Boolean(true));
        assert_eq!(Answer::parse(&q, "f").unwrap(), Answer::Boolean(false));
        assert!(Answer::parse(&q, "maybe").is_err());
    }

    #[test]
    fn fill_blank_count_checked() {
        let q = question(QuestionKind::FillBlank {
            blanks: vec!["a".into(), "b".into()],
            answers: vec!["Yes".into(), "No".into()],
        });
        assert_eq!(
            Answer::parse(&q, "yes| No ").unwrap(),
            Answer::Blanks(vec!["yes".into(), " No".into()])
        );
        assert_eq!(
            Answer::parse(&q, "yes"),
            Err(ValidationError::BlankCount {
                expected: 2,
                got: 1
            })
        );
    }

    #[test]
    fn unsupported_kind_cannot_be_answered() {
        let q = question(QuestionKind::Unsupported {
            type_name: "hotspot".into(),
        });
        assert_eq!(
            Answer::parse(&q, "x"),
            Err(ValidationError::Unsupported("hotspot".into()))
        );
    }

    #[test]
    fn confidence_scales() {
        assert!(ConfidenceScale::FivePoint.validate(0).is_err());
        assert_eq!(ConfidenceScale::FivePoint.validate(5), Ok(5));
        assert_eq!(ConfidenceScale::Percent.validate(0), Ok(0));
        assert!(ConfidenceScale::Percent.validate(101).is_err());
    }

    #[test]
    fn answer_json_shape() {
        let json = serde_json::to_string(&Answer::Number(47.0)).unwrap();
        assert_eq!(json, r#"{"kind":"number","value":47.0}"#);
    }
}

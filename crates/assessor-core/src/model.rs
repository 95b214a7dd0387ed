//! Core data model types for the assessment engine.
//!
//! Questions arrive in a flat wire format (`type`, `options`,
//! `correct_answers`, ...) shared by TOML banks and JSON services. At the
//! serde boundary they are converted into [`QuestionKind`], a tagged union
//! where each variant carries exactly the answer key its type needs.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Difficulty band of a question. Ordered easy < medium < hard.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Difficulty::Easy => write!(f, "easy"),
            Difficulty::Medium => write!(f, "medium"),
            Difficulty::Hard => write!(f, "hard"),
        }
    }
}

impl FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            other => Err(format!("unknown difficulty: {other}")),
        }
    }
}

/// How a session is run. Each mode gets its own clock budget.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Practice,
    Assessment,
    Adaptive,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Practice => write!(f, "practice"),
            Mode::Assessment => write!(f, "assessment"),
            Mode::Adaptive => write!(f, "adaptive"),
        }
    }
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "practice" => Ok(Mode::Practice),
            "assessment" | "exam" => Ok(Mode::Assessment),
            "adaptive" => Ok(Mode::Adaptive),
            other => Err(format!("unknown mode: {other}")),
        }
    }
}

/// Type-specific shape of a question and its answer key.
#[derive(Debug, Clone, PartialEq)]
pub enum QuestionKind {
    MultipleChoice {
        options: Vec<String>,
        correct: Option<String>,
    },
    MultipleSelect {
        options: Vec<String>,
        correct: Vec<String>,
    },
    TrueFalse {
        correct: Option<bool>,
    },
    ShortAnswer {
        accepted: Vec<String>,
    },
    Essay,
    Slider {
        min: f64,
        max: f64,
        target: Option<f64>,
    },
    FillBlank {
        blanks: Vec<String>,
        answers: Vec<String>,
    },
    Scenario {
        narrative: String,
        options: Vec<String>,
    },
    /// A type this engine does not know. Never graded as correct.
    Unsupported { type_name: String },
}

impl QuestionKind {
    /// Wire name of this kind (e.g. "multiple-choice").
    pub fn type_name(&self) -> &str {
        match self {
            QuestionKind::MultipleChoice { .. } => "multiple-choice",
            QuestionKind::MultipleSelect { .. } => "multiple-select",
            QuestionKind::TrueFalse { .. } => "true-false",
            QuestionKind::ShortAnswer { .. } => "short-answer",
            QuestionKind::Essay => "essay",
            QuestionKind::Slider { .. } => "slider",
            QuestionKind::FillBlank { .. } => "fill-blank",
            QuestionKind::Scenario { .. } => "scenario",
            QuestionKind::Unsupported { type_name } => type_name,
        }
    }

    /// Kinds that need an external rubric; the engine never grades them.
    pub fn is_ungraded(&self) -> bool {
        matches!(self, QuestionKind::Essay | QuestionKind::Scenario { .. })
    }
}

/// An immutable question definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawQuestion", into = "RawQuestion")]
pub struct Question {
    pub id: String,
    pub prompt: String,
    pub kind: QuestionKind,
    /// Positive scoring weight.
    pub points: u32,
    pub difficulty: Difficulty,
    pub topic: String,
    pub time_limit_seconds: Option<u32>,
    pub hints: Vec<String>,
}

impl Question {
    pub fn type_name(&self) -> &str {
        self.kind.type_name()
    }

    /// Selectable options for choice-like kinds; empty otherwise.
    pub fn options(&self) -> &[String] {
        match &self.kind {
            QuestionKind::MultipleChoice { options, .. }
            | QuestionKind::MultipleSelect { options, .. }
            | QuestionKind::Scenario { options, .. } => options,
            _ => &[],
        }
    }

    pub fn hint_count(&self) -> u32 {
        self.hints.len() as u32
    }
}

/// A single element of `correct_answers` on the wire: text, number or bool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnswerValue {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl AnswerValue {
    /// Text form. Whole numbers render without a fractional part.
    pub fn as_text(&self) -> String {
        match self {
            AnswerValue::Bool(b) => b.to_string(),
            AnswerValue::Number(n) if n.fract() == 0.0 && n.is_finite() => {
                format!("{}", *n as i64)
            }
            AnswerValue::Number(n) => n.to_string(),
            AnswerValue::Text(s) => s.clone(),
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            AnswerValue::Number(n) => Some(*n),
            AnswerValue::Text(s) => s.trim().parse().ok(),
            AnswerValue::Bool(_) => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            AnswerValue::Bool(b) => Some(*b),
            AnswerValue::Text(s) => parse_bool(s),
            AnswerValue::Number(_) => None,
        }
    }

    /// Resolve a choice key against the option list. A key equal to an
    /// option's text is that option; otherwise an integral number in range
    /// is a 0-based option index.
    fn as_choice(&self, options: &[String]) -> String {
        let text = self.as_text();
        if options.iter().any(|o| *o == text) {
            return text;
        }
        if let AnswerValue::Number(n) = self {
            if n.fract() == 0.0 && *n >= 0.0 && (*n as usize) < options.len() {
                return options[*n as usize].clone();
            }
        }
        text
    }
}

/// Parse the usual spellings of a boolean answer.
pub fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_lowercase().as_str() {
        "true" | "t" | "yes" | "y" => Some(true),
        "false" | "f" | "no" | "n" => Some(false),
        _ => None,
    }
}

/// A question that could not be converted from its wire form.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("invalid question '{id}': {reason}")]
pub struct InvalidQuestion {
    pub id: String,
    pub reason: String,
}

/// Flat wire representation of a question.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawQuestion {
    pub id: String,
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default)]
    pub prompt: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
    #[serde(default, alias = "correctAnswers", skip_serializing_if = "Vec::is_empty")]
    pub correct_answers: Vec<AnswerValue>,
    #[serde(default = "default_points")]
    pub points: u32,
    #[serde(default)]
    pub difficulty: Difficulty,
    #[serde(default = "default_topic")]
    pub topic: String,
    #[serde(
        default,
        alias = "timeLimitSeconds",
        skip_serializing_if = "Option::is_none"
    )]
    pub time_limit_seconds: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub blanks: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub hints: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scenario: Option<String>,
}

fn default_points() -> u32 {
    1
}

fn default_topic() -> String {
    "general".to_string()
}

const SLIDER_DEFAULT_MIN: f64 = 0.0;
const SLIDER_DEFAULT_MAX: f64 = 100.0;

impl TryFrom<RawQuestion> for Question {
    type Error = InvalidQuestion;

    fn try_from(raw: RawQuestion) -> Result<Self, Self::Error> {
        let invalid = |reason: &str| InvalidQuestion {
            id: raw.id.clone(),
            reason: reason.to_string(),
        };
        if raw.id.trim().is_empty() {
            return Err(invalid("id is empty"));
        }
        if raw.points == 0 {
            return Err(invalid("points must be positive"));
        }

        let normalized = raw.type_name.trim().to_lowercase().replace('_', "-");
        let first = raw.correct_answers.first();
        let kind = match normalized.as_str() {
            "multiple-choice" => QuestionKind::MultipleChoice {
                correct: first.map(|v| v.as_choice(&raw.options)),
                options: raw.options,
            },
            "multiple-select" => QuestionKind::MultipleSelect {
                correct: raw
                    .correct_answers
                    .iter()
                    .map(|v| v.as_choice(&raw.options))
                    .collect(),
                options: raw.options,
            },
            "true-false" => QuestionKind::TrueFalse {
                correct: first.and_then(AnswerValue::as_bool),
            },
            "short-answer" => QuestionKind::ShortAnswer {
                accepted: raw.correct_answers.iter().map(AnswerValue::as_text).collect(),
            },
            "essay" => QuestionKind::Essay,
            "slider" => QuestionKind::Slider {
                min: raw.min.unwrap_or(SLIDER_DEFAULT_MIN),
                max: raw.max.unwrap_or(SLIDER_DEFAULT_MAX),
                target: first.and_then(AnswerValue::as_number),
            },
            "fill-blank" => QuestionKind::FillBlank {
                blanks: raw.blanks,
                answers: raw.correct_answers.iter().map(AnswerValue::as_text).collect(),
            },
            "scenario" => QuestionKind::Scenario {
                narrative: raw.scenario.unwrap_or_default(),
                options: raw.options,
            },
            _ => QuestionKind::Unsupported {
                type_name: raw.type_name.clone(),
            },
        };

        Ok(Question {
            id: raw.id,
            prompt: raw.prompt,
            kind,
            points: raw.points,
            difficulty: raw.difficulty,
            topic: raw.topic,
            time_limit_seconds: raw.time_limit_seconds,
            hints: raw.hints,
        })
    }
}

impl From<Question> for RawQuestion {
    fn from(q: Question) -> Self {
        let mut raw = RawQuestion {
            id: q.id,
            type_name: q.kind.type_name().to_string(),
            prompt: q.prompt,
            options: Vec::new(),
            correct_answers: Vec::new(),
            points: q.points,
            difficulty: q.difficulty,
            topic: q.topic,
            time_limit_seconds: q.time_limit_seconds,
            min: None,
            max: None,
            blanks: Vec::new(),
            hints: q.hints,
            scenario: None,
        };
        match q.kind {
            QuestionKind::MultipleChoice { options, correct } => {
                raw.options = options;
                raw.correct_answers = correct.into_iter().map(AnswerValue::Text).collect();
            }
            QuestionKind::MultipleSelect { options, correct } => {
                raw.options = options;
                raw.correct_answers = correct.into_iter().map(AnswerValue::Text).collect();
            }
            QuestionKind::TrueFalse { correct } => {
                raw.correct_answers = correct.into_iter().map(AnswerValue::Bool).collect();
            }
            QuestionKind::ShortAnswer { accepted } => {
                raw.correct_answers = accepted.into_iter().map(AnswerValue::Text).collect();
            }
            QuestionKind::Essay | QuestionKind::Unsupported { .. } => {}
            QuestionKind::Slider { min, max, target } => {
                raw.min = Some(min);
                raw.max = Some(max);
                raw.correct_answers = target.into_iter().map(AnswerValue::Number).collect();
            }
            QuestionKind::FillBlank { blanks, answers } => {
                raw.blanks = blanks;
                raw.correct_answers = answers.into_iter().map(AnswerValue::Text).collect();
            }
            QuestionKind::Scenario { narrative, options } => {
                raw.options = options;
                raw.scenario = (!narrative.is_empty()).then_some(narrative);
            }
        }
        raw
    }
}

/// A named collection of questions, usually loaded from one TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionBank {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub questions: Vec<Question>,
}

impl QuestionBank {
    /// Distinct topics in first-appearance order.
    pub fn topics(&self) -> Vec<&str> {
        let mut topics: Vec<&str> = Vec::new();
        for q in &self.questions {
            if !topics.contains(&q.topic.as_str()) {
                topics.push(&q.topic);
            }
        }
        topics
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_and_difficulty_parse() {
        assert_eq!("Assessment".parse::<Mode>().unwrap(), Mode::Assessment);
        assert_eq!("exam".parse::<Mode>().unwrap(), Mode::Assessment);
        assert!("speedrun".parse::<Mode>().is_err());
        assert_eq!(" HARD ".parse::<Difficulty>().unwrap(), Difficulty::Hard);
        assert!(Difficulty::Easy < Difficulty::Hard);
        assert_eq!(Mode::Adaptive.to_string(), "adaptive");
    }

    #[test]
    fn json_wire_format_becomes_tagged_kind() {
        let json = r#"{
            "id": "q1",
            "type": "multiple-choice",
            "prompt": "Capital of France?",
            "options": ["Berlin", "Paris"],
            "correctAnswers": ["Paris"],
            "points": 2,
            "difficulty": "easy",
            "topic": "geography"
        }"#;
        let q: Question = serde_json::from_str(json).unwrap();
        assert_eq!(q.points, 2);
        assert_eq!(
            q.kind,
            QuestionKind::MultipleChoice {
                options: vec!["Berlin".into(), "Paris".into()],
                correct: Some("Paris".into()),
            }
        );
    }

    #[test]
    fn numeric_choice_key_resolves_to_option() {
        let json = r#"{"id":"q","type":"multiple_choice","options":["a","b","c"],"correct_answers":[2]}"#;
        let q: Question = serde_json::from_str(json).unwrap();
        match q.kind {
            QuestionKind::MultipleChoice { correct, .. } => assert_eq!(correct.as_deref(), Some("c")),
            other => panic!("unexpected kind {other:?}"),
        }
    }

    #[test]
    fn numeric_key_matching_option_text_is_not_an_index() {
        let json = r#"{"id":"q","type":"multiple-choice","options":["1","2","3"],"correctAnswers":[2]}"#;
        let q: Question = serde_json::from_str(json).unwrap();
        match &q.kind {
            QuestionKind::MultipleChoice { correct, .. } => assert_eq!(correct.as_deref(), Some("2")),
            other => panic!("unexpected kind {other:?}"),
        }
        assert_eq!(
            crate::evaluator::evaluate(&q, Some(&crate::answer::Answer::Choice("2".into()))),
            crate::answer::Grade::Correct
        );

        let json = r#"{"id":"m","type":"multiple-select","options":["0","1","2"],"correctAnswers":[0,2]}"#;
        let q: Question = serde_json::from_str(json).unwrap();
        match q.kind {
            QuestionKind::MultipleSelect { correct, .. } => {
                assert_eq!(correct, vec!["0".to_string(), "2".to_string()])
            }
            other => panic!("unexpected kind {other:?}"),
        }
    }

    #[test]
    fn slider_target_coerced_from_text() {
        let json = r#"{"id":"s","type":"slider","min":10,"max":20,"correct_answers":["15"]}"#;
        let q: Question = serde_json::from_str(json).unwrap();
        assert_eq!(
            q.kind,
            QuestionKind::Slider {
                min: 10.0,
                max: 20.0,
                target: Some(15.0)
            }
        );
    }

    #[test]
    fn unknown_type_is_kept_as_unsupported() {
        let json = r#"{"id":"x","type":"drag-and-drop"}"#;
        let q: Question = serde_json::from_str(json).unwrap();
        assert_eq!(q.type_name(), "drag-and-drop");
        assert!(!q.kind.is_ungraded());
        assert_eq!(q.topic, "general");
        assert_eq!(q.points, 1);
    }

    #[test]
    fn zero_points_rejected() {
        let json = r#"{"id":"z","type":"essay","points":0}"#;
        let err = serde_json::from_str::<Question>(json).unwrap_err();
        assert!(err.to_string().contains("points must be positive"));
    }

    #[test]
    fn wire_roundtrip_keeps_answer_key() {
        let json = r#"{"id":"f","type":"fill-blank","blanks":["a","b"],"correct_answers":["Yes","No"],"hints":["h"]}"#;
        let q: Question = serde_json::from_str(json).unwrap();
        let back: Question = serde_json::from_str(&serde_json::to_string(&q).unwrap()).unwrap();
        assert_eq!(q, back);
        assert_eq!(back.hint_count(), 1);
    }

    #[test]
    fn bank_topics_in_order() {
        let mk = |id: &str, topic: &str| Question {
            id: id.into(),
            prompt: String::new(),
            kind: QuestionKind::Essay,
            points: 1,
            difficulty: Difficulty::Easy,
            topic: topic.into(),
            time_limit_seconds: None,
            hints: vec![],
        };
        let bank = QuestionBank {
            id: "b".into(),
            name: "B".into(),
            description: String::new(),
            questions: vec![mk("1", "rust"), mk("2", "go"), mk("3", "rust")],
        };
        assert_eq!(bank.topics(), vec!["rust", "go"]);
    }
}

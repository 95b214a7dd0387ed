//! Per-type answer evaluation.
//!
//! Evaluation is total: missing answers, missing answer keys, mismatched
//! answer shapes and unknown question types all grade as incorrect. Essay and
//! scenario questions are reported as [`Grade::Ungraded`] rather than wrong.

use std::collections::BTreeSet;

use crate::answer::{Answer, Grade};
use crate::model::{Question, QuestionKind};

/// Fraction of the slider range accepted around the target.
pub const SLIDER_TOLERANCE: f64 = 0.05;

/// Grade `answer` against `question`.
pub fn evaluate(question: &Question, answer: Option<&Answer>) -> Grade {
    let Some(answer) = answer else {
        return Grade::Incorrect;
    };

    match (&question.kind, answer) {
        (QuestionKind::Essay, _) | (QuestionKind::Scenario { .. }, _) => Grade::Ungraded,

        (QuestionKind::MultipleChoice { correct, .. }, Answer::Choice(selected)) => {
            grade(correct.as_deref() == Some(selected.as_str()))
        }

        (QuestionKind::TrueFalse { correct }, Answer::Boolean(value)) => {
            grade(*correct == Some(*value))
        }

        (QuestionKind::MultipleSelect { correct, .. }, Answer::Selection(selected)) => {
            if correct.is_empty() {
                return Grade::Incorrect;
            }
            let expected: BTreeSet<&str> = correct.iter().map(String::as_str).collect();
            grade(
                selected.len() == expected.len()
                    && selected.iter().all(|s| expected.contains(s.as_str())),
            )
        }

        (QuestionKind::ShortAnswer { accepted }, Answer::Text(text)) => {
            let given = normalize(text);
            grade(accepted.iter().any(|a| normalize(a) == given))
        }

        (QuestionKind::Slider { min, max, target }, Answer::Number(value)) => match target {
            Some(target) => {
                let tolerance = (max - min).abs() * SLIDER_TOLERANCE;
                grade((value - target).abs() <= tolerance)
            }
            None => Grade::Incorrect,
        },

        (QuestionKind::FillBlank { answers, .. }, Answer::Blanks(values)) => {
            if answers.is_empty() || answers.len() != values.len() {
                return Grade::Incorrect;
            }
            grade(
                answers
                    .iter()
                    .zip(values)
                    .all(|(expected, given)| normalize(expected) == normalize(given)),
            )
        }

        (QuestionKind::Unsupported { type_name }, _) => {
            tracing::warn!(
                question = %question.id,
                "cannot evaluate unsupported question type '{type_name}'"
            );
            Grade::Incorrect
        }

        (kind, answer) => {
            tracing::warn!(
                question = %question.id,
                "answer shape {answer:?} does not fit question type '{}'",
                kind.type_name()
            );
            Grade::Incorrect
        }
    }
}

/// Convenience wrapper: `true` only for [`Grade::Correct`].
pub fn is_correct(question: &Question, answer: Option<&Answer>) -> bool {
    evaluate(question, answer).is_correct()
}

fn grade(correct: bool) -> Grade {
    if correct {
        Grade::Correct
    } else {
        Grade::Incorrect
    }
}

/// Case-fold and collapse whitespace for text comparison.
fn normalize(s: &str) -> String {
    s.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

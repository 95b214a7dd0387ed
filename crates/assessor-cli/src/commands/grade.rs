//! The `assessor grade` command.
//!
//! Runs a session without a clock against an answers file:
//!
//! ```toml
//! [answers]
//! q1 = "Paris"
//! q2 = [1, 3]      # multiple-select
//! q3 = ["a", "b"]  # fill-blank
//!
//! [confidence]
//! q1 = 5
//! ```

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::Deserialize;

use assessor_core::answer::Answer;
use assessor_core::model::{Question, QuestionKind};
use assessor_core::session::{AssessmentSession, NavOutcome, SessionState, SubmitOutcome};
use assessor_sources::{create_telemetry, load_config_from, BankSource};

use super::{parse_mode, print_summary, save_reports};

#[derive(Debug, Default, Deserialize)]
struct AnswerSheet {
    #[serde(default)]
    answers: BTreeMap<String, toml::Value>,
    #[serde(default)]
    confidence: BTreeMap<String, u32>,
}

fn scalar_text(value: &toml::Value) -> String {
    match value {
        toml::Value::String(s) => s.clone(),
        toml::Value::Integer(i) => i.to_string(),
        toml::Value::Float(f) => f.to_string(),
        toml::Value::Boolean(b) => b.to_string(),
        other => other.to_string(),
    }
}

/// Turn an answers-file value into the text a learner would have typed.
fn answer_input(question: &Question, value: &toml::Value) -> String {
    match value {
        toml::Value::Array(items) => {
            let separator = match question.kind {
                QuestionKind::FillBlank { .. } => "|",
                _ => ",",
            };
            items
                .iter()
                .map(scalar_text)
                .collect::<Vec<_>>()
                .join(separator)
        }
        other => scalar_text(other),
    }
}

/// Move on without answering, finishing after the last question.
fn skip(session: &mut AssessmentSession) {
    if !matches!(session.go_next(), NavOutcome::Moved { .. }) {
        session.finish_now();
    }
}

pub async fn execute(
    bank: PathBuf,
    answers_path: PathBuf,
    mode: String,
    topic: Option<String>,
    output: Option<PathBuf>,
    format: String,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let mode = parse_mode(&mode)?;
    let config = load_config_from(config_path.as_deref())?;
    let content = std::fs::read_to_string(&answers_path)
        .with_context(|| format!("failed to read answers: {}", answers_path.display()))?;
    let sheet: AnswerSheet = toml::from_str(&content)
        .with_context(|| format!("failed to parse answers: {}", answers_path.display()))?;

    let source = BankSource::open(&bank);
    let mut session = AssessmentSession::new(config.session_config())
        .with_telemetry(create_telemetry(&config.telemetry)?);
    session
        .start(&source, mode, topic.as_deref())
        .await
        .context("failed to start session")?;

    for id in sheet.answers.keys() {
        if !session.questions().iter().any(|q| &q.id == id) {
            eprintln!("  [{id}] WARNING: not in this session, ignored");
        }
    }

    while session.state() == SessionState::Running {
        let Some(question) = session.current_question().cloned() else {
            break;
        };

        if let Some(level) = sheet.confidence.get(&question.id) {
            if let Err(e) = session.set_confidence(*level) {
                eprintln!("  [{}] WARNING: {e}", question.id);
            }
        }

        let Some(value) = sheet.answers.get(&question.id) else {
            skip(&mut session);
            continue;
        };
        match Answer::parse(&question, &answer_input(&question, value)) {
            Ok(answer) => {
                if let SubmitOutcome::Rejected(_) = session.submit_answer(answer) {
                    skip(&mut session);
                }
            }
            Err(e) => {
                eprintln!("  [{}] WARNING: {e}", question.id);
                skip(&mut session);
            }
        }
    }

    let report = session
        .take_report()
        .context("session ended without a report")?;
    print_summary(&report);
    if let Some(output) = output {
        save_reports(&report, &output, &format)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(kind: QuestionKind) -> Question {
        Question {
            id: "q".into(),
            prompt: "?".into(),
            kind,
            points: 1,
            difficulty: Default::default(),
            topic: "general".into(),
            time_limit_seconds: None,
            hints: vec![],
        }
    }

    #[test]
    fn arrays_join_by_question_type() {
        let sheet: AnswerSheet = toml::from_str("[answers]\nq = [1, 3]\n").unwrap();
        let value = &sheet.answers["q"];

        let select = question(QuestionKind::MultipleSelect {
            options: vec!["a".into(), "b".into(), "c".into()],
            correct: vec![],
        });
        assert_eq!(answer_input(&select, value), "1,3");

        let blanks = question(QuestionKind::FillBlank {
            blanks: vec![],
            answers: vec!["x".into(), "y".into()],
        });
        assert_eq!(answer_input(&blanks, value), "1|3");
    }

    #[test]
    fn scalars_become_text() {
        let sheet: AnswerSheet =
            toml::from_str("[answers]\na = true\nb = 42.5\nc = \"Paris\"\n").unwrap();
        let q = question(QuestionKind::Essay);
        assert_eq!(answer_input(&q, &sheet.answers["a"]), "true");
        assert_eq!(answer_input(&q, &sheet.answers["b"]), "42.5");
        assert_eq!(answer_input(&q, &sheet.answers["c"]), "Paris");
    }
}

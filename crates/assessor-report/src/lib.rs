//! assessor-report: Rendering of finished assessment reports.
//!
//! Turns an `AssessmentReport` into a self-contained HTML page or a Markdown
//! summary. Rendering only; nothing here changes scores.

pub mod html;
pub mod markdown;

pub use html::{generate_html, write_html_report};
pub use markdown::generate_markdown;

/// Display text for an answered question, or a dash.
pub(crate) fn answer_text(report: &assessor_core::report::AssessmentReport, question_id: &str) -> String {
    report
        .answer_for(question_id)
        .map(|r| r.answer.to_string())
        .unwrap_or_else(|| "-".to_string())
}

/// Grade label for a question; unanswered questions read "unanswered".
pub(crate) fn grade_label(report: &assessor_core::report::AssessmentReport, question_id: &str) -> String {
    report
        .answer_for(question_id)
        .map(|r| r.grade.to_string())
        .unwrap_or_else(|| "unanswered".to_string())
}

#[cfg(test)]
pub(crate) mod fixtures {
    use std::collections::HashMap;

    use assessor_core::answer::{Answer, AnswerRecord, Grade};
    use assessor_core::model::{Difficulty, Mode, Question, QuestionKind};
    use assessor_core::report::{AssessmentReport, FinishReason};
    use assessor_core::scoring::aggregate;

    fn question(id: &str, topic: &str, kind: QuestionKind, difficulty: Difficulty) -> Question {
        Question {
            id: id.into(),
            prompt: format!("Prompt for <{id}>"),
            kind,
            points: 1,
            difficulty,
            topic: topic.into(),
            time_limit_seconds: None,
            hints: vec![],
        }
    }

    fn record(q: &Question, answer: Answer, grade: Grade, secs: u64) -> AnswerRecord {
        AnswerRecord {
            question_id: q.id.clone(),
            answer,
            grade,
            points_awarded: if grade.is_correct() { q.points } else { 0 },
            confidence: Some(4),
            hints_used: 1,
            time_spent_seconds: secs,
            sealed: true,
        }
    }

    /// Three topics: one strong, one weak, one essay-only; one question unanswered.
    pub fn sample_report() -> AssessmentReport {
        let questions = vec![
            question(
                "rust-1",
                "ownership",
                QuestionKind::TrueFalse {
                    correct: Some(true),
                },
                Difficulty::Easy,
            ),
            question(
                "rust-2",
                "ownership",
                QuestionKind::ShortAnswer {
                    accepted: vec!["move".into()],
                },
                Difficulty::Medium,
            ),
            question(
                "sql-1",
                "sql",
                QuestionKind::TrueFalse {
                    correct: Some(false),
                },
                Difficulty::Hard,
            ),
            question("essay-1", "writing", QuestionKind::Essay, Difficulty::Hard),
            question(
                "sql-2",
                "sql",
                QuestionKind::TrueFalse {
                    correct: Some(true),
                },
                Difficulty::Medium,
            ),
        ];
        let answers = vec![
            record(&questions[0], Answer::Boolean(true), Grade::Correct, 12),
            record(&questions[1], Answer::Text("move".into()), Grade::Correct, 30),
            record(&questions[2], Answer::Boolean(true), Grade::Incorrect, 8),
            record(
                &questions[3],
                Answer::Text("Borrowing lets code use a value without owning it.".into()),
                Grade::Ungraded,
                90,
            ),
        ];
        let map: HashMap<String, AnswerRecord> = answers
            .iter()
            .map(|r| (r.question_id.clone(), r.clone()))
            .collect();
        let results = aggregate(&questions, &map, 140);

        AssessmentReport {
            id: uuid::Uuid::nil(),
            session_id: uuid::Uuid::nil(),
            created_at: chrono::Utc::now(),
            started_at: chrono::Utc::now(),
            mode: Mode::Assessment,
            topic: None,
            reason: FinishReason::TimeExpired,
            questions,
            answers,
            flagged: vec!["sql-1".into()],
            results,
        }
    }
}

//! Assessment report types with JSON persistence and progress comparison.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::answer::AnswerRecord;
use crate::model::{Mode, Question};
use crate::results::Results;

/// How a session reached `Finished`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    /// The last question was answered.
    Completed,
    /// The session clock ran out.
    TimeExpired,
    /// The learner submitted before answering everything.
    SubmittedEarly,
}

impl std::fmt::Display for FinishReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FinishReason::Completed => write!(f, "completed"),
            FinishReason::TimeExpired => write!(f, "time expired"),
            FinishReason::SubmittedEarly => write!(f, "submitted early"),
        }
    }
}

/// A finished session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssessmentReport {
    /// Unique report identifier.
    pub id: Uuid,
    pub session_id: Uuid,
    /// When the session finished.
    pub created_at: DateTime<Utc>,
    pub started_at: DateTime<Utc>,
    pub mode: Mode,
    #[serde(default)]
    pub topic: Option<String>,
    pub reason: FinishReason,
    /// The question set, in session order.
    pub questions: Vec<Question>,
    /// Records for answered questions, in question order.
    pub answers: Vec<AnswerRecord>,
    #[serde(default)]
    pub flagged: Vec<String>,
    pub results: Results,
}

impl AssessmentReport {
    /// Save the report as JSON to a file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize report")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
        Ok(())
    }

    /// Load a report from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read report from {}", path.display()))?;
        let report: AssessmentReport =
            serde_json::from_str(&content).context("failed to parse report JSON")?;
        Ok(report)
    }

    /// The record for a question, if it was answered.
    pub fn answer_for(&self, question_id: &str) -> Option<&AnswerRecord> {
        self.answers.iter().find(|r| r.question_id == question_id)
    }

    /// Compare topic mastery against an earlier report.
    ///
    /// A topic moves into `regressions` or `improvements` when its mastery
    /// changed by more than `threshold` (a ratio, e.g. `0.05`). Topics
    /// without graded questions on either side are not compared.
    pub fn compare(&self, baseline: &AssessmentReport, threshold: f64) -> ProgressReport {
        let mut regressions = Vec::new();
        let mut improvements = Vec::new();
        let mut unchanged = 0usize;
        let mut new_topics = Vec::new();

        for (topic, current) in &self.results.topic_breakdown {
            let Some(current_mastery) = current.mastery() else {
                continue;
            };
            let baseline_mastery = baseline
                .results
                .topic_breakdown
                .get(topic)
                .and_then(|t| t.mastery());

            let Some(baseline_mastery) = baseline_mastery else {
                new_topics.push(topic.clone());
                continue;
            };

            let delta = current_mastery - baseline_mastery;
            let change = TopicChange {
                topic: topic.clone(),
                baseline_mastery,
                current_mastery,
                delta,
            };
            if delta < -threshold {
                regressions.push(change);
            } else if delta > threshold {
                improvements.push(change);
            } else {
                unchanged += 1;
            }
        }

        let removed_topics = baseline
            .results
            .topic_breakdown
            .iter()
            .filter(|(_, t)| t.mastery().is_some())
            .filter(|(topic, _)| {
                self.results
                    .topic_breakdown
                    .get(*topic)
                    .and_then(|t| t.mastery())
                    .is_none()
            })
            .map(|(topic, _)| topic.clone())
            .collect();

        ProgressReport {
            baseline_score: baseline.results.score_percent,
            current_score: self.results.score_percent,
            regressions,
            improvements,
            unchanged,
            new_topics,
            removed_topics,
        }
    }
}

/// Result of comparing two reports.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressReport {
    pub baseline_score: u32,
    pub current_score: u32,
    /// Topics where mastery went down.
    pub regressions: Vec<TopicChange>,
    /// Topics where mastery went up.
    pub improvements: Vec<TopicChange>,
    /// Topics with no significant change.
    pub unchanged: usize,
    /// Topics graded now but not in the baseline.
    pub new_topics: Vec<String>,
    /// Topics graded in the baseline but not now.
    pub removed_topics: Vec<String>,
}

/// Mastery movement for one topic. Values are ratios in `[0, 1]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopicChange {
    pub topic: String,
    pub baseline_mastery: f64,
    pub current_mastery: f64,
    pub delta: f64,
}

impl ProgressReport {
    /// Overall score movement in percentage points.
    pub fn score_delta(&self) -> i64 {
        self.current_score as i64 - self.baseline_score as i64
    }

    /// Format the progress report as markdown.
    pub fn to_markdown(&self) -> String {
        let mut md = String::new();

        md.push_str(&format!(
            "**Score:** {}% -> {}% ({:+})\n\n",
            self.baseline_score,
            self.current_score,
            self.score_delta()
        ));
        md.push_str(&format!(
            "**Summary:** {} regressions, {} improvements, {} unchanged\n\n",
            self.regressions.len(),
            self.improvements.len(),
            self.unchanged
        ));

        for (title, changes) in [
            ("Regressions", &self.regressions),
            ("Improvements", &self.improvements),
        ] {
            if changes.is_empty() {
                continue;
            }
            md.push_str(&format!("### {title}\n\n"));
            md.push_str("| Topic | Baseline | Current | Delta |\n");
            md.push_str("|-------|----------|---------|-------|\n");
            for c in changes {
                md.push_str(&format!(
                    "| {} | {:.1}% | {:.1}% | {:+.1}% |\n",
                    c.topic,
                    c.baseline_mastery * 100.0,
                    c.current_mastery * 100.0,
                    c.delta * 100.0
                ));
            }
            md.push('\n');
        }

        if !self.new_topics.is_empty() {
            md.push_str(&format!("**New topics:** {}\n\n", self.new_topics.join(", ")));
        }
        if !self.removed_topics.is_empty() {
            md.push_str(&format!(
                "**Removed topics:** {}\n\n",
                self.removed_topics.join(", ")
            ));
        }

        md
    }

    /// Returns true if any topic regressed.
    pub fn has_regressions(&self) -> bool {
        !self.regressions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::results::TopicBreakdown;
    use indexmap::IndexMap;

    fn make_report(score: u32, topics: &[(&str, u32, u32)]) -> AssessmentReport {
        let topic_breakdown: IndexMap<String, TopicBreakdown> = topics
            .iter()
            .map(|(name, correct, total)| {
                (
                    name.to_string(),
                    TopicBreakdown {
                        correct: *correct,
                        total: *total,
                        ungraded: 0,
                        average_time_seconds: 10.0,
                    },
                )
            })
            .collect();

        AssessmentReport {
            id: Uuid::nil(),
            session_id: Uuid::nil(),
            created_at: Utc::now(),
            started_at: Utc::now(),
            mode: Mode::Assessment,
            topic: None,
            reason: FinishReason::Completed,
            questions: vec![],
            answers: vec![],
            flagged: vec![],
            results: Results {
                total_questions: 0,
                correct_count: 0,
                ungraded_count: 0,
                unanswered_count: 0,
                earned_points: 0,
                total_points: 0,
                score_percent: score,
                time_spent_seconds: 0,
                topic_breakdown,
                difficulty_breakdown: IndexMap::new(),
                recommendations: vec![],
                strengths: vec![],
                improvements: vec![],
                next_steps: vec![],
            },
        }
    }

    #[test]
    fn compare_identical_reports() {
        let baseline = make_report(80, &[("rust", 4, 5)]);
        let current = make_report(80, &[("rust", 4, 5)]);

        let report = current.compare(&baseline, 0.05);
        assert!(report.regressions.is_empty());
        assert!(report.improvements.is_empty());
        assert_eq!(report.unchanged, 1);
        assert_eq!(report.score_delta(), 0);
    }

    #[test]
    fn compare_with_regression_and_improvement() {
        let baseline = make_report(60, &[("rust", 4, 5), ("sql", 1, 4)]);
        let current = make_report(55, &[("rust", 2, 5), ("sql", 3, 4)]);

        let report = current.compare(&baseline, 0.05);
        assert!(report.has_regressions());
        assert_eq!(report.regressions[0].topic, "rust");
        assert_eq!(report.improvements[0].topic, "sql");
        assert_eq!(report.score_delta(), -5);
    }

    #[test]
    fn compare_with_new_and_removed() {
        let baseline = make_report(50, &[("old", 1, 2), ("essays", 0, 0)]);
        let current = make_report(50, &[("new", 1, 2)]);

        let report = current.compare(&baseline, 0.05);
        assert_eq!(report.new_topics, vec!["new"]);
        assert_eq!(report.removed_topics, vec!["old"]);
    }

    #[test]
    fn json_roundtrip() {
        let report = make_report(75, &[("rust", 3, 4)]);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("report.json");

        report.save_json(&path).unwrap();
        let loaded = AssessmentReport::load_json(&path).unwrap();

        assert_eq!(loaded.results, report.results);
        assert_eq!(loaded.reason, FinishReason::Completed);
    }

    #[test]
    fn load_missing_file_fails_with_path() {
        let err = AssessmentReport::load_json(Path::new("/nonexistent/report.json")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/report.json"));
    }

    #[test]
    fn markdown_output() {
        let baseline = make_report(80, &[("rust", 4, 5)]);
        let current = make_report(40, &[("rust", 1, 5), ("go", 1, 1)]);

        let md = current.compare(&baseline, 0.05).to_markdown();
        assert!(md.contains("80% -> 40% (-40)"));
        assert!(md.contains("### Regressions"));
        assert!(md.contains("| rust | 80.0% | 20.0% | -60.0% |"));
        assert!(md.contains("**New topics:** go"));
    }
}

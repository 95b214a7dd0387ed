//! Result types produced once a session finishes.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::model::Difficulty;

/// Per-topic tally.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TopicBreakdown {
    pub correct: u32,
    /// Graded questions, unanswered ones included.
    pub total: u32,
    /// Answered essay/scenario questions, kept out of `total`.
    #[serde(default)]
    pub ungraded: u32,
    /// Mean time over every question of the topic.
    pub average_time_seconds: f64,
}

impl TopicBreakdown {
    /// `correct / total`, or `None` when nothing in the topic was graded.
    pub fn mastery(&self) -> Option<f64> {
        (self.total > 0).then(|| self.correct as f64 / self.total as f64)
    }

    /// Mastery as a rounded whole percentage.
    pub fn mastery_percent(&self) -> Option<u32> {
        self.mastery().map(|m| (m * 100.0).round() as u32)
    }
}

/// Per-difficulty tally.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DifficultyBreakdown {
    pub correct: u32,
    pub total: u32,
}

/// Immutable snapshot of a completed session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Results {
    pub total_questions: u32,
    pub correct_count: u32,
    pub ungraded_count: u32,
    pub unanswered_count: u32,
    pub earned_points: u32,
    pub total_points: u32,
    /// `round(earned_points / total_points * 100)`, 0 when there are no points.
    pub score_percent: u32,
    pub time_spent_seconds: u64,
    /// Keyed by topic in first-appearance order.
    pub topic_breakdown: IndexMap<String, TopicBreakdown>,
    pub difficulty_breakdown: IndexMap<Difficulty, DifficultyBreakdown>,
    pub recommendations: Vec<String>,
    pub strengths: Vec<String>,
    pub improvements: Vec<String>,
    pub next_steps: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mastery_guards_empty_topic() {
        let empty = TopicBreakdown::default();
        assert_eq!(empty.mastery(), None);

        let t = TopicBreakdown {
            correct: 2,
            total: 3,
            ungraded: 0,
            average_time_seconds: 0.0,
        };
        assert_eq!(t.mastery_percent(), Some(67));
    }
}

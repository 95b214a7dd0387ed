//! Score aggregation.
//!
//! Reduces a session's answer records into points, a percentage score and
//! per-topic / per-difficulty breakdowns. Accumulation is commutative, so
//! totals do not depend on question order; topic time averages are divided
//! out only after every question has been added.

use std::collections::HashMap;

use indexmap::IndexMap;

use crate::answer::{AnswerRecord, Grade};
use crate::model::Question;
use crate::recommendations;
use crate::results::{DifficultyBreakdown, Results, TopicBreakdown};

/// Intermediate per-topic sums.
#[derive(Default)]
struct TopicAccumulator {
    correct: u32,
    total: u32,
    ungraded: u32,
    time_sum: u64,
}

/// Compute `round(earned / possible * 100)`, guarding a zero denominator.
pub fn score_percent(earned: u32, possible: u32) -> u32 {
    if possible == 0 {
        return 0;
    }
    let pct = (earned as f64 / possible as f64 * 100.0).round();
    pct.clamp(0.0, 100.0) as u32
}

/// Aggregate `answers` for `questions` into a [`Results`] snapshot.
///
/// A question with no record counts as unanswered and incorrect. Answered
/// essay/scenario questions are tallied as ungraded and kept out of the
/// point and mastery totals.
pub fn aggregate(
    questions: &[Question],
    answers: &HashMap<String, AnswerRecord>,
    time_spent_seconds: u64,
) -> Results {
    let mut topics: IndexMap<String, TopicAccumulator> = IndexMap::new();
    let mut difficulties: IndexMap<_, DifficultyBreakdown> = IndexMap::new();
    let mut correct_count = 0u32;
    let mut ungraded_count = 0u32;
    let mut unanswered_count = 0u32;
    let mut earned_points = 0u32;
    let mut total_points = 0u32;

    for question in questions {
        let record = answers.get(&question.id);
        let grade = record.map(|r| r.grade).unwrap_or(Grade::Incorrect);
        if record.is_none() {
            unanswered_count += 1;
        }

        let topic = topics.entry(question.topic.clone()).or_default();
        topic.time_sum += record.map(|r| r.time_spent_seconds).unwrap_or(0);

        if grade == Grade::Ungraded {
            topic.ungraded += 1;
            ungraded_count += 1;
            continue;
        }

        let difficulty = difficulties.entry(question.difficulty).or_default();
        topic.total += 1;
        difficulty.total += 1;
        total_points += question.points;

        if grade.is_correct() {
            topic.correct += 1;
            difficulty.correct += 1;
            correct_count += 1;
            earned_points += record.map(|r| r.points_awarded).unwrap_or(0);
        }
    }

    let topic_breakdown: IndexMap<String, TopicBreakdown> = topics
        .into_iter()
        .map(|(name, acc)| {
            let counted = acc.total + acc.ungraded;
            let average_time_seconds = if counted == 0 {
                0.0
            } else {
                acc.time_sum as f64 / counted as f64
            };
            (
                name,
                TopicBreakdown {
                    correct: acc.correct,
                    total: acc.total,
                    ungraded: acc.ungraded,
                    average_time_seconds,
                },
            )
        })
        .collect();

    let score = score_percent(earned_points, total_points);

    tracing::debug!(
        questions = questions.len(),
        correct = correct_count,
        earned_points,
        total_points,
        score,
        "aggregated session results"
    );

    Results {
        total_questions: questions.len() as u32,
        correct_count,
        ungraded_count,
        unanswered_count,
        earned_points,
        total_points,
        score_percent: score,
        time_spent_seconds,
        strengths: recommendations::strengths(&topic_breakdown),
        improvements: recommendations::improvements(&topic_breakdown),
        recommendations: recommendations::recommendations(&topic_breakdown, score),
        next_steps: recommendations::next_steps(score),
        topic_breakdown,
        difficulty_breakdown: difficulties,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::answer::Answer;
    use crate::model::{Difficulty, QuestionKind};

    fn question(id: &str, topic: &str, difficulty: Difficulty, points: u32) -> Question {
        Question {
            id: id.into(),
            prompt: String::new(),
            kind: QuestionKind::TrueFalse {
                correct: Some(true),
            },
            points,
            difficulty,
            topic: topic.into(),
            time_limit_seconds: None,
            hints: vec![],
        }
    }

    fn record(id: &str, grade: Grade, points: u32, secs: u64) -> AnswerRecord {
        AnswerRecord {
            question_id: id.into(),
            answer: Answer::Boolean(grade.is_correct()),
            grade,
            points_awarded: if grade.is_correct() { points } else { 0 },
            confidence: None,
            hints_used: 0,
            time_spent_seconds: secs,
            sealed: true,
        }
    }

    fn answers(records: Vec<AnswerRecord>) -> HashMap<String, AnswerRecord> {
        records
            .into_iter()
            .map(|r| (r.question_id.clone(), r))
            .collect()
    }

    #[test]
    fn points_weighted_scenario() {
        let mut mc = question("mc", "basics", Difficulty::Easy, 2);
        mc.kind = QuestionKind::MultipleChoice {
            options: vec!["a".into(), "b".into()],
            correct: Some("a".into()),
        };
        let tf = question("tf", "basics", Difficulty::Medium, 1);
        let answers = answers(vec![
            record("mc", Grade::Correct, 2, 10),
            record("tf", Grade::Incorrect, 1, 5),
        ]);

        let results = aggregate(&[mc, tf], &answers, 15);
        assert_eq!(results.earned_points, 2);
        assert_eq!(results.total_points, 3);
        assert_eq!(results.score_percent, 67);
        assert_eq!(results.correct_count, 1);
        assert_eq!(results.total_questions, 2);
    }

    #[test]
    fn zero_points_scores_zero() {
        let results = aggregate(&[], &HashMap::new(), 0);
        assert_eq!(results.score_percent, 0);
        assert_eq!(score_percent(0, 0), 0);
        assert_eq!(score_percent(5, 5), 100);
    }

    #[test]
    fn unanswered_questions_count_as_incorrect() {
        let qs = vec![
            question("a", "t", Difficulty::Easy, 1),
            question("b", "t", Difficulty::Easy, 1),
        ];
        let results = aggregate(&qs, &answers(vec![record("a", Grade::Correct, 1, 4)]), 4);
        assert_eq!(results.unanswered_count, 1);
        assert_eq!(results.topic_breakdown["t"].total, 2);
        assert_eq!(results.topic_breakdown["t"].correct, 1);
        assert_eq!(results.topic_breakdown["t"].average_time_seconds, 2.0);
        assert_eq!(results.score_percent, 50);
    }

    #[test]
    fn order_of_questions_does_not_change_totals() {
        let qs = vec![
            question("1", "rust", Difficulty::Easy, 1),
            question("2", "go", Difficulty::Hard, 3),
            question("3", "rust", Difficulty::Medium, 2),
            question("4", "go", Difficulty::Easy, 1),
            question("5", "sql", Difficulty::Hard, 5),
        ];
        let ans = answers(vec![
            record("1", Grade::Correct, 1, 7),
            record("2", Grade::Incorrect, 3, 11),
            record("3", Grade::Correct, 2, 13),
            record("5", Grade::Correct, 5, 3),
        ]);
        let forward = aggregate(&qs, &ans, 60);
        let mut reversed_qs = qs.clone();
        reversed_qs.reverse();
        let reversed = aggregate(&reversed_qs, &ans, 60);
        let mut rotated_qs = qs.clone();
        rotated_qs.rotate_left(2);
        let rotated = aggregate(&rotated_qs, &ans, 60);

        for other in [&reversed, &rotated] {
            assert_eq!(forward.score_percent, other.score_percent);
            assert_eq!(forward.topic_breakdown, other.topic_breakdown);
            assert_eq!(forward.difficulty_breakdown, other.difficulty_breakdown);
        }
    }

    #[test]
    fn ungraded_answers_stay_out_of_totals() {
        let mut essay = question("e", "writing", Difficulty::Hard, 5);
        essay.kind = QuestionKind::Essay;
        let tf = question("tf", "writing", Difficulty::Easy, 1);
        let ans = answers(vec![
            record("e", Grade::Ungraded, 5, 120),
            record("tf", Grade::Correct, 1, 10),
        ]);
        let results = aggregate(&[essay, tf], &ans, 130);
        assert_eq!(results.ungraded_count, 1);
        assert_eq!(results.total_points, 1);
        assert_eq!(results.score_percent, 100);
        let writing = &results.topic_breakdown["writing"];
        assert_eq!((writing.correct, writing.total, writing.ungraded), (1, 1, 1));
        assert_eq!(writing.average_time_seconds, 65.0);
        assert!(!results.difficulty_breakdown.contains_key(&Difficulty::Hard));
    }

    #[test]
    fn topics_keep_first_appearance_order() {
        let qs = vec![
            question("1", "zeta", Difficulty::Easy, 1),
            question("2", "alpha", Difficulty::Easy, 1),
            question("3", "zeta", Difficulty::Easy, 1),
        ];
        let results = aggregate(&qs, &HashMap::new(), 0);
        let names: Vec<&str> = results.topic_breakdown.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["zeta", "alpha"]);
    }
}

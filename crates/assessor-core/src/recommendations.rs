//! Recommendation rules.
//!
//! Four pure functions over the topic breakdown and overall score. Output
//! order is fixed: topic lines follow breakdown insertion order.

use indexmap::IndexMap;

use crate::results::TopicBreakdown;

/// Topic mastery at or above this ratio is a strength.
pub const STRENGTH_THRESHOLD: f64 = 0.80;
/// Topic mastery below this ratio needs improvement.
pub const IMPROVEMENT_THRESHOLD: f64 = 0.70;
/// Topic mastery below this ratio gets a dedicated review recommendation.
pub const REVIEW_THRESHOLD: f64 = 0.60;

/// One line per topic with mastery >= 80%.
pub fn strengths(topics: &IndexMap<String, TopicBreakdown>) -> Vec<String> {
    topics
        .iter()
        .filter_map(|(name, t)| {
            let mastery = t.mastery()?;
            (mastery >= STRENGTH_THRESHOLD)
                .then(|| format!("Strong grasp of {name} ({}%)", percent(mastery)))
        })
        .collect()
}

/// One line per topic with mastery < 70%.
pub fn improvements(topics: &IndexMap<String, TopicBreakdown>) -> Vec<String> {
    topics
        .iter()
        .filter_map(|(name, t)| {
            let mastery = t.mastery()?;
            (mastery < IMPROVEMENT_THRESHOLD)
                .then(|| format!("{name} needs more practice ({}%)", percent(mastery)))
        })
        .collect()
}

/// Generic remediation below 70 overall, per-topic review below 60% mastery,
/// and an advancement line at 90 or above, in that order.
pub fn recommendations(topics: &IndexMap<String, TopicBreakdown>, score: u32) -> Vec<String> {
    let mut lines = Vec::new();

    if score < 70 {
        lines.push("Review the core concepts before your next attempt".to_string());
        lines.push("Work through additional practice questions at a comfortable pace".to_string());
    }

    for (name, t) in topics {
        if let Some(mastery) = t.mastery() {
            if mastery < REVIEW_THRESHOLD {
                lines.push(format!(
                    "Revisit the {name} material ({}% mastery)",
                    percent(mastery)
                ));
            }
        }
    }

    if score >= 90 {
        lines.push("You are ready for more advanced material".to_string());
    }

    lines
}

/// Exactly one branch fires, chosen by the overall score alone.
pub fn next_steps(score: u32) -> Vec<String> {
    let lines: &[&str] = if score >= 80 {
        &[
            "Continue to the next module",
            "Apply what you learned in a hands-on project",
        ]
    } else if score >= 60 {
        &[
            "Review the questions you answered incorrectly",
            "Take another practice round on your weaker topics",
        ]
    } else {
        &[
            "Revisit the course materials for this unit",
            "Schedule regular study sessions over the coming week",
            "Reach out to a tutor or mentor for guided help",
        ]
    };
    lines.iter().map(|s| s.to_string()).collect()
}

fn percent(ratio: f64) -> u32 {
    (ratio * 100.0).round() as u32
}

/// Deterministic rotation through a fixed list of phrases.
///
/// Successive calls return successive phrases, wrapping around, so feedback
/// does not repeat back-to-back yet stays reproducible.
#[derive(Debug, Clone)]
pub struct PhraseRotation {
    phrases: &'static [&'static str],
    calls: usize,
}

pub const CORRECT_PHRASES: &[&str] = &["Correct!", "Nicely done.", "Exactly right.", "Well reasoned."];
pub const INCORRECT_PHRASES: &[&str] = &[
    "Not quite.",
    "That's not it this time.",
    "Close, but no.",
    "Keep going, you'll get the next one.",
];
pub const UNGRADED_PHRASES: &[&str] = &["Answer recorded for review.", "Saved for your instructor."];

impl PhraseRotation {
    pub fn new(phrases: &'static [&'static str]) -> Self {
        Self { phrases, calls: 0 }
    }

    pub fn next_phrase(&mut self) -> &'static str {
        if self.phrases.is_empty() {
            return "";
        }
        let phrase = self.phrases[self.calls % self.phrases.len()];
        self.calls += 1;
        phrase
    }
}

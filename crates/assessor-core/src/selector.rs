//! Question selection from a bank for a given mode and topic.

use crate::model::{Mode, Question};

/// Pick the ordered question set for a session.
///
/// Topic matching is case-insensitive. Adaptive sessions ramp from easy to
/// hard (stable within a band); the other modes keep bank order. `limit`
/// caps the count after ordering.
pub fn select_questions(
    bank: &[Question],
    mode: Mode,
    topic: Option<&str>,
    limit: Option<usize>,
) -> Vec<Question> {
    let mut selected: Vec<Question> = bank
        .iter()
        .filter(|q| match topic {
            Some(t) => q.topic.trim().eq_ignore_ascii_case(t.trim()),
            None => true,
        })
        .cloned()
        .collect();

    if mode == Mode::Adaptive {
        selected.sort_by_key(|q| q.difficulty);
    }

    if let Some(limit) = limit {
        selected.truncate(limit);
    }

    selected
}

//! Markdown summary of an assessment report.

use assessor_core::report::AssessmentReport;

use crate::{answer_text, grade_label};

/// Escape table cell content.
fn cell(s: &str) -> String {
    s.replace('|', "\\|").replace('\n', " ")
}

/// Render a report as Markdown.
pub fn generate_markdown(report: &AssessmentReport) -> String {
    let results = &report.results;
    let mut md = String::new();

    md.push_str("# Assessment results\n\n");
    md.push_str(&format!(
        "**Score:** {}% ({}/{} points) | **Mode:** {} | **Finished:** {}\n\n",
        results.score_percent,
        results.earned_points,
        results.total_points,
        report.mode,
        report.reason
    ));
    md.push_str(&format!(
        "{} correct of {} questions, {} ungraded, {} unanswered, {}m {}s\n\n",
        results.correct_count,
        results.total_questions,
        results.ungraded_count,
        results.unanswered_count,
        results.time_spent_seconds / 60,
        results.time_spent_seconds % 60
    ));

    if !results.topic_breakdown.is_empty() {
        md.push_str("## Topics\n\n");
        md.push_str("| Topic | Correct | Mastery | Avg time |\n");
        md.push_str("|-------|---------|---------|----------|\n");
        for (topic, t) in &results.topic_breakdown {
            md.push_str(&format!(
                "| {} | {}/{} | {} | {:.1}s |\n",
                cell(topic),
                t.correct,
                t.total,
                t.mastery_percent()
                    .map(|p| format!("{p}%"))
                    .unwrap_or_else(|| "ungraded".to_string()),
                t.average_time_seconds
            ));
        }
        md.push('\n');
    }

    if !results.difficulty_breakdown.is_empty() {
        md.push_str("## Difficulty\n\n");
        for (difficulty, d) in &results.difficulty_breakdown {
            md.push_str(&format!("- {difficulty}: {}/{}\n", d.correct, d.total));
        }
        md.push('\n');
    }

    for (title, lines) in [
        ("Strengths", &results.strengths),
        ("Needs improvement", &results.improvements),
        ("Recommendations", &results.recommendations),
        ("Next steps", &results.next_steps),
    ] {
        if lines.is_empty() {
            continue;
        }
        md.push_str(&format!("## {title}\n\n"));
        for line in lines {
            md.push_str(&format!("- {line}\n"));
        }
        md.push('\n');
    }

    if !report.questions.is_empty() {
        md.push_str("## Questions\n\n");
        md.push_str("| # | Question | Answer | Grade |\n");
        md.push_str("|---|----------|--------|-------|\n");
        for (i, q) in report.questions.iter().enumerate() {
            let flag = if report.flagged.contains(&q.id) {
                " (flagged)"
            } else {
                ""
            };
            md.push_str(&format!(
                "| {} | {}{} | {} | {} |\n",
                i + 1,
                cell(&q.prompt),
                flag,
                cell(&answer_text(report, &q.id)),
                grade_label(report, &q.id)
            ));
        }
    }

    md
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::sample_report;

    #[test]
    fn markdown_summary() {
        let md = generate_markdown(&sample_report());
        assert!(md.starts_with("# Assessment results"));
        assert!(md.contains("**Score:** 50% (2/4 points)"));
        assert!(md.contains("**Finished:** time expired"));
        assert!(md.contains("| ownership | 2/2 | 100% |"));
        assert!(md.contains("| writing | 0/0 | ungraded |"));
        assert!(md.contains("- hard: 0/1"));
        assert!(md.contains("## Strengths"));
        assert!(md.contains("(flagged)"));
        assert!(md.contains("| 5 | Prompt for <sql-2> | - | unanswered |"));
    }

    #[test]
    fn pipes_in_cells_are_escaped() {
        let mut report = sample_report();
        report.questions[0].prompt = "a | b".into();
        let md = generate_markdown(&report);
        assert!(md.contains("a \\| b"));
    }
}

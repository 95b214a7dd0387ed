//! HTML report generator.
//!
//! Produces a self-contained HTML file with all CSS/JS inlined.

use anyhow::Result;
use std::path::Path;

use assessor_core::report::AssessmentReport;

use crate::{answer_text, grade_label};

/// `(topic, mastery ratio)` rows in breakdown order.
type TopicRows<'a> = Vec<(&'a str, f64)>;

/// Escape a string for safe HTML insertion.
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

/// Generate an HTML report from an assessment report.
pub fn generate_html(report: &AssessmentReport) -> String {
    let results = &report.results;
    let mut html = String::new();

    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    html.push_str("<meta charset=\"utf-8\">\n");
    html.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n");
    html.push_str(&format!(
        "<title>assessor report: {}% ({})</title>\n",
        results.score_percent, report.mode
    ));
    html.push_str("<style>\n");
    html.push_str(CSS);
    html.push_str("</style>\n");
    html.push_str("</head>\n<body>\n");

    // Header
    html.push_str("<header>\n");
    html.push_str("<h1>assessor report</h1>\n");
    html.push_str(&format!(
        "<p class=\"meta\">Mode: <strong>{}</strong>{} | {} questions | {} | {}</p>\n",
        report.mode,
        report
            .topic
            .as_deref()
            .map(|t| format!(" | Topic: <strong>{}</strong>", html_escape(t)))
            .unwrap_or_default(),
        results.total_questions,
        report.reason,
        report.created_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    html.push_str("</header>\n");

    // Score dashboard
    html.push_str("<section class=\"dashboard\">\n");
    html.push_str("<h2>Summary</h2>\n");
    html.push_str(&format!(
        "<p class=\"score {}\">{}%</p>\n",
        score_class(results.score_percent as f64 / 100.0),
        results.score_percent
    ));
    html.push_str("<table class=\"summary\">\n");
    html.push_str("<thead><tr><th>Correct</th><th>Points</th><th>Ungraded</th><th>Unanswered</th><th>Time</th></tr></thead>\n");
    html.push_str(&format!(
        "<tbody><tr><td>{}/{}</td><td>{}/{}</td><td>{}</td><td>{}</td><td>{}m {}s</td></tr></tbody></table>\n",
        results.correct_count,
        results.total_questions - results.ungraded_count,
        results.earned_points,
        results.total_points,
        results.ungraded_count,
        results.unanswered_count,
        results.time_spent_seconds / 60,
        results.time_spent_seconds % 60,
    ));
    html.push_str("</section>\n");

    // Topic breakdown
    html.push_str("<section class=\"topics\">\n");
    html.push_str("<h2>Topics</h2>\n");
    html.push_str("<table class=\"summary\">\n");
    html.push_str("<thead><tr><th>Topic</th><th>Correct</th><th>Mastery</th><th>Ungraded</th><th>Avg time</th></tr></thead>\n");
    html.push_str("<tbody>\n");
    for (topic, t) in &results.topic_breakdown {
        html.push_str(&format!(
            "<tr><td>{}</td><td>{}/{}</td><td>{}</td><td>{}</td><td>{:.1}s</td></tr>\n",
            html_escape(topic),
            t.correct,
            t.total,
            t.mastery_percent()
                .map(|p| format!("{p}%"))
                .unwrap_or_else(|| "-".to_string()),
            t.ungraded,
            t.average_time_seconds,
        ));
    }
    html.push_str("</tbody></table>\n");

    let graded: TopicRows = results
        .topic_breakdown
        .iter()
        .filter_map(|(name, t)| t.mastery().map(|m| (name.as_str(), m)))
        .collect();
    if !graded.is_empty() {
        html.push_str(&generate_bar_chart(&graded));
    }

    // Difficulty breakdown
    if !results.difficulty_breakdown.is_empty() {
        html.push_str("<h2>Difficulty</h2>\n");
        html.push_str("<table class=\"summary\">\n");
        html.push_str("<thead><tr><th>Difficulty</th><th>Correct</th></tr></thead>\n<tbody>\n");
        for (difficulty, d) in &results.difficulty_breakdown {
            html.push_str(&format!(
                "<tr><td>{}</td><td>{}/{}</td></tr>\n",
                difficulty, d.correct, d.total
            ));
        }
        html.push_str("</tbody></table>\n");
    }
    html.push_str("</section>\n");

    // Feedback lists
    html.push_str("<section class=\"feedback\">\n");
    for (title, lines) in [
        ("Strengths", &results.strengths),
        ("Needs improvement", &results.improvements),
        ("Recommendations", &results.recommendations),
        ("Next steps", &results.next_steps),
    ] {
        if lines.is_empty() {
            continue;
        }
        html.push_str(&format!("<h3>{title}</h3>\n<ul>\n"));
        for line in lines {
            html.push_str(&format!("<li>{}</li>\n", html_escape(line)));
        }
        html.push_str("</ul>\n");
    }
    html.push_str("</section>\n");

    // Per-question results
    html.push_str("<section class=\"results\">\n");
    html.push_str("<h2>Questions</h2>\n");
    html.push_str("<table class=\"results-table\" id=\"results\">\n");
    html.push_str("<thead><tr><th onclick=\"sortTable(0)\">#</th><th onclick=\"sortTable(1)\">Question</th><th onclick=\"sortTable(2)\">Topic</th><th onclick=\"sortTable(3)\">Answer</th><th onclick=\"sortTable(4)\">Grade</th><th onclick=\"sortTable(5)\">Time</th></tr></thead>\n");
    html.push_str("<tbody>\n");

    for (i, q) in report.questions.iter().enumerate() {
        let grade = grade_label(report, &q.id);
        let row_class = match grade.as_str() {
            "correct" => "pass",
            "ungraded" => "ungraded",
            _ => "fail",
        };
        let flag = if report.flagged.contains(&q.id) {
            " <span class=\"flag\">flagged</span>"
        } else {
            ""
        };
        let time = report
            .answer_for(&q.id)
            .map(|r| format!("{}s", r.time_spent_seconds))
            .unwrap_or_else(|| "-".to_string());

        html.push_str(&format!(
            "<tr class=\"{}\"><td>{}</td><td>{}{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
            row_class,
            i + 1,
            html_escape(&q.prompt),
            flag,
            html_escape(&q.topic),
            html_escape(&answer_text(report, &q.id)),
            grade,
            time
        ));
    }

    html.push_str("</tbody></table>\n");
    html.push_str("</section>\n");

    // Raw JSON
    html.push_str("<section class=\"raw-data\">\n");
    html.push_str("<details>\n<summary>Raw JSON Data</summary>\n");
    html.push_str("<pre><code>");
    html.push_str(&html_escape(
        &serde_json::to_string_pretty(report).unwrap_or_default(),
    ));
    html.push_str("</code></pre>\n");
    html.push_str("</details>\n</section>\n");

    // JavaScript for sorting
    html.push_str("<script>\n");
    html.push_str(JS);
    html.push_str("</script>\n");

    html.push_str("</body>\n</html>");
    html
}

/// Write an HTML report to a file.
pub fn write_html_report(report: &AssessmentReport, path: &Path) -> Result<()> {
    let html = generate_html(report);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, html)?;
    Ok(())
}

fn score_class(ratio: f64) -> &'static str {
    if ratio >= 0.8 {
        "good"
    } else if ratio >= 0.6 {
        "fair"
    } else {
        "poor"
    }
}

/// Horizontal bar per topic, width proportional to mastery.
fn generate_bar_chart(topics: &[(&str, f64)]) -> String {
    let bar_height = 30;
    let max_width = 400;
    let padding = 10;
    let label_width = 200;

    let total_height = topics.len() * (bar_height + padding) + padding;

    let mut svg = format!(
        "<svg width=\"{}\" height=\"{}\" xmlns=\"http://www.w3.org/2000/svg\">\n",
        label_width + max_width + 60,
        total_height
    );

    for (i, (topic, mastery)) in topics.iter().enumerate() {
        let y = i * (bar_height + padding) + padding;
        let width = (*mastery * max_width as f64) as usize;

        let color = match score_class(*mastery) {
            "good" => "#22c55e",
            "fair" => "#eab308",
            _ => "#ef4444",
        };

        svg.push_str(&format!(
            "  <text x=\"{}\" y=\"{}\" font-size=\"14\" fill=\"currentColor\" text-anchor=\"end\" dominant-baseline=\"middle\">{}</text>\n",
            label_width - 10,
            y + bar_height / 2,
            html_escape(topic)
        ));
        svg.push_str(&format!(
            "  <rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" fill=\"{}\" rx=\"4\"/>\n",
            label_width, y, width, bar_height, color
        ));
        svg.push_str(&format!(
            "  <text x=\"{}\" y=\"{}\" font-size=\"12\" fill=\"currentColor\" dominant-baseline=\"middle\">{:.0}%</text>\n",
            label_width + width + 8,
            y + bar_height / 2,
            mastery * 100.0
        ));
    }

    svg.push_str("</svg>\n");
    svg
}

const CSS: &str = r#"
:root { --bg: #fff; --fg: #1a1a1a; --border: #e5e7eb; --pass: #dcfce7; --fail: #fde2e2; --muted: #f3f4f6; }
@media (prefers-color-scheme: dark) {
  :root { --bg: #111827; --fg: #f9fafb; --border: #374151; --pass: #064e3b; --fail: #7f1d1d; --muted: #1f2937; }
}
body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', sans-serif; margin: 0; padding: 2rem; background: var(--bg); color: var(--fg); }
h1, h2 { margin-top: 2rem; }
.meta { color: #6b7280; }
.score { font-size: 3rem; font-weight: bold; margin: 0.5rem 0; }
.score.good { color: #22c55e; }
.score.fair { color: #eab308; }
.score.poor { color: #ef4444; }
table { border-collapse: collapse; width: 100%; margin: 1rem 0; }
th, td { border: 1px solid var(--border); padding: 0.5rem 1rem; text-align: left; }
th { background: var(--border); cursor: pointer; }
.pass { background: var(--pass); }
.fail { background: var(--fail); }
.ungraded { background: var(--muted); }
.flag { font-size: 0.75rem; padding: 0 0.4rem; border: 1px solid currentColor; border-radius: 4px; }
pre { overflow-x: auto; padding: 1rem; background: var(--border); border-radius: 8px; }
code { font-family: 'JetBrains Mono', 'Fira Code', monospace; font-size: 0.85rem; }
details { margin: 1rem 0; }
summary { cursor: pointer; font-weight: bold; }
svg { margin: 1rem 0; }
"#;

const JS: &str = r#"
function sortTable(col) {
  const table = document.getElementById('results');
  const tbody = table.querySelector('tbody');
  const rows = Array.from(tbody.querySelectorAll('tr'));
  const asc = table.dataset.sortCol == col && table.dataset.sortDir == 'asc' ? false : true;
  rows.sort((a, b) => {
    const va = a.cells[col].textContent;
    const vb = b.cells[col].textContent;
    return asc ? va.localeCompare(vb, undefined, {numeric: true}) : vb.localeCompare(va, undefined, {numeric: true});
  });
  table.dataset.sortCol = col;
  table.dataset.sortDir = asc ? 'asc' : 'desc';
  rows.forEach(r => tbody.appendChild(r));
}
"#;

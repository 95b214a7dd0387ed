pub mod compare;
pub mod grade;
pub mod init;
pub mod take;
pub mod topics;
pub mod validate;

use std::path::Path;

use anyhow::Result;
use comfy_table::{Cell, Table};

use assessor_core::model::Mode;
use assessor_core::report::AssessmentReport;
use assessor_report::{generate_markdown, write_html_report};

pub(crate) fn parse_mode(mode: &str) -> Result<Mode> {
    mode.parse::<Mode>().map_err(|e| anyhow::anyhow!(e))
}

/// Print the score line and per-topic table.
pub(crate) fn print_summary(report: &AssessmentReport) {
    let results = &report.results;
    println!(
        "\nScore: {}% ({}/{} points, {} correct of {}) [{}]",
        results.score_percent,
        results.earned_points,
        results.total_points,
        results.correct_count,
        results.total_questions,
        report.reason
    );

    let mut table = Table::new();
    table.set_header(vec!["Topic", "Correct", "Mastery", "Avg time"]);
    for (topic, t) in &results.topic_breakdown {
        table.add_row(vec![
            Cell::new(topic),
            Cell::new(format!("{}/{}", t.correct, t.total)),
            Cell::new(
                t.mastery_percent()
                    .map(|p| format!("{p}%"))
                    .unwrap_or_else(|| "ungraded".to_string()),
            ),
            Cell::new(format!("{:.1}s", t.average_time_seconds)),
        ]);
    }
    println!("\n{table}");

    for line in results.recommendations.iter().chain(&results.next_steps) {
        println!("  - {line}");
    }
}

/// Write the report in each requested format under `output`.
pub(crate) fn save_reports(report: &AssessmentReport, output: &Path, format: &str) -> Result<()> {
    std::fs::create_dir_all(output)?;
    let timestamp = report.created_at.format("%Y-%m-%dT%H%M%S");

    let formats: Vec<&str> = if format == "all" {
        vec!["json", "html", "md"]
    } else {
        format.split(',').map(str::trim).collect()
    };

    for fmt in &formats {
        match *fmt {
            "json" => {
                let path = output.join(format!("assessment-{timestamp}.json"));
                report.save_json(&path)?;
                eprintln!("Results saved to: {}", path.display());
            }
            "html" => {
                let path = output.join(format!("assessment-{timestamp}.html"));
                write_html_report(report, &path)?;
                eprintln!("HTML report: {}", path.display());
            }
            "md" | "markdown" => {
                let path = output.join(format!("assessment-{timestamp}.md"));
                std::fs::write(&path, generate_markdown(report))?;
                eprintln!("Markdown report: {}", path.display());
            }
            _ => {
                eprintln!("Unknown format: {fmt}");
            }
        }
    }

    Ok(())
}

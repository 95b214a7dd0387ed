//! The `assessor compare` command.

use std::path::PathBuf;

use anyhow::Result;

use assessor_core::report::AssessmentReport;

pub fn execute(
    baseline_path: PathBuf,
    current_path: PathBuf,
    threshold: f64,
    fail_on_regression: bool,
    format: String,
) -> Result<()> {
    anyhow::ensure!(
        (0.0..=1.0).contains(&threshold),
        "threshold must be between 0.0 and 1.0"
    );

    let baseline = AssessmentReport::load_json(&baseline_path)?;
    let current = AssessmentReport::load_json(&current_path)?;

    let report = current.compare(&baseline, threshold);

    match format.as_str() {
        "markdown" | "md" => {
            println!("{}", report.to_markdown());
        }
        "json" => {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        _ => {
            println!(
                "Score: {}% -> {}% ({:+})",
                report.baseline_score,
                report.current_score,
                report.score_delta()
            );
            println!(
                "Comparison: {} regressions, {} improvements, {} unchanged",
                report.regressions.len(),
                report.improvements.len(),
                report.unchanged
            );

            for (title, changes) in [
                ("Regressions", &report.regressions),
                ("Improvements", &report.improvements),
            ] {
                if changes.is_empty() {
                    continue;
                }
                println!("\n{title}:");
                for c in changes {
                    println!(
                        "  {} {:.1}% -> {:.1}% ({:+.1}%)",
                        c.topic,
                        c.baseline_mastery * 100.0,
                        c.current_mastery * 100.0,
                        c.delta * 100.0
                    );
                }
            }

            if !report.new_topics.is_empty() {
                println!("\nNew topics: {}", report.new_topics.join(", "));
            }
            if !report.removed_topics.is_empty() {
                println!("Removed topics: {}", report.removed_topics.join(", "));
            }
        }
    }

    if fail_on_regression && report.has_regressions() {
        std::process::exit(1);
    }

    Ok(())
}

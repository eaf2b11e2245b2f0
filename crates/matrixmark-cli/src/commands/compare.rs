//! The `matrixmark compare` command.

use std::path::PathBuf;

use anyhow::Result;

use matrixmark_core::report::GradeReport;

pub fn execute(
    baseline_path: PathBuf,
    current_path: PathBuf,
    threshold: f64,
    fail_on_regression: bool,
    format: String,
) -> Result<()> {
    let baseline = GradeReport::load_json(&baseline_path)?;
    let current = GradeReport::load_json(&current_path)?;

    let regrade = current.compare(&baseline, threshold);

    match format.as_str() {
        "markdown" | "md" => {
            println!("{}", regrade.to_markdown());
        }
        "json" => {
            println!("{}", serde_json::to_string_pretty(&regrade)?);
        }
        _ => {
            // text format
            println!(
                "Regrade: {} down, {} up, {} unchanged",
                regrade.regressions.len(),
                regrade.improvements.len(),
                regrade.unchanged
            );

            if !regrade.regressions.is_empty() {
                println!("\nScore decreases:");
                for c in &regrade.regressions {
                    println!(
                        "  {} {:.1}% -> {:.1}% ({:+.1}%)",
                        c.attempt_id,
                        c.baseline_fraction * 100.0,
                        c.current_fraction * 100.0,
                        c.delta * 100.0
                    );
                }
            }

            if !regrade.improvements.is_empty() {
                println!("\nScore increases:");
                for c in &regrade.improvements {
                    println!(
                        "  {} {:.1}% -> {:.1}% ({:+.1}%)",
                        c.attempt_id,
                        c.baseline_fraction * 100.0,
                        c.current_fraction * 100.0,
                        c.delta * 100.0
                    );
                }
            }

            if regrade.new_attempts > 0 {
                println!("\n{} new attempt(s)", regrade.new_attempts);
            }
            if regrade.removed_attempts > 0 {
                println!("{} removed attempt(s)", regrade.removed_attempts);
            }
        }
    }

    if fail_on_regression && regrade.has_regressions() {
        std::process::exit(1);
    }

    Ok(())
}

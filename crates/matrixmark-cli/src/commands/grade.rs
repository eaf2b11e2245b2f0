//! The `matrixmark grade` command.

use std::path::PathBuf;
use std::time::Instant;

use anyhow::Result;
use chrono::Utc;
use uuid::Uuid;

use matrixmark_core::grading::{
    grade_response_detailed, is_complete, summarize, validation_message,
};
use matrixmark_core::parser;
use matrixmark_core::report::{AttemptResult, GradeReport, QuestionSummary};
use matrixmark_report::csv::write_csv_report;
use matrixmark_report::markdown::write_markdown_report;

pub fn execute(
    question_path: PathBuf,
    attempts_path: PathBuf,
    output: PathBuf,
    format: String,
    strict: bool,
) -> Result<()> {
    let start = Instant::now();

    let question = parser::parse_question(&question_path)?;
    let attempts = parser::parse_attempts(&attempts_path, &question)?;
    anyhow::ensure!(!attempts.is_empty(), "no attempts found in {}", attempts_path.display());

    let mut results = Vec::new();
    for attempt in &attempts {
        let complete = is_complete(&question, &attempt.response);
        if !complete {
            let message = validation_message(&question, &attempt.response)
                .unwrap_or_else(|| "incomplete response".into());
            if strict {
                anyhow::bail!("attempt {}: {message}", attempt.id);
            }
            eprintln!("  Warning: attempt {}: {message}", attempt.id);
        }

        let outcome = grade_response_detailed(&question, &attempt.response);
        results.push(AttemptResult {
            attempt_id: attempt.id.clone(),
            fraction: outcome.grade.fraction,
            state: outcome.grade.state,
            complete,
            rows: outcome.rows,
            summary: summarize(&question, &attempt.response),
        });
    }

    let report = GradeReport {
        id: Uuid::new_v4(),
        created_at: Utc::now(),
        question: QuestionSummary {
            id: question.id.clone(),
            name: question.name.clone(),
            method: question.method.to_string(),
            multiple: question.multiple,
            row_count: question.rows.len(),
        },
        results,
        duration_ms: start.elapsed().as_millis() as u64,
    };

    print_summary(&report);

    std::fs::create_dir_all(&output)?;
    let timestamp = Utc::now().format("%Y-%m-%dT%H%M%S");

    let formats: Vec<&str> = if format == "all" {
        vec!["json", "markdown", "csv"]
    } else {
        format.split(',').collect()
    };

    for fmt in &formats {
        match *fmt {
            "json" => {
                let path = output.join(format!("report-{timestamp}.json"));
                report.save_json(&path)?;
                eprintln!("Results saved to: {}", path.display());
            }
            "markdown" | "md" => {
                let path = output.join(format!("report-{timestamp}.md"));
                write_markdown_report(&report, &path)?;
                eprintln!("Markdown report: {}", path.display());
            }
            "csv" => {
                let path = output.join(format!("report-{timestamp}.csv"));
                write_csv_report(&report, &path)?;
                eprintln!("CSV report: {}", path.display());
            }
            _ => {
                eprintln!("Unknown format: {fmt}");
            }
        }
    }

    Ok(())
}

fn print_summary(report: &GradeReport) {
    use comfy_table::{Cell, Table};

    let mut table = Table::new();
    table.set_header(vec!["Attempt", "Score", "State", "Complete"]);

    for r in &report.results {
        table.add_row(vec![
            Cell::new(&r.attempt_id),
            Cell::new(format!("{:.1}%", r.fraction * 100.0)),
            Cell::new(r.state.to_string()),
            Cell::new(if r.complete { "yes" } else { "no" }),
        ]);
    }

    eprintln!(
        "Graded {} attempt(s) against '{}' [{}], mean {:.1}%",
        report.results.len(),
        report.question.name,
        report.question.method,
        report.mean_fraction() * 100.0
    );
    eprintln!("\n{table}");
}

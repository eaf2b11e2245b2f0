//! Markdown report output.
//!
//! Renders a grading run as a self-contained markdown document suitable for
//! review threads and CI summaries.

use std::path::Path;

use anyhow::Result;

use matrixmark_core::report::GradeReport;

/// Generate a markdown document from a grade report.
pub fn generate_markdown(report: &GradeReport) -> String {
    let mut md = String::new();

    md.push_str(&format!("# Grading report: {}\n\n", report.question.name));
    md.push_str(&format!(
        "- Question: `{}` (method `{}`, {})\n",
        report.question.id,
        report.question.method,
        if report.question.multiple {
            "multi-select"
        } else {
            "single-select"
        }
    ));
    md.push_str(&format!("- Rows: {}\n", report.question.row_count));
    md.push_str(&format!("- Attempts: {}\n", report.results.len()));
    md.push_str(&format!(
        "- Mean score: {:.1}%\n",
        report.mean_fraction() * 100.0
    ));
    md.push_str(&format!(
        "- Generated: {}\n\n",
        report.created_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));

    md.push_str("| Attempt | Score | State | Complete |\n");
    md.push_str("|---------|-------|-------|----------|\n");
    for r in &report.results {
        md.push_str(&format!(
            "| {} | {:.1}% | {} | {} |\n",
            r.attempt_id,
            r.fraction * 100.0,
            r.state,
            if r.complete { "yes" } else { "no" }
        ));
    }
    md.push('\n');

    for r in &report.results {
        md.push_str(&format!("## {}\n\n", r.attempt_id));
        for line in r.summary.lines() {
            md.push_str(&format!("- {line}\n"));
        }
        md.push('\n');
    }

    md
}

/// Write a markdown report to a file.
pub fn write_markdown_report(report: &GradeReport, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, generate_markdown(report))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use matrixmark_core::grading::GradeState;
    use matrixmark_core::report::{AttemptResult, QuestionSummary};
    use uuid::Uuid;

    fn make_report() -> GradeReport {
        GradeReport {
            id: Uuid::nil(),
            created_at: Utc::now(),
            question: QuestionSummary {
                id: "q1".into(),
                name: "Capitals".into(),
                method: "kprime".into(),
                multiple: true,
                row_count: 2,
            },
            results: vec![AttemptResult {
                attempt_id: "alice".into(),
                fraction: 1.0,
                state: GradeState::Correct,
                complete: true,
                rows: vec![],
                summary: "Paris is in France: True\nMadrid is in Italy: False".into(),
            }],
            duration_ms: 3,
        }
    }

    #[test]
    fn markdown_contains_attempts_and_rows() {
        let md = generate_markdown(&make_report());
        assert!(md.contains("# Grading report: Capitals"));
        assert!(md.contains("| alice | 100.0% | correct | yes |"));
        assert!(md.contains("- Paris is in France: True"));
        assert!(md.contains("method `kprime`"));
    }

    #[test]
    fn write_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/report.md");
        write_markdown_report(&make_report(), &path).unwrap();
        assert!(path.exists());
    }
}

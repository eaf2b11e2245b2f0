//! CSV export for gradebook import.
//!
//! One line per (attempt, row), with the composite `cell{row}_{col}` keys
//! as the selected-cell column so external tools can address cells the same
//! way the wire format does.

use std::path::Path;

use anyhow::Result;

use matrixmark_core::model::MatrixQuestion;
use matrixmark_core::report::GradeReport;

fn escape(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Generate CSV content from a grade report.
pub fn generate_csv(report: &GradeReport) -> String {
    let mut out = String::from("attempt,row,row_fraction,selected_cells,attempt_fraction,state\n");

    for result in &report.results {
        for row in &result.rows {
            let cells: Vec<String> = row
                .selected
                .iter()
                .map(|col| MatrixQuestion::cell_key(row.row_id, *col))
                .collect();
            out.push_str(&format!(
                "{},{},{:.4},{},{:.4},{}\n",
                escape(&result.attempt_id),
                row.row_id,
                row.fraction,
                escape(&cells.join(";")),
                result.fraction,
                result.state
            ));
        }
    }

    out
}

/// Write a CSV report to a file.
pub fn write_csv_report(report: &GradeReport, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, generate_csv(report))?;
    Ok(())
}

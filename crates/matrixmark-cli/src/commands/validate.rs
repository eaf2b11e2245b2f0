//! The `matrixmark validate` command.

use std::path::PathBuf;

use anyhow::Result;

pub fn execute(question_path: PathBuf) -> Result<()> {
    let questions = if question_path.is_dir() {
        matrixmark_core::parser::load_question_directory(&question_path)?
    } else {
        vec![matrixmark_core::parser::parse_question(&question_path)?]
    };

    let mut total_warnings = 0;

    for question in &questions {
        println!(
            "Question: {} ({} rows x {} cols, method {})",
            question.name,
            question.rows.len(),
            question.cols.len(),
            question.method
        );

        let warnings = matrixmark_core::parser::validate_question(question);
        for w in &warnings {
            let prefix = w
                .row_id
                .map(|id| format!("  [row {id}]"))
                .unwrap_or_else(|| "  ".to_string());
            println!("{prefix} WARNING: {}", w.message);
        }
        total_warnings += warnings.len();
    }

    if total_warnings == 0 {
        println!("All question files valid.");
    } else {
        println!("\n{total_warnings} warning(s) found.");
    }

    Ok(())
}

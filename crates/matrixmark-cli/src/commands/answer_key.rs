//! The `matrixmark answer-key` command.

use std::path::PathBuf;

use anyhow::{Context, Result};

use matrixmark_core::grading::{correct_response, summarize};
use matrixmark_core::parser;

pub fn execute(question_path: PathBuf) -> Result<()> {
    let question = parser::parse_question(&question_path)?;

    let correct = correct_response(&question)
        .with_context(|| format!("cannot derive answer key for '{}'", question.name))?;

    println!("Answer key for: {} [{}]", question.name, question.method);
    println!("{}", summarize(&question, &correct));

    Ok(())
}

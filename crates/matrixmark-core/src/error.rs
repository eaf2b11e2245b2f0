//! Grading error types.
//!
//! Grading itself is total: incomplete responses are reported through
//! [`crate::grading::is_complete`], and selections against unauthored or
//! unknown cells are ignored (stale client data must not break grading —
//! attempt parsing warns and drops them). The only hard failure is
//! correct-answer derivation over inconsistent authoring data, where no
//! safe default exists.

use thiserror::Error;

use crate::model::RowId;

/// Errors raised by the grading engine.
#[derive(Debug, Error)]
pub enum GradeError {
    /// A single-select row has zero or several authored-correct columns, so
    /// the canonical correct response cannot be derived. An authoring
    /// defect; surfaced as a hard failure rather than guessed around.
    #[error("row {row_id} has {found} correct column(s), expected exactly one for single-select")]
    AmbiguousCorrectAnswer { row_id: RowId, found: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_message_names_the_row() {
        let err = GradeError::AmbiguousCorrectAnswer { row_id: 4, found: 2 };
        assert!(err.to_string().contains("row 4"));
        assert!(err.to_string().contains("2 correct"));
    }
}

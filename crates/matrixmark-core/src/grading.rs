//! The grading engine.
//!
//! Pure, synchronous functions of `(&MatrixQuestion, &Response)`: response
//! completeness, per-row scoring under the five grading methods,
//! question-level aggregation, correct-response derivation, response
//! equivalence, and summarization. Nothing here performs I/O or mutates the
//! question model.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::GradeError;
use crate::model::{ColId, GradingMethod, MatrixQuestion, Response, RowId};

/// Qualitative grading outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GradeState {
    Correct,
    Partial,
    Wrong,
}

impl std::fmt::Display for GradeState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GradeState::Correct => write!(f, "correct"),
            GradeState::Partial => write!(f, "partial"),
            GradeState::Wrong => write!(f, "wrong"),
        }
    }
}

/// The (fraction, qualitative state) output of grading a response.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Grade {
    /// Score in [0.0, 1.0].
    pub fraction: f64,
    /// Qualitative classification of the fraction.
    pub state: GradeState,
}

impl Grade {
    /// Map a fraction to its qualitative state. Exact boundaries: only a
    /// full 1.0 is `Correct` and only a flat 0.0 is `Wrong`; everything in
    /// between is `Partial`. Applied last, independent of the method.
    pub fn from_fraction(fraction: f64) -> Self {
        let state = if fraction >= 1.0 {
            GradeState::Correct
        } else if fraction <= 0.0 {
            GradeState::Wrong
        } else {
            GradeState::Partial
        };
        Grade {
            fraction: fraction.clamp(0.0, 1.0),
            state,
        }
    }
}

/// Per-row diagnostics carried alongside the question-level grade, for
/// review and feedback sinks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RowGrade {
    pub row_id: RowId,
    /// Row fraction in [0.0, 1.0]. Rows with no authored cells report 0.0
    /// here but are excluded from aggregation.
    pub fraction: f64,
    /// Columns the candidate selected, in column order.
    pub selected: Vec<ColId>,
    /// Columns the author marked correct (or positively weighted).
    pub expected: Vec<ColId>,
}

/// A question-level grade plus its per-row breakdown.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradeOutcome {
    pub grade: Grade,
    pub rows: Vec<RowGrade>,
}

/// Whether a response is complete enough to grade.
///
/// Multi-select: always true — an empty row is itself a meaningful answer
/// ("none of these"). Single-select: every row needs exactly one selection;
/// omission is ambiguous and treated as missing data. Total over any
/// well-formed response.
pub fn is_complete(question: &MatrixQuestion, response: &Response) -> bool {
    if question.allows_multiple() {
        return true;
    }
    question
        .rows
        .iter()
        .all(|row| response.selected(row.id).len() == 1)
}

/// Human-readable incomplete-response message for single-select omissions.
/// `None` when the response is complete. Recoverable: surfaced to the
/// submitter as validation feedback, never as a failure.
pub fn validation_message(question: &MatrixQuestion, response: &Response) -> Option<String> {
    if is_complete(question, response) {
        return None;
    }
    let missing: Vec<&str> = question
        .rows
        .iter()
        .filter(|row| response.selected(row.id).len() != 1)
        .map(|row| row.short_text.as_str())
        .collect();
    Some(format!(
        "Select exactly one answer for every row. Unanswered: {}",
        missing.join(", ")
    ))
}

/// Selections in a row restricted to cells the author actually created.
/// Stale selections against unauthored pairs are ignored rather than
/// failing the grading call.
fn authored_selection(
    question: &MatrixQuestion,
    response: &Response,
    row: RowId,
) -> BTreeSet<ColId> {
    response
        .selected(row)
        .into_iter()
        .filter(|col| question.cell(row, *col).is_some())
        .collect()
}

/// Score a single row in [0.0, 1.0] under the question's method.
///
/// Single-select rows arrive here with a singleton (or empty) selection and
/// the same predicates apply.
pub fn score_row(question: &MatrixQuestion, response: &Response, row: RowId) -> f64 {
    let selected = authored_selection(question, response, row);
    match question.method {
        // Unused: the question-level default applies instead.
        GradingMethod::None => 0.0,
        GradingMethod::Any => {
            let any_correct = selected
                .iter()
                .any(|col| question.cell(row, *col).is_some_and(|c| c.is_correct()));
            let any_incorrect = selected
                .iter()
                .any(|col| question.cell(row, *col).is_some_and(|c| !c.is_correct()));
            if !selected.is_empty() && any_correct && !any_incorrect {
                1.0
            } else {
                0.0
            }
        }
        GradingMethod::All | GradingMethod::Kprime => {
            if selected == question.correct_cols(row) {
                1.0
            } else {
                0.0
            }
        }
        GradingMethod::Weighted => {
            // Sum raw weights and divide once: integer weights summing to
            // 100 must grade to exactly 1.0, which per-cell division by
            // 100 does not guarantee (0.6 + 0.3 + 0.1 < 1.0 in f64).
            let sum: f64 = selected
                .iter()
                .filter_map(|col| question.cell(row, *col))
                .map(|cell| cell.weight())
                .sum();
            (sum / 100.0).clamp(0.0, 1.0)
        }
    }
}

/// Grade a response, returning the question-level grade plus per-row
/// diagnostics. Never fails for well-formed input; malformed weight
/// configurations degrade gracefully (sum and clamp).
pub fn grade_response_detailed(question: &MatrixQuestion, response: &Response) -> GradeOutcome {
    let rows: Vec<RowGrade> = question
        .rows
        .iter()
        .map(|row| RowGrade {
            row_id: row.id,
            fraction: score_row(question, response, row.id),
            selected: authored_selection(question, response, row.id)
                .into_iter()
                .collect(),
            expected: question.correct_cols(row.id).into_iter().collect(),
        })
        .collect();

    // Rows without authored cells are data-entry omissions: they never
    // enter the mean's denominator or the Kprime conjunction.
    let gradable: Vec<&RowGrade> = rows
        .iter()
        .filter(|r| question.row_has_cells(r.row_id))
        .collect();

    let fraction = match question.method {
        GradingMethod::None => question.default_grade.clamp(0.0, 1.0),
        GradingMethod::Kprime => {
            if !gradable.is_empty() && gradable.iter().all(|r| r.fraction >= 1.0) {
                1.0
            } else {
                0.0
            }
        }
        _ => {
            if gradable.is_empty() {
                0.0
            } else {
                gradable.iter().map(|r| r.fraction).sum::<f64>() / gradable.len() as f64
            }
        }
    };

    GradeOutcome {
        grade: Grade::from_fraction(fraction),
        rows,
    }
}

/// Grade a response to a (fraction, state) pair.
pub fn grade_response(question: &MatrixQuestion, response: &Response) -> Grade {
    grade_response_detailed(question, response).grade
}

/// Derive the canonical correct response: per row, the cells flagged
/// correct (boolean methods) or positively weighted (weighted method).
///
/// For single-select questions every row must yield exactly one column;
/// zero or several is an authoring inconsistency reported as
/// [`GradeError::AmbiguousCorrectAnswer`] rather than guessed around.
pub fn correct_response(question: &MatrixQuestion) -> Result<Response, GradeError> {
    let mut response = Response::new();
    for row in &question.rows {
        let correct = question.correct_cols(row.id);
        if !question.allows_multiple() && correct.len() != 1 {
            return Err(GradeError::AmbiguousCorrectAnswer {
                row_id: row.id,
                found: correct.len(),
            });
        }
        for col in correct {
            response.select(row.id, col);
        }
    }
    Ok(response)
}

/// Whether two responses select the same columns in every row.
/// Order-independent; a row absent from one response equals an empty set in
/// the other.
pub fn same_response(a: &Response, b: &Response) -> bool {
    let rows: BTreeSet<RowId> = a
        .selections
        .keys()
        .chain(b.selections.keys())
        .copied()
        .collect();
    rows.iter().all(|row| a.selected(*row) == b.selected(*row))
}

/// Empty-selection marker used by [`summarize`].
pub const EMPTY_MARKER: &str = "-";

/// Render a response against the question as one line per row:
/// `<row label>: <selected column labels, comma-joined in column order>`.
///
/// Rows with no selection render the explicit `-` marker, so the summary's
/// line count always equals the question's row count. Purely a rendering:
/// no grading happens here.
pub fn summarize(question: &MatrixQuestion, response: &Response) -> String {
    question
        .rows
        .iter()
        .map(|row| {
            let selected = response.selected(row.id);
            let labels: Vec<&str> = question
                .cols
                .iter()
                .filter(|col| selected.contains(&col.id))
                .map(|col| col.short_text.as_str())
                .collect();
            if labels.is_empty() {
                format!("{}: {EMPTY_MARKER}", row.short_text)
            } else {
                format!("{}: {}", row.short_text, labels.join(", "))
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

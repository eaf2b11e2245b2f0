//! TOML question and attempt parsing.
//!
//! Loads authored matrix questions and candidate attempts from TOML files
//! and directories, and validates questions for authoring defects the
//! grading engine deliberately tolerates (the engine clamps and ignores;
//! the validator reports).

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::model::{Cell, Col, ColId, GradingMethod, MatrixQuestion, Response, Row, RowId};

/// Intermediate TOML structure for question files.
#[derive(Debug, Deserialize)]
struct TomlQuestionFile {
    question: TomlQuestionHeader,
    #[serde(default)]
    rows: Vec<TomlRow>,
    #[serde(default)]
    cols: Vec<TomlCol>,
    #[serde(default)]
    cells: Vec<TomlCell>,
}

#[derive(Debug, Deserialize)]
struct TomlQuestionHeader {
    id: String,
    name: String,
    #[serde(default)]
    description: String,
    method: String,
    #[serde(default = "default_multiple")]
    multiple: bool,
    #[serde(default = "default_grade")]
    default_grade: f64,
}

fn default_multiple() -> bool {
    true
}

fn default_grade() -> f64 {
    1.0
}

#[derive(Debug, Deserialize)]
struct TomlRow {
    id: RowId,
    text: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    feedback: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TomlCol {
    id: ColId,
    text: String,
    #[serde(default)]
    description: Option<String>,
}

/// A cell carries either `correct` or `weight`; which one is expected
/// depends on the grading method and is checked by [`validate_question`].
#[derive(Debug, Deserialize)]
struct TomlCell {
    row: RowId,
    col: ColId,
    #[serde(default)]
    correct: Option<bool>,
    #[serde(default)]
    weight: Option<f64>,
}

/// Parse a single TOML file into a [`MatrixQuestion`].
pub fn parse_question(path: &Path) -> Result<MatrixQuestion> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read question file: {}", path.display()))?;
    parse_question_str(&content, path)
}

/// Parse a TOML string into a [`MatrixQuestion`] (useful for testing).
pub fn parse_question_str(content: &str, source_path: &Path) -> Result<MatrixQuestion> {
    let parsed: TomlQuestionFile = toml::from_str(content)
        .with_context(|| format!("failed to parse TOML: {}", source_path.display()))?;

    let method: GradingMethod = parsed
        .question
        .method
        .parse()
        .map_err(|e: String| anyhow::anyhow!("{e}"))?;

    let rows = parsed
        .rows
        .iter()
        .enumerate()
        .map(|(order, r)| Row {
            id: r.id,
            short_text: r.text.clone(),
            description: r.description.clone(),
            feedback: r.feedback.clone(),
            order: order as u32,
        })
        .collect();

    let cols = parsed
        .cols
        .iter()
        .enumerate()
        .map(|(order, c)| Col {
            id: c.id,
            short_text: c.text.clone(),
            description: c.description.clone(),
            order: order as u32,
        })
        .collect();

    let mut cells = HashMap::new();
    for c in &parsed.cells {
        let cell = match (c.correct, c.weight) {
            (Some(flag), None) => Cell::Correct(flag),
            (None, Some(w)) => Cell::Weight(w),
            (Some(_), Some(_)) => anyhow::bail!(
                "cell ({}, {}) sets both `correct` and `weight`",
                c.row,
                c.col
            ),
            (None, None) => anyhow::bail!(
                "cell ({}, {}) sets neither `correct` nor `weight`",
                c.row,
                c.col
            ),
        };
        if cells.insert((c.row, c.col), cell).is_some() {
            anyhow::bail!("cell ({}, {}) is defined twice", c.row, c.col);
        }
    }

    Ok(MatrixQuestion {
        id: parsed.question.id,
        name: parsed.question.name,
        description: parsed.question.description,
        method,
        multiple: parsed.question.multiple,
        default_grade: parsed.question.default_grade,
        rows,
        cols,
        cells,
    })
}

/// Recursively load all `.toml` question files from a directory. Files
/// that fail to parse are logged and skipped.
pub fn load_question_directory(dir: &Path) -> Result<Vec<MatrixQuestion>> {
    let mut questions = Vec::new();

    if !dir.is_dir() {
        anyhow::bail!("not a directory: {}", dir.display());
    }

    for entry in std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?
    {
        let entry = entry?;
        let path = entry.path();

        if path.is_dir() {
            questions.extend(load_question_directory(&path)?);
        } else if path.extension().is_some_and(|ext| ext == "toml") {
            match parse_question(&path) {
                Ok(q) => questions.push(q),
                Err(e) => {
                    tracing::warn!("skipping {}: {}", path.display(), e);
                }
            }
        }
    }

    Ok(questions)
}

/// Intermediate TOML structure for attempt files.
#[derive(Debug, Deserialize)]
struct TomlAttemptFile {
    #[serde(default)]
    attempts: Vec<TomlAttempt>,
}

#[derive(Debug, Deserialize)]
struct TomlAttempt {
    id: String,
    /// Row id (as a TOML key) to selected column id(s).
    #[serde(default)]
    selections: HashMap<String, TomlSelection>,
}

/// A selection is either one column id (single-select shorthand) or a list.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TomlSelection {
    One(ColId),
    Many(Vec<ColId>),
}

/// A named candidate attempt: an id plus the response to grade.
#[derive(Debug, Clone)]
pub struct Attempt {
    pub id: String,
    pub response: Response,
}

/// Parse a TOML file of attempts against a question. Selections naming
/// unknown rows or columns are logged and dropped — stale client data must
/// not break grading.
pub fn parse_attempts(path: &Path, question: &MatrixQuestion) -> Result<Vec<Attempt>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read attempts file: {}", path.display()))?;
    parse_attempts_str(&content, path, question)
}

/// Parse a TOML string of attempts (useful for testing).
pub fn parse_attempts_str(
    content: &str,
    source_path: &Path,
    question: &MatrixQuestion,
) -> Result<Vec<Attempt>> {
    let parsed: TomlAttemptFile = toml::from_str(content)
        .with_context(|| format!("failed to parse TOML: {}", source_path.display()))?;

    let mut attempts = Vec::new();
    for a in parsed.attempts {
        let mut response = Response::new();
        for (row_key, selection) in &a.selections {
            let Ok(row_id) = row_key.parse::<RowId>() else {
                tracing::warn!("attempt {}: row key '{}' is not an id", a.id, row_key);
                continue;
            };
            if question.row(row_id).is_none() {
                tracing::warn!("attempt {}: unknown row {}", a.id, row_id);
                continue;
            }
            let cols: Vec<ColId> = match selection {
                TomlSelection::One(col) => vec![*col],
                TomlSelection::Many(cols) => cols.clone(),
            };
            for col in cols {
                if question.col(col).is_none() {
                    tracing::warn!("attempt {}: unknown column {}", a.id, col);
                    continue;
                }
                response.select(row_id, col);
            }
        }
        attempts.push(Attempt {
            id: a.id,
            response,
        });
    }

    Ok(attempts)
}

/// A warning from question validation.
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    /// The row id the warning refers to, if any.
    pub row_id: Option<RowId>,
    /// Warning message.
    pub message: String,
}

/// Validate a question for authoring defects.
///
/// These are exactly the invariants the grading engine does not re-check:
/// it clamps malformed weight sums and tolerates sparse grids, so the only
/// place defects surface is here, before the question reaches candidates.
pub fn validate_question(question: &MatrixQuestion) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();

    if question.rows.is_empty() || question.cols.is_empty() {
        warnings.push(ValidationWarning {
            row_id: None,
            message: "question has an empty grid".into(),
        });
    }

    // Duplicate identities
    let mut seen_rows = std::collections::HashSet::new();
    for row in &question.rows {
        if !seen_rows.insert(row.id) {
            warnings.push(ValidationWarning {
                row_id: Some(row.id),
                message: format!("duplicate row id: {}", row.id),
            });
        }
    }
    let mut seen_cols = std::collections::HashSet::new();
    for col in &question.cols {
        if !seen_cols.insert(col.id) {
            warnings.push(ValidationWarning {
                row_id: None,
                message: format!("duplicate column id: {}", col.id),
            });
        }
    }

    // A weighted single-select configuration is rejected here, not at
    // grading time.
    if question.is_weighted() && !question.allows_multiple() {
        warnings.push(ValidationWarning {
            row_id: None,
            message: "weighted grading requires multiple selection".into(),
        });
    }

    // Cells must reference the grid and match the method's cell kind.
    for ((row, col), cell) in &question.cells {
        if question.row(*row).is_none() {
            warnings.push(ValidationWarning {
                row_id: Some(*row),
                message: format!("cell ({row}, {col}) references unknown row {row}"),
            });
        }
        if question.col(*col).is_none() {
            warnings.push(ValidationWarning {
                row_id: Some(*row),
                message: format!("cell ({row}, {col}) references unknown column {col}"),
            });
        }
        match cell {
            Cell::Weight(w) => {
                if !question.is_weighted() {
                    warnings.push(ValidationWarning {
                        row_id: Some(*row),
                        message: format!(
                            "cell ({row}, {col}) has a weight but method is {}",
                            question.method
                        ),
                    });
                }
                if !(-100.0..=100.0).contains(w) {
                    warnings.push(ValidationWarning {
                        row_id: Some(*row),
                        message: format!("cell ({row}, {col}) weight {w} outside [-100, 100]"),
                    });
                }
            }
            Cell::Correct(_) => {
                if question.is_weighted() {
                    warnings.push(ValidationWarning {
                        row_id: Some(*row),
                        message: format!(
                            "cell ({row}, {col}) has a correct flag but method is weighted"
                        ),
                    });
                }
            }
        }
    }

    for row in &question.rows {
        if !question.row_has_cells(row.id) {
            warnings.push(ValidationWarning {
                row_id: Some(row.id),
                message: format!("row {} has no authored cells", row.id),
            });
            continue;
        }

        // Positive weights per row must sum to 100.
        if question.is_weighted() {
            let positive_sum: f64 = question
                .cols
                .iter()
                .filter_map(|col| question.cell(row.id, col.id))
                .filter_map(|cell| match cell {
                    Cell::Weight(w) if *w > 0.0 => Some(*w),
                    _ => None,
                })
                .sum();
            if (positive_sum - 100.0).abs() > 1e-6 {
                tracing::warn!(
                    row = row.id,
                    sum = positive_sum,
                    "positive weights do not sum to 100"
                );
                warnings.push(ValidationWarning {
                    row_id: Some(row.id),
                    message: format!(
                        "row {} positive weights sum to {positive_sum}, expected 100",
                        row.id
                    ),
                });
            }
        }

        // Single-select rows need exactly one correct column, or the
        // correct response cannot be derived.
        if !question.allows_multiple() {
            let correct = question.correct_cols(row.id).len();
            if correct != 1 {
                warnings.push(ValidationWarning {
                    row_id: Some(row.id),
                    message: format!(
                        "row {} has {correct} correct column(s), single-select needs exactly one",
                        row.id
                    ),
                });
            }
        }
    }

    warnings
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    const VALID_TOML: &str = r#"
[question]
id = "capitals"
name = "Capital cities"
description = "True/false statements about capitals"
method = "kprime"
multiple = true

[[rows]]
id = 0
text = "Paris is in France"

[[rows]]
id = 1
text = "Madrid is in Italy"
feedback = "Madrid is the capital of Spain."

[[cols]]
id = 0
text = "True"

[[cols]]
id = 1
text = "False"

[[cells]]
row = 0
col = 0
correct = true

[[cells]]
row = 0
col = 1
correct = false

[[cells]]
row = 1
col = 0
correct = false

[[cells]]
row = 1
col = 1
correct = true
"#;

    #[test]
    fn parse_valid_question() {
        let q = parse_question_str(VALID_TOML, &PathBuf::from("test.toml")).unwrap();
        assert_eq!(q.id, "capitals");
        assert_eq!(q.method, GradingMethod::Kprime);
        assert!(q.multiple);
        assert_eq!(q.rows.len(), 2);
        assert_eq!(q.cols.len(), 2);
        assert_eq!(q.cells.len(), 4);
        assert_eq!(q.cell(1, 1), Some(&Cell::Correct(true)));
        assert_eq!(q.rows[1].feedback.as_deref(), Some("Madrid is the capital of Spain."));
        assert!(validate_question(&q).is_empty());
    }

    #[test]
    fn parse_weighted_cells() {
        let toml = r#"
[question]
id = "w"
name = "Weighted"
method = "weighted"

[[rows]]
id = 0
text = "Pick the protocols"

[[cols]]
id = 0
text = "TCP"

[[cols]]
id = 1
text = "UDP"

[[cells]]
row = 0
col = 0
weight = 40.0

[[cells]]
row = 0
col = 1
weight = 60.0
"#;
        let q = parse_question_str(toml, &PathBuf::from("w.toml")).unwrap();
        assert!(q.is_weighted());
        assert_eq!(q.cell(0, 1), Some(&Cell::Weight(60.0)));
        assert!(validate_question(&q).is_empty());
    }

    #[test]
    fn parse_rejects_cell_with_both_kinds() {
        let toml = r#"
[question]
id = "bad"
name = "Bad"
method = "all"

[[rows]]
id = 0
text = "Row"

[[cols]]
id = 0
text = "Col"

[[cells]]
row = 0
col = 0
correct = true
weight = 50.0
"#;
        let err = parse_question_str(toml, &PathBuf::from("bad.toml")).unwrap_err();
        assert!(err.to_string().contains("both"));
    }

    #[test]
    fn parse_rejects_duplicate_cell() {
        let toml = r#"
[question]
id = "dup"
name = "Dup"
method = "all"

[[rows]]
id = 0
text = "Row"

[[cols]]
id = 0
text = "Col"

[[cells]]
row = 0
col = 0
correct = true

[[cells]]
row = 0
col = 0
correct = false
"#;
        let err = parse_question_str(toml, &PathBuf::from("dup.toml")).unwrap_err();
        assert!(err.to_string().contains("twice"));
    }

    #[test]
    fn parse_malformed_toml() {
        let result = parse_question_str("not [valid toml }{", &PathBuf::from("bad.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn validate_weighted_single_select() {
        let mut q = parse_question_str(VALID_TOML, &PathBuf::from("t.toml")).unwrap();
        q.method = GradingMethod::Weighted;
        q.multiple = false;
        let warnings = validate_question(&q);
        assert!(warnings
            .iter()
            .any(|w| w.message.contains("requires multiple selection")));
    }

    #[test]
    fn validate_weight_sum() {
        let toml = r#"
[question]
id = "w"
name = "Weighted"
method = "weighted"

[[rows]]
id = 0
text = "Row"

[[cols]]
id = 0
text = "A"

[[cols]]
id = 1
text = "B"

[[cells]]
row = 0
col = 0
weight = 40.0

[[cells]]
row = 0
col = 1
weight = 40.0
"#;
        let q = parse_question_str(toml, &PathBuf::from("w.toml")).unwrap();
        let warnings = validate_question(&q);
        assert!(warnings
            .iter()
            .any(|w| w.message.contains("sum to 80") && w.row_id == Some(0)));
    }

    #[test]
    fn validate_single_select_needs_one_correct() {
        let mut q = parse_question_str(VALID_TOML, &PathBuf::from("t.toml")).unwrap();
        q.multiple = false;
        // Row 0 already has exactly one correct column; break row 1.
        q.cells.insert((1, 0), Cell::Correct(true));
        let warnings = validate_question(&q);
        assert!(warnings
            .iter()
            .any(|w| w.row_id == Some(1) && w.message.contains("2 correct")));
    }

    #[test]
    fn validate_row_without_cells() {
        let mut q = parse_question_str(VALID_TOML, &PathBuf::from("t.toml")).unwrap();
        q.cells.retain(|(row, _), _| *row != 1);
        let warnings = validate_question(&q);
        assert!(warnings
            .iter()
            .any(|w| w.row_id == Some(1) && w.message.contains("no authored cells")));
    }

    #[test]
    fn validate_weight_out_of_range() {
        let mut q = parse_question_str(VALID_TOML, &PathBuf::from("t.toml")).unwrap();
        q.method = GradingMethod::Weighted;
        q.cells.clear();
        q.cells.insert((0, 0), Cell::Weight(150.0));
        let warnings = validate_question(&q);
        assert!(warnings
            .iter()
            .any(|w| w.message.contains("outside [-100, 100]")));
    }

    #[test]
    fn parse_attempts_multi_and_shorthand() {
        let q = parse_question_str(VALID_TOML, &PathBuf::from("t.toml")).unwrap();
        let toml = r#"
[[attempts]]
id = "alice"

[attempts.selections]
0 = [0]
1 = [1]

[[attempts]]
id = "bob"

[attempts.selections]
0 = 1
"#;
        let attempts = parse_attempts_str(toml, &PathBuf::from("a.toml"), &q).unwrap();
        assert_eq!(attempts.len(), 2);
        assert_eq!(attempts[0].id, "alice");
        assert_eq!(attempts[0].response.selected(0), [0].into());
        assert_eq!(attempts[0].response.selected(1), [1].into());
        assert_eq!(attempts[1].response.selected(0), [1].into());
        assert!(attempts[1].response.is_empty_row(1));
    }

    #[test]
    fn parse_attempts_drops_unknown_identities() {
        let q = parse_question_str(VALID_TOML, &PathBuf::from("t.toml")).unwrap();
        let toml = r#"
[[attempts]]
id = "stale"

[attempts.selections]
0 = [0, 7]
9 = [0]
"#;
        let attempts = parse_attempts_str(toml, &PathBuf::from("a.toml"), &q).unwrap();
        assert_eq!(attempts.len(), 1);
        assert_eq!(attempts[0].response.selected(0), [0].into());
        assert!(attempts[0].response.is_empty_row(9));
    }

    #[test]
    fn load_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("q.toml"), VALID_TOML).unwrap();
        std::fs::write(dir.path().join("broken.toml"), "nope }{").unwrap();
        std::fs::write(dir.path().join("ignored.txt"), "not toml").unwrap();

        let questions = load_question_directory(dir.path()).unwrap();
        assert_eq!(questions.len(), 1);
        assert_eq!(questions[0].id, "capitals");
    }
}

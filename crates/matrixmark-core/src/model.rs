//! Core data model types for matrixmark.
//!
//! These are the fundamental types the whole system uses to represent a
//! matrix question (rows crossed with columns, correctness data per cell)
//! and a candidate response against it.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Stable identity of a statement row.
pub type RowId = u32;

/// Stable identity of a response column.
pub type ColId = u32;

/// One statement being judged; the unit of per-row scoring.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Row {
    /// Unique identifier within the question.
    pub id: RowId,
    /// Short display text.
    pub short_text: String,
    /// Optional long form of the statement.
    #[serde(default)]
    pub description: Option<String>,
    /// Optional feedback shown after grading.
    #[serde(default)]
    pub feedback: Option<String>,
    /// Relative position in the grid.
    #[serde(default)]
    pub order: u32,
}

/// One response option shared by all rows (e.g. "True"/"False").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Col {
    /// Unique identifier within the question.
    pub id: ColId,
    /// Short display text.
    pub short_text: String,
    /// Optional long form of the option.
    #[serde(default)]
    pub description: Option<String>,
    /// Relative position in the grid.
    #[serde(default)]
    pub order: u32,
}

/// Correctness data at a (row, column) intersection.
///
/// Boolean methods (`none`/`any`/`all`/`kprime`) use `Correct`; the
/// `weighted` method uses `Weight` with a signed value in [-100, 100].
/// Positive weights in a row are supposed to sum to 100 — an authoring-time
/// invariant checked by [`crate::parser::validate_question`], never
/// re-enforced during grading.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Cell {
    /// Whether selecting this cell is correct.
    Correct(bool),
    /// Signed credit awarded when this cell is selected.
    Weight(f64),
}

impl Cell {
    /// Whether this cell belongs to the correct response: a `true` flag, or
    /// a strictly positive weight.
    pub fn is_correct(&self) -> bool {
        match self {
            Cell::Correct(flag) => *flag,
            Cell::Weight(w) => *w > 0.0,
        }
    }

    /// The raw credit contributed when selected, on the [-100, 100] scale.
    /// Callers sum raw weights and divide by 100 once, so integer-valued
    /// weights that add up to 100 grade to exactly 1.0.
    pub fn weight(&self) -> f64 {
        match self {
            Cell::Correct(_) => 0.0,
            Cell::Weight(w) => *w,
        }
    }
}

/// The grading policy applied to a question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GradingMethod {
    /// No grading; the question-level default grade applies.
    None,
    /// A row scores 1.0 if at least one correct and no incorrect cell is
    /// selected.
    Any,
    /// A row scores 1.0 only if the selection equals the correct set.
    All,
    /// Same row predicate as `All`, but rows are ANDed at the question
    /// level: one wrong row zeroes the whole question.
    Kprime,
    /// Partial credit proportional to the selected cells' weights.
    Weighted,
}

impl GradingMethod {
    /// All methods, in declaration order.
    pub const ALL: [GradingMethod; 5] = [
        GradingMethod::None,
        GradingMethod::Any,
        GradingMethod::All,
        GradingMethod::Kprime,
        GradingMethod::Weighted,
    ];
}

impl fmt::Display for GradingMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GradingMethod::None => write!(f, "none"),
            GradingMethod::Any => write!(f, "any"),
            GradingMethod::All => write!(f, "all"),
            GradingMethod::Kprime => write!(f, "kprime"),
            GradingMethod::Weighted => write!(f, "weighted"),
        }
    }
}

impl FromStr for GradingMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "none" => Ok(GradingMethod::None),
            "any" | "anycorrect" => Ok(GradingMethod::Any),
            "all" | "allcorrect" => Ok(GradingMethod::All),
            "kprime" => Ok(GradingMethod::Kprime),
            "weighted" => Ok(GradingMethod::Weighted),
            other => Err(format!("unknown grading method: {other}")),
        }
    }
}

fn default_grade() -> f64 {
    1.0
}

/// An authored matrix question: the full grid plus its grading policy.
///
/// Immutable after construction. The question exclusively owns its rows,
/// columns, and cells; grading reads the model and never mutates it, so
/// concurrent grading of independent responses is safe without locking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatrixQuestion {
    /// Unique identifier for this question.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Description of what the question assesses.
    #[serde(default)]
    pub description: String,
    /// The grading policy.
    pub method: GradingMethod,
    /// Whether several columns may be selected per row.
    pub multiple: bool,
    /// Fraction awarded under [`GradingMethod::None`].
    #[serde(default = "default_grade")]
    pub default_grade: f64,
    /// Ordered statement rows.
    pub rows: Vec<Row>,
    /// Ordered response columns, shared across all rows.
    pub cols: Vec<Col>,
    /// Correctness data, keyed by (row, column). Sparse grids are allowed:
    /// a missing pair means "no credit, not selectable".
    pub cells: HashMap<(RowId, ColId), Cell>,
}

impl MatrixQuestion {
    /// Constant-time cell lookup. `None` for pairs never authored; grading
    /// treats those as ignorable, not as errors.
    pub fn cell(&self, row: RowId, col: ColId) -> Option<&Cell> {
        self.cells.get(&(row, col))
    }

    /// Deterministic composite key for a (row, column) pair, used only at
    /// external boundaries (CSV export, wire interop). Distinct pairs map
    /// to distinct keys.
    pub fn cell_key(row: RowId, col: ColId) -> String {
        format!("cell{row}_{col}")
    }

    pub fn is_weighted(&self) -> bool {
        self.method == GradingMethod::Weighted
    }

    pub fn is_kprime(&self) -> bool {
        self.method == GradingMethod::Kprime
    }

    pub fn allows_multiple(&self) -> bool {
        self.multiple
    }

    /// Whether any cell was authored for the row. Rows without cells are
    /// data-entry omissions and never contribute to the aggregate grade.
    pub fn row_has_cells(&self, row: RowId) -> bool {
        self.cells.keys().any(|(r, _)| *r == row)
    }

    /// The authored-correct column set for a row: `true`-flagged cells for
    /// boolean methods, strictly positive weights for the weighted method.
    pub fn correct_cols(&self, row: RowId) -> BTreeSet<ColId> {
        self.cols
            .iter()
            .filter(|col| {
                self.cell(row, col.id)
                    .is_some_and(|cell| cell.is_correct())
            })
            .map(|col| col.id)
            .collect()
    }

    /// Row lookup by id.
    pub fn row(&self, id: RowId) -> Option<&Row> {
        self.rows.iter().find(|r| r.id == id)
    }

    /// Column lookup by id.
    pub fn col(&self, id: ColId) -> Option<&Col> {
        self.cols.iter().find(|c| c.id == id)
    }
}

/// A candidate's selected cells: one grading attempt's input.
///
/// Modeled directly as a two-level mapping (row → selected column set)
/// rather than a flat composite-key map; string keys exist only at the
/// external boundary. Ephemeral — constructed fresh per grading attempt and
/// never persisted by the core.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    /// Selected columns per row. Rows with no selection may be absent;
    /// absence and an empty set are equivalent.
    pub selections: BTreeMap<RowId, BTreeSet<ColId>>,
}

impl Response {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a column as selected in a row.
    pub fn select(&mut self, row: RowId, col: ColId) {
        self.selections.entry(row).or_default().insert(col);
    }

    /// The selected column set for a row; empty if the row was skipped.
    pub fn selected(&self, row: RowId) -> BTreeSet<ColId> {
        self.selections.get(&row).cloned().unwrap_or_default()
    }

    /// Whether the row has no selection.
    pub fn is_empty_row(&self, row: RowId) -> bool {
        self.selections.get(&row).is_none_or(|cols| cols.is_empty())
    }

    /// Whether any row has a selection.
    pub fn is_empty(&self) -> bool {
        self.selections.values().all(|cols| cols.is_empty())
    }
}

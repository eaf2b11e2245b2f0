//! Grade report types with JSON persistence and regrade comparison.
//!
//! A grading run over a batch of attempts produces a [`GradeReport`]; a
//! saved report can later be compared against a regrade of the same
//! attempts (typically after the author adjusted weights or correctness
//! flags) to see exactly which scores moved.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::grading::{GradeState, RowGrade};

/// A complete grading run report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradeReport {
    /// Unique report identifier.
    pub id: Uuid,
    /// When the report was created.
    pub created_at: DateTime<Utc>,
    /// Summary of the graded question.
    pub question: QuestionSummary,
    /// One result per graded attempt.
    pub results: Vec<AttemptResult>,
    /// Total wall-clock duration in milliseconds.
    pub duration_ms: u64,
}

/// Summary of a question (without the full grid definition).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionSummary {
    pub id: String,
    pub name: String,
    /// Grading method name (e.g. "kprime").
    pub method: String,
    pub multiple: bool,
    pub row_count: usize,
}

/// The graded outcome of one attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttemptResult {
    /// Attempt identifier (e.g. a candidate id).
    pub attempt_id: String,
    /// Question-level score in [0.0, 1.0].
    pub fraction: f64,
    /// Qualitative state of the score.
    pub state: GradeState,
    /// Whether the response was complete under the question's policy.
    pub complete: bool,
    /// Per-row diagnostics.
    pub rows: Vec<RowGrade>,
    /// Deterministic one-line-per-row rendering of the response.
    pub summary: String,
}

impl GradeReport {
    /// Save the report as JSON to a file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize report")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
        Ok(())
    }

    /// Load a report from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read report from {}", path.display()))?;
        let report: GradeReport =
            serde_json::from_str(&content).context("failed to parse report JSON")?;
        Ok(report)
    }

    /// Mean fraction across all attempts; 0.0 for an empty report.
    pub fn mean_fraction(&self) -> f64 {
        if self.results.is_empty() {
            return 0.0;
        }
        self.results.iter().map(|r| r.fraction).sum::<f64>() / self.results.len() as f64
    }

    /// Compare this report (the regrade) against a baseline to see which
    /// attempt scores moved by more than `threshold`.
    pub fn compare(&self, baseline: &GradeReport, threshold: f64) -> RegradeReport {
        use std::collections::HashMap;

        let index = |report: &GradeReport| -> HashMap<String, f64> {
            report
                .results
                .iter()
                .map(|r| (r.attempt_id.clone(), r.fraction))
                .collect()
        };

        let baseline_scores = index(baseline);
        let current_scores = index(self);

        let mut regressions = Vec::new();
        let mut improvements = Vec::new();
        let mut unchanged = 0usize;
        let mut new_attempts = 0usize;

        for (attempt_id, &current) in &current_scores {
            if let Some(&before) = baseline_scores.get(attempt_id) {
                let delta = current - before;
                let change = ScoreChange {
                    attempt_id: attempt_id.clone(),
                    baseline_fraction: before,
                    current_fraction: current,
                    delta,
                };
                if delta < -threshold {
                    regressions.push(change);
                } else if delta > threshold {
                    improvements.push(change);
                } else {
                    unchanged += 1;
                }
            } else {
                new_attempts += 1;
            }
        }

        let removed_attempts = baseline_scores
            .keys()
            .filter(|k| !current_scores.contains_key(*k))
            .count();

        regressions.sort_by(|a, b| a.attempt_id.cmp(&b.attempt_id));
        improvements.sort_by(|a, b| a.attempt_id.cmp(&b.attempt_id));

        RegradeReport {
            regressions,
            improvements,
            unchanged,
            new_attempts,
            removed_attempts,
        }
    }
}

/// Result of comparing a regrade against a baseline report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegradeReport {
    /// Attempts whose score went down.
    pub regressions: Vec<ScoreChange>,
    /// Attempts whose score went up.
    pub improvements: Vec<ScoreChange>,
    /// Attempts with no significant change.
    pub unchanged: usize,
    /// Attempts in the regrade but not the baseline.
    pub new_attempts: usize,
    /// Attempts in the baseline but not the regrade.
    pub removed_attempts: usize,
}

/// A score movement for one attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreChange {
    pub attempt_id: String,
    pub baseline_fraction: f64,
    pub current_fraction: f64,
    pub delta: f64,
}

impl RegradeReport {
    /// Format the comparison as markdown.
    pub fn to_markdown(&self) -> String {
        let mut md = String::new();

        md.push_str(&format!(
            "**Summary:** {} down, {} up, {} unchanged\n\n",
            self.regressions.len(),
            self.improvements.len(),
            self.unchanged
        ));

        let section = |md: &mut String, title: &str, changes: &[ScoreChange]| {
            if changes.is_empty() {
                return;
            }
            md.push_str(&format!("### {title}\n\n"));
            md.push_str("| Attempt | Baseline | Current | Delta |\n");
            md.push_str("|---------|----------|---------|-------|\n");
            for c in changes {
                md.push_str(&format!(
                    "| {} | {:.1}% | {:.1}% | {:+.1}% |\n",
                    c.attempt_id,
                    c.baseline_fraction * 100.0,
                    c.current_fraction * 100.0,
                    c.delta * 100.0
                ));
            }
            md.push('\n');
        };

        section(&mut md, "Score decreases", &self.regressions);
        section(&mut md, "Score increases", &self.improvements);

        md
    }

    /// Returns true if any attempt's score went down.
    pub fn has_regressions(&self) -> bool {
        !self.regressions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_result(attempt_id: &str, fraction: f64, state: GradeState) -> AttemptResult {
        AttemptResult {
            attempt_id: attempt_id.into(),
            fraction,
            state,
            complete: true,
            rows: vec![],
            summary: String::new(),
        }
    }

    fn make_report(results: Vec<AttemptResult>) -> GradeReport {
        GradeReport {
            id: Uuid::nil(),
            created_at: Utc::now(),
            question: QuestionSummary {
                id: "q1".into(),
                name: "Test".into(),
                method: "all".into(),
                multiple: true,
                row_count: 4,
            },
            results,
            duration_ms: 0,
        }
    }

    #[test]
    fn compare_identical_reports() {
        let r = make_result("alice", 1.0, GradeState::Correct);
        let baseline = make_report(vec![r.clone()]);
        let current = make_report(vec![r]);

        let regrade = current.compare(&baseline, 0.01);
        assert!(regrade.regressions.is_empty());
        assert!(regrade.improvements.is_empty());
        assert_eq!(regrade.unchanged, 1);
        assert!(!regrade.has_regressions());
    }

    #[test]
    fn compare_detects_score_drop() {
        let baseline = make_report(vec![make_result("alice", 1.0, GradeState::Correct)]);
        let current = make_report(vec![make_result("alice", 0.5, GradeState::Partial)]);

        let regrade = current.compare(&baseline, 0.01);
        assert_eq!(regrade.regressions.len(), 1);
        assert_eq!(regrade.regressions[0].attempt_id, "alice");
        assert!((regrade.regressions[0].delta + 0.5).abs() < 1e-9);
    }

    #[test]
    fn compare_with_new_and_removed() {
        let baseline = make_report(vec![make_result("old", 1.0, GradeState::Correct)]);
        let current = make_report(vec![make_result("new", 1.0, GradeState::Correct)]);

        let regrade = current.compare(&baseline, 0.01);
        assert_eq!(regrade.new_attempts, 1);
        assert_eq!(regrade.removed_attempts, 1);
    }

    #[test]
    fn json_roundtrip() {
        let report = make_report(vec![make_result("alice", 0.75, GradeState::Partial)]);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");

        report.save_json(&path).unwrap();
        let loaded = GradeReport::load_json(&path).unwrap();

        assert_eq!(loaded.question.id, "q1");
        assert_eq!(loaded.results.len(), 1);
        assert_eq!(loaded.results[0].state, GradeState::Partial);
    }

    #[test]
    fn markdown_output() {
        let baseline = make_report(vec![make_result("alice", 1.0, GradeState::Correct)]);
        let current = make_report(vec![make_result("alice", 0.25, GradeState::Partial)]);

        let regrade = current.compare(&baseline, 0.01);
        let md = regrade.to_markdown();
        assert!(md.contains("Score decreases"));
        assert!(md.contains("alice"));
    }

    #[test]
    fn mean_fraction_over_attempts() {
        let report = make_report(vec![
            make_result("a", 1.0, GradeState::Correct),
            make_result("b", 0.5, GradeState::Partial),
        ]);
        assert!((report.mean_fraction() - 0.75).abs() < 1e-9);
        assert_eq!(make_report(vec![]).mean_fraction(), 0.0);
    }
}

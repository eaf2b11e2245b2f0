//! matrixmark-report — Markdown and CSV renderings of a grade report.

pub mod csv;
pub mod markdown;

//! matrixmark-core — Data model and grading engine for matrix questions.
//!
//! This crate defines the question/response data model, the grading policy
//! engine, the TOML authoring parser with validation, and grade reports.

pub mod error;
pub mod grading;
pub mod model;
pub mod parser;
pub mod report;

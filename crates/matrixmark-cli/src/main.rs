//! matrixmark CLI — the user-facing command-line interface.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "matrixmark", version, about = "Matrix question grading engine")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Grade a batch of attempts against a question
    Grade {
        /// Path to the question .toml file
        #[arg(long)]
        question: PathBuf,

        /// Path to the attempts .toml file
        #[arg(long)]
        attempts: PathBuf,

        /// Output directory for report files
        #[arg(long, default_value = "./matrixmark-results")]
        output: PathBuf,

        /// Output format: json, markdown, csv, all
        #[arg(long, default_value = "json")]
        format: String,

        /// Fail instead of grading incomplete single-select attempts
        #[arg(long)]
        strict: bool,
    },

    /// Validate question definition files
    Validate {
        /// Path to a question .toml file or directory
        #[arg(long)]
        question: PathBuf,
    },

    /// Derive and print the canonical correct response
    AnswerKey {
        /// Path to the question .toml file
        #[arg(long)]
        question: PathBuf,
    },

    /// Compare a regrade report against a baseline
    Compare {
        /// Baseline report JSON
        #[arg(long)]
        baseline: PathBuf,

        /// Current (regrade) report JSON
        #[arg(long)]
        current: PathBuf,

        /// Minimum fraction delta counted as a change
        #[arg(long, default_value = "0.01")]
        threshold: f64,

        /// Exit code 1 if any score went down
        #[arg(long)]
        fail_on_regression: bool,

        /// Output format: text, json, markdown
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Create a starter question and attempts file
    Init,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("matrixmark_core=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Grade {
            question,
            attempts,
            output,
            format,
            strict,
        } => commands::grade::execute(question, attempts, output, format, strict),
        Commands::Validate { question } => commands::validate::execute(question),
        Commands::AnswerKey { question } => commands::answer_key::execute(question),
        Commands::Compare {
            baseline,
            current,
            threshold,
            fail_on_regression,
            format,
        } => commands::compare::execute(baseline, current, threshold, fail_on_regression, format),
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

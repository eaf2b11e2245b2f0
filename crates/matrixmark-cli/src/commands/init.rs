//! The `matrixmark init` command.

use anyhow::Result;

pub fn execute() -> Result<()> {
    if std::path::Path::new("question.toml").exists() {
        println!("question.toml already exists, skipping.");
    } else {
        std::fs::write("question.toml", SAMPLE_QUESTION)?;
        println!("Created question.toml");
    }

    if std::path::Path::new("attempts.toml").exists() {
        println!("attempts.toml already exists, skipping.");
    } else {
        std::fs::write("attempts.toml", SAMPLE_ATTEMPTS)?;
        println!("Created attempts.toml");
    }

    println!("\nNext steps:");
    println!("  1. Edit question.toml with your rows, columns and cells");
    println!("  2. Run: matrixmark validate --question question.toml");
    println!("  3. Run: matrixmark grade --question question.toml --attempts attempts.toml");

    Ok(())
}

const SAMPLE_QUESTION: &str = r#"# matrixmark question definition

[question]
id = "capitals"
name = "Capital cities"
description = "Judge each statement as true or false"
method = "kprime"          # none | any | all | kprime | weighted
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

const SAMPLE_ATTEMPTS: &str = r#"# matrixmark attempts: one table per candidate

[[attempts]]
id = "alice"

[attempts.selections]
0 = [0]
1 = [1]

[[attempts]]
id = "bob"

[attempts.selections]
0 = [0]
1 = [0]
"#;

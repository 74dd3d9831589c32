//! The `fetutor validate` command.

use std::path::PathBuf;

use anyhow::Result;

use fetutor_core::model::ProblemBank;
use fetutor_core::parser;

pub fn execute(bank_path: PathBuf) -> Result<()> {
    let problems = if bank_path.is_dir() {
        parser::load_bank_directory(&bank_path)?
    } else {
        parser::parse_bank(&bank_path)?
    };

    println!("Bank: {} ({} problems)", bank_path.display(), problems.len());

    let warnings = parser::validate_bank(&problems);
    for w in &warnings {
        let prefix = w
            .problem_id
            .as_ref()
            .map(|id| format!("  [{id}]"))
            .unwrap_or_else(|| "  ".to_string());
        println!("{prefix} WARNING: {}", w.message);
    }

    // Duplicate ids are only a warning above; a bank that cannot be built is an error.
    ProblemBank::new(problems)?;

    if warnings.is_empty() {
        println!("All problems valid.");
    } else {
        println!("\n{} warning(s) found.", warnings.len());
    }

    Ok(())
}

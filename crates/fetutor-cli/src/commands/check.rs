//! The `fetutor check` command.

use std::path::PathBuf;

use anyhow::{Context, Result};

use fetutor_core::matcher;

pub fn execute(
    answer: String,
    expected: Option<f64>,
    problem: Option<String>,
    bank: Option<PathBuf>,
    tolerance: Option<f64>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let config = fetutor_providers::load_config_from(config_path.as_deref())?;
    let tolerance = tolerance.unwrap_or(config.tolerance);
    if !(tolerance.is_finite() && tolerance >= 0.0) {
        anyhow::bail!("tolerance must be a non-negative number, got {tolerance}");
    }

    let extracted = matcher::extract_first_number(&answer);
    match extracted {
        Some(value) => println!("Extracted: {value}"),
        None => println!("Extracted: (no number found)"),
    }

    if let Some(expected) = expected {
        print_verdict("answer", expected, matcher::matches(&answer, expected, tolerance));
        return Ok(());
    }

    let id = problem.context("either --expected or --problem is required")?;
    let bank = super::load_bank(bank.as_deref(), &config)?;
    let problem = bank
        .get(&id)
        .with_context(|| format!("no problem with id '{id}'"))?;

    if problem.targets().is_empty() {
        let verdict = if problem.check_option(&answer) {
            "correct"
        } else {
            "incorrect"
        };
        println!("{}: option {verdict}", problem.id());
        return Ok(());
    }

    for target in problem.targets() {
        print_verdict(
            &target.name,
            target.value,
            matcher::matches(&answer, target.value, tolerance),
        );
    }
    Ok(())
}

fn print_verdict(name: &str, expected: f64, matched: bool) {
    let verdict = if matched { "MATCH" } else { "NO MATCH" };
    println!("{name} (expected {expected}): {verdict}");
}

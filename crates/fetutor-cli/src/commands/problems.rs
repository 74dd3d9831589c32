//! The `fetutor problems` command.

use std::path::PathBuf;

use anyhow::Result;
use comfy_table::{ContentArrangement, Table};

pub fn execute(
    bank: Option<PathBuf>,
    category: Option<String>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let config = fetutor_providers::load_config_from(config_path.as_deref())?;
    let bank = super::load_bank(bank.as_deref(), &config)?;

    let problems = match &category {
        Some(c) => bank.by_category(c),
        None => bank.problems().to_vec(),
    };

    if problems.is_empty() {
        match category {
            Some(c) => println!(
                "No problems in category '{c}'. Categories: {}",
                bank.categories().join(", ")
            ),
            None => println!("The problem bank is empty."),
        }
        return Ok(());
    }

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["ID", "Category", "Targets", "Choice", "Statement"]);
    for p in &problems {
        let targets = p
            .targets()
            .iter()
            .map(|t| t.name.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        let choice = if p.options().is_empty() {
            "-".to_string()
        } else {
            p.options().len().to_string()
        };
        table.add_row(vec![
            p.id().to_string(),
            p.category().to_string(),
            targets,
            choice,
            truncate(p.statement(), 60),
        ]);
    }
    println!("{table}");
    println!("{} problem(s)", problems.len());

    Ok(())
}

fn truncate(s: &str, max_chars: usize) -> String {
    let s = s.trim();
    if s.chars().count() <= max_chars {
        return s.to_string();
    }
    let cut: String = s.chars().take(max_chars.saturating_sub(3)).collect();
    format!("{cut}...")
}

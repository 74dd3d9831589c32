//! Problem bank loader.
//!
//! Loads problems from `.toml` or `.json` bank files and directories, and
//! validates them.

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::model::{Problem, ProblemBank, Target};

/// On-disk shape shared by the TOML and JSON formats.
#[derive(Debug, Deserialize)]
struct BankFile {
    #[serde(default)]
    problems: Vec<RawProblem>,
}

#[derive(Debug, Deserialize)]
struct RawProblem {
    id: String,
    #[serde(default = "default_category")]
    category: String,
    statement: String,
    #[serde(default)]
    targets: Vec<Target>,
    #[serde(default)]
    options: Vec<String>,
    #[serde(default)]
    correct_option: Option<String>,
    #[serde(default)]
    explanation: String,
}

fn default_category() -> String {
    "General".to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Toml,
    Json,
}

impl Format {
    fn of(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()? {
            "toml" => Some(Format::Toml),
            "json" => Some(Format::Json),
            _ => None,
        }
    }
}

/// Parse a single bank file.
pub fn parse_bank(path: &Path) -> Result<Vec<Problem>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read problem bank: {}", path.display()))?;

    parse_bank_str(&content, path)
}

/// Parse bank content; the format is chosen from `source_path`'s extension.
pub fn parse_bank_str(content: &str, source_path: &Path) -> Result<Vec<Problem>> {
    let format = Format::of(source_path).with_context(|| {
        format!(
            "unsupported problem bank format (expected .toml or .json): {}",
            source_path.display()
        )
    })?;

    let parsed: BankFile = match format {
        Format::Toml => toml::from_str(content)
            .with_context(|| format!("failed to parse TOML: {}", source_path.display()))?,
        Format::Json => serde_json::from_str(content)
            .with_context(|| format!("failed to parse JSON: {}", source_path.display()))?,
    };

    parsed
        .problems
        .into_iter()
        .map(|raw| {
            let problem = Problem::new(raw.id, raw.category, raw.statement, raw.targets)
                .with_context(|| format!("invalid problem in {}", source_path.display()))?;
            Ok(problem
                .with_options(raw.options, raw.correct_option)
                .with_explanation(raw.explanation))
        })
        .collect()
}

/// Recursively load every bank file under `dir`. Files that fail to parse are
/// skipped with a warning.
pub fn load_bank_directory(dir: &Path) -> Result<Vec<Problem>> {
    let mut problems = Vec::new();

    if !dir.is_dir() {
        anyhow::bail!("not a directory: {}", dir.display());
    }

    let mut entries = std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?
        .collect::<std::io::Result<Vec<_>>>()?;
    entries.sort_by_key(|e| e.path());

    for entry in entries {
        let path = entry.path();

        if path.is_dir() {
            problems.extend(load_bank_directory(&path)?);
        } else if Format::of(&path).is_some() {
            match parse_bank(&path) {
                Ok(found) => problems.extend(found),
                Err(e) => {
                    tracing::warn!("skipping {}: {:#}", path.display(), e);
                }
            }
        }
    }

    Ok(problems)
}

/// Load a bank from a file or a directory of bank files.
pub fn load_bank(path: &Path) -> Result<ProblemBank> {
    let problems = if path.is_dir() {
        load_bank_directory(path)?
    } else {
        parse_bank(path)?
    };
    ProblemBank::new(problems).with_context(|| format!("invalid problem bank: {}", path.display()))
}

/// A warning from problem bank validation.
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    /// The problem ID (if applicable).
    pub problem_id: Option<String>,
    /// Warning message.
    pub message: String,
}

/// Validate problems for issues that do not stop them from loading.
pub fn validate_bank(problems: &[Problem]) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();
    let mut warn = |problem: &Problem, message: String| {
        warnings.push(ValidationWarning {
            problem_id: Some(problem.id().to_string()),
            message,
        })
    };

    let mut seen_ids = HashSet::new();
    for problem in problems {
        if !seen_ids.insert(problem.id()) {
            warn(problem, format!("duplicate problem ID: {}", problem.id()));
        }
        if problem.statement().trim().is_empty() {
            warn(problem, "statement is empty".into());
        }
        if problem.targets().is_empty() && problem.options().is_empty() {
            warn(
                problem,
                "no targets or options; answers can never be graded".into(),
            );
        }
        match problem.correct_option() {
            Some(correct) if !problem.options().iter().any(|o| o == correct) => warn(
                problem,
                format!("correct_option {correct:?} is not one of the options"),
            ),
            None if !problem.options().is_empty() => {
                warn(problem, "options given but no correct_option".into())
            }
            _ => {}
        }
    }

    warnings
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    const VALID_TOML: &str = r#"
[[problems]]
id = "S1"
category = "Statics"
statement = """
A 100 N load hangs from the midpoint of a 4 m simply supported beam.
Find the reaction at each support.
"""
targets = [
    { name = "R_A", value = 50.0 },
    { name = "R_B", value = 50.0 },
]
explanation = "Symmetry: each support carries half the load."

[[problems]]
id = "S2"
category = "Statics"
statement = "Which is a zero-force member?"
options = ["AB", "BC", "CD"]
correct_option = "BC"
"#;

    const VALID_JSON: &str = r#"{
  "problems": [
    {
      "id": "D1",
      "category": "Dynamics",
      "statement": "A car accelerates at a(t) = 2t^2 + 2 from 10 m/s. Speed after 3 s?",
      "targets": [{ "name": "v_final", "value": 34.0 }]
    }
  ]
}"#;

    #[test]
    fn parse_valid_toml() {
        let problems = parse_bank_str(VALID_TOML, &PathBuf::from("bank.toml")).unwrap();
        assert_eq!(problems.len(), 2);
        assert_eq!(problems[0].id(), "S1");
        assert_eq!(problems[0].targets().len(), 2);
        assert!(problems[0].explanation().starts_with("Symmetry"));
        assert!(problems[1].check_option(" BC "));
        assert!(validate_bank(&problems).is_empty());
    }

    #[test]
    fn parse_valid_json() {
        let problems = parse_bank_str(VALID_JSON, &PathBuf::from("bank.json")).unwrap();
        assert_eq!(problems.len(), 1);
        assert_eq!(problems[0].target("v_final").unwrap().value, 34.0);
    }

    #[test]
    fn missing_category_defaults() {
        let toml = r#"
[[problems]]
id = "x"
statement = "Find F."
targets = [{ name = "F", value = 1.0 }]
"#;
        let problems = parse_bank_str(toml, &PathBuf::from("bank.toml")).unwrap();
        assert_eq!(problems[0].category(), "General");
    }

    #[test]
    fn duplicate_target_is_rejected() {
        let toml = r#"
[[problems]]
id = "x"
statement = "Find F."
targets = [{ name = "F", value = 1.0 }, { name = "F", value = 2.0 }]
"#;
        let err = parse_bank_str(toml, &PathBuf::from("bank.toml")).unwrap_err();
        assert!(format!("{err:#}").contains("duplicate target"));
    }

    #[test]
    fn unknown_extension_is_rejected() {
        let err = parse_bank_str(VALID_TOML, &PathBuf::from("bank.yaml")).unwrap_err();
        assert!(err.to_string().contains("unsupported"));
    }

    #[test]
    fn parse_malformed_toml() {
        let bad = "this is not [valid toml }{";
        assert!(parse_bank_str(bad, &PathBuf::from("bad.toml")).is_err());
    }

    #[test]
    fn validate_flags_untestable_and_bad_options() {
        let toml = r#"
[[problems]]
id = "empty"
statement = "  "

[[problems]]
id = "mc"
statement = "Pick one."
options = ["A", "B"]
correct_option = "C"
"#;
        let problems = parse_bank_str(toml, &PathBuf::from("bank.toml")).unwrap();
        let warnings = validate_bank(&problems);
        assert!(warnings.iter().any(|w| w.message.contains("statement is empty")));
        assert!(warnings.iter().any(|w| w.message.contains("can never be graded")));
        assert!(warnings
            .iter()
            .any(|w| w.problem_id.as_deref() == Some("mc") && w.message.contains("\"C\"")));
    }

    #[test]
    fn load_directory_skips_bad_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.toml"), VALID_TOML).unwrap();
        std::fs::write(dir.path().join("b.json"), VALID_JSON).unwrap();
        std::fs::write(dir.path().join("broken.toml"), "{{{").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let problems = load_bank_directory(dir.path()).unwrap();
        assert_eq!(problems.len(), 3);

        let bank = load_bank(dir.path()).unwrap();
        assert_eq!(bank.categories(), vec!["Statics", "Dynamics"]);
    }

    #[test]
    fn load_bank_rejects_duplicate_ids_across_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.toml"), VALID_TOML).unwrap();
        std::fs::write(dir.path().join("b.toml"), VALID_TOML).unwrap();

        let err = load_bank(dir.path()).unwrap_err();
        assert!(format!("{err:#}").contains("S1"));
    }
}

//! Core data model types for fetutor.
//!
//! Problems, target variables, transcripts, and the problem bank. Records are
//! validated at construction so the rest of the system can rely on the
//! invariants (finite targets, unique names).

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::ProblemError;

/// A named numeric quantity the student is expected to derive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Target {
    /// Variable name (e.g. "v_final").
    pub name: String,
    /// Expected value.
    pub value: f64,
}

/// A single practice problem.
#[derive(Debug, Clone, Serialize)]
pub struct Problem {
    id: String,
    category: String,
    statement: String,
    targets: Vec<Target>,
    options: Vec<String>,
    correct_option: Option<String>,
    explanation: String,
}

impl Problem {
    /// Build a problem, enforcing the target invariants.
    pub fn new(
        id: impl Into<String>,
        category: impl Into<String>,
        statement: impl Into<String>,
        targets: Vec<Target>,
    ) -> Result<Self, ProblemError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(ProblemError::EmptyId);
        }

        let mut seen = HashSet::new();
        for target in &targets {
            if target.name.trim().is_empty() {
                return Err(ProblemError::EmptyTargetName { problem: id });
            }
            if !target.value.is_finite() {
                return Err(ProblemError::NonFiniteTarget {
                    problem: id,
                    name: target.name.clone(),
                });
            }
            if !seen.insert(target.name.as_str()) {
                return Err(ProblemError::DuplicateTarget {
                    problem: id,
                    name: target.name.clone(),
                });
            }
        }

        Ok(Self {
            id,
            category: category.into(),
            statement: statement.into(),
            targets,
            options: Vec::new(),
            correct_option: None,
            explanation: String::new(),
        })
    }

    /// Attach multiple-choice options and the correct one.
    pub fn with_options(mut self, options: Vec<String>, correct_option: Option<String>) -> Self {
        self.options = options;
        self.correct_option = correct_option;
        self
    }

    /// Attach the worked explanation shown after a correct answer.
    pub fn with_explanation(mut self, explanation: impl Into<String>) -> Self {
        self.explanation = explanation.into();
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn statement(&self) -> &str {
        &self.statement
    }

    /// Targets in declaration order.
    pub fn targets(&self) -> &[Target] {
        &self.targets
    }

    pub fn target(&self, name: &str) -> Option<&Target> {
        self.targets.iter().find(|t| t.name == name)
    }

    pub fn options(&self) -> &[String] {
        &self.options
    }

    pub fn correct_option(&self) -> Option<&str> {
        self.correct_option.as_deref()
    }

    pub fn explanation(&self) -> &str {
        &self.explanation
    }

    /// Check a multiple-choice pick. Problems without a correct option never match.
    pub fn check_option(&self, choice: &str) -> bool {
        self.correct_option
            .as_deref()
            .is_some_and(|correct| correct.trim() == choice.trim())
    }
}

/// Who produced a transcript turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Tutor,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Student => write!(f, "Student"),
            Role::Tutor => write!(f, "Tutor"),
        }
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "student" | "user" => Ok(Role::Student),
            "tutor" | "model" | "assistant" => Ok(Role::Tutor),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

/// One transcript entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub text: String,
}

/// Append-only dialogue record for one session.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Transcript {
    turns: Vec<Turn>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, role: Role, text: impl Into<String>) {
        self.turns.push(Turn {
            role,
            text: text.into(),
        });
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// True when the latest turn is the student's, i.e. a tutor reply is owed.
    pub fn awaiting_reply(&self) -> bool {
        self.turns.last().is_some_and(|t| t.role == Role::Student)
    }

    /// Render as `Role: text` lines, the evidence format sent to the oracle.
    pub fn render(&self) -> String {
        self.turns
            .iter()
            .map(|t| format!("{}: {}", t.role, t.text))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Immutable, shared collection of problems.
#[derive(Debug, Clone, Default)]
pub struct ProblemBank {
    problems: Vec<Arc<Problem>>,
}

impl ProblemBank {
    /// Build a bank, rejecting duplicate problem ids.
    pub fn new(problems: Vec<Problem>) -> Result<Self, ProblemError> {
        let mut seen = HashSet::new();
        for p in &problems {
            if !seen.insert(p.id().to_string()) {
                return Err(ProblemError::DuplicateProblem(p.id().to_string()));
            }
        }
        Ok(Self {
            problems: problems.into_iter().map(Arc::new).collect(),
        })
    }

    pub fn get(&self, id: &str) -> Option<Arc<Problem>> {
        self.problems.iter().find(|p| p.id() == id).cloned()
    }

    pub fn problems(&self) -> &[Arc<Problem>] {
        &self.problems
    }

    pub fn len(&self) -> usize {
        self.problems.len()
    }

    pub fn is_empty(&self) -> bool {
        self.problems.is_empty()
    }

    /// Problems in a category (case-insensitive).
    pub fn by_category(&self, category: &str) -> Vec<Arc<Problem>> {
        self.problems
            .iter()
            .filter(|p| p.category().eq_ignore_ascii_case(category))
            .cloned()
            .collect()
    }

    /// Distinct categories in first-seen order.
    pub fn categories(&self) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        for p in &self.problems {
            if !out.iter().any(|c| c == p.category()) {
                out.push(p.category().to_string());
            }
        }
        out
    }
}

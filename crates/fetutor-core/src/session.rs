//! Per-problem tutoring session state.
//!
//! A `Session` is owned by the shell for one problem attempt. The solved set
//! only grows: each student turn is checked once against the targets that are
//! still open, and nothing can take a solved target back out.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

use crate::matcher::{self, DEFAULT_TOLERANCE};
use crate::model::{Problem, Role, Transcript};
use crate::report::{send_logged, with_feedback, Delivery, DeliverySettings};
use crate::traits::{Notification, Notifier};

/// Result of grading one student turn.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GradeOutcome {
    /// Targets solved by this turn, in problem order.
    pub newly_solved: Vec<String>,
    /// Every target is now solved.
    pub all_solved: bool,
}

/// A skip request, recorded without touching grading state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkipRecord {
    pub problem_id: String,
    pub solved: Vec<String>,
    pub remaining: Vec<String>,
    pub at: DateTime<Utc>,
}

impl SkipRecord {
    pub fn notification(&self, user_name: &str, settings: &DeliverySettings) -> Notification {
        let list = |names: &[String]| {
            if names.is_empty() {
                "none".to_string()
            } else {
                names.join(", ")
            }
        };
        Notification {
            to: settings.recipient.clone(),
            subject: format!(
                "{} ({user_name}): skipped {}",
                settings.app_name, self.problem_id
            ),
            body: format!(
                "Problem: {}\nSkipped at: {}\nSolved: {}\nRemaining: {}",
                self.problem_id,
                self.at.to_rfc3339(),
                list(&self.solved),
                list(&self.remaining),
            ),
        }
    }
}

/// Whether a skip is reported to the notifier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SkipPolicy {
    pub notify: bool,
}

impl SkipPolicy {
    /// Report `record` when the policy asks for it and a notifier exists.
    /// Failures are logged and returned as status, never as errors.
    pub async fn apply(
        &self,
        record: &SkipRecord,
        user_name: &str,
        notifier: Option<&dyn Notifier>,
        settings: &DeliverySettings,
    ) -> Delivery {
        match notifier {
            Some(notifier) if self.notify => {
                send_logged(notifier, &record.notification(user_name, settings)).await
            }
            _ => Delivery::NotAttempted,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Session {
    id: Uuid,
    problem: Arc<Problem>,
    transcript: Transcript,
    solved: BTreeSet<String>,
    tolerance: f64,
}

impl Session {
    pub fn new(problem: Arc<Problem>) -> Self {
        Self::with_tolerance(problem, DEFAULT_TOLERANCE)
    }

    pub fn with_tolerance(problem: Arc<Problem>, tolerance: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            problem,
            transcript: Transcript::new(),
            solved: BTreeSet::new(),
            tolerance,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn problem(&self) -> &Arc<Problem> {
        &self.problem
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    pub fn is_solved(&self, name: &str) -> bool {
        self.solved.contains(name)
    }

    /// Solved target names, in problem order.
    pub fn solved(&self) -> Vec<String> {
        self.problem
            .targets()
            .iter()
            .filter(|t| self.solved.contains(&t.name))
            .map(|t| t.name.clone())
            .collect()
    }

    /// Unsolved target names, in problem order.
    pub fn remaining(&self) -> Vec<String> {
        self.problem
            .targets()
            .iter()
            .filter(|t| !self.solved.contains(&t.name))
            .map(|t| t.name.clone())
            .collect()
    }

    pub fn all_solved(&self) -> bool {
        self.solved.len() == self.problem.targets().len()
    }

    /// Record a student turn and grade it once against the open targets.
    pub fn submit_student(&mut self, text: impl Into<String>) -> GradeOutcome {
        let text = text.into();
        let newly_solved: Vec<String> = self
            .problem
            .targets()
            .iter()
            .filter(|t| !self.solved.contains(&t.name))
            .filter(|t| matcher::matches(&text, t.value, self.tolerance))
            .map(|t| t.name.clone())
            .collect();

        self.solved.extend(newly_solved.iter().cloned());
        self.transcript.push(Role::Student, text);

        if !newly_solved.is_empty() {
            debug!(session = %self.id, solved = ?newly_solved, "targets solved");
        }
        GradeOutcome {
            newly_solved,
            all_solved: self.all_solved(),
        }
    }

    pub fn record_tutor(&mut self, text: impl Into<String>) {
        self.transcript.push(Role::Tutor, text);
    }

    /// Record a skip. Grading state is left exactly as it is.
    pub fn skip(&self) -> SkipRecord {
        SkipRecord {
            problem_id: self.problem.id().to_string(),
            solved: self.solved(),
            remaining: self.remaining(),
            at: Utc::now(),
        }
    }

    /// Transcript snapshot for scoring and reporting, with optional feedback block.
    pub fn report_input(&self, feedback: Option<&str>) -> String {
        let rendered = self.transcript.render();
        match feedback.map(str::trim).filter(|f| !f.is_empty()) {
            Some(fb) => with_feedback(&rendered, fb),
            None => rendered,
        }
    }
}

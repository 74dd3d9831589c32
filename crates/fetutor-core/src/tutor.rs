//! One tutoring turn: grade first, then ask the oracle for a reply.
//!
//! Grading is applied exactly once per student message and never depends on
//! the oracle. If the reply fails, the caller retries with
//! [`Tutor::retry_reply`], which re-asks for the same turn without touching
//! the transcript or the solved set.

use std::sync::Arc;

use tracing::{instrument, warn};

use crate::error::OracleError;
use crate::model::Problem;
use crate::session::{GradeOutcome, Session};
use crate::traits::{Oracle, OracleSettings};

/// Outcome of a student turn.
#[derive(Debug)]
pub struct TurnOutcome {
    pub grade: GradeOutcome,
    /// The tutor's reply, already recorded in the transcript when `Ok`.
    pub reply: Result<String, OracleError>,
}

pub struct Tutor {
    oracle: Arc<dyn Oracle>,
    settings: OracleSettings,
}

impl Tutor {
    pub fn new(oracle: Arc<dyn Oracle>, settings: OracleSettings) -> Self {
        Self { oracle, settings }
    }

    /// Opening line shown when a problem is chosen.
    pub fn greeting(problem: &Problem) -> String {
        format!(
            "Ready for this {} challenge? Ask me for a hint!",
            problem.category()
        )
    }

    /// System instruction for the tutoring conversation.
    pub fn instruction(session: &Session) -> String {
        let problem = session.problem();
        let solved = session.solved();
        let remaining = session.remaining();
        format!(
            "You are a Socratic engineering tutor helping a student with a {category} problem.\n\
             PROBLEM: {statement}\n\
             Quantities the student must find: {all}.\n\
             Already confirmed correct: {solved}.\n\
             Still open: {remaining}.\n\n\
             RULES:\n\
             1. Never state the final numeric answer of an open quantity.\n\
             2. Guide with one question or hint at a time; ask the student to write the governing \
             equations (e.g. $\\sum F_x = 0$) before any arithmetic.\n\
             3. Use LaTeX for all math.\n\
             4. Keep replies under 120 words.",
            category = problem.category(),
            statement = problem.statement(),
            all = join_or_none(problem.targets().iter().map(|t| t.name.clone()).collect()),
            solved = join_or_none(solved),
            remaining = join_or_none(remaining),
        )
    }

    /// Record `text`, grade it, and request a reply.
    #[instrument(skip(self, session, text), fields(session = %session.id()))]
    pub async fn respond(&self, session: &mut Session, text: &str) -> TurnOutcome {
        let grade = session.submit_student(text);
        let reply = self.reply(session).await;
        TurnOutcome { grade, reply }
    }

    /// Ask again for a reply to the latest student turn.
    pub async fn retry_reply(&self, session: &mut Session) -> Result<String, OracleError> {
        self.reply(session).await
    }

    async fn reply(&self, session: &mut Session) -> Result<String, OracleError> {
        let request = self.settings.request(
            Self::instruction(session),
            format!("Conversation so far:\n{}", session.transcript().render()),
        );
        match self.oracle.complete(&request).await {
            Ok(response) => {
                let text = response.text.trim().to_string();
                session.record_tutor(text.clone());
                Ok(text)
            }
            Err(e) => {
                warn!(error = %e, quota = e.is_quota(), "tutor reply failed");
                Err(e)
            }
        }
    }
}

fn join_or_none(names: Vec<String>) -> String {
    if names.is_empty() {
        "none".to_string()
    } else {
        names.join(", ")
    }
}

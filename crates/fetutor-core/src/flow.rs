//! Page flow: landing → chat → report.
//!
//! One enumerated phase drives what the shell shows. Starting a new problem
//! always builds a fresh `Session`, which is what resets the solved set.

use std::sync::Arc;

use crate::error::FlowError;
use crate::model::Problem;
use crate::session::Session;

#[derive(Debug, Clone)]
pub enum Phase {
    Landing,
    Chat(Session),
    Report(Session),
}

impl Phase {
    pub fn label(&self) -> &'static str {
        match self {
            Phase::Landing => "landing",
            Phase::Chat(_) => "chat",
            Phase::Report(_) => "report",
        }
    }
}

#[derive(Debug)]
pub struct Flow {
    phase: Phase,
    tolerance: f64,
}

impl Flow {
    pub fn new(tolerance: f64) -> Self {
        Self {
            phase: Phase::Landing,
            tolerance,
        }
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn session(&self) -> Option<&Session> {
        match &self.phase {
            Phase::Chat(s) | Phase::Report(s) => Some(s),
            Phase::Landing => None,
        }
    }

    /// The live session, only while chatting.
    pub fn session_mut(&mut self) -> Option<&mut Session> {
        match &mut self.phase {
            Phase::Chat(s) => Some(s),
            _ => None,
        }
    }

    /// Enter chat with a fresh session. Allowed from any phase; a running
    /// session is discarded.
    pub fn start(&mut self, problem: Arc<Problem>) {
        self.phase = Phase::Chat(Session::with_tolerance(problem, self.tolerance));
    }

    /// Chat → report.
    pub fn finish(&mut self) -> Result<(), FlowError> {
        match std::mem::replace(&mut self.phase, Phase::Landing) {
            Phase::Chat(s) => {
                self.phase = Phase::Report(s);
                Ok(())
            }
            other => {
                let from = other.label();
                self.phase = other;
                Err(FlowError {
                    from,
                    action: "finish",
                })
            }
        }
    }

    /// Report → landing.
    pub fn restart(&mut self) -> Result<(), FlowError> {
        if !matches!(self.phase, Phase::Report(_)) {
            return Err(FlowError {
                from: self.phase.label(),
                action: "restart",
            });
        }
        self.phase = Phase::Landing;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Target;

    fn problem(id: &str) -> Arc<Problem> {
        Arc::new(
            Problem::new(
                id,
                "Statics",
                "stmt",
                vec![Target {
                    name: "F".into(),
                    value: 10.0,
                }],
            )
            .unwrap(),
        )
    }

    #[test]
    fn happy_path() {
        let mut flow = Flow::new(0.05);
        assert_eq!(flow.phase().label(), "landing");

        flow.start(problem("1"));
        flow.session_mut().unwrap().submit_student("F = 10 N");
        assert_eq!(flow.phase().label(), "chat");

        flow.finish().unwrap();
        assert!(flow.session().unwrap().is_solved("F"));
        assert_eq!(flow.phase().label(), "report");
        assert!(flow.session_mut().is_none());

        flow.restart().unwrap();
        assert!(flow.session().is_none());
    }

    #[test]
    fn invalid_transitions_are_rejected() {
        let mut flow = Flow::new(0.05);
        assert_eq!(
            flow.finish().unwrap_err(),
            FlowError {
                from: "landing",
                action: "finish"
            }
        );
        assert!(flow.restart().is_err());

        flow.start(problem("1"));
        assert_eq!(flow.restart().unwrap_err().from, "chat");
        assert_eq!(flow.phase().label(), "chat");
    }

    #[test]
    fn new_problem_resets_solved_set() {
        let mut flow = Flow::new(0.05);
        flow.start(problem("1"));
        flow.session_mut().unwrap().submit_student("10");
        assert!(flow.session().unwrap().is_solved("F"));

        flow.start(problem("2"));
        let fresh = flow.session().unwrap();
        assert_eq!(fresh.problem().id(), "2");
        assert!(!fresh.is_solved("F"));
    }
}

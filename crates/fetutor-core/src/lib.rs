//! fetutor-core: answer matching, mastery scoring, and session reports.
//!
//! This crate holds the tutoring data model, the deterministic answer
//! matcher, the oracle-backed scorer and report composer, and the per-session
//! state that a shell (CLI or otherwise) drives.

pub mod error;
pub mod flow;
pub mod matcher;
pub mod model;
pub mod parser;
pub mod report;
pub mod scorer;
pub mod session;
pub mod traits;
pub mod tutor;

#[cfg(test)]
mod testing;

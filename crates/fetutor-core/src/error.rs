//! Error types shared across fetutor.
//!
//! `OracleError` lives in `fetutor-core` so the scorer, composer, and tutor
//! can classify provider failures (quota vs. everything else) without string
//! matching.

use thiserror::Error;

/// Errors that can occur when calling the generative oracle.
#[derive(Debug, Clone, Error)]
pub enum OracleError {
    /// The provider refused the request because the quota is exhausted (HTTP 429).
    #[error("quota exceeded{}", retry_hint(.retry_after_ms))]
    QuotaExceeded { retry_after_ms: Option<u64> },

    /// Authentication failed (invalid or missing API key).
    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    /// The requested model was not found.
    #[error("model not found: {0}")]
    ModelNotFound(String),

    /// The API returned an error response.
    #[error("API error (HTTP {status}): {message}")]
    ApiError { status: u16, message: String },

    /// The request timed out.
    #[error("request timed out after {0}s")]
    Timeout(u64),

    /// A network error occurred.
    #[error("network error: {0}")]
    NetworkError(String),

    /// No oracle is configured for this process.
    #[error("oracle unavailable: {0}")]
    Unavailable(String),
}

fn retry_hint(retry_after_ms: &Option<u64>) -> String {
    match retry_after_ms {
        Some(ms) => format!(", retry after {ms}ms"),
        None => String::new(),
    }
}

impl OracleError {
    /// Returns `true` for quota / rate-limit exhaustion.
    pub fn is_quota(&self) -> bool {
        matches!(self, OracleError::QuotaExceeded { .. })
    }

    /// Returns `true` if this error is permanent and retrying the same turn is pointless.
    pub fn is_permanent(&self) -> bool {
        matches!(
            self,
            OracleError::AuthenticationFailed(_)
                | OracleError::ModelNotFound(_)
                | OracleError::Unavailable(_)
        )
    }

    /// Returns the retry-after delay in milliseconds, if the provider sent one.
    pub fn retry_after_ms(&self) -> Option<u64> {
        match self {
            OracleError::QuotaExceeded { retry_after_ms } => *retry_after_ms,
            _ => None,
        }
    }
}

/// Errors from an outbound notifier.
#[derive(Debug, Clone, Error)]
pub enum NotifyError {
    #[error("notifier rejected message (HTTP {status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("notifier transport error: {0}")]
    Transport(String),

    #[error("notifier not configured: {0}")]
    NotConfigured(String),
}

/// A problem record that violates the data model invariants.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProblemError {
    #[error("problem id is empty")]
    EmptyId,

    #[error("problem {problem}: target variable name is empty")]
    EmptyTargetName { problem: String },

    #[error("problem {problem}: duplicate target variable '{name}'")]
    DuplicateTarget { problem: String, name: String },

    #[error("problem {problem}: target '{name}' is not a finite number")]
    NonFiniteTarget { problem: String, name: String },

    #[error("duplicate problem id: {0}")]
    DuplicateProblem(String),
}

/// An illegal page transition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot {action} while in the {from} phase")]
pub struct FlowError {
    pub from: &'static str,
    pub action: &'static str,
}

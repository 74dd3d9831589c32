//! Capability traits injected into the scorer, composer, and tutor.
//!
//! `Oracle` is implemented by the `fetutor-providers` crate (Gemini,
//! OpenAI-compatible, mock); `Notifier` by its webhook and log notifiers.
//! Nothing in the core reaches for a global client.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{NotifyError, OracleError};

// ---------------------------------------------------------------------------
// Oracle trait
// ---------------------------------------------------------------------------

/// A request/response text-completion service.
#[async_trait]
pub trait Oracle: Send + Sync {
    /// Human-readable backend name (e.g. "gemini").
    fn name(&self) -> &str;

    /// Complete `request.prompt` under the `request.system` instruction.
    async fn complete(&self, request: &CompletionRequest)
        -> Result<CompletionResponse, OracleError>;
}

/// One completion call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionRequest {
    /// Model identifier (e.g. "gemini-2.0-flash").
    pub model: String,
    /// System instruction.
    pub system: String,
    /// User message.
    pub prompt: String,
    /// Sampling temperature.
    pub temperature: f64,
    /// Maximum tokens to generate.
    pub max_tokens: u32,
}

impl CompletionRequest {
    pub fn new(model: impl Into<String>, system: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            system: system.into(),
            prompt: prompt.into(),
            temperature: 0.0,
            max_tokens: 1024,
        }
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }
}

/// Text returned by the oracle. The shape of `text` is never trusted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionResponse {
    pub text: String,
    /// Model that actually answered.
    pub model: String,
    /// Latency in milliseconds.
    pub latency_ms: u64,
}

/// Shared settings for oracle-facing components.
#[derive(Debug, Clone)]
pub struct OracleSettings {
    pub model: String,
    pub temperature: f64,
    pub max_tokens: u32,
}

impl Default for OracleSettings {
    fn default() -> Self {
        Self {
            model: "gemini-2.0-flash".to_string(),
            temperature: 0.0,
            max_tokens: 1024,
        }
    }
}

impl OracleSettings {
    pub fn request(&self, system: impl Into<String>, prompt: impl Into<String>) -> CompletionRequest {
        CompletionRequest::new(self.model.clone(), system, prompt)
            .with_temperature(self.temperature)
            .with_max_tokens(self.max_tokens)
    }
}

// ---------------------------------------------------------------------------
// Notifier trait
// ---------------------------------------------------------------------------

/// An outbound message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Fire-and-forget delivery of reports to a fixed recipient.
#[async_trait]
pub trait Notifier: Send + Sync {
    fn name(&self) -> &str;

    async fn send(&self, notification: &Notification) -> Result<(), NotifyError>;
}

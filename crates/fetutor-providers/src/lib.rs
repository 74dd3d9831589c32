//! fetutor-providers: oracle backends, notifiers, and configuration.
//!
//! Implements the core `Oracle` trait for Gemini and OpenAI-compatible
//! endpoints (plus mock and offline stand-ins) and the `Notifier` trait for
//! webhook and log delivery.

pub mod config;
pub mod gemini;
mod http;
pub mod mock;
pub mod notify;
pub mod offline;
pub mod openai;

pub use config::{
    create_notifier, create_oracle, load_config, load_config_from, ConfigError, NotifierConfig,
    ProviderConfig, TutorConfig,
};
pub use gemini::GeminiOracle;
pub use mock::MockOracle;
pub use notify::{LogNotifier, MockNotifier, WebhookNotifier};
pub use offline::OfflineOracle;
pub use openai::OpenAiOracle;

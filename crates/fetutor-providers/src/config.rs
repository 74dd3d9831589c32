//! Configuration and oracle/notifier factories.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use fetutor_core::matcher::DEFAULT_TOLERANCE;
use fetutor_core::report::DeliverySettings;
use fetutor_core::scorer::Rubric;
use fetutor_core::traits::{Notifier, Oracle, OracleSettings};

use crate::gemini::GeminiOracle;
use crate::mock::MockOracle;
use crate::notify::{LogNotifier, WebhookNotifier};
use crate::offline::OfflineOracle;
use crate::openai::OpenAiOracle;

/// Configuration problems that stop an oracle or notifier from being built.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("provider '{0}' is not configured (see `fetutor init`, or pass --offline)")]
    UnknownProvider(String),

    #[error("{provider} api_key is empty (set {env_var})")]
    EmptyApiKey {
        provider: &'static str,
        env_var: &'static str,
    },

    #[error("webhook notifier has an empty url")]
    EmptyWebhookUrl,

    #[error("tolerance must be a finite, non-negative number, got {0}")]
    InvalidTolerance(f64),
}

/// Configuration for a single oracle backend.
///
/// Note: Custom Debug impl masks API keys to prevent accidental exposure in logs.
#[derive(Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ProviderConfig {
    Gemini {
        api_key: String,
        #[serde(default)]
        base_url: Option<String>,
        #[serde(default)]
        timeout_secs: Option<u64>,
    },
    OpenAI {
        api_key: String,
        #[serde(default)]
        base_url: Option<String>,
        #[serde(default)]
        org_id: Option<String>,
    },
    /// Canned replies, for demos and tests.
    Mock {
        #[serde(default)]
        response: Option<String>,
    },
    Offline,
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderConfig::Gemini {
                api_key: _,
                base_url,
                timeout_secs,
            } => f
                .debug_struct("Gemini")
                .field("api_key", &"***")
                .field("base_url", base_url)
                .field("timeout_secs", timeout_secs)
                .finish(),
            ProviderConfig::OpenAI {
                api_key: _,
                base_url,
                org_id,
            } => f
                .debug_struct("OpenAI")
                .field("api_key", &"***")
                .field("base_url", base_url)
                .field("org_id", org_id)
                .finish(),
            ProviderConfig::Mock { response } => {
                f.debug_struct("Mock").field("response", response).finish()
            }
            ProviderConfig::Offline => f.write_str("Offline"),
        }
    }
}

/// Where session reports go.
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum NotifierConfig {
    /// Reports are never sent.
    #[default]
    #[serde(rename = "none")]
    Disabled,
    /// Reports are written to the log.
    Log,
    Webhook {
        url: String,
        #[serde(default)]
        token: Option<String>,
    },
}

impl std::fmt::Debug for NotifierConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NotifierConfig::Disabled => f.write_str("Disabled"),
            NotifierConfig::Log => f.write_str("Log"),
            NotifierConfig::Webhook { url, token } => f
                .debug_struct("Webhook")
                .field("url", url)
                .field("token", &token.as_ref().map(|_| "***"))
                .finish(),
        }
    }
}

/// Top-level fetutor configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TutorConfig {
    /// Oracle configurations keyed by name.
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
    /// Default oracle to use.
    #[serde(default = "default_provider")]
    pub default_provider: String,
    /// Default model to use.
    #[serde(default = "default_model")]
    pub default_model: String,
    /// Sampling temperature for every oracle call.
    #[serde(default)]
    pub temperature: f64,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Relative tolerance for answer matching.
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,
    /// Subject named in the scoring rubric.
    #[serde(default = "default_subject")]
    pub subject: String,
    /// Application name used in report subject lines.
    #[serde(default = "default_app_name")]
    pub app_name: String,
    /// Fixed report recipient.
    #[serde(default)]
    pub recipient: String,
    #[serde(default)]
    pub notifier: NotifierConfig,
    /// Send a notification when a student skips a problem.
    #[serde(default)]
    pub notify_on_skip: bool,
    /// Problem bank file or directory.
    #[serde(default = "default_bank")]
    pub bank: PathBuf,
}

fn default_provider() -> String {
    "gemini".to_string()
}
fn default_model() -> String {
    "gemini-2.0-flash".to_string()
}
fn default_max_tokens() -> u32 {
    1024
}
fn default_tolerance() -> f64 {
    DEFAULT_TOLERANCE
}
fn default_subject() -> String {
    "Statics".to_string()
}
fn default_app_name() -> String {
    "Statics Tutor".to_string()
}
fn default_bank() -> PathBuf {
    PathBuf::from("./problems")
}

impl Default for TutorConfig {
    fn default() -> Self {
        Self {
            providers: HashMap::new(),
            default_provider: default_provider(),
            default_model: default_model(),
            temperature: 0.0,
            max_tokens: default_max_tokens(),
            tolerance: default_tolerance(),
            subject: default_subject(),
            app_name: default_app_name(),
            recipient: String::new(),
            notifier: NotifierConfig::Disabled,
            notify_on_skip: false,
            bank: default_bank(),
        }
    }
}

impl TutorConfig {
    /// Oracle call settings, optionally overriding the model.
    pub fn oracle_settings(&self, model: Option<&str>) -> OracleSettings {
        OracleSettings {
            model: model.unwrap_or(&self.default_model).to_string(),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        }
    }

    pub fn rubric(&self) -> Rubric {
        Rubric::for_subject(&self.subject)
    }

    pub fn delivery(&self) -> DeliverySettings {
        DeliverySettings {
            app_name: self.app_name.clone(),
            recipient: self.recipient.clone(),
        }
    }

    /// Build the named oracle, or the default one.
    pub fn oracle(&self, name: Option<&str>) -> Result<Arc<dyn Oracle>> {
        let name = name.unwrap_or(&self.default_provider);
        let provider = self
            .providers
            .get(name)
            .ok_or_else(|| ConfigError::UnknownProvider(name.to_string()))?;
        create_oracle(provider)
    }

    pub fn notifier(&self) -> Result<Option<Arc<dyn Notifier>>> {
        create_notifier(&self.notifier)
    }
}

/// Replace `${VAR_NAME}` references with environment values. Unset variables
/// become empty; an unterminated reference is left as is.
fn resolve_env_vars(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(start) = rest.find("${") {
        let Some(len) = rest[start + 2..].find('}') else {
            break;
        };
        out.push_str(&rest[..start]);
        out.push_str(&std::env::var(&rest[start + 2..start + 2 + len]).unwrap_or_default());
        rest = &rest[start + 2 + len + 1..];
    }
    out.push_str(rest);
    out
}

fn resolve_opt(value: &mut Option<String>) {
    if let Some(v) = value {
        *v = resolve_env_vars(v);
    }
}

fn resolve_provider_config(config: &mut ProviderConfig) {
    match config {
        ProviderConfig::Gemini {
            api_key, base_url, ..
        } => {
            *api_key = resolve_env_vars(api_key);
            resolve_opt(base_url);
        }
        ProviderConfig::OpenAI {
            api_key,
            base_url,
            org_id,
        } => {
            *api_key = resolve_env_vars(api_key);
            resolve_opt(base_url);
            resolve_opt(org_id);
        }
        ProviderConfig::Mock { .. } | ProviderConfig::Offline => {}
    }
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `fetutor.toml` in the current directory
/// 2. `~/.config/fetutor/config.toml`
///
/// Environment variable overrides: `FETUTOR_GEMINI_KEY`, `FETUTOR_OPENAI_KEY`,
/// `FETUTOR_WEBHOOK_URL`.
pub fn load_config() -> Result<TutorConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<TutorConfig> {
    let config_path = match path {
        Some(p) if p.exists() => Some(p.to_path_buf()),
        Some(p) => return Err(ConfigError::NotFound(p.to_path_buf()).into()),
        None => [Some(PathBuf::from("fetutor.toml")), global_config_path()]
            .into_iter()
            .flatten()
            .find(|p| p.exists()),
    };

    let mut config = match config_path {
        Some(path) => {
            tracing::debug!("loading config from {}", path.display());
            parse_config(
                &std::fs::read_to_string(&path)
                    .with_context(|| format!("failed to read config: {}", path.display()))?,
            )
            .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => TutorConfig::default(),
    };

    apply_env_overrides(&mut config);
    Ok(config)
}

/// Parse config text and resolve `${VAR}` references.
pub fn parse_config(content: &str) -> Result<TutorConfig> {
    let mut config: TutorConfig = toml::from_str(content)?;
    if !(config.tolerance.is_finite() && config.tolerance >= 0.0) {
        return Err(ConfigError::InvalidTolerance(config.tolerance).into());
    }
    for provider in config.providers.values_mut() {
        resolve_provider_config(provider);
    }
    if let NotifierConfig::Webhook { url, token } = &mut config.notifier {
        *url = resolve_env_vars(url);
        resolve_opt(token);
    }
    config.recipient = resolve_env_vars(&config.recipient);
    Ok(config)
}

fn apply_env_overrides(config: &mut TutorConfig) {
    if let Ok(key) = std::env::var("FETUTOR_GEMINI_KEY") {
        match config.providers.get_mut("gemini") {
            Some(ProviderConfig::Gemini { api_key, .. }) => *api_key = key,
            _ => {
                config.providers.insert(
                    "gemini".into(),
                    ProviderConfig::Gemini {
                        api_key: key,
                        base_url: None,
                        timeout_secs: None,
                    },
                );
            }
        }
    }

    if let Ok(key) = std::env::var("FETUTOR_OPENAI_KEY") {
        match config.providers.get_mut("openai") {
            Some(ProviderConfig::OpenAI { api_key, .. }) => *api_key = key,
            _ => {
                config.providers.insert(
                    "openai".into(),
                    ProviderConfig::OpenAI {
                        api_key: key,
                        base_url: None,
                        org_id: None,
                    },
                );
            }
        }
    }

    if let Ok(url) = std::env::var("FETUTOR_WEBHOOK_URL") {
        let token = match &config.notifier {
            NotifierConfig::Webhook { token, .. } => token.clone(),
            _ => None,
        };
        config.notifier = NotifierConfig::Webhook { url, token };
    }
}

fn global_config_path() -> Option<PathBuf> {
    std::env::var("HOME").ok().map(|h| {
        PathBuf::from(h)
            .join(".config")
            .join("fetutor")
            .join("config.toml")
    })
}

/// Create an oracle instance from its configuration.
pub fn create_oracle(config: &ProviderConfig) -> Result<Arc<dyn Oracle>> {
    match config {
        ProviderConfig::Gemini {
            api_key,
            base_url,
            timeout_secs,
        } => {
            if api_key.trim().is_empty() {
                return Err(ConfigError::EmptyApiKey {
                    provider: "gemini",
                    env_var: "FETUTOR_GEMINI_KEY",
                }
                .into());
            }
            Ok(match timeout_secs {
                Some(secs) => Arc::new(GeminiOracle::with_timeout(api_key, base_url.clone(), *secs)),
                None => Arc::new(GeminiOracle::new(api_key, base_url.clone())),
            })
        }
        ProviderConfig::OpenAI {
            api_key,
            base_url,
            org_id,
        } => {
            if api_key.trim().is_empty() {
                return Err(ConfigError::EmptyApiKey {
                    provider: "openai",
                    env_var: "FETUTOR_OPENAI_KEY",
                }
                .into());
            }
            Ok(Arc::new(OpenAiOracle::new(
                api_key,
                base_url.clone(),
                org_id.clone(),
            )))
        }
        ProviderConfig::Mock { response } => Ok(Arc::new(match response {
            Some(r) => MockOracle::with_fixed_response(r),
            None => MockOracle::new(HashMap::new()),
        })),
        ProviderConfig::Offline => Ok(Arc::new(OfflineOracle::default())),
    }
}

/// Create the configured notifier; `None` when reports are not sent.
pub fn create_notifier(config: &NotifierConfig) -> Result<Option<Arc<dyn Notifier>>> {
    match config {
        NotifierConfig::Disabled => Ok(None),
        NotifierConfig::Log => Ok(Some(Arc::new(LogNotifier))),
        NotifierConfig::Webhook { url, token } => {
            if url.trim().is_empty() {
                return Err(ConfigError::EmptyWebhookUrl.into());
            }
            Ok(Some(Arc::new(WebhookNotifier::new(url, token.clone()))))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_env_vars_basic() {
        std::env::set_var("_FETUTOR_TEST_VAR", "hello");
        assert_eq!(resolve_env_vars("${_FETUTOR_TEST_VAR}"), "hello");
        assert_eq!(
            resolve_env_vars("prefix_${_FETUTOR_TEST_VAR}_suffix"),
            "prefix_hello_suffix"
        );
        assert_eq!(resolve_env_vars("${_FETUTOR_UNSET_VAR}x"), "x");
        assert_eq!(resolve_env_vars("broken ${oops"), "broken ${oops");
        std::env::remove_var("_FETUTOR_TEST_VAR");
    }

    #[test]
    fn default_config() {
        let config = TutorConfig::default();
        assert_eq!(config.default_provider, "gemini");
        assert_eq!(config.default_model, "gemini-2.0-flash");
        assert_eq!(config.tolerance, 0.05);
        assert!(matches!(config.notifier, NotifierConfig::Disabled));
        assert_eq!(config.delivery().app_name, "Statics Tutor");
    }

    #[test]
    fn parse_full_config() {
        std::env::set_var("_FETUTOR_TEST_KEY", "g-key");
        let config = parse_config(
            r#"
default_provider = "gemini"
default_model = "gemini-2.0-flash"
tolerance = 0.02
subject = "Dynamics"
recipient = "instructor@example.edu"
notify_on_skip = true

[providers.gemini]
type = "gemini"
api_key = "${_FETUTOR_TEST_KEY}"

[providers.openai]
type = "openai"
api_key = "sk-openai"

[providers.demo]
type = "mock"
response = "7"

[notifier]
type = "webhook"
url = "https://hooks.example.com/reports"
"#,
        )
        .unwrap();
        std::env::remove_var("_FETUTOR_TEST_KEY");

        assert_eq!(config.providers.len(), 3);
        assert!(matches!(
            config.providers.get("gemini"),
            Some(ProviderConfig::Gemini { api_key, .. }) if api_key == "g-key"
        ));
        assert_eq!(config.tolerance, 0.02);
        assert_eq!(config.rubric().subject, "Dynamics");
        assert!(config.notify_on_skip);
        assert!(config.notifier().unwrap().is_some());
        assert_eq!(config.oracle(Some("demo")).unwrap().name(), "mock");
    }

    #[test]
    fn debug_masks_keys() {
        let config = ProviderConfig::Gemini {
            api_key: "super-secret".into(),
            base_url: None,
            timeout_secs: None,
        };
        let debug = format!("{config:?}");
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("***"));
    }

    #[test]
    fn missing_provider_is_an_error() {
        let config = TutorConfig::default();
        let err = config.oracle(None).err().unwrap();
        assert!(err.to_string().contains("'gemini' is not configured"));
        assert!(matches!(
            err.downcast_ref::<ConfigError>(),
            Some(ConfigError::UnknownProvider(name)) if name == "gemini"
        ));
    }

    #[test]
    fn invalid_tolerance_is_rejected() {
        for text in ["tolerance = nan\n", "tolerance = inf\n", "tolerance = -0.05\n"] {
            let err = parse_config(text).err().unwrap();
            assert!(
                matches!(
                    err.downcast_ref::<ConfigError>(),
                    Some(ConfigError::InvalidTolerance(_))
                ),
                "{text}: {err}"
            );
        }
        assert_eq!(parse_config("tolerance = 0.1\n").unwrap().tolerance, 0.1);
    }

    #[test]
    fn empty_webhook_url_is_rejected() {
        let err = create_notifier(&NotifierConfig::Webhook {
            url: "  ".into(),
            token: None,
        })
        .err()
        .unwrap();
        assert!(matches!(
            err.downcast_ref::<ConfigError>(),
            Some(ConfigError::EmptyWebhookUrl)
        ));
    }

    #[test]
    fn empty_key_is_rejected() {
        let err = create_oracle(&ProviderConfig::Gemini {
            api_key: String::new(),
            base_url: None,
            timeout_secs: None,
        })
        .err()
        .unwrap();
        assert!(err.to_string().contains("FETUTOR_GEMINI_KEY"));
    }

    #[test]
    fn explicit_missing_path_fails() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        assert!(load_config_from(Some(&missing)).is_err());
    }

    #[test]
    fn explicit_path_loads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fetutor.toml");
        std::fs::write(&path, "app_name = \"Dynamics Tutor\"\n").unwrap();
        let config = load_config_from(Some(&path)).unwrap();
        assert_eq!(config.app_name, "Dynamics Tutor");
    }
}

//! Oracle used when no provider is configured.

use async_trait::async_trait;

use fetutor_core::error::OracleError;
use fetutor_core::traits::{CompletionRequest, CompletionResponse, Oracle};

/// Every call fails with `OracleError::Unavailable`, so scoring degrades to
/// "unavailable" and reports fall back to placeholders. Grading is unaffected.
#[derive(Debug, Default)]
pub struct OfflineOracle {
    reason: String,
}

impl OfflineOracle {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl Oracle for OfflineOracle {
    fn name(&self) -> &str {
        "offline"
    }

    async fn complete(
        &self,
        _request: &CompletionRequest,
    ) -> Result<CompletionResponse, OracleError> {
        let reason = if self.reason.is_empty() {
            "no oracle configured"
        } else {
            &self.reason
        };
        Err(OracleError::Unavailable(reason.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn always_unavailable() {
        let oracle = OfflineOracle::default();
        let err = oracle
            .complete(&CompletionRequest::new("m", "s", "p"))
            .await
            .unwrap_err();
        assert!(err.is_permanent());
        assert_eq!(err.to_string(), "oracle unavailable: no oracle configured");
    }
}

//! Mock oracle for testing.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use fetutor_core::error::OracleError;
use fetutor_core::traits::{CompletionRequest, CompletionResponse, Oracle};

/// A mock oracle for driving the scorer, composer, and tutor without real API calls.
///
/// Queued outcomes are served first, in order. After that a permanent failure
/// (if set) is returned, otherwise the first rule whose key is a substring of
/// the prompt or system instruction wins, then the default response.
pub struct MockOracle {
    /// Map of substring → response text.
    rules: HashMap<String, String>,
    /// Default response if nothing else applies.
    default_response: String,
    /// Outcomes served before anything else.
    queue: Mutex<VecDeque<Result<String, OracleError>>>,
    /// Returned on every call once the queue is empty.
    failure: Option<OracleError>,
    /// Number of calls made.
    call_count: AtomicU32,
    /// Last request received.
    last_request: Mutex<Option<CompletionRequest>>,
}

impl MockOracle {
    /// Create a mock with the given substring→response rules.
    pub fn new(rules: HashMap<String, String>) -> Self {
        Self {
            rules,
            default_response: "Let's start with a free-body diagram.".to_string(),
            queue: Mutex::new(VecDeque::new()),
            failure: None,
            call_count: AtomicU32::new(0),
            last_request: Mutex::new(None),
        }
    }

    /// Create a mock that always returns the same text.
    pub fn with_fixed_response(response: &str) -> Self {
        Self {
            default_response: response.to_string(),
            ..Self::new(HashMap::new())
        }
    }

    /// Create a mock whose every call fails with `error`.
    pub fn failing(error: OracleError) -> Self {
        Self {
            failure: Some(error),
            ..Self::new(HashMap::new())
        }
    }

    /// Queue a successful reply for the next call.
    pub fn push_response(&self, text: &str) {
        self.queue.lock().unwrap().push_back(Ok(text.to_string()));
    }

    /// Queue a failure for the next call.
    pub fn fail_next(&self, error: OracleError) {
        self.queue.lock().unwrap().push_back(Err(error));
    }

    /// Get the number of calls made to this oracle.
    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::Relaxed)
    }

    /// Get the last request made to this oracle.
    pub fn last_request(&self) -> Option<CompletionRequest> {
        self.last_request.lock().unwrap().clone()
    }

    fn next_outcome(&self, request: &CompletionRequest) -> Result<String, OracleError> {
        if let Some(queued) = self.queue.lock().unwrap().pop_front() {
            return queued;
        }
        if let Some(error) = &self.failure {
            return Err(error.clone());
        }
        Ok(self
            .rules
            .iter()
            .find(|(key, _)| {
                request.prompt.contains(key.as_str()) || request.system.contains(key.as_str())
            })
            .map(|(_, v)| v.clone())
            .unwrap_or_else(|| self.default_response.clone()))
    }
}

#[async_trait]
impl Oracle for MockOracle {
    fn name(&self) -> &str {
        "mock"
    }

    async fn complete(
        &self,
        request: &CompletionRequest,
    ) -> Result<CompletionResponse, OracleError> {
        self.call_count.fetch_add(1, Ordering::Relaxed);
        *self.last_request.lock().unwrap() = Some(request.clone());

        let text = self.next_outcome(request)?;
        Ok(CompletionResponse {
            text,
            model: request.model.clone(),
            latency_ms: 1,
        })
    }
}

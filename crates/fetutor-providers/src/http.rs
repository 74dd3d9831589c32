//! HTTP status and transport error mapping shared by the oracle backends.

use std::time::Duration;

use fetutor_core::error::OracleError;

pub(crate) const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Build the shared client with the oracle timeout applied.
pub(crate) fn client(timeout_secs: u64) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .unwrap_or_else(|e| {
            tracing::warn!("falling back to default HTTP client: {e}");
            reqwest::Client::new()
        })
}

/// Map a transport failure. The request URL is stripped from the message so
/// nothing sent in it can reach reports or logs.
pub(crate) fn transport_error(e: reqwest::Error, timeout_secs: u64) -> OracleError {
    if e.is_timeout() {
        OracleError::Timeout(timeout_secs)
    } else {
        OracleError::NetworkError(e.without_url().to_string())
    }
}

/// Pass successful responses through; map error statuses onto `OracleError`.
///
/// `extract_message` pulls the human-readable message out of a
/// provider-specific error body, falling back to the raw body.
pub(crate) async fn check_status(
    response: reqwest::Response,
    model: &str,
    extract_message: fn(&str) -> Option<String>,
) -> Result<reqwest::Response, OracleError> {
    let status = response.status().as_u16();
    if status < 400 {
        return Ok(response);
    }

    if status == 429 {
        let retry_after_ms = response
            .headers()
            .get("retry-after")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok())
            .map(|secs| secs.saturating_mul(1000));
        return Err(OracleError::QuotaExceeded { retry_after_ms });
    }
    if status == 404 {
        return Err(OracleError::ModelNotFound(model.to_string()));
    }

    let body = response.text().await.unwrap_or_default();
    let message = extract_message(&body).unwrap_or(body);
    if status == 401 || status == 403 {
        return Err(OracleError::AuthenticationFailed(message));
    }
    Err(OracleError::ApiError { status, message })
}

pub(crate) fn parse_error(e: reqwest::Error) -> OracleError {
    OracleError::ApiError {
        status: 0,
        message: format!("failed to parse response: {}", e.without_url()),
    }
}

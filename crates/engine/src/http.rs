use std::time::Duration;

use reqwest::{Client, RequestBuilder, StatusCode};
use tracing::debug;

use common::{Error, Result};

const USER_AGENT: &str = concat!("htf-scan/", env!("CARGO_PKG_VERSION"));

/// Longest slice of an error body copied into a log line.
const MAX_ERROR_BODY: usize = 200;

/// Build the HTTP client shared by the REST sources.
pub fn build_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .use_rustls_tls()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| Error::Config(format!("failed to build HTTP client: {e}")))
}

/// Send `request` and return the body of a 2xx response.
///
/// Transport errors, timeouts and non-2xx statuses all map to
/// `Error::SourceUnavailable` tagged with `provider`.
pub async fn get_body(provider: &str, request: RequestBuilder) -> Result<String> {
    let resp = request
        .send()
        .await
        .map_err(|e| Error::unavailable(provider, transport_reason(&e)))?;

    let status = resp.status();
    let body = resp
        .text()
        .await
        .map_err(|e| Error::unavailable(provider, e))?;

    if !status.is_success() {
        return Err(Error::unavailable(provider, status_reason(status, &body)));
    }

    debug!(provider, bytes = body.len(), "Upstream response received");
    Ok(body)
}

fn transport_reason(e: &reqwest::Error) -> String {
    if e.is_timeout() {
        format!("request timed out: {e}")
    } else {
        e.to_string()
    }
}

fn status_reason(status: StatusCode, body: &str) -> String {
    let snippet: String = body.chars().take(MAX_ERROR_BODY).collect();
    match status {
        // Binance answers 451 from restricted regions, some CDNs use 403.
        StatusCode::UNAVAILABLE_FOR_LEGAL_REASONS | StatusCode::FORBIDDEN => {
            format!("blocked from this location (HTTP {status}): {snippet}")
        }
        StatusCode::TOO_MANY_REQUESTS => format!("rate limited (HTTP {status}): {snippet}"),
        _ => format!("HTTP {status}: {snippet}"),
    }
}

/// Read a JSON number that may arrive either as a number or a decimal string.
pub(crate) fn json_f64(value: &serde_json::Value) -> Option<f64> {
    match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

pub(crate) fn json_i64(value: &serde_json::Value) -> Option<i64> {
    match value {
        serde_json::Value::Number(n) => n.as_i64(),
        serde_json::Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

//! Upstream fetching for the rate aggregator.
//!
//! Each upstream call resolves to a `SourceOutcome`, so a failure in one
//! source never aborts the others.

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

/// Reasons a single upstream source is considered failed.
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("network error: {message}")]
    Network { message: String },

    #[error("HTTP {status_code}")]
    Status { status_code: u16 },

    #[error("invalid JSON: {message}")]
    InvalidJson { message: String },

    #[error("empty payload")]
    EmptyPayload,
}

/// Result of one upstream call, kept tagged until the response is composed.
#[derive(Debug)]
pub enum SourceOutcome<T> {
    Fetched(T),
    Failed(UpstreamError),
}

impl<T> SourceOutcome<T> {
    /// Collapse to the payload, discarding the failure reason.
    pub fn fetched(self) -> Option<T> {
        match self {
            SourceOutcome::Fetched(payload) => Some(payload),
            SourceOutcome::Failed(_) => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, SourceOutcome::Failed(_))
    }
}

impl<T> From<Result<T, UpstreamError>> for SourceOutcome<T> {
    fn from(result: Result<T, UpstreamError>) -> Self {
        match result {
            Ok(payload) => SourceOutcome::Fetched(payload),
            Err(e) => SourceOutcome::Failed(e),
        }
    }
}

/// GET `url` and decode the JSON body into `T`.
///
/// Non-2xx statuses, transport errors, unparsable bodies and empty payloads
/// (`null`, `false`, `0`, `""`) are reported as `UpstreamError`. Any other
/// JSON that is not an object decodes as `T::default()`.
pub async fn fetch_payload<T: DeserializeOwned + Default>(
    client: &Client,
    source: &'static str,
    url: &Url,
) -> SourceOutcome<T> {
    let outcome: SourceOutcome<T> = fetch_json(client, url).await.into();

    match &outcome {
        SourceOutcome::Fetched(_) => debug!(source = source, url = %url, "rates_source_fetched"),
        SourceOutcome::Failed(e) => {
            warn!(source = source, url = %url, error = %e, "rates_source_failed")
        }
    }

    outcome
}

async fn fetch_json<T: DeserializeOwned + Default>(
    client: &Client,
    url: &Url,
) -> Result<T, UpstreamError> {
    let response = client
        .get(url.clone())
        .send()
        .await
        .map_err(|e| UpstreamError::Network {
            message: e.to_string(),
        })?;

    let status = response.status();
    if !status.is_success() {
        return Err(UpstreamError::Status {
            status_code: status.as_u16(),
        });
    }

    let body = response.bytes().await.map_err(|e| UpstreamError::Network {
        message: e.to_string(),
    })?;

    let value: Value = serde_json::from_slice(&body).map_err(|e| UpstreamError::InvalidJson {
        message: e.to_string(),
    })?;

    if is_empty_payload(&value) {
        return Err(UpstreamError::EmptyPayload);
    }

    if !value.is_object() {
        return Ok(T::default());
    }

    serde_json::from_value(value).map_err(|e| UpstreamError::InvalidJson {
        message: e.to_string(),
    })
}

fn is_empty_payload(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(_) | Value::Object(_) => false,
    }
}

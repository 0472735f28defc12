//! Fitbit Web API client: credential store, token refresh and the
//! heart-rate / sleep fetchers that persist raw responses to disk.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod auth;
pub mod config;
pub mod credentials;
pub mod http_client;
pub mod results;
pub mod utils;

pub use http_client::ApiResponse;
pub use utils::{DateParam, Period};

/// `errorType` the API reports once the bearer token has expired.
pub const EXPIRED_TOKEN: &str = "expired_token";

#[derive(Debug, Error)]
pub enum FitbitError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("credentials error: {0}")]
    Credentials(String),
    #[error("invalid header value: {0}")]
    InvalidHeader(String),
    #[error("token refresh rejected: {0}")]
    Refresh(ApiErrorEntry),
    #[error("api error: {0}")]
    Api(#[from] ApiError),
    #[error("missing or invalid field in response: {0}")]
    MissingField(String),
}

/// One element of the `errors` array the API returns on failure.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct ApiErrorEntry {
    #[serde(rename = "errorType", default, skip_serializing_if = "Option::is_none")]
    pub error_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl std::fmt::Display for ApiErrorEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = self.error_type.as_deref().unwrap_or("unknown");
        match &self.message {
            Some(message) => write!(f, "{kind}: {message}"),
            None => f.write_str(kind),
        }
    }
}

/// API-level failure reported inside a response body.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum ApiError {
    #[error("access token expired")]
    ExpiredToken,
    #[error("{}", describe_entries(.0))]
    Other(Vec<ApiErrorEntry>),
}

fn describe_entries(entries: &[ApiErrorEntry]) -> String {
    if entries.is_empty() {
        return "unrecognised errors payload".to_string();
    }
    entries
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Inspect a parsed response body for an `errors` array.
///
/// A missing, null or empty `errors` field is `Ok`. An entry whose
/// `errorType` is `expired_token` wins over any other entry.
pub fn classify_errors(body: &serde_json::Value) -> Result<(), ApiError> {
    let errors = match body.get("errors") {
        None | Some(serde_json::Value::Null) => return Ok(()),
        Some(errors) => errors,
    };
    let Some(items) = errors.as_array() else {
        return Err(ApiError::Other(Vec::new()));
    };
    if items.is_empty() {
        return Ok(());
    }

    let entries: Vec<ApiErrorEntry> = items
        .iter()
        .map(|item| serde_json::from_value(item.clone()).unwrap_or_default())
        .collect();
    if entries
        .iter()
        .any(|e| e.error_type.as_deref() == Some(EXPIRED_TOKEN))
    {
        return Err(ApiError::ExpiredToken);
    }
    Err(ApiError::Other(entries))
}

/// Whether the body reports an expired access token.
pub fn is_expired(body: &serde_json::Value) -> bool {
    matches!(classify_errors(body), Err(ApiError::ExpiredToken))
}

/// A response body saved to disk by one of the fetchers.
#[derive(Clone, Debug)]
pub struct FetchedRecord {
    pub path: std::path::PathBuf,
    pub response: ApiResponse,
}

#[async_trait]
pub trait FitbitClient: Send {
    /// Fetch heart-rate data and save it under the heartbeat directory,
    /// keyed by the server-supplied `dateTime`.
    async fn heart_rate(
        &mut self,
        date: DateParam,
        period: Period,
    ) -> Result<FetchedRecord, FitbitError>;

    /// Fetch today's sleep log, "today" being the local date in the
    /// client's fixed UTC offset.
    async fn sleep(&mut self) -> Result<FetchedRecord, FitbitError>;
}

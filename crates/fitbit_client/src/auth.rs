//! Bearer headers and the refresh-token exchange.

use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use serde::Deserialize;

use crate::credentials::CredentialStore;
use crate::{ApiErrorEntry, FitbitError};

/// Successful body of the token endpoint; other fields are ignored.
#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
}

/// Owns the credential store and keeps it in sync with the token endpoint.
#[derive(Debug)]
pub struct Authenticator {
    client: reqwest::Client,
    token_url: String,
    store: CredentialStore,
}

impl Authenticator {
    pub fn new(
        client: reqwest::Client,
        token_url: impl Into<String>,
        store: CredentialStore,
    ) -> Self {
        Self {
            client,
            token_url: token_url.into(),
            store,
        }
    }

    /// `Authorization: Bearer <access_token>`.
    pub fn bearer_header(&self) -> Result<HeaderMap, FitbitError> {
        let token = self.store.credentials().access_token.expose_secret();
        let mut value = HeaderValue::from_str(&format!("Bearer {token}")).map_err(|_| {
            FitbitError::InvalidHeader("access token is not a valid header value".into())
        })?;
        value.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, value);
        Ok(headers)
    }

    /// Exchange the refresh token for a new token pair and persist it.
    ///
    /// When the endpoint answers with an `errors` array the store is left
    /// untouched and the first entry is returned as [`FitbitError::Refresh`].
    /// Rotating a still-valid token is harmless.
    pub async fn refresh(&mut self) -> Result<(), FitbitError> {
        let body = {
            let creds = self.store.credentials();
            let form = [
                ("grant_type", "refresh_token"),
                ("refresh_token", creds.refresh_token.expose_secret()),
                ("client_id", creds.client_id.as_str()),
            ];
            tracing::debug!(url = %self.token_url, "requesting token refresh");
            let resp = self.client.post(&self.token_url).form(&form).send().await?;
            resp.text().await?
        };
        let parsed: serde_json::Value = serde_json::from_str(&body)?;

        // Any non-null `errors`, even an empty list, means no new tokens.
        if !matches!(parsed.get("errors"), None | Some(serde_json::Value::Null)) {
            let entry = first_error(&parsed);
            tracing::error!(error = %entry, "token refresh rejected");
            return Err(FitbitError::Refresh(entry));
        }

        let tokens: TokenResponse = serde_json::from_value(parsed)?;
        self.store.update_tokens(tokens.access_token, tokens.refresh_token);
        self.store.save().await?;
        tracing::info!(path = %self.store.path().display(), "access token refreshed");
        Ok(())
    }

    pub fn store(&self) -> &CredentialStore {
        &self.store
    }
}

fn first_error(body: &serde_json::Value) -> ApiErrorEntry {
    body.get("errors")
        .and_then(|e| e.get(0))
        .and_then(|e| serde_json::from_value(e.clone()).ok())
        .unwrap_or_default()
}

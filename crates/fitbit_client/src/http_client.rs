//! HTTP client implementation for the Fitbit Web API.
//!
//! This module provides a reqwest-based implementation of the
//! [`FitbitClient`](crate::FitbitClient) trait together with the request
//! wrapper that refreshes an expired token and retries once.

use crate::auth::Authenticator;
use crate::credentials::CredentialStore;
use crate::results::{self, ResultsLayout};
use crate::{
    ApiError, DateParam, FetchedRecord, FitbitClient, FitbitError, Period, classify_errors, utils,
};
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Utc};
use reqwest::StatusCode;
use reqwest::header::HeaderMap;
use std::path::PathBuf;

/// HTTP verbs the wrapper knows how to issue.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl From<HttpMethod> for reqwest::Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Delete => reqwest::Method::DELETE,
        }
    }
}

/// Everything about a request other than its verb and URL.
#[derive(Clone, Debug, Default)]
pub struct RequestParams {
    pub headers: HeaderMap,
    pub query: Vec<(String, String)>,
    pub form: Option<Vec<(String, String)>>,
}

impl RequestParams {
    pub fn with_headers(headers: HeaderMap) -> Self {
        Self {
            headers,
            ..Self::default()
        }
    }
}

/// A response whose body has been read but not interpreted.
#[derive(Clone, Debug)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub body: String,
}

impl ApiResponse {
    pub fn json(&self) -> Result<serde_json::Value, FitbitError> {
        Ok(serde_json::from_str(&self.body)?)
    }

    /// API-level error carried in the body, if any.
    pub fn api_error(&self) -> Result<Option<ApiError>, FitbitError> {
        Ok(classify_errors(&self.json()?).err())
    }
}

/// Client for the Fitbit Web API using reqwest.
#[derive(Debug)]
pub struct ReqwestFitbitClient {
    base_url: String,
    client: reqwest::Client,
    auth: Authenticator,
    results: ResultsLayout,
    utc_offset: FixedOffset,
}

impl ReqwestFitbitClient {
    /// Create a new client instance.
    ///
    /// # Arguments
    /// * `base_url` - The API root, e.g. "https://api.fitbit.com"
    ///   (the token endpoint is `{base_url}/oauth2/token`)
    /// * `store` - Loaded credentials; the client owns them from here on
    /// * `results` - Where fetched records are written
    /// * `utc_offset` - Offset used to compute "today" for the sleep fetch
    pub fn new(
        base_url: &str,
        store: CredentialStore,
        results: ResultsLayout,
        utc_offset: FixedOffset,
    ) -> Result<Self, FitbitError> {
        let base_url = base_url.trim_end_matches('/').to_string();
        let client = reqwest::Client::builder()
            .user_agent(concat!("fitbit_client/", env!("CARGO_PKG_VERSION")))
            .build()?;
        let auth = Authenticator::new(client.clone(), format!("{base_url}/oauth2/token"), store);
        Ok(Self {
            base_url,
            client,
            auth,
            results,
            utc_offset,
        })
    }

    pub fn from_config(
        config: &crate::config::Config,
        store: CredentialStore,
    ) -> Result<Self, FitbitError> {
        Self::new(
            &config.base_url,
            store,
            ResultsLayout::new(&config.results_dir),
            config.utc_offset,
        )
    }

    pub fn authenticator(&self) -> &Authenticator {
        &self.auth
    }

    /// Issue one request and read its body.
    async fn execute(
        &self,
        method: HttpMethod,
        url: &str,
        params: &RequestParams,
    ) -> Result<ApiResponse, FitbitError> {
        tracing::debug!(?method, %url, "sending request");
        let mut request = self
            .client
            .request(method.into(), url)
            .headers(params.headers.clone());
        if !params.query.is_empty() {
            request = request.query(&params.query);
        }
        if let Some(form) = &params.form {
            request = request.form(form);
        }
        let resp = request.send().await?;
        let status = resp.status();
        let body = resp.text().await?;
        Ok(ApiResponse { status, body })
    }

    /// Send a request; if the API reports an expired token, refresh it and
    /// send the request once more with a fresh bearer header.
    ///
    /// Other API errors are passed through in the returned response.
    pub async fn send_with_refresh(
        &mut self,
        method: HttpMethod,
        url: &str,
        mut params: RequestParams,
    ) -> Result<ApiResponse, FitbitError> {
        let resp = self.execute(method, url, &params).await?;
        match classify_errors(&resp.json()?) {
            Ok(()) => Ok(resp),
            Err(ApiError::ExpiredToken) => {
                tracing::warn!(%url, "access token expired, refreshing and retrying once");
                self.auth.refresh().await?;
                params.headers = self.auth.bearer_header()?;
                self.execute(method, url, &params).await
            }
            Err(err @ ApiError::Other(_)) => {
                tracing::warn!(
                    %url,
                    status = resp.status.as_u16(),
                    error = %err,
                    "api reported an error"
                );
                Ok(resp)
            }
        }
    }

    /// Fetch `url` with the current bearer token and save the body as
    /// `{dir}/{key}.json`, where `key_of` picks the key from the parsed body.
    async fn fetch_and_save<K>(
        &mut self,
        url: &str,
        dir: PathBuf,
        key_of: K,
    ) -> Result<FetchedRecord, FitbitError>
    where
        K: FnOnce(&serde_json::Value) -> Result<String, FitbitError> + Send,
    {
        let headers = self.auth.bearer_header()?;
        let response = self
            .send_with_refresh(HttpMethod::Get, url, RequestParams::with_headers(headers))
            .await?;
        let data = response.json()?;
        classify_errors(&data)?;

        results::ensure_dir(&dir).await?;
        let path = results::record_path(&dir, &key_of(&data)?)?;
        results::write_pretty_json(&path, &data).await?;
        tracing::info!(path = %path.display(), "saved record");

        Ok(FetchedRecord { path, response })
    }

    /// Sleep fetch with an explicit clock, "today" being `now` shifted into
    /// the client's UTC offset.
    pub async fn sleep_at(&mut self, now: DateTime<Utc>) -> Result<FetchedRecord, FitbitError> {
        let date = utils::local_date(now, self.utc_offset);
        let url = format!("{}/1.2/user/-/sleep/date/{}.json", self.base_url, date);
        let dir = self.results.sleep_dir();
        self.fetch_and_save(&url, dir, move |_| Ok(date)).await
    }
}

/// `dateTime` of the first `activities-heart` entry.
fn heart_rate_key(data: &serde_json::Value) -> Result<String, FitbitError> {
    data.get("activities-heart")
        .and_then(|a| a.get(0))
        .and_then(|first| first.get("dateTime"))
        .and_then(|d| d.as_str())
        .map(str::to_string)
        .ok_or_else(|| FitbitError::MissingField("activities-heart[0].dateTime".into()))
}

#[async_trait]
impl FitbitClient for ReqwestFitbitClient {
    async fn heart_rate(
        &mut self,
        date: DateParam,
        period: Period,
    ) -> Result<FetchedRecord, FitbitError> {
        let url = format!(
            "{}/1/user/-/activities/heart/date/{}/{}.json",
            self.base_url, date, period
        );
        let dir = self.results.heartbeat_dir();
        self.fetch_and_save(&url, dir, heart_rate_key).await
    }

    async fn sleep(&mut self) -> Result<FetchedRecord, FitbitError> {
        self.sleep_at(Utc::now()).await
    }
}

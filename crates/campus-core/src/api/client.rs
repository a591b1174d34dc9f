//! API client for communicating with the campus REST backend.
//!
//! This module provides the `ApiClient` struct for reading resource
//! collections and submitting new or edited records.

use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, warn};

use crate::models::{Resource, ResourceKind};

use super::ApiError;

// ============================================================================
// Constants
// ============================================================================

/// HTTP request timeout in seconds, used when the config does not set one.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Maximum number of retries for rate-limited (429) requests.
const MAX_RATE_LIMIT_RETRIES: u32 = 3;

/// Initial backoff delay in milliseconds for rate limiting.
const INITIAL_BACKOFF_MS: u64 = 1000;

/// API client for the campus backend.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    /// Create a new API client rooted at `base_url` (e.g. `http://localhost:8080/api`).
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ApiError> {
        let client = Client::builder().timeout(timeout).build()?;
        let base_url = base_url.into().trim_end_matches('/').to_string();

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Query parameters identifying the acting user, for kinds that take one.
    fn actor_query(kind: ResourceKind, actor_id: i64) -> Vec<(&'static str, String)> {
        if kind.takes_actor() {
            vec![("userId", actor_id.to_string())]
        } else {
            Vec::new()
        }
    }

    /// Check if response is successful, returning an error with body if not.
    /// Returns Ok(Some(response)) for success, Ok(None) for rate limit (should retry),
    /// or Err for other errors.
    async fn check_response_for_retry(response: Response) -> Result<Option<Response>, ApiError> {
        if response.status().is_success() {
            Ok(Some(response))
        } else if response.status().as_u16() == 429 {
            Ok(None)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body))
        }
    }

    /// Send a request, retrying with exponential backoff while rate limited.
    ///
    /// `build` is called once per attempt because a `RequestBuilder` is
    /// consumed by `send`.
    async fn send<F>(&self, url: &str, build: F) -> Result<Response, ApiError>
    where
        F: Fn() -> RequestBuilder,
    {
        let mut retries = 0;
        let mut backoff_ms = INITIAL_BACKOFF_MS;

        loop {
            let response = build().send().await?;

            match Self::check_response_for_retry(response).await? {
                Some(response) => return Ok(response),
                None => {
                    retries += 1;
                    if retries > MAX_RATE_LIMIT_RETRIES {
                        return Err(ApiError::RateLimited);
                    }
                    warn!(url = url, retry = retries, backoff_ms = backoff_ms, "Rate limited, backing off");
                    tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                    backoff_ms *= 2; // Exponential backoff
                }
            }
        }
    }

    async fn decode<T: DeserializeOwned>(url: &str, response: Response) -> Result<T, ApiError> {
        let text = response.text().await?;
        serde_json::from_str(&text)
            .map_err(|e| ApiError::InvalidResponse(format!("Failed to parse JSON from {}: {}", url, e)))
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T, ApiError> {
        let url = self.url(path);
        debug!(url = %url, "GET");
        let response = self
            .send(&url, || self.client.get(&url).query(query))
            .await?;
        Self::decode(&url, response).await
    }

    pub async fn post<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        query: &[(&str, String)],
        body: &B,
    ) -> Result<T, ApiError> {
        let url = self.url(path);
        debug!(url = %url, "POST");
        let response = self
            .send(&url, || self.client.post(&url).query(query).json(body))
            .await?;
        Self::decode(&url, response).await
    }

    pub async fn put<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        query: &[(&str, String)],
        body: &B,
    ) -> Result<T, ApiError> {
        let url = self.url(path);
        debug!(url = %url, "PUT");
        let response = self
            .send(&url, || self.client.put(&url).query(query).json(body))
            .await?;
        Self::decode(&url, response).await
    }

    /// DELETE ignores the response body; some backends answer 204.
    pub async fn delete(&self, path: &str, query: &[(&str, String)]) -> Result<(), ApiError> {
        let url = self.url(path);
        debug!(url = %url, "DELETE");
        self.send(&url, || self.client.delete(&url).query(query))
            .await?;
        Ok(())
    }

    // ===== Resource Methods =====

    /// Fetch the whole collection for `R`.
    pub async fn list<R: Resource>(&self) -> Result<Vec<R>, ApiError> {
        self.get(R::KIND.endpoint(), &[]).await
    }

    /// Fetch a filtered view of the collection, e.g. `/status/ACTIVE` or
    /// `/search` with a `keyword` query.
    pub async fn list_filtered<R: Resource>(
        &self,
        suffix: &str,
        query: &[(&str, String)],
    ) -> Result<Vec<R>, ApiError> {
        let path = format!("{}{}", R::KIND.endpoint(), suffix);
        self.get(&path, query).await
    }

    pub async fn fetch<R: Resource>(&self, id: i64) -> Result<R, ApiError> {
        let path = format!("{}/{}", R::KIND.endpoint(), id);
        self.get(&path, &[]).await
    }

    /// Create a record; the server assigns id, timestamps and attribution.
    pub async fn create<R: Resource>(&self, record: &R, actor_id: i64) -> Result<R, ApiError> {
        let query = Self::actor_query(R::KIND, actor_id);
        self.post(R::KIND.create_endpoint(), &query, record).await
    }

    pub async fn update<R: Resource>(&self, id: i64, record: &R, actor_id: i64) -> Result<R, ApiError> {
        let path = format!("{}/{}", R::KIND.endpoint(), id);
        let query = Self::actor_query(R::KIND, actor_id);
        self.put(&path, &query, record).await
    }

    pub async fn delete_record(&self, kind: ResourceKind, id: i64, actor_id: i64) -> Result<(), ApiError> {
        let path = format!("{}/{}", kind.endpoint(), id);
        let query = Self::actor_query(kind, actor_id);
        self.delete(&path, &query).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = ApiClient::new("http://localhost:8080/api/", Duration::from_secs(5)).unwrap();
        assert_eq!(client.base_url(), "http://localhost:8080/api");
        assert_eq!(client.url("/events"), "http://localhost:8080/api/events");
    }

    #[test]
    fn test_actor_query_only_for_posts() {
        assert_eq!(
            ApiClient::actor_query(ResourceKind::Events, 1),
            vec![("userId", "1".to_string())]
        );
        assert!(ApiClient::actor_query(ResourceKind::FoundItems, 1).is_empty());
    }

    #[tokio::test]
    async fn test_unreachable_server_is_network_error() {
        // Port 9 (discard) on localhost is closed in test environments.
        let client = ApiClient::new("http://127.0.0.1:9", Duration::from_secs(2)).unwrap();
        let err = client.list::<crate::models::Event>().await.unwrap_err();
        assert!(err.is_network(), "unexpected error: {err:?}");
    }
}

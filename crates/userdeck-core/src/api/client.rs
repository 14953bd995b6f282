//! API client for the remote user directory.
//!
//! Every request goes through one configured `reqwest::Client` (base URL,
//! timeout, JSON content type). The stored token is attached on the way out;
//! a 401 on the way back clears it and notifies subscribers.

use std::time::Duration;

use reqwest::{header, Client, Response};
use serde::{de::DeserializeOwned, Serialize};
use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::auth::TokenStore;
use crate::models::{LoginRequest, LoginResponse, RegisterResponse, User, UserDetail, UserPage};

use super::error::{ApiError, ApiResult};

// ============================================================================
// Constants
// ============================================================================

/// HTTP request timeout in seconds.
const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Capacity of the session event channel.
const EVENT_CHANNEL_CAPACITY: usize = 16;

/// Signals from the transport layer to whoever owns the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// The server rejected the presented token. The store is already cleared.
    Unauthorized,
}

/// API client for the user directory.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    store: TokenStore,
    events: broadcast::Sender<SessionEvent>,
}

impl ApiClient {
    /// Create a new API client rooted at `base_url`, reading tokens from `store`.
    pub fn new(base_url: &str, store: TokenStore) -> ApiResult<Self> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );

        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .default_headers(headers)
            .build()?;

        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            store,
            events,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn store(&self) -> &TokenStore {
        &self.store
    }

    /// Receive `SessionEvent`s emitted by this client and all its clones.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn auth_headers(&self) -> header::HeaderMap {
        let mut headers = header::HeaderMap::new();
        if let Some(token) = self.store.get() {
            match header::HeaderValue::from_str(&format!("Bearer {}", token)) {
                Ok(value) => {
                    headers.insert(header::AUTHORIZATION, value);
                }
                Err(_) => warn!("Stored token is not a valid header value, sending without it"),
            }
        }
        headers
    }

    /// Check if response is successful, returning an error with body if not.
    /// On a session-bound request a 401 clears the session and emits
    /// `SessionEvent::Unauthorized` first. Credential submissions never do.
    async fn check_response(&self, response: Response, session_bound: bool) -> ApiResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        if session_bound && status == reqwest::StatusCode::UNAUTHORIZED {
            warn!(url = %response.url(), "Server rejected session token");
            if let Err(e) = self.store.remove() {
                warn!(error = %e, "Failed to clear session after 401");
            }
            if self.events.send(SessionEvent::Unauthorized).is_err() {
                debug!("No session subscribers for unauthorized event");
            }
        }

        let body = response.text().await.unwrap_or_default();
        Err(ApiError::from_status(status, &body))
    }

    async fn parse<T: DeserializeOwned>(response: Response, url: &str) -> ApiResult<T> {
        let text = response.text().await?;
        serde_json::from_str(&text)
            .map_err(|e| ApiError::InvalidResponse(format!("{} from {}", e, url)))
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        let url = self.url(path);
        debug!(url = %url, "GET");
        let response = self
            .client
            .get(&url)
            .headers(self.auth_headers())
            .send()
            .await?;

        let response = self.check_response(response, true).await?;
        Self::parse(response, &url).await
    }

    /// POST credentials to a public endpoint. A 401 here judges the
    /// credentials, not the stored session, so the store is left alone.
    async fn post_credentials<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> ApiResult<T> {
        let url = self.url(path);
        debug!(url = %url, "POST");
        let response = self
            .client
            .post(&url)
            .headers(self.auth_headers())
            .json(body)
            .send()
            .await?;

        let response = self.check_response(response, false).await?;
        Self::parse(response, &url).await
    }

    // ===== Auth =====

    /// Submit credentials. The returned body may lack a token; callers decide
    /// what that means.
    pub async fn login(&self, email: &str, password: &str) -> ApiResult<LoginResponse> {
        self.post_credentials("/login", &LoginRequest { email, password }).await
    }

    pub async fn register(&self, email: &str, password: &str) -> ApiResult<RegisterResponse> {
        self.post_credentials("/register", &LoginRequest { email, password }).await
    }

    // ===== Directory =====

    /// Fetch one page of users (1-based).
    pub async fn fetch_users(&self, page: u32) -> ApiResult<UserPage> {
        self.get(&format!("/users?page={}", page.max(1))).await
    }

    pub async fn fetch_user(&self, user_id: i64) -> ApiResult<User> {
        let detail: UserDetail = self.get(&format!("/users/{}", user_id)).await?;
        Ok(detail.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_is_trimmed() {
        let client = ApiClient::new("https://reqres.in/api/", TokenStore::in_memory()).unwrap();
        assert_eq!(client.base_url(), "https://reqres.in/api");
        assert_eq!(client.url("/users/2"), "https://reqres.in/api/users/2");
    }

    #[test]
    fn test_auth_headers_follow_store() {
        let store = TokenStore::in_memory();
        let client = ApiClient::new("http://localhost", store.clone()).unwrap();
        assert!(client.auth_headers().get(header::AUTHORIZATION).is_none());

        store.set("abc").unwrap();
        assert_eq!(
            client.auth_headers().get(header::AUTHORIZATION).unwrap(),
            "Bearer abc"
        );

        store.remove().unwrap();
        assert!(client.auth_headers().get(header::AUTHORIZATION).is_none());
    }

    #[test]
    fn test_empty_token_sends_no_header() {
        let store = TokenStore::in_memory();
        store.set("").unwrap();
        let client = ApiClient::new("http://localhost", store).unwrap();
        assert!(client.auth_headers().get(header::AUTHORIZATION).is_none());
    }

    #[test]
    fn test_invalid_token_is_skipped() {
        let store = TokenStore::in_memory();
        store.set("bad\ntoken").unwrap();
        let client = ApiClient::new("http://localhost", store).unwrap();
        assert!(client.auth_headers().is_empty());
    }
}

//! Login, logout and validity checks on top of the API client and token store.

use chrono::Duration;
use tracing::{info, warn};

use crate::api::{ApiClient, ApiError, ApiResult};
use crate::models::RegisterResponse;

use super::policy::SessionPolicy;
use super::store::TokenStore;

/// Demo-mode credentials accepted when the remote login is unreachable.
pub const DEMO_EMAIL: &str = "eve.holt@reqres.in";
pub const DEMO_PASSWORD: &str = "cityslicka";

/// Prefix of locally minted demo tokens; the epoch milliseconds follow.
pub const DEMO_TOKEN_PREFIX: &str = "QpwL5tke4Pnpja7X4_mock_";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginSuccess {
    pub token: String,
    /// The token was minted locally by the demo-mode fallback.
    pub demo: bool,
}

#[derive(Clone)]
pub struct AuthService {
    api: ApiClient,
    store: TokenStore,
    policy: SessionPolicy,
    demo_mode: bool,
}

impl AuthService {
    pub fn new(api: ApiClient) -> Self {
        let store = api.store().clone();
        let policy = SessionPolicy::new(store.clone());
        Self {
            api,
            store,
            policy,
            demo_mode: false,
        }
    }

    /// Replace the default 30-minute policy.
    pub fn with_policy(mut self, policy: SessionPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Enable the offline/demo login fallback. Off unless asked for.
    pub fn with_demo_mode(mut self, enabled: bool) -> Self {
        self.demo_mode = enabled;
        self
    }

    pub fn demo_mode(&self) -> bool {
        self.demo_mode
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn policy(&self) -> &SessionPolicy {
        &self.policy
    }

    /// Log in and persist the issued token.
    ///
    /// A response without a token fails with `AuthenticationFailed`. Transport
    /// errors propagate unchanged unless demo mode is on and the server was
    /// unreachable, in which case the built-in demo pair is checked instead.
    pub async fn authenticate(&self, email: &str, password: &str) -> ApiResult<LoginSuccess> {
        let (token, demo) = match self.api.login(email, password).await {
            Ok(response) => match response.token {
                Some(token) if !token.is_empty() => (token, false),
                _ => return Err(ApiError::AuthenticationFailed),
            },
            Err(e) if self.demo_mode && e.is_unreachable() => {
                warn!(error = %e, "API unavailable, using demo authentication");
                (self.demo_login(email, password)?, true)
            }
            Err(e) => return Err(e),
        };

        self.store
            .set(&token)
            .map_err(|e| ApiError::Storage(format!("{:#}", e)))?;
        info!(demo, "Login successful");

        Ok(LoginSuccess { token, demo })
    }

    fn demo_login(&self, email: &str, password: &str) -> ApiResult<String> {
        if email == DEMO_EMAIL && password == DEMO_PASSWORD {
            let now = self.store.clock().now_millis();
            Ok(format!("{}{}", DEMO_TOKEN_PREFIX, now))
        } else {
            Err(ApiError::InvalidCredentials)
        }
    }

    /// Create an account. Does not log in.
    pub async fn register(&self, email: &str, password: &str) -> ApiResult<RegisterResponse> {
        self.api.register(email, password).await
    }

    pub fn check_validity(&self) -> bool {
        self.policy.is_valid()
    }

    pub fn clear(&self) -> anyhow::Result<()> {
        self.store.remove()
    }

    pub fn current_token(&self) -> Option<String> {
        self.store.get()
    }

    pub fn session_remaining(&self) -> Option<Duration> {
        self.policy.time_until_expiry()
    }
}

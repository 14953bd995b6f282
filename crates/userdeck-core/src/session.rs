//! Process-wide authentication state.
//!
//! One `SessionContext` is created at startup and handed to whatever needs
//! it. It starts in `Loading`, settles on the stored session, and afterwards
//! changes only on login, logout, expiry detection or a 401 reported by the
//! API client.

use tokio::sync::broadcast::{self, error::TryRecvError};
use tracing::{debug, info, warn};

use crate::api::SessionEvent;
use crate::auth::AuthService;
use crate::messages;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthStatus {
    Loading,
    Authenticated,
    Unauthenticated,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    Success,
    Failure(String),
}

impl LoginOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, LoginOutcome::Success)
    }
}

pub struct SessionContext {
    auth: AuthService,
    events: broadcast::Receiver<SessionEvent>,
    authenticated: bool,
    loading: bool,
    error: Option<String>,
}

impl SessionContext {
    /// New context in the `Loading` state. Call `initialize` to settle it.
    pub fn new(auth: AuthService) -> Self {
        let events = auth.api().subscribe();
        Self {
            auth,
            events,
            authenticated: false,
            loading: true,
            error: None,
        }
    }

    /// Consult the stored session once and leave `Loading`.
    pub fn initialize(&mut self) -> AuthStatus {
        self.authenticated = self.auth.check_validity();
        self.loading = false;
        debug!(authenticated = self.authenticated, "Session initialized");
        self.status()
    }

    pub fn status(&self) -> AuthStatus {
        if self.loading {
            AuthStatus::Loading
        } else if self.authenticated {
            AuthStatus::Authenticated
        } else {
            AuthStatus::Unauthenticated
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    pub fn token(&self) -> Option<String> {
        self.auth.current_token()
    }

    pub fn auth(&self) -> &AuthService {
        &self.auth
    }

    /// Log in. Failures leave the session untouched and set `error`.
    pub async fn login(&mut self, email: &str, password: &str) -> LoginOutcome {
        self.loading = true;
        self.error = None;

        let result = self.auth.authenticate(email, password).await;
        self.loading = false;

        // A 401 from the login endpoint itself is not a lost session.
        self.drain_events();

        match result {
            Ok(_) => {
                self.authenticated = true;
                LoginOutcome::Success
            }
            Err(e) => {
                warn!(error = %e, "Login failed");
                // Any session that was already active stays as the store has it.
                self.authenticated = self.auth.check_validity();
                let message = e.login_message();
                self.error = Some(message.clone());
                LoginOutcome::Failure(message)
            }
        }
    }

    /// Clear the stored session. Safe to call repeatedly.
    pub fn logout(&mut self) {
        if let Err(e) = self.auth.clear() {
            warn!(error = %e, "Failed to clear stored session");
        }
        if self.authenticated {
            info!("Logged out");
        }
        self.authenticated = false;
        self.loading = false;
        self.error = None;
    }

    /// Re-check expiry. An authenticated session whose token has lapsed
    /// becomes unauthenticated. Returns true if the state changed.
    pub fn revalidate(&mut self) -> bool {
        if self.loading || !self.authenticated {
            return false;
        }
        if self.auth.check_validity() {
            return false;
        }
        info!("Session expired");
        self.authenticated = false;
        self.error = Some(messages::SESSION_EXPIRED.to_string());
        true
    }

    /// Apply events from the API client. Returns true if the state changed.
    pub fn process_events(&mut self) -> bool {
        let mut unauthorized = false;
        loop {
            match self.events.try_recv() {
                Ok(SessionEvent::Unauthorized) => unauthorized = true,
                Err(TryRecvError::Lagged(skipped)) => {
                    debug!(skipped, "Session event receiver lagged");
                    unauthorized = true;
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
            }
        }

        if !unauthorized || !self.authenticated {
            return false;
        }

        // The API client has already cleared the store.
        info!("Session rejected by server");
        self.authenticated = false;
        self.error = Some(messages::SESSION_EXPIRED.to_string());
        true
    }

    fn drain_events(&mut self) {
        while let Ok(_) | Err(TryRecvError::Lagged(_)) = self.events.try_recv() {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ApiClient;
    use crate::auth::TokenStore;

    fn context(store: &TokenStore) -> SessionContext {
        let api = ApiClient::new("http://127.0.0.1:9", store.clone()).unwrap();
        SessionContext::new(AuthService::new(api))
    }

    #[test]
    fn test_starts_loading() {
        let store = TokenStore::in_memory();
        let ctx = context(&store);
        assert_eq!(ctx.status(), AuthStatus::Loading);
        assert!(ctx.is_loading());
        assert!(!ctx.is_authenticated());
    }

    #[test]
    fn test_initialize_without_session() {
        let store = TokenStore::in_memory();
        let mut ctx = context(&store);
        assert_eq!(ctx.initialize(), AuthStatus::Unauthenticated);
    }

    #[test]
    fn test_initialize_with_stored_session() {
        let store = TokenStore::in_memory();
        store.set("tok").unwrap();
        let mut ctx = context(&store);

        assert_eq!(ctx.initialize(), AuthStatus::Authenticated);
        assert_eq!(ctx.token().as_deref(), Some("tok"));
    }

    #[test]
    fn test_logout_twice_is_idempotent() {
        let store = TokenStore::in_memory();
        store.set("tok").unwrap();
        let mut ctx = context(&store);
        ctx.initialize();

        ctx.logout();
        assert_eq!(ctx.status(), AuthStatus::Unauthenticated);
        assert_eq!(store.get(), None);

        ctx.logout();
        assert_eq!(ctx.status(), AuthStatus::Unauthenticated);
        assert_eq!(ctx.error(), None);
    }

    #[test]
    fn test_revalidate_detects_removed_token() {
        let store = TokenStore::in_memory();
        store.set("tok").unwrap();
        let mut ctx = context(&store);
        ctx.initialize();

        assert!(!ctx.revalidate());

        store.remove().unwrap();
        assert!(ctx.revalidate());
        assert_eq!(ctx.status(), AuthStatus::Unauthenticated);
        assert_eq!(ctx.error(), Some(messages::SESSION_EXPIRED));

        // Nothing more to report
        assert!(!ctx.revalidate());
    }

    #[test]
    fn test_process_events_without_events_is_noop() {
        let store = TokenStore::in_memory();
        store.set("tok").unwrap();
        let mut ctx = context(&store);
        ctx.initialize();

        assert!(!ctx.process_events());
        assert_eq!(ctx.status(), AuthStatus::Authenticated);
    }

    #[test]
    fn test_clear_error() {
        let store = TokenStore::in_memory();
        store.set("tok").unwrap();
        let mut ctx = context(&store);
        ctx.initialize();
        store.remove().unwrap();
        ctx.revalidate();

        ctx.clear_error();
        assert_eq!(ctx.error(), None);
    }
}

//! Session validity with lazy expiry.
//!
//! There is no timer. Expiry is checked whenever validity is asked for, and
//! an expired token is removed at that moment.

use chrono::Duration;
use tracing::{debug, warn};

use super::store::TokenStore;

/// Token expiry time in minutes, counted from issue.
pub const TOKEN_EXPIRY_MINUTES: i64 = 30;

#[derive(Clone)]
pub struct SessionPolicy {
    store: TokenStore,
    expiry_window: Duration,
}

impl SessionPolicy {
    pub fn new(store: TokenStore) -> Self {
        Self::with_expiry_window(store, Duration::minutes(TOKEN_EXPIRY_MINUTES))
    }

    pub fn with_expiry_window(store: TokenStore, expiry_window: Duration) -> Self {
        Self {
            store,
            expiry_window,
        }
    }

    pub fn expiry_window(&self) -> Duration {
        self.expiry_window
    }

    /// True while a token exists and `now <= issued_at + expiry window`.
    ///
    /// Fails closed when either the token or its timestamp is missing. An
    /// expired token is removed from the store before returning false.
    pub fn is_valid(&self) -> bool {
        if self.store.get().is_none() {
            return false;
        }
        let Some(expires_at) = self.expires_at() else {
            return false;
        };

        let now = self.store.clock().now_millis();
        if now > expires_at {
            debug!(expires_at, now, "Session token expired");
            if let Err(e) = self.store.remove() {
                warn!(error = %e, "Failed to remove expired session token");
            }
            return false;
        }
        true
    }

    /// Epoch milliseconds after which the stored token is invalid.
    pub fn expires_at(&self) -> Option<i64> {
        self.store
            .issued_at()
            .map(|issued| issued + self.expiry_window.num_milliseconds())
    }

    /// Time left on the stored token, negative once expired. Never mutates
    /// the store.
    pub fn time_until_expiry(&self) -> Option<Duration> {
        self.store.get()?;
        let expires_at = self.expires_at()?;
        let now = self.store.clock().now_millis();
        Some(Duration::milliseconds(expires_at - now))
    }

    /// Whole minutes remaining (for display), floored at zero.
    pub fn minutes_until_expiry(&self) -> Option<i64> {
        self.time_until_expiry()
            .map(|left| left.num_minutes().max(0))
    }
}

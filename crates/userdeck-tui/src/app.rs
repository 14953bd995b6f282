//! Application state management for userdeck.
//!
//! This module contains the `App` struct that owns the session context, the
//! navigator and the transient view state of the login and dashboard screens.

use anyhow::Result;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use userdeck_core::api::{ApiClient, ApiResult};
use userdeck_core::auth::{AuthService, TokenStore};
use userdeck_core::messages;
use userdeck_core::models::{User, UserPage};
use userdeck_core::routes::{Navigator, Route, Screen};
use userdeck_core::session::{LoginOutcome, SessionContext};
use userdeck_core::Config;

// ============================================================================
// Constants
// ============================================================================

/// Buffer size for the background fetch channel.
const CHANNEL_BUFFER_SIZE: usize = 16;

/// Maximum length for email input.
const MAX_EMAIL_LENGTH: usize = 100;

/// Maximum length for password input.
/// 128 chars accommodates password managers and passphrases.
const MAX_PASSWORD_LENGTH: usize = 128;

// ============================================================================
// UI State Types
// ============================================================================

/// Overall application state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Normal,
    ShowingHelp,
    ConfirmingQuit,
    Quitting,
}

/// Login form focus state
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LoginFocus {
    Email,
    Password,
    Button,
}

// ============================================================================
// Background Task Results
// ============================================================================

/// Results sent back from spawned fetch tasks.
enum FetchResult {
    /// A page of the user directory
    Users { page: u32, result: ApiResult<UserPage> },
    /// A single user record
    UserDetail { user_id: i64, result: ApiResult<User> },
}

// ============================================================================
// Dashboard State
// ============================================================================

/// Transient state of the dashboard. Reset whenever the dashboard is left.
#[derive(Debug, Default)]
pub struct DashboardState {
    pub page: Option<UserPage>,
    pub requested_page: u32,
    pub loading: bool,
    pub error: Option<String>,
    pub selection: usize,
    pub detail: Option<User>,
    pub detail_loading: bool,
}

impl DashboardState {
    pub fn users(&self) -> &[User] {
        self.page.as_ref().map(|p| p.data.as_slice()).unwrap_or_default()
    }

    pub fn selected_user(&self) -> Option<&User> {
        self.users().get(self.selection)
    }

    pub fn select_next(&mut self) {
        let len = self.users().len();
        if len > 0 && self.selection + 1 < len {
            self.selection += 1;
            self.clear_detail();
        }
    }

    pub fn select_prev(&mut self) {
        if self.selection > 0 {
            self.selection -= 1;
            self.clear_detail();
        }
    }

    /// Drop the detail panel; it belongs to the previous selection.
    fn clear_detail(&mut self) {
        self.detail = None;
        self.detail_loading = false;
    }

    /// Page number to load for "next", if there is one.
    pub fn next_page(&self) -> Option<u32> {
        self.page
            .as_ref()
            .filter(|p| p.has_next())
            .map(|p| p.page + 1)
    }

    /// Page number to load for "previous", if there is one.
    pub fn prev_page(&self) -> Option<u32> {
        self.page
            .as_ref()
            .filter(|p| p.has_prev())
            .map(|p| p.page - 1)
    }
}

// ============================================================================
// Main Application Struct
// ============================================================================

/// Main application state container
pub struct App {
    // Core services
    pub config: Config,
    pub session: SessionContext,
    pub navigator: Navigator,
    api: ApiClient,

    // UI State
    pub state: AppState,
    pub screen: Screen,

    // Login form state
    pub login_email: String,
    pub login_password: String,
    pub login_focus: LoginFocus,
    pub login_error: Option<String>,
    pub login_submitting: bool,

    // Dashboard
    pub dashboard: DashboardState,

    // Background task channel
    fetch_rx: mpsc::Receiver<FetchResult>,
    fetch_tx: mpsc::Sender<FetchResult>,

    // Status message
    pub status_message: Option<String>,
}

impl App {
    /// Create the application. The session starts in `Loading`; call
    /// `start` to settle it.
    pub fn new(config: Config, initial_path: &str) -> Result<Self> {
        let cache_dir = config.cache_dir()?;
        debug!(?cache_dir, "Storage directory configured");

        let store = TokenStore::open(&cache_dir)?;
        let api = ApiClient::new(config.api_base_url()?, store)?;
        let auth = AuthService::new(api.clone()).with_demo_mode(config.demo_mode);
        if config.demo_mode {
            info!("Demo login fallback enabled");
        }

        Ok(Self::with_services(config, auth, initial_path))
    }

    pub fn with_services(config: Config, auth: AuthService, initial_path: &str) -> Self {
        let api = auth.api().clone();
        let session = SessionContext::new(auth);
        let navigator = Navigator::new(initial_path);
        let (tx, rx) = mpsc::channel(CHANNEL_BUFFER_SIZE);

        let login_email = config.last_email.clone().unwrap_or_default();
        let login_password = std::env::var(userdeck_core::config::ENV_PASSWORD).unwrap_or_default();

        Self {
            config,
            session,
            navigator,
            api,

            state: AppState::Normal,
            screen: Screen::Waiting,

            login_email,
            login_password,
            login_focus: LoginFocus::Email,
            login_error: None,
            login_submitting: false,

            dashboard: DashboardState::default(),

            fetch_rx: rx,
            fetch_tx: tx,

            status_message: None,
        }
    }

    // =========================================================================
    // Authentication
    // =========================================================================

    /// Settle the session from storage and pick the first screen.
    pub fn start(&mut self) {
        let status = self.session.initialize();
        info!(?status, "Session checked");
        self.sync_route();
    }

    /// Per-loop session upkeep: apply API events, re-check expiry, route.
    pub fn tick(&mut self) {
        let rejected = self.session.process_events();
        let expired = self.session.revalidate();
        if rejected || expired {
            self.status_message = Some(messages::SESSION_EXPIRED.to_string());
        }
        self.sync_route();
    }

    /// Queue a login for the next loop iteration so the form can show
    /// "Signing in..." first.
    pub fn submit_login(&mut self) {
        if self.login_email.trim().is_empty() || self.login_password.is_empty() {
            self.login_error = Some("Email and password required".to_string());
            return;
        }
        self.login_error = None;
        self.login_submitting = true;
    }

    /// Run a queued login, if any.
    pub async fn run_pending_login(&mut self) {
        if self.login_submitting {
            self.attempt_login().await;
            self.login_submitting = false;
        }
    }

    /// Attempt login with the credentials from the login form
    pub async fn attempt_login(&mut self) {
        let email = self.login_email.trim().to_string();
        let password = self.login_password.clone();

        match self.session.login(&email, &password).await {
            LoginOutcome::Success => {
                self.config.last_email = Some(email);
                if let Err(e) = self.config.save() {
                    warn!(error = %e, "Failed to save config");
                }
                self.login_password.clear();
                self.login_error = None;
                self.status_message = None;
                self.sync_route();
            }
            LoginOutcome::Failure(message) => {
                error!(message = %message, "Login failed");
                self.login_error = Some(message);
            }
        }
    }

    /// Dismiss the login error and return to the form.
    pub fn dismiss_login_error(&mut self) {
        self.login_error = None;
        self.session.clear_error();
    }

    pub fn logout(&mut self) {
        self.session.logout();
        self.status_message = Some("Logged out".to_string());
        self.sync_route();
    }

    /// Text to show under the login form, if any.
    pub fn login_notice(&self) -> Option<&str> {
        self.login_error.as_deref().or_else(|| self.session.error())
    }

    /// Whole minutes left on the current session.
    pub fn session_minutes_left(&self) -> Option<i64> {
        if !self.session.is_authenticated() {
            return None;
        }
        self.session.auth().policy().minutes_until_expiry()
    }

    // =========================================================================
    // Routing
    // =========================================================================

    /// Apply the route guard and react to screen changes.
    fn sync_route(&mut self) {
        let screen = self.navigator.sync(self.session.status());
        if screen == self.screen {
            return;
        }
        debug!(from = ?self.screen, to = ?screen, "Screen change");

        if self.screen == Screen::Page(Route::Dashboard) {
            self.dashboard = DashboardState::default();
        }
        self.screen = screen;

        match screen {
            Screen::Page(Route::Dashboard) => self.load_page(1),
            Screen::Page(Route::Login) => self.start_login(),
            Screen::Waiting => {}
        }
    }

    /// Reset the login form focus for a fresh visit.
    fn start_login(&mut self) {
        self.login_focus = if self.login_email.is_empty() {
            LoginFocus::Email
        } else {
            LoginFocus::Password
        };
        self.login_submitting = false;
    }

    // =========================================================================
    // Dashboard
    // =========================================================================

    /// Fetch a page of users in the background.
    pub fn load_page(&mut self, page: u32) {
        let page = page.max(1);
        self.dashboard.requested_page = page;
        self.dashboard.loading = true;
        self.dashboard.error = None;

        let api = self.api.clone();
        let tx = self.fetch_tx.clone();
        tokio::spawn(async move {
            let result = api.fetch_users(page).await;
            Self::send_result(&tx, FetchResult::Users { page, result }).await;
        });
    }

    pub fn retry_dashboard(&mut self) {
        let page = self.dashboard.requested_page;
        self.load_page(page);
    }

    pub fn next_page(&mut self) {
        if self.dashboard.loading {
            return;
        }
        if let Some(page) = self.dashboard.next_page() {
            self.load_page(page);
        }
    }

    pub fn prev_page(&mut self) {
        if self.dashboard.loading {
            return;
        }
        if let Some(page) = self.dashboard.prev_page() {
            self.load_page(page);
        }
    }

    /// Fetch the full record of the selected user.
    pub fn load_selected_user(&mut self) {
        let Some(user_id) = self.dashboard.selected_user().map(|u| u.id) else {
            return;
        };
        self.dashboard.detail_loading = true;

        let api = self.api.clone();
        let tx = self.fetch_tx.clone();
        tokio::spawn(async move {
            let result = api.fetch_user(user_id).await;
            Self::send_result(&tx, FetchResult::UserDetail { user_id, result }).await;
        });
    }

    /// Helper to send fetch results, logging any channel errors
    async fn send_result(tx: &mpsc::Sender<FetchResult>, result: FetchResult) {
        if let Err(e) = tx.send(result).await {
            error!(error = %e, "Failed to send fetch result - channel closed");
        }
    }

    /// Check for completed background tasks and process results
    pub fn check_background_tasks(&mut self) {
        while let Ok(result) = self.fetch_rx.try_recv() {
            self.process_fetch_result(result);
        }
    }

    fn process_fetch_result(&mut self, result: FetchResult) {
        // Results for a dashboard that has since been left are dropped.
        if self.screen != Screen::Page(Route::Dashboard) {
            return;
        }

        match result {
            FetchResult::Users { page, result } => {
                if page != self.dashboard.requested_page {
                    debug!(page, requested = self.dashboard.requested_page, "Ignoring superseded page");
                    return;
                }
                self.dashboard.loading = false;
                match result {
                    Ok(data) => {
                        debug!(page = data.page, users = data.data.len(), "Dashboard page loaded");
                        self.dashboard.selection = 0;
                        self.dashboard.clear_detail();
                        self.dashboard.page = Some(data);
                    }
                    Err(e) => {
                        error!(error = %e, "Dashboard data fetch error");
                        self.dashboard.error = Some(messages::DASHBOARD_LOAD_FAILED.to_string());
                    }
                }
            }
            FetchResult::UserDetail { user_id, result } => {
                if self.dashboard.selected_user().map(|u| u.id) != Some(user_id) {
                    debug!(user_id, "Ignoring details for a user no longer selected");
                    return;
                }
                self.dashboard.detail_loading = false;
                match result {
                    Ok(user) => self.dashboard.detail = Some(user),
                    Err(e) => {
                        warn!(user_id, error = %e, "Failed to load user details");
                        self.status_message = Some(format!("Could not load user {}", user_id));
                    }
                }
            }
        }
    }
}

// ============================================================================
// Input validation helpers (exported for use in input.rs)
// ============================================================================

/// Check if a character is valid for input (no control characters)
fn is_valid_input_char(c: char) -> bool {
    !c.is_control()
}

/// Check if an email character should be accepted
pub fn can_add_email_char(current_len: usize, c: char) -> bool {
    current_len < MAX_EMAIL_LENGTH && is_valid_input_char(c) && !c.is_whitespace()
}

/// Check if a password character should be accepted
pub fn can_add_password_char(current_len: usize, c: char) -> bool {
    current_len < MAX_PASSWORD_LENGTH && is_valid_input_char(c)
}

// ============================================================================
// Tests
// ============================================================================

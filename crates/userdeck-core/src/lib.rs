//! Core library for userdeck.
//!
//! Everything that is not terminal rendering lives here:
//!
//! - `auth`: token storage, session expiry policy and the login service
//! - `api`: the REST client for the remote user directory
//! - `session`: process-wide authentication state
//! - `routes`: screen routing and the protected-route guard
//! - `config`: on-disk configuration with environment overrides
//! - `models`: wire types for the directory API

pub mod api;
pub mod auth;
pub mod clock;
pub mod config;
pub mod messages;
pub mod models;
pub mod routes;
pub mod session;

pub use api::{ApiClient, ApiError, SessionEvent};
pub use auth::{AuthService, SessionPolicy, TokenStore};
pub use config::Config;
pub use routes::{Navigator, Route, RouteGuard};
pub use session::{AuthStatus, LoginOutcome, SessionContext};

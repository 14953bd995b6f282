//! Authentication module for managing the login session.
//!
//! This module provides:
//! - `Storage`: durable key-value backends (`FileStorage`, `MemoryStorage`)
//! - `TokenStore`: the session token and its issuance time
//! - `SessionPolicy`: token validity with lazy expiry
//! - `AuthService`: login, logout and validity checks
//!
//! Sessions are persisted to disk and tokens expire 30 minutes after issue.

pub mod policy;
pub mod service;
pub mod storage;
pub mod store;

pub use policy::{SessionPolicy, TOKEN_EXPIRY_MINUTES};
pub use service::{AuthService, LoginSuccess, DEMO_EMAIL, DEMO_PASSWORD, DEMO_TOKEN_PREFIX};
pub use storage::{FileStorage, MemoryStorage, Storage};
pub use store::{TokenStore, TOKEN_KEY, TOKEN_TIMESTAMP_KEY};

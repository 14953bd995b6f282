//! REST API client module for the remote user directory.
//!
//! This module provides the `ApiClient` for logging in and fetching user
//! records. Requests carry the stored session token as a bearer credential;
//! a 401 from the server clears the token and emits `SessionEvent::Unauthorized`.

pub mod client;
pub mod error;

pub use client::{ApiClient, SessionEvent};
pub use error::{ApiError, ApiResult, ErrorKind};

//! Data models for the remote user directory.
//!
//! - `User`, `UserPage`, `UserDetail`: directory records
//! - `LoginRequest`, `LoginResponse`, `RegisterResponse`: auth payloads
//! - `ApiErrorBody`: the `{ "error": ... }` body returned on bad requests

pub mod auth;
pub mod user;

pub use auth::{ApiErrorBody, LoginRequest, LoginResponse, RegisterResponse};
pub use user::{User, UserDetail, UserPage};

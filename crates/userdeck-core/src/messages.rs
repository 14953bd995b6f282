//! User-facing messages shared by every front end.

pub const LOGIN_FAILED: &str = "Invalid email or password. Please try again.";
pub const LOGIN_FAILED_GENERIC: &str = "Login failed. Please try again.";
pub const NETWORK_ERROR: &str = "Unable to connect. Please check your internet connection.";
pub const SESSION_EXPIRED: &str = "Your session has expired. Please log in again.";
pub const DASHBOARD_LOAD_FAILED: &str = "Unable to load dashboard data. Please try again.";

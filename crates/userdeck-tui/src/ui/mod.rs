//! Terminal UI module using ratatui.
//!
//! - `render`: Frame layout, status bar and overlays
//! - `input`: Keyboard event handling
//! - `styles`: Color scheme and text styling
//! - `views`: Per-route screen rendering (login, dashboard)

pub mod input;
pub mod render;
pub mod styles;
pub mod views;

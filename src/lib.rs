//! Terminal client for a news article recommendation service.
//!
//! The binary in `main.rs` wires these modules together; they are exposed as
//! a library so the integration tests can drive a session against a mock
//! backend.

pub mod api;
pub mod app;
pub mod config;
pub mod keybindings;
pub mod session;
pub mod theme;
pub mod ui;
pub mod util;

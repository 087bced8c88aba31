//! Terminal User Interface module.
//!
//! This module provides the TUI for the recommendation client, including:
//! - Main event loop (`run`)
//! - Keyboard input dispatch
//! - Background task event processing
//! - Rendering for the recommendation list, mark-read card and history
//!
//! # Module Structure
//!
//! - `loop_runner` - Main event loop and terminal management
//! - `input` - Keyboard input handling
//! - `events` - Background task event processing
//! - `render` - Layout and render dispatch
//! - `recommendations` - Recommendation list and mark-read card widgets
//! - `history` - Reading history widget
//! - `status` - Status bar widget
//! - `help` - Keybinding overlay

mod events;
mod help;
mod history;
mod input;
mod loop_runner;
mod recommendations;
mod render;
mod status;

// Re-export the public API
pub use events::handle_app_event;
pub use input::handle_input;
pub use loop_runner::{run, Action};
pub use render::render;

//! Utility functions for common operations.
//!
//! - **URL validation**: backend origin checks and safe opening of article links
//! - **Text processing**: sanitizing backend text and fitting it to terminal width

mod link;
mod text;

pub use link::{validate_base_url, validate_url_for_open, UrlValidationError};
pub use text::{single_line, strip_control_chars, truncate_to_width};

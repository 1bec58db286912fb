//! HTTP request handlers organized by domain
//!
//! Each submodule contains handlers for a specific API area.

pub mod ai;
pub mod categories;
pub mod health;
pub mod insights;

// Re-export all handlers for use in router
pub use ai::*;
pub use categories::*;
pub use health::*;
pub use insights::*;

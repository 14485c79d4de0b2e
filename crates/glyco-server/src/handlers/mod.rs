//! HTTP request handlers organized by domain
//!
//! Each submodule contains handlers for a specific API area.

pub mod entries;
pub mod export;
pub mod health;
pub mod session;

// Re-export all handlers for use in router
pub use entries::*;
pub use export::*;
pub use health::*;
pub use session::*;

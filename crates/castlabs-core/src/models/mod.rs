//! Data models for the SDK
//!
//! Each sub-module represents one feature area of the platform.

mod encoding;
mod process;
mod repository;

// Re-export all models for convenient imports
pub use encoding::*;
pub use process::*;
pub use repository::*;

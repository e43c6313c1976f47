//! Subfeed Common Utilities
//!
//! Shared infrastructure for all subfeed crates:
//! - Error types and result aliases
//! - Time base helpers for the millisecond event clock
//! - Tracing/logging initialization
//! - Configuration loading

pub mod config;
pub mod error;
pub mod logging;
pub mod time;

pub use config::*;
pub use error::*;
pub use time::*;

//! AudioSweet Common Utilities
//!
//! Shared infrastructure for all AudioSweet crates:
//! - Error types and result aliases
//! - Timebase helpers (sample-period epsilon, split threshold, interval tests)
//! - Tracing/logging initialization
//! - Configuration loading and render settings

pub mod config;
pub mod error;
pub mod logging;
pub mod timebase;

pub use config::*;
pub use error::*;
pub use timebase::*;

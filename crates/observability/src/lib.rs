//! Tracing/logging setup shared by tollgate binaries.

/// Tracing configuration (filters, output format).
pub mod tracing;

pub use tracing::{LogFormat, init, init_with};

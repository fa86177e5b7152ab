//! `tollgate-core` — shared building blocks (errors, identifiers).
//!
//! This crate contains no I/O and no authorization policy.

pub mod error;
pub mod id;

pub use error::{CoreError, CoreResult};
pub use id::PrincipalId;

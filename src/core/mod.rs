//! Core Module
//!
//! Shared infrastructure: the database access layer and the error type every
//! part of the crate reports through.

pub mod db;
pub mod error;

// Re-export commonly used types for convenience
pub use error::{render_chain, AccessError, ErrorKind, Result, ResultExt};

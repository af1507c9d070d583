//! Common types and utilities shared across blinkdb.
//!
//! This module contains fundamental primitives used throughout the codebase:
//! - Configuration constants and options
//! - Error types
//! - Identifiers (RecordId)

pub mod config;
pub mod error;
mod record_id;

pub use config::{SearchOptions, StrictMode};
pub use error::{Error, Result};
pub use record_id::RecordId;

//! open-coder SDK
//!
//! Shared error taxonomy used by the engine and its integration tests.

/// Error types and handling
pub mod errors;

pub use errors::{EngineError, ErrorExt, ErrorPolicy};

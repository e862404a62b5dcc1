//! Pagetest Common Library
//!
//! Shared result types and errors used by the runner, the report emitters
//! and the CLI.

pub mod error;
pub mod types;

pub use error::{DecodeError, Error, Result, RunnerError};
pub use types::*;

/// Pagetest version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

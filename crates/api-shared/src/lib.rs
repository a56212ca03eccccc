//! # API Shared
//!
//! Shared utilities and definitions for the uploadimg APIs.
//!
//! Contains:
//! - Wire types for requests and responses (`types` module)
//! - Shared services like `HealthService`
//!
//! Used by `api-rest` and the CLI for common functionality.

pub mod health;
pub mod types;

pub use health::HealthService;
pub use types::*;

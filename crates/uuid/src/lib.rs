//! Unique name generation for stored uploads.
//!
//! When a caller does not supply a name, uploadimg stores the file under a generated one:
//!
//! `<unique id>_<shuffled alphabet>`
//!
//! Example:
//! `20260111T143522.045123Z-550e8400_hkqegnmfipjlo`
//!
//! - The *unique id* ([`UniqueId`]) is a UTC timestamp with microsecond precision followed by
//!   eight hex characters of entropy taken from a random (v4) UUID.
//! - The *shuffled alphabet* is the letters `e` through `q` in random order.
//!
//! Generated names contain only ASCII alphanumerics and `.`, `-`, `_`, so they are always safe
//! as file names.
//!
//! ## Uniqueness
//!
//! Names are practically unique, not guaranteed unique. Two uploads in the same microsecond
//! collide only if they also draw the same 32 bits of entropy and the same permutation.
//! Nothing checks the destination for an existing file.

mod service;

// Re-export public types
pub use service::{GeneratedName, UniqueId, NAME_ALPHABET};

/// Error type for unique id operations.
#[derive(Debug, thiserror::Error)]
pub enum UuidError {
    /// Invalid input provided
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type for unique id operations.
pub type UuidResult<T> = Result<T, UuidError>;

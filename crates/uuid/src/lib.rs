//! Record identity utilities.
//!
//! Every persisted clinical record (patient, pregnancy, lab request, ...) is addressed by a
//! [`RecordId`]. Identities are assigned by the record store at create time and are opaque to
//! the rest of the system.
//!
//! ## Canonical form
//! - Length: 32
//! - Characters: `0-9` and `a-f` only
//! - Example: `550e8400e29b41d4a716446655440000`
//!
//! This is the same value you would get from `Uuid::new_v4().simple().to_string()`.
//! Canonical form is *required* for externally supplied identifiers (for example, REST path
//! parameters or CLI arguments). Use [`RecordId::parse`] to validate an input string;
//! uppercase, hyphenated, wrong-length and non-hex values are rejected.

mod record_id;

pub use record_id::{RecordId, Uuid};

/// Error type for record identity operations.
#[derive(Debug, thiserror::Error)]
pub enum UuidError {
    /// Invalid input provided
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type for record identity operations.
pub type UuidResult<T> = Result<T, UuidError>;

//! Error taxonomy shared across the board engine.
//!
//! Every failure is surfaced to the caller; the core never retries and never
//! downgrades an error to a default value. The single documented leniency is
//! unparseable due dates during CSV import, which leave the field unset with
//! a warning (see `transfer`).

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Input rejected before any write (blank title, out-of-range priority,
    /// unparseable date, negative hours).
    #[error("validation failed: {0}")]
    Validation(String),

    /// Operation targeted a task id that does not exist.
    #[error("task {0} not found")]
    NotFound(u64),

    /// A proposed arrangement is not a permutation of the board snapshot:
    /// a task is missing, duplicated, or unknown.
    #[error("invalid arrangement: {0}")]
    InvalidArrangement(String),

    /// A task referenced by an arrangement was deleted since the snapshot
    /// was taken. The caller must reload the board and retry.
    #[error("stale arrangement: task {0} no longer exists")]
    StaleArrangement(u64),

    /// Malformed bulk input; the whole import is rejected, zero rows written.
    #[error("transfer failed: {0}")]
    Transfer(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// The store file exists but cannot be deserialized. Surfaced rather
    /// than silently starting fresh so no data is dropped.
    #[error("task store is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}

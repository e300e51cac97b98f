//! Error types for the reconciliation task.

use uuid::Uuid;

use hardstop_calendar::CalendarError;

/// Errors raised by the persistence collaborator.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The unit of work could not be serialized against concurrent writers
    /// (e.g. a row-lock acquisition timeout). The invocation's effects were
    /// discarded; the next scheduled firing retries.
    #[error("lock contention: {0}")]
    LockContention(String),

    /// The datastore is unreachable or failed outside of contention.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// A referenced record does not exist.
    #[error("record not found: {0}")]
    NotFound(Uuid),
}

/// Errors raised by one reconciliation invocation.
#[derive(Debug, thiserror::Error)]
pub enum ReconciliationError {
    /// The holiday calendar could not be consulted.
    #[error(transparent)]
    Calendar(#[from] CalendarError),

    /// The persistence collaborator failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ReconciliationError {
    /// True if the failure is contention that the next firing absorbs.
    #[must_use]
    pub const fn is_contention(&self) -> bool {
        matches!(self, Self::Store(StoreError::LockContention(_)))
    }
}

/// Result alias for reconciliation operations.
pub type Result<T> = std::result::Result<T, ReconciliationError>;

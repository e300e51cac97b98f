//! Error types for the calendar engine.

/// Errors raised by the bank holiday client, cache and calendar.
#[derive(Debug, thiserror::Error)]
pub enum CalendarError {
    /// The remote bank holiday feed could not be fetched or parsed.
    #[error("failed to fetch bank holidays: {0}")]
    Fetch(String),

    /// No holiday data is available: the fetch failed and nothing usable is
    /// cached. Callers must propagate this rather than assume an empty
    /// holiday set.
    #[error("bank holiday calendar unavailable: {0}")]
    Unavailable(String),
}

/// Result alias for calendar operations.
pub type Result<T> = std::result::Result<T, CalendarError>;

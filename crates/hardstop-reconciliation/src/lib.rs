//! Hard-stop licence reconciliation control loop.
//!
//! A background process that periodically re-evaluates pending hard-stop
//! cases against the working-day calendar and transitions both the case and
//! the associated licence through their terminal states:
//!
//! - [`domain`] — the licence and case records this subsystem touches;
//! - [`store`] — the persistence port (`select then mutate within one
//!   transaction`) plus an in-memory implementation;
//! - [`policy`] — the calendar-aware hard-stop window predicate;
//! - [`job`] — the reconciliation invocation body;
//! - [`runtime`] — timer registration (jittered interval + daily cache
//!   eviction) and graceful shutdown;
//! - [`config`] — environment-driven settings for both schedules.
//!
//! One invocation is one atomic unit of work: a failed commit leaves every
//! selected case `Pending` and every licence untouched, and the next firing
//! retries. Concurrent replicas may overlap; the store serializes conflicting
//! commits and inactivation is idempotent, so at-least-once execution is safe.

pub mod config;
pub mod domain;
pub mod error;
pub mod job;
pub mod policy;
pub mod runtime;
pub mod store;

pub use config::{ConfigError, ReconciliationConfig};
pub use domain::{
    CaseStatus, Licence, LicenceHistoryEntry, LicenceKind, LicenceStatus, PotentialHardStopCase,
};
pub use error::{ReconciliationError, Result, StoreError};
pub use job::{
    HardStopReconciliationJob, ReconciliationStats, DEFAULT_CASE_AGE_THRESHOLD_HOURS,
    INACTIVATION_REASON,
};
pub use policy::{CalendarHardStopPolicy, HardStopPolicy, DEFAULT_WINDOW_WORKING_DAYS};
pub use runtime::{next_daily_occurrence, ReconciliationRuntime};
pub use store::{
    InMemoryReconciliationStore, PendingCase, ReconciliationOutcome, ReconciliationStore,
};

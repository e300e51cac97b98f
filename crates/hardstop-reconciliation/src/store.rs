//! Persistence port for the reconciliation task.
//!
//! The real datastore lives in the surrounding case-management service; this
//! subsystem only depends on the trait below. The contract encodes the
//! "select then mutate within one transaction" discipline: selection is a
//! read, and the whole outcome of an invocation is applied by a single atomic
//! [`commit`] that either lands completely or not at all.
//!
//! [`commit`]: ReconciliationStore::commit

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::{CaseStatus, Licence, LicenceHistoryEntry, LicenceStatus, PotentialHardStopCase};
use crate::error::StoreError;

/// A selected case joined with its licence.
#[derive(Debug, Clone)]
pub struct PendingCase {
    /// The pending case record.
    pub case: PotentialHardStopCase,
    /// The licence the case refers to.
    pub licence: Licence,
}

/// The full effect of one reconciliation invocation.
#[derive(Debug, Clone, Default)]
pub struct ReconciliationOutcome {
    /// Cases to move to `Processed`.
    pub processed_case_ids: Vec<Uuid>,
    /// Licences to move to `Inactive`, each with one history entry.
    pub inactivated_licence_ids: Vec<Uuid>,
    /// Reason tag recorded on every history entry.
    pub reason: String,
}

impl ReconciliationOutcome {
    /// An outcome with no effects and the given reason tag.
    #[must_use]
    pub fn with_reason(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
            ..Self::default()
        }
    }

    /// True if committing this outcome would change nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.processed_case_ids.is_empty() && self.inactivated_licence_ids.is_empty()
    }
}

/// Storage backend for cases and licences.
///
/// Concurrent task replicas may select the same pending cases; the store's
/// own locking serializes conflicting commits, and inactivation is idempotent
/// (an already-inactive licence is a no-op), so at-least-once execution is
/// safe.
#[async_trait::async_trait]
pub trait ReconciliationStore: Send + Sync {
    /// All cases with `status = Pending` created strictly before `cutoff`.
    ///
    /// Order is whatever the underlying selection returns; no sort is
    /// guaranteed beyond the filter.
    async fn find_pending_older_than(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<PendingCase>, StoreError>;

    /// Apply the outcome atomically.
    ///
    /// Every listed case becomes `Processed` and every listed licence becomes
    /// `Inactive` with one [`LicenceHistoryEntry`] carrying the reason tag.
    /// On [`StoreError::LockContention`] (or any error) no effect is visible.
    async fn commit(&self, outcome: &ReconciliationOutcome) -> Result<(), StoreError>;
}

/// In-memory store used by tests and by embedders without a datastore.
///
/// Commit failure can be injected to exercise the rollback path.
#[derive(Debug, Default)]
pub struct InMemoryReconciliationStore {
    cases: Arc<RwLock<HashMap<Uuid, PotentialHardStopCase>>>,
    licences: Arc<RwLock<HashMap<Uuid, Licence>>>,
    history: Arc<RwLock<Vec<LicenceHistoryEntry>>>,
    fail_next_commit: AtomicBool,
}

impl InMemoryReconciliationStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a licence.
    pub async fn put_licence(&self, licence: Licence) {
        self.licences.write().await.insert(licence.id, licence);
    }

    /// Insert or replace a case.
    pub async fn put_case(&self, case: PotentialHardStopCase) {
        self.cases.write().await.insert(case.id, case);
    }

    /// Read a licence back.
    pub async fn licence(&self, id: Uuid) -> Option<Licence> {
        self.licences.read().await.get(&id).cloned()
    }

    /// Read a case back.
    pub async fn case(&self, id: Uuid) -> Option<PotentialHardStopCase> {
        self.cases.read().await.get(&id).cloned()
    }

    /// All recorded history entries, oldest first.
    pub async fn history(&self) -> Vec<LicenceHistoryEntry> {
        self.history.read().await.clone()
    }

    /// Make the next `commit` fail with lock contention, leaving the store
    /// untouched.
    pub fn fail_next_commit(&self) {
        self.fail_next_commit.store(true, Ordering::SeqCst);
    }
}

#[async_trait::async_trait]
impl ReconciliationStore for InMemoryReconciliationStore {
    async fn find_pending_older_than(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<PendingCase>, StoreError> {
        let cases = self.cases.read().await;
        let licences = self.licences.read().await;

        let mut selected = Vec::new();
        for case in cases.values() {
            if !case.is_pending() || case.date_created >= cutoff {
                continue;
            }
            let licence = licences
                .get(&case.licence_id)
                .cloned()
                .ok_or(StoreError::NotFound(case.licence_id))?;
            selected.push(PendingCase {
                case: case.clone(),
                licence,
            });
        }
        Ok(selected)
    }

    async fn commit(&self, outcome: &ReconciliationOutcome) -> Result<(), StoreError> {
        // Both maps stay locked for the whole commit, so readers never see a
        // half-applied outcome.
        let mut cases = self.cases.write().await;
        let mut licences = self.licences.write().await;
        let mut history = self.history.write().await;

        if self.fail_next_commit.swap(false, Ordering::SeqCst) {
            return Err(StoreError::LockContention(
                "timeout acquiring row lock".to_string(),
            ));
        }

        // Validate before mutating; a bad id rolls back the whole outcome.
        for licence_id in &outcome.inactivated_licence_ids {
            if !licences.contains_key(licence_id) {
                return Err(StoreError::NotFound(*licence_id));
            }
        }
        for case_id in &outcome.processed_case_ids {
            if !cases.contains_key(case_id) {
                return Err(StoreError::NotFound(*case_id));
            }
        }

        let now = Utc::now();
        for licence_id in &outcome.inactivated_licence_ids {
            if let Some(licence) = licences.get_mut(licence_id) {
                // Inactivating an already-inactive licence is a no-op.
                if licence.is_inactive() {
                    continue;
                }
                licence.status_code = LicenceStatus::Inactive;
                history.push(LicenceHistoryEntry {
                    licence_id: *licence_id,
                    status_code: LicenceStatus::Inactive,
                    reason: outcome.reason.clone(),
                    recorded_at: now,
                });
            }
        }

        for case_id in &outcome.processed_case_ids {
            if let Some(case) = cases.get_mut(case_id) {
                if case.status == CaseStatus::Pending {
                    case.mark_processed();
                }
            }
        }

        Ok(())
    }
}

//! Hard-stop reconciliation job.
//!
//! Periodically re-evaluates pending cases against the hard-stop window and
//! transitions both the case and the associated licence through their
//! terminal states. One invocation is one unit of work: the whole outcome is
//! committed atomically or not at all, and failed runs leave every selected
//! case pending for the next firing.

use std::sync::Arc;

use chrono::{Duration, Utc};
use tracing::{debug, info, instrument};

use crate::error::Result;
use crate::policy::HardStopPolicy;
use crate::store::{ReconciliationOutcome, ReconciliationStore};

/// Default minimum age of a case before it is reconciled, in hours.
pub const DEFAULT_CASE_AGE_THRESHOLD_HOURS: i64 = 8;

/// Reason tag recorded on licences inactivated by this job.
pub const INACTIVATION_REASON: &str = "hard stop window expired";

/// Counters from one reconciliation invocation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconciliationStats {
    /// Cases selected for this invocation.
    pub selected: usize,
    /// Licences moved to `Inactive`.
    pub inactivated: usize,
    /// Cases moved to `Processed`.
    pub processed: usize,
}

/// The reconciliation control loop body.
pub struct HardStopReconciliationJob {
    store: Arc<dyn ReconciliationStore>,
    policy: Arc<dyn HardStopPolicy>,
    case_age_threshold: Duration,
}

impl HardStopReconciliationJob {
    /// Create a job with the default age threshold.
    #[must_use]
    pub fn new(store: Arc<dyn ReconciliationStore>, policy: Arc<dyn HardStopPolicy>) -> Self {
        Self {
            store,
            policy,
            case_age_threshold: Duration::hours(DEFAULT_CASE_AGE_THRESHOLD_HOURS),
        }
    }

    /// Override the minimum case age.
    #[must_use]
    pub fn with_case_age_threshold(mut self, threshold: Duration) -> Self {
        self.case_age_threshold = threshold;
        self
    }

    /// Run a single reconciliation invocation.
    ///
    /// Selects every pending case older than the threshold, evaluates the
    /// hard-stop window for each licence sequentially, and commits the whole
    /// outcome in one atomic unit of work.
    ///
    /// # Errors
    ///
    /// Any calendar or store failure aborts the invocation before anything is
    /// committed; every selected case stays pending. The caller logs and
    /// relies on the next scheduled firing.
    #[instrument(skip(self))]
    pub async fn run_once(&self) -> Result<ReconciliationStats> {
        let cutoff = Utc::now() - self.case_age_threshold;
        let pending = self.store.find_pending_older_than(cutoff).await?;

        if pending.is_empty() {
            debug!("no pending hard-stop cases to reconcile");
            return Ok(ReconciliationStats::default());
        }

        let today = Utc::now().date_naive();
        let mut outcome = ReconciliationOutcome::with_reason(INACTIVATION_REASON);

        for entry in &pending {
            // Terminal licences are never transitioned again; the case is
            // still closed so it stops being selected.
            if !entry.licence.is_inactive() {
                let in_window = self
                    .policy
                    .in_hard_stop_period(&entry.licence, today)
                    .await?;
                if !in_window {
                    outcome.inactivated_licence_ids.push(entry.licence.id);
                }
            }
            outcome.processed_case_ids.push(entry.case.id);
        }

        self.store.commit(&outcome).await?;

        let stats = ReconciliationStats {
            selected: pending.len(),
            inactivated: outcome.inactivated_licence_ids.len(),
            processed: outcome.processed_case_ids.len(),
        };

        info!(
            selected = stats.selected,
            inactivated = stats.inactivated,
            processed = stats.processed,
            "reconciled hard-stop cases"
        );

        Ok(stats)
    }
}

impl std::fmt::Debug for HardStopReconciliationJob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HardStopReconciliationJob")
            .field("case_age_threshold", &self.case_age_threshold)
            .finish()
    }
}

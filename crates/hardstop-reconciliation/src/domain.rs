//! Domain records touched by the reconciliation task.
//!
//! The surrounding case-management system creates and mutates these records;
//! this subsystem only ever moves a licence toward `Inactive` and a case from
//! `Pending` to `Processed`.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Licence variants. Only some of them are subject to the hard-stop path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LicenceKind {
    /// Standard conditional-release licence.
    Crd,
    /// Licence created through the expedited hard-stop path.
    HardStop,
    /// Home-detention-curfew licence.
    Hdc,
    /// Variation of an existing licence.
    Variation,
}

impl LicenceKind {
    /// True for kinds that the hard-stop window applies to.
    #[must_use]
    pub const fn is_hard_stop_eligible(self) -> bool {
        matches!(self, Self::HardStop | Self::Hdc)
    }
}

/// Licence status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LicenceStatus {
    /// Being drafted.
    InProgress,
    /// Submitted for approval.
    Submitted,
    /// Approved, not yet in force.
    Approved,
    /// In force.
    Active,
    /// Terminal for this subsystem; never transitioned further here.
    Inactive,
}

/// A licence record, as far as this subsystem reads it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Licence {
    /// Licence identifier.
    pub id: Uuid,
    /// The date the licence comes into force, if known.
    pub licence_start_date: Option<NaiveDate>,
    /// Licence variant.
    pub kind: LicenceKind,
    /// Current status code.
    pub status_code: LicenceStatus,
}

impl Licence {
    /// True once the licence has reached its terminal status.
    #[must_use]
    pub fn is_inactive(&self) -> bool {
        self.status_code == LicenceStatus::Inactive
    }
}

/// Status of a potential hard-stop case. Monotonic: `Pending → Processed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CaseStatus {
    /// Awaiting reconciliation.
    Pending,
    /// Reconciled; terminal.
    Processed,
}

/// A pending record flagging a licence for reconciliation against the
/// hard-stop window. Created externally when a licence enters a potential
/// hard-stop condition; terminally updated only by the reconciliation task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PotentialHardStopCase {
    /// Case identifier.
    pub id: Uuid,
    /// The single licence this case refers to.
    pub licence_id: Uuid,
    /// Case status.
    pub status: CaseStatus,
    /// When the case was created.
    pub date_created: DateTime<Utc>,
}

impl PotentialHardStopCase {
    /// Create a new pending case for a licence.
    #[must_use]
    pub fn new(licence_id: Uuid, date_created: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            licence_id,
            status: CaseStatus::Pending,
            date_created,
        }
    }

    /// Move the case to its terminal status. Already-processed cases stay
    /// processed; the transition is never reversed.
    pub fn mark_processed(&mut self) {
        self.status = CaseStatus::Processed;
    }

    /// True while the case awaits reconciliation.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.status == CaseStatus::Pending
    }
}

/// Audit entry recorded when a licence is inactivated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LicenceHistoryEntry {
    /// The licence that changed.
    pub licence_id: Uuid,
    /// The status the licence moved to.
    pub status_code: LicenceStatus,
    /// Why the transition happened.
    pub reason: String,
    /// When the transition was recorded.
    pub recorded_at: DateTime<Utc>,
}

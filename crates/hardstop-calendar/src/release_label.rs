//! Release-date label resolution.
//!
//! A licence carries up to four candidate release dates. Exactly one of them
//! governs the calendar computation, and the label identifies which rule won.
//! The precedence is strict: confirmed > HDC > PRRD-derived > default, with
//! the confirmed-date equality checked first so that a confirmed date
//! coinciding with an HDC or PRRD-derived date still wins.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::working_days::WorkingDaysCalendar;

/// Which release-date rule governs a licence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReleaseDateLabel {
    /// The explicitly confirmed release date.
    ConfirmedReleaseDate,
    /// The home-detention-curfew release date.
    HdcReleaseDate,
    /// The post-recall release date, via its last-working-day derivation.
    PrrdReleaseDate,
    /// The default release date.
    DefaultReleaseDate,
}

impl std::fmt::Display for ReleaseDateLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::ConfirmedReleaseDate => "confirmed release date",
            Self::HdcReleaseDate => "HDC release date",
            Self::PrrdReleaseDate => "PRRD release date",
            Self::DefaultReleaseDate => "default release date",
        };
        f.write_str(s)
    }
}

/// Candidate release dates for a single licence. All optional.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateReleaseDates {
    /// The default release date.
    pub release_date: Option<NaiveDate>,
    /// An explicitly confirmed release date.
    pub confirmed_release_date: Option<NaiveDate>,
    /// Post-recall release date (PRRD), present for recalled cases.
    pub post_recall_release_date: Option<NaiveDate>,
    /// Home-detention-curfew actual release date.
    pub hdc_actual_date: Option<NaiveDate>,
}

impl CandidateReleaseDates {
    fn is_empty(&self) -> bool {
        self.release_date.is_none()
            && self.confirmed_release_date.is_none()
            && self.post_recall_release_date.is_none()
            && self.hdc_actual_date.is_none()
    }
}

/// Picks the governing release-date label for a set of candidates.
#[derive(Debug, Clone)]
pub struct ReleaseDateLabelResolver {
    calendar: WorkingDaysCalendar,
}

impl ReleaseDateLabelResolver {
    /// Create a resolver over the given calendar.
    #[must_use]
    pub fn new(calendar: WorkingDaysCalendar) -> Self {
        Self { calendar }
    }

    /// Resolve which rule governs. First match wins:
    ///
    /// 1. no dates at all → default;
    /// 2. confirmed date present and equal to the default → confirmed;
    /// 3. HDC date present → HDC;
    /// 4. PRRD present and the default equals the last working day before the
    ///    PRRD → PRRD;
    /// 5. otherwise → default.
    ///
    /// # Errors
    ///
    /// Returns [`CalendarError::Unavailable`] only when a PRRD is present and
    /// the holiday calendar cannot be consulted.
    ///
    /// [`CalendarError::Unavailable`]: crate::error::CalendarError::Unavailable
    pub async fn resolve(&self, dates: &CandidateReleaseDates) -> Result<ReleaseDateLabel> {
        if dates.is_empty() {
            return Ok(ReleaseDateLabel::DefaultReleaseDate);
        }

        if let Some(confirmed) = dates.confirmed_release_date {
            if dates.release_date == Some(confirmed) {
                return Ok(ReleaseDateLabel::ConfirmedReleaseDate);
            }
        }

        if dates.hdc_actual_date.is_some() {
            return Ok(ReleaseDateLabel::HdcReleaseDate);
        }

        if let Some(prrd) = dates.post_recall_release_date {
            let derived = self.calendar.last_working_day_before(prrd).await?;
            if dates.release_date == Some(derived) {
                return Ok(ReleaseDateLabel::PrrdReleaseDate);
            }
        }

        Ok(ReleaseDateLabel::DefaultReleaseDate)
    }
}

//! Hard-stop window predicate.
//!
//! The hard-stop period is the stretch immediately before a licence's start
//! date during which standard processing is suspended in favour of the
//! expedited path. The predicate is a pure function of licence state and the
//! holiday calendar, so re-evaluating it across retries with identical input
//! yields identical output.

use chrono::NaiveDate;

use hardstop_calendar::{CalendarError, WorkingDaysCalendar};

use crate::domain::Licence;
use crate::error::Result;

/// Default number of working days the window spans before the start date.
pub const DEFAULT_WINDOW_WORKING_DAYS: u32 = 2;

/// Boolean contract: is the licence still within its hard-stop window?
#[async_trait::async_trait]
pub trait HardStopPolicy: Send + Sync {
    /// Evaluate the window for `licence` as of `on`.
    ///
    /// Must be safe to recompute repeatedly; failed reconciliation runs leave
    /// cases pending and re-ask the same question next firing.
    async fn in_hard_stop_period(&self, licence: &Licence, on: NaiveDate) -> Result<bool>;
}

/// Calendar-aware window policy.
///
/// The window opens `window_working_days` working days before the licence
/// start date and closes at the end of the start date. Ineligible kinds and
/// licences without a start date are never in the window.
#[derive(Debug, Clone)]
pub struct CalendarHardStopPolicy {
    calendar: WorkingDaysCalendar,
    window_working_days: u32,
}

impl CalendarHardStopPolicy {
    /// Create a policy with the default window length.
    #[must_use]
    pub fn new(calendar: WorkingDaysCalendar) -> Self {
        Self {
            calendar,
            window_working_days: DEFAULT_WINDOW_WORKING_DAYS,
        }
    }

    /// Override the window length in working days.
    #[must_use]
    pub fn with_window_working_days(mut self, days: u32) -> Self {
        self.window_working_days = days;
        self
    }

    async fn window_start(&self, licence_start: NaiveDate) -> Result<NaiveDate> {
        if self.window_working_days == 0 {
            return Ok(licence_start);
        }
        let nth = (self.window_working_days - 1) as usize;
        self.calendar
            .working_days_before(licence_start)
            .await?
            .nth(nth)
            .ok_or_else(|| {
                CalendarError::Unavailable(format!(
                    "no working day exists {} days before {licence_start}",
                    self.window_working_days
                ))
                .into()
            })
    }
}

#[async_trait::async_trait]
impl HardStopPolicy for CalendarHardStopPolicy {
    async fn in_hard_stop_period(&self, licence: &Licence, on: NaiveDate) -> Result<bool> {
        if !licence.kind.is_hard_stop_eligible() {
            return Ok(false);
        }
        let Some(start) = licence.licence_start_date else {
            return Ok(false);
        };
        if on > start {
            // The start date has passed; the window is over.
            return Ok(false);
        }

        let opens = self.window_start(start).await?;
        Ok(on >= opens)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;
    use std::sync::Arc;

    use uuid::Uuid;

    use hardstop_calendar::{BankHolidayCache, HolidaySource};

    use super::*;
    use crate::domain::{LicenceKind, LicenceStatus};

    struct StaticSource(BTreeSet<NaiveDate>);

    #[async_trait::async_trait]
    impl HolidaySource for StaticSource {
        async fn fetch_holidays(&self) -> hardstop_calendar::Result<BTreeSet<NaiveDate>> {
            Ok(self.0.clone())
        }
    }

    struct FailingSource;

    #[async_trait::async_trait]
    impl HolidaySource for FailingSource {
        async fn fetch_holidays(&self) -> hardstop_calendar::Result<BTreeSet<NaiveDate>> {
            Err(CalendarError::Fetch("down".to_string()))
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn policy(holidays: impl IntoIterator<Item = NaiveDate>) -> CalendarHardStopPolicy {
        let source = Arc::new(StaticSource(holidays.into_iter().collect()));
        let calendar = WorkingDaysCalendar::new(Arc::new(BankHolidayCache::new(source)));
        CalendarHardStopPolicy::new(calendar)
    }

    fn licence(kind: LicenceKind, start: Option<NaiveDate>) -> Licence {
        Licence {
            id: Uuid::new_v4(),
            licence_start_date: start,
            kind,
            status_code: LicenceStatus::Submitted,
        }
    }

    #[tokio::test]
    async fn test_window_brackets_the_start_date() {
        // Start Friday 2026-09-04; two working days back opens Wednesday.
        let lic = licence(LicenceKind::HardStop, Some(date(2026, 9, 4)));
        let policy = policy([]);

        assert!(!policy
            .in_hard_stop_period(&lic, date(2026, 9, 1))
            .await
            .unwrap());
        assert!(policy
            .in_hard_stop_period(&lic, date(2026, 9, 2))
            .await
            .unwrap());
        assert!(policy
            .in_hard_stop_period(&lic, date(2026, 9, 4))
            .await
            .unwrap());
        assert!(!policy
            .in_hard_stop_period(&lic, date(2026, 9, 5))
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_window_start_skips_weekends_and_holidays() {
        // Start Tuesday 2026-09-01 with Monday 2026-08-31 a bank holiday:
        // working days before are Fri 28, Thu 27, so the window opens Thursday.
        let lic = licence(LicenceKind::HardStop, Some(date(2026, 9, 1)));
        let policy = policy([date(2026, 8, 31)]);

        assert!(policy
            .in_hard_stop_period(&lic, date(2026, 8, 27))
            .await
            .unwrap());
        assert!(!policy
            .in_hard_stop_period(&lic, date(2026, 8, 26))
            .await
            .unwrap());
        // Weekend days inside the bracket still count as within the window.
        assert!(policy
            .in_hard_stop_period(&lic, date(2026, 8, 29))
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_ineligible_kind_is_never_in_window() {
        let lic = licence(LicenceKind::Crd, Some(date(2026, 9, 4)));
        // A failing source proves the calendar is not consulted.
        let calendar = WorkingDaysCalendar::new(Arc::new(BankHolidayCache::new(Arc::new(
            FailingSource,
        ))));
        let policy = CalendarHardStopPolicy::new(calendar);

        assert!(!policy
            .in_hard_stop_period(&lic, date(2026, 9, 3))
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_missing_start_date_is_never_in_window() {
        let lic = licence(LicenceKind::HardStop, None);
        assert!(!policy([])
            .in_hard_stop_period(&lic, date(2026, 9, 3))
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_calendar_outage_propagates() {
        let lic = licence(LicenceKind::HardStop, Some(date(2026, 9, 4)));
        let calendar = WorkingDaysCalendar::new(Arc::new(BankHolidayCache::new(Arc::new(
            FailingSource,
        ))));
        let policy = CalendarHardStopPolicy::new(calendar);

        let err = policy
            .in_hard_stop_period(&lic, date(2026, 9, 3))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            crate::error::ReconciliationError::Calendar(CalendarError::Unavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_zero_length_window_is_the_start_date_only() {
        let lic = licence(LicenceKind::Hdc, Some(date(2026, 9, 4)));
        let policy = policy([]).with_window_working_days(0);

        assert!(policy
            .in_hard_stop_period(&lic, date(2026, 9, 4))
            .await
            .unwrap());
        assert!(!policy
            .in_hard_stop_period(&lic, date(2026, 9, 3))
            .await
            .unwrap());
    }
}

//! Working-day predicates and business-day sequences.
//!
//! A working day is a calendar day that is neither a weekend day nor a
//! bank holiday. Sequence producers hand out lazy, unbounded iterators over a
//! holiday-set snapshot: callers bound consumption themselves with `take`,
//! `find` or `nth`. Nothing is materialized eagerly.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{Datelike, NaiveDate, Weekday};

use crate::cache::BankHolidayCache;
use crate::error::{CalendarError, Result};

/// True if the date falls on a Saturday or Sunday.
#[must_use]
pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Direction of a [`WorkingDays`] sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Forward,
    Backward,
}

/// Lazy, unbounded sequence of working days.
///
/// Produced by [`WorkingDaysCalendar::working_days_after`] and
/// [`WorkingDaysCalendar::working_days_before`]. Each element is a working
/// day strictly beyond the starting date, in ascending or descending order.
/// The sequence only ends at the bounds of the chrono date range, which no
/// realistic caller reaches. `Clone` restarts nothing: a clone continues from
/// the same cursor; call the producer again for a fresh sequence.
#[derive(Debug, Clone)]
pub struct WorkingDays {
    cursor: NaiveDate,
    direction: Direction,
    holidays: Arc<BTreeSet<NaiveDate>>,
}

impl Iterator for WorkingDays {
    type Item = NaiveDate;

    fn next(&mut self) -> Option<NaiveDate> {
        loop {
            self.cursor = match self.direction {
                Direction::Forward => self.cursor.succ_opt()?,
                Direction::Backward => self.cursor.pred_opt()?,
            };
            if !is_weekend(self.cursor) && !self.holidays.contains(&self.cursor) {
                return Some(self.cursor);
            }
        }
    }
}

/// Calendar engine composing weekend rules with the cached holiday set.
///
/// Reads, but never writes, the holiday cache; a cache miss triggers a fetch
/// through the configured source before the answer is produced.
#[derive(Debug, Clone)]
pub struct WorkingDaysCalendar {
    cache: Arc<BankHolidayCache>,
}

impl WorkingDaysCalendar {
    /// Create a calendar over the given holiday cache.
    #[must_use]
    pub fn new(cache: Arc<BankHolidayCache>) -> Self {
        Self { cache }
    }

    /// True if the date is a weekend day or a bank holiday.
    ///
    /// # Errors
    ///
    /// Returns [`CalendarError::Unavailable`] if no holiday data can be
    /// obtained.
    pub async fn is_non_working_day(&self, date: NaiveDate) -> Result<bool> {
        if is_weekend(date) {
            return Ok(true);
        }
        let holidays = self.cache.get_or_fetch().await?;
        Ok(holidays.contains(&date))
    }

    /// Working days strictly after `date`, ascending.
    ///
    /// # Errors
    ///
    /// Returns [`CalendarError::Unavailable`] if no holiday data can be
    /// obtained.
    pub async fn working_days_after(&self, date: NaiveDate) -> Result<WorkingDays> {
        Ok(WorkingDays {
            cursor: date,
            direction: Direction::Forward,
            holidays: self.cache.get_or_fetch().await?,
        })
    }

    /// Working days strictly before `date`, descending.
    ///
    /// # Errors
    ///
    /// Returns [`CalendarError::Unavailable`] if no holiday data can be
    /// obtained.
    pub async fn working_days_before(&self, date: NaiveDate) -> Result<WorkingDays> {
        Ok(WorkingDays {
            cursor: date,
            direction: Direction::Backward,
            holidays: self.cache.get_or_fetch().await?,
        })
    }

    /// The nearest working day strictly before `date`.
    ///
    /// Always excludes `date` itself, whether or not `date` is a working day.
    ///
    /// # Errors
    ///
    /// Returns [`CalendarError::Unavailable`] if no holiday data can be
    /// obtained, or if the date range is exhausted before a working day is
    /// found.
    pub async fn last_working_day_before(&self, date: NaiveDate) -> Result<NaiveDate> {
        self.working_days_before(date).await?.next().ok_or_else(|| {
            CalendarError::Unavailable(format!("no working day exists before {date}"))
        })
    }
}

//! Working-day calendar engine for the hard-stop reconciliation subsystem.
//!
//! This crate answers business-day questions against the UK bank holiday
//! register:
//!
//! - [`client::BankHolidayClient`] fetches the authoritative holiday list for
//!   one jurisdiction;
//! - [`cache::BankHolidayCache`] holds the most recent list process-wide,
//!   populated on miss and cleared only by the daily eviction timer;
//! - [`working_days::WorkingDaysCalendar`] classifies dates and produces lazy
//!   business-day sequences;
//! - [`release_label::ReleaseDateLabelResolver`] picks which candidate
//!   release date governs a licence.
//!
//! Holiday data is never guessed: if the feed is unreachable and nothing is
//! cached, every dependent computation fails with
//! [`error::CalendarError::Unavailable`].

pub mod cache;
pub mod client;
pub mod error;
pub mod release_label;
pub mod working_days;

pub use cache::{BankHolidayCache, BANK_HOLIDAY_CACHE};
pub use client::{
    BankHolidayClient, BankHolidayEvent, Division, HolidaySource, DEFAULT_BANK_HOLIDAY_URL,
};
pub use error::{CalendarError, Result};
pub use release_label::{CandidateReleaseDates, ReleaseDateLabel, ReleaseDateLabelResolver};
pub use working_days::{is_weekend, WorkingDays, WorkingDaysCalendar};

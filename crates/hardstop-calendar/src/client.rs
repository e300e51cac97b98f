//! GOV.UK bank holiday feed client.
//!
//! Fetches the authoritative list of non-working dates from the public
//! `bank-holidays.json` register and reduces it to an ordered date set for a
//! single jurisdiction. The feed is always replaced wholesale, never merged.

use std::collections::{BTreeSet, HashMap};
use std::time::Duration;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{CalendarError, Result};

/// Default endpoint of the UK bank holiday register.
pub const DEFAULT_BANK_HOLIDAY_URL: &str = "https://www.gov.uk/bank-holidays.json";

/// Jurisdiction division within the bank holiday register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Division {
    /// England and Wales (default).
    #[default]
    EnglandAndWales,
    /// Scotland.
    Scotland,
    /// Northern Ireland.
    NorthernIreland,
}

impl Division {
    /// Key of this division in the feed's top-level map.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::EnglandAndWales => "england-and-wales",
            Self::Scotland => "scotland",
            Self::NorthernIreland => "northern-ireland",
        }
    }
}

impl std::str::FromStr for Division {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "england-and-wales" => Ok(Self::EnglandAndWales),
            "scotland" => Ok(Self::Scotland),
            "northern-ireland" => Ok(Self::NorthernIreland),
            _ => Err(format!("unknown bank holiday division: {s}")),
        }
    }
}

impl std::fmt::Display for Division {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single event in the bank holiday register.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BankHolidayEvent {
    /// Human-readable holiday name.
    pub title: String,
    /// The calendar date of the holiday.
    pub date: NaiveDate,
    /// Free-text notes (e.g. "substitute day").
    #[serde(default)]
    pub notes: String,
    /// Whether bunting is flown.
    #[serde(default)]
    pub bunting: bool,
}

/// Events for one division of the register.
#[derive(Debug, Clone, Deserialize)]
pub struct DivisionCalendar {
    /// Division key, echoed by the feed.
    pub division: String,
    /// All published events for the division.
    pub events: Vec<BankHolidayEvent>,
}

/// Source of the authoritative holiday date set.
///
/// This is the documented population source for [`BankHolidayCache`]: the
/// cache calls `fetch_holidays` on a miss and stores whatever it returns.
///
/// [`BankHolidayCache`]: crate::cache::BankHolidayCache
#[async_trait::async_trait]
pub trait HolidaySource: Send + Sync {
    /// Fetch the full, ordered holiday date set.
    ///
    /// # Errors
    ///
    /// Returns [`CalendarError::Fetch`] if the source cannot produce a list;
    /// there is no partial result.
    async fn fetch_holidays(&self) -> Result<BTreeSet<NaiveDate>>;
}

/// HTTP client for the GOV.UK bank holiday register.
#[derive(Debug, Clone)]
pub struct BankHolidayClient {
    url: String,
    division: Division,
    http_client: reqwest::Client,
}

impl BankHolidayClient {
    /// Create a client against the given feed URL.
    ///
    /// # Errors
    ///
    /// Returns [`CalendarError::Fetch`] if the HTTP client cannot be built.
    pub fn new(url: impl Into<String>, division: Division) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| CalendarError::Fetch(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            url: url.into(),
            division,
            http_client,
        })
    }

    /// Create a client against the public GOV.UK register.
    ///
    /// # Errors
    ///
    /// Returns [`CalendarError::Fetch`] if the HTTP client cannot be built.
    pub fn with_default_url(division: Division) -> Result<Self> {
        Self::new(DEFAULT_BANK_HOLIDAY_URL, division)
    }

    /// The division this client selects from the feed.
    #[must_use]
    pub const fn division(&self) -> Division {
        self.division
    }
}

#[async_trait::async_trait]
impl HolidaySource for BankHolidayClient {
    async fn fetch_holidays(&self) -> Result<BTreeSet<NaiveDate>> {
        let response = self
            .http_client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| CalendarError::Fetch(format!("request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(CalendarError::Fetch(format!(
                "HTTP {}: {}",
                response.status(),
                response.status().canonical_reason().unwrap_or("Unknown")
            )));
        }

        let feed: HashMap<String, DivisionCalendar> = response
            .json()
            .await
            .map_err(|e| CalendarError::Fetch(format!("invalid JSON: {e}")))?;

        let calendar = feed.get(self.division.as_str()).ok_or_else(|| {
            CalendarError::Fetch(format!("division {} missing from feed", self.division))
        })?;

        tracing::debug!(
            division = %self.division,
            events = calendar.events.len(),
            "fetched bank holiday feed"
        );

        Ok(calendar.events.iter().map(|e| e.date).collect())
    }
}

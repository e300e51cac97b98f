//! Process-wide bank holiday cache.
//!
//! Holds the most recent holiday date set under a single well-known cache
//! name. The cache has no per-entry expiry: it is populated on miss through
//! the configured [`HolidaySource`] and discarded only by [`clear`], which the
//! daily eviction timer calls on its own schedule.
//!
//! [`clear`]: BankHolidayCache::clear

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::NaiveDate;
use tokio::sync::RwLock;

use crate::client::HolidaySource;
use crate::error::{CalendarError, Result};

/// Well-known name of the holiday cache, used in log fields.
pub const BANK_HOLIDAY_CACHE: &str = "bank-holidays";

/// Cache over the authoritative holiday date set.
///
/// Readers share an `Arc` snapshot of the set; population replaces the whole
/// set atomically, so no partial state is ever observable.
pub struct BankHolidayCache {
    source: Arc<dyn HolidaySource>,
    holidays: RwLock<Option<Arc<BTreeSet<NaiveDate>>>>,
}

impl BankHolidayCache {
    /// Create an empty cache over the given population source.
    #[must_use]
    pub fn new(source: Arc<dyn HolidaySource>) -> Self {
        Self {
            source,
            holidays: RwLock::new(None),
        }
    }

    /// Get the cached holiday set, fetching through the source on a miss.
    ///
    /// The fetch happens under the write lock with a double-check, so
    /// concurrent callers racing on an empty cache trigger one fetch.
    ///
    /// # Errors
    ///
    /// Returns [`CalendarError::Unavailable`] if the cache is empty and the
    /// source fails; no empty holiday set is ever assumed.
    pub async fn get_or_fetch(&self) -> Result<Arc<BTreeSet<NaiveDate>>> {
        {
            let cached = self.holidays.read().await;
            if let Some(ref set) = *cached {
                return Ok(Arc::clone(set));
            }
        }

        let mut cached = self.holidays.write().await;
        if let Some(ref set) = *cached {
            return Ok(Arc::clone(set));
        }

        let fetched = self.source.fetch_holidays().await.map_err(|e| match e {
            CalendarError::Fetch(msg) | CalendarError::Unavailable(msg) => {
                CalendarError::Unavailable(msg)
            }
        })?;

        let set = Arc::new(fetched);
        *cached = Some(Arc::clone(&set));

        tracing::info!(
            cache = BANK_HOLIDAY_CACHE,
            holidays = set.len(),
            "populated bank holiday cache"
        );

        Ok(set)
    }

    /// Discard the cached holiday set unconditionally.
    ///
    /// The next read repopulates through the source. This is the only
    /// proactive discard path; all other paths only populate on miss.
    pub async fn clear(&self) {
        let mut cached = self.holidays.write().await;
        *cached = None;
        tracing::info!(cache = BANK_HOLIDAY_CACHE, "cleared bank holiday cache");
    }

    /// Whether a holiday set is currently cached.
    pub async fn is_populated(&self) -> bool {
        self.holidays.read().await.is_some()
    }
}

impl std::fmt::Debug for BankHolidayCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BankHolidayCache")
            .field("name", &BANK_HOLIDAY_CACHE)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    use super::*;

    /// Counting source for populate-on-miss assertions.
    struct CountingSource {
        dates: BTreeSet<NaiveDate>,
        fetches: AtomicUsize,
        fail: AtomicBool,
    }

    impl CountingSource {
        fn new(dates: impl IntoIterator<Item = NaiveDate>) -> Self {
            Self {
                dates: dates.into_iter().collect(),
                fetches: AtomicUsize::new(0),
                fail: AtomicBool::new(false),
            }
        }
    }

    #[async_trait::async_trait]
    impl HolidaySource for CountingSource {
        async fn fetch_holidays(&self) -> Result<BTreeSet<NaiveDate>> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            if self.fail.load(Ordering::SeqCst) {
                return Err(CalendarError::Fetch("connection refused".to_string()));
            }
            Ok(self.dates.clone())
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[tokio::test]
    async fn test_populates_on_miss_once() {
        let source = Arc::new(CountingSource::new([date(2026, 1, 1)]));
        let cache = BankHolidayCache::new(Arc::clone(&source) as Arc<dyn HolidaySource>);

        assert!(!cache.is_populated().await);

        let first = cache.get_or_fetch().await.unwrap();
        let second = cache.get_or_fetch().await.unwrap();

        assert_eq!(first, second);
        assert_eq!(source.fetches.load(Ordering::SeqCst), 1);
        assert!(cache.is_populated().await);
    }

    #[tokio::test]
    async fn test_clear_forces_refetch() {
        let source = Arc::new(CountingSource::new([date(2026, 1, 1)]));
        let cache = BankHolidayCache::new(Arc::clone(&source) as Arc<dyn HolidaySource>);

        cache.get_or_fetch().await.unwrap();
        cache.clear().await;
        assert!(!cache.is_populated().await);

        cache.get_or_fetch().await.unwrap();
        assert_eq!(source.fetches.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_fetch_failure_with_empty_cache_is_unavailable() {
        let source = Arc::new(CountingSource::new([date(2026, 1, 1)]));
        source.fail.store(true, Ordering::SeqCst);
        let cache = BankHolidayCache::new(Arc::clone(&source) as Arc<dyn HolidaySource>);

        let err = cache.get_or_fetch().await.unwrap_err();
        assert!(matches!(err, CalendarError::Unavailable(_)));
        assert!(!cache.is_populated().await);

        // A later successful fetch recovers.
        source.fail.store(false, Ordering::SeqCst);
        let set = cache.get_or_fetch().await.unwrap();
        assert!(set.contains(&date(2026, 1, 1)));
    }

    #[tokio::test]
    async fn test_cached_value_survives_source_failure() {
        let source = Arc::new(CountingSource::new([date(2026, 1, 1)]));
        let cache = BankHolidayCache::new(Arc::clone(&source) as Arc<dyn HolidaySource>);

        cache.get_or_fetch().await.unwrap();

        // Source starts failing, but the cached set keeps serving reads.
        source.fail.store(true, Ordering::SeqCst);
        let set = cache.get_or_fetch().await.unwrap();
        assert!(set.contains(&date(2026, 1, 1)));
        assert_eq!(source.fetches.load(Ordering::SeqCst), 1);
    }
}

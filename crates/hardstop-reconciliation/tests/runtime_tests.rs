//! Timer-loop tests for the reconciliation runtime, mostly under tokio's
//! paused clock so days pass in milliseconds.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use chrono::{Duration as ChronoDuration, NaiveDate, NaiveTime, Utc};
use tokio::time::{sleep, timeout, Duration};
use uuid::Uuid;

use hardstop_calendar::{BankHolidayCache, HolidaySource, WorkingDaysCalendar};
use hardstop_reconciliation::{
    CalendarHardStopPolicy, CaseStatus, HardStopReconciliationJob, InMemoryReconciliationStore,
    Licence, LicenceKind, LicenceStatus, PotentialHardStopCase, ReconciliationConfig,
    ReconciliationRuntime,
};

struct CountingSource {
    dates: BTreeSet<NaiveDate>,
    fetches: AtomicUsize,
}

impl CountingSource {
    fn new() -> Self {
        Self {
            dates: BTreeSet::new(),
            fetches: AtomicUsize::new(0),
        }
    }
}

#[async_trait::async_trait]
impl HolidaySource for CountingSource {
    async fn fetch_holidays(&self) -> hardstop_calendar::Result<BTreeSet<NaiveDate>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        Ok(self.dates.clone())
    }
}

fn test_config() -> ReconciliationConfig {
    ReconciliationConfig {
        reconciliation_interval_secs: 1,
        startup_jitter_secs: 0,
        ..ReconciliationConfig::default()
    }
}

fn runtime_over(
    store: Arc<InMemoryReconciliationStore>,
    config: ReconciliationConfig,
) -> (Arc<ReconciliationRuntime>, Arc<BankHolidayCache>) {
    let cache = Arc::new(BankHolidayCache::new(Arc::new(CountingSource::new())));
    let calendar = WorkingDaysCalendar::new(Arc::clone(&cache));
    let policy = Arc::new(CalendarHardStopPolicy::new(calendar));
    let job = Arc::new(HardStopReconciliationJob::new(store, policy));
    let runtime = Arc::new(ReconciliationRuntime::new(job, Arc::clone(&cache), config));
    (runtime, cache)
}

#[tokio::test(start_paused = true)]
async fn test_reconciliation_loop_recovers_after_contention() {
    let store = Arc::new(InMemoryReconciliationStore::new());
    let today = Utc::now().date_naive();

    let licence = Licence {
        id: Uuid::new_v4(),
        licence_start_date: Some(today - ChronoDuration::days(7)),
        kind: LicenceKind::HardStop,
        status_code: LicenceStatus::Submitted,
    };
    let case = PotentialHardStopCase::new(licence.id, Utc::now() - ChronoDuration::hours(9));
    store.put_licence(licence.clone()).await;
    store.put_case(case.clone()).await;

    // The first firing hits contention; the loop must defer and retry.
    store.fail_next_commit();

    let (runtime, _cache) = runtime_over(Arc::clone(&store), test_config());
    let handles = runtime.spawn();

    let mut waited = 0;
    while store.case(case.id).await.unwrap().status == CaseStatus::Pending && waited < 30 {
        sleep(Duration::from_secs(1)).await;
        waited += 1;
    }

    assert_eq!(store.case(case.id).await.unwrap().status, CaseStatus::Processed);
    assert_eq!(
        store.licence(licence.id).await.unwrap().status_code,
        LicenceStatus::Inactive
    );

    runtime.shutdown();
    for handle in handles {
        handle.await.unwrap();
    }
}

#[tokio::test(start_paused = true)]
async fn test_eviction_loop_clears_cache_and_next_read_refetches() {
    let store = Arc::new(InMemoryReconciliationStore::new());
    let source = Arc::new(CountingSource::new());
    let cache = Arc::new(BankHolidayCache::new(
        Arc::clone(&source) as Arc<dyn HolidaySource>
    ));
    let calendar = WorkingDaysCalendar::new(Arc::clone(&cache));
    let policy = Arc::new(CalendarHardStopPolicy::new(calendar));
    let job = Arc::new(HardStopReconciliationJob::new(store, policy));

    let config = ReconciliationConfig {
        cache_eviction_time: NaiveTime::from_hms_opt(23, 45, 0).unwrap(),
        ..test_config()
    };
    let runtime = Arc::new(ReconciliationRuntime::new(
        job,
        Arc::clone(&cache),
        config,
    ));

    // Warm the cache, then let the daily eviction fire.
    cache.get_or_fetch().await.unwrap();
    assert_eq!(source.fetches.load(Ordering::SeqCst), 1);

    let handle = {
        let runtime = Arc::clone(&runtime);
        tokio::spawn(async move { runtime.run_eviction_loop().await })
    };

    let mut waited = 0;
    while cache.is_populated().await && waited < 60 {
        sleep(Duration::from_secs(60 * 60)).await;
        waited += 1;
    }
    assert!(!cache.is_populated().await);

    // The next calendar read performs a fresh fetch rather than returning a
    // stale value.
    cache.get_or_fetch().await.unwrap();
    assert!(source.fetches.load(Ordering::SeqCst) >= 2);

    runtime.shutdown();
    handle.await.unwrap();
}

#[tokio::test]
async fn test_shutdown_wakes_loops_mid_sleep() {
    let store = Arc::new(InMemoryReconciliationStore::new());
    // An hour-long interval and a daily eviction: without a prompt wake-up
    // both loops would hold their handles for the rest of the sleep.
    let config = ReconciliationConfig {
        reconciliation_interval_secs: 3600,
        startup_jitter_secs: 0,
        ..ReconciliationConfig::default()
    };
    let (runtime, _cache) = runtime_over(store, config);
    let handles = runtime.spawn();

    // Real clock: give both loops time to enter their sleeps.
    sleep(Duration::from_millis(100)).await;
    runtime.shutdown();

    for handle in handles {
        timeout(Duration::from_secs(5), handle)
            .await
            .expect("loop did not stop promptly after shutdown")
            .unwrap();
    }
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_stops_both_loops() {
    let store = Arc::new(InMemoryReconciliationStore::new());
    let (runtime, _cache) = runtime_over(store, test_config());

    let handles = runtime.spawn();
    sleep(Duration::from_secs(5)).await;

    runtime.shutdown();
    assert!(runtime.is_shutdown());
    for handle in handles {
        handle.await.unwrap();
    }
}

//! Timer registration for the reconciliation subsystem.
//!
//! Two independent timers are registered at process start: the jittered
//! reconciliation interval and the daily cache eviction. Each drives a plain
//! callable; there is no network surface and no dependency-injection
//! machinery. Decoupling the eviction schedule from the reconciliation
//! schedule keeps holiday data reasonably fresh without refetching on every
//! run.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, NaiveTime, Utc};
use rand::Rng;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, sleep};
use tracing::{error, info, warn};

use hardstop_calendar::{BankHolidayCache, BankHolidayClient, WorkingDaysCalendar};

use crate::config::ReconciliationConfig;
use crate::job::HardStopReconciliationJob;
use crate::policy::CalendarHardStopPolicy;
use crate::store::ReconciliationStore;

/// The next time `at` (UTC) occurs strictly after `from`.
#[must_use]
pub fn next_daily_occurrence(from: DateTime<Utc>, at: NaiveTime) -> DateTime<Utc> {
    let today = from.date_naive().and_time(at).and_utc();
    if from < today {
        today
    } else {
        (from.date_naive() + chrono::Duration::days(1))
            .and_time(at)
            .and_utc()
    }
}

/// Owns the two timer loops and their shared shutdown signal.
pub struct ReconciliationRuntime {
    job: Arc<HardStopReconciliationJob>,
    cache: Arc<BankHolidayCache>,
    config: ReconciliationConfig,
    shutdown_tx: watch::Sender<bool>,
}

impl ReconciliationRuntime {
    /// Create a runtime over the job, the holiday cache and the schedules.
    #[must_use]
    pub fn new(
        job: Arc<HardStopReconciliationJob>,
        cache: Arc<BankHolidayCache>,
        config: ReconciliationConfig,
    ) -> Self {
        let (shutdown_tx, _) = watch::channel(false);
        Self {
            job,
            cache,
            config,
            shutdown_tx,
        }
    }

    /// Build the whole collaborator chain from configuration and wire it over
    /// the given store: feed client → holiday cache → calendar → window
    /// policy → job, each taking its setting from `config`.
    ///
    /// # Errors
    ///
    /// Returns a calendar error if the bank holiday HTTP client cannot be
    /// built.
    pub fn from_config(
        store: Arc<dyn ReconciliationStore>,
        config: ReconciliationConfig,
    ) -> crate::error::Result<Arc<Self>> {
        let client =
            BankHolidayClient::new(config.bank_holiday_url.clone(), config.bank_holiday_division)?;
        let cache = Arc::new(BankHolidayCache::new(Arc::new(client)));
        let calendar = WorkingDaysCalendar::new(Arc::clone(&cache));
        let policy = Arc::new(
            CalendarHardStopPolicy::new(calendar)
                .with_window_working_days(config.hard_stop_window_working_days),
        );
        let job = Arc::new(
            HardStopReconciliationJob::new(store, policy)
                .with_case_age_threshold(chrono::Duration::hours(config.case_age_threshold_hours)),
        );
        Ok(Arc::new(Self::new(job, cache, config)))
    }

    /// The reconciliation job driven by this runtime.
    #[must_use]
    pub fn job(&self) -> Arc<HardStopReconciliationJob> {
        Arc::clone(&self.job)
    }

    /// The holiday cache driven by this runtime's eviction timer.
    #[must_use]
    pub fn cache(&self) -> Arc<BankHolidayCache> {
        Arc::clone(&self.cache)
    }

    /// Register both timers. Returns the spawned task handles.
    #[must_use]
    pub fn spawn(self: &Arc<Self>) -> Vec<JoinHandle<()>> {
        let reconciliation = {
            let runtime = Arc::clone(self);
            tokio::spawn(async move { runtime.run_reconciliation_loop().await })
        };
        let eviction = {
            let runtime = Arc::clone(self);
            tokio::spawn(async move { runtime.run_eviction_loop().await })
        };
        vec![reconciliation, eviction]
    }

    /// Request graceful shutdown; sleeping loops are woken immediately.
    pub fn shutdown(&self) {
        info!("shutdown requested");
        let _ = self.shutdown_tx.send(true);
    }

    /// Check if shutdown was requested.
    #[must_use]
    pub fn is_shutdown(&self) -> bool {
        *self.shutdown_tx.borrow()
    }

    /// The reconciliation timer: a uniformly random initial delay, then a
    /// fixed interval. A failed invocation is logged and deferred to the next
    /// firing; the loop itself never dies.
    pub async fn run_reconciliation_loop(&self) {
        let jitter_secs = if self.config.startup_jitter_secs == 0 {
            0
        } else {
            rand::thread_rng().gen_range(0..=self.config.startup_jitter_secs)
        };

        info!(
            interval_secs = self.config.reconciliation_interval_secs,
            jitter_secs, "starting hard-stop reconciliation timer"
        );

        let mut shutdown_rx = self.shutdown_tx.subscribe();

        tokio::select! {
            () = sleep(Duration::from_secs(jitter_secs)) => {}
            _ = shutdown_rx.changed() => {}
        }

        let mut ticks = interval(Duration::from_secs(
            self.config.reconciliation_interval_secs.max(1),
        ));

        loop {
            if self.is_shutdown() {
                break;
            }

            tokio::select! {
                _ = ticks.tick() => {}
                _ = shutdown_rx.changed() => {}
            }
            if self.is_shutdown() {
                break;
            }

            // The job logs its own stats; only failures are handled here.
            match self.job.run_once().await {
                Ok(_) => {}
                Err(e) if e.is_contention() => {
                    warn!(error = %e, "reconciliation deferred to next firing");
                }
                Err(e) => {
                    error!(error = %e, "reconciliation run failed");
                }
            }
        }

        info!("reconciliation timer stopping");
    }

    /// The eviction timer: clears the whole holiday cache once a day at the
    /// configured time. All other paths only populate on miss.
    pub async fn run_eviction_loop(&self) {
        info!(
            eviction_time = %self.config.cache_eviction_time,
            "starting bank holiday cache eviction timer"
        );

        let mut shutdown_rx = self.shutdown_tx.subscribe();

        loop {
            if self.is_shutdown() {
                break;
            }

            let now = Utc::now();
            let next = next_daily_occurrence(now, self.config.cache_eviction_time);
            let wait = (next - now).to_std().unwrap_or(Duration::ZERO);

            tokio::select! {
                () = sleep(wait) => {}
                _ = shutdown_rx.changed() => {}
            }
            if self.is_shutdown() {
                break;
            }

            self.cache.clear().await;
        }

        info!("eviction timer stopping");
    }
}

impl std::fmt::Debug for ReconciliationRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReconciliationRuntime")
            .field("config", &self.config)
            .field("shutdown", &self.is_shutdown())
            .finish()
    }
}

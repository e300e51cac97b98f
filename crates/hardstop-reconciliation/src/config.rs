//! Environment-driven configuration for the reconciliation runtime.

use chrono::NaiveTime;

use hardstop_calendar::{Division, DEFAULT_BANK_HOLIDAY_URL};

/// Configuration for the two timers and their collaborators.
#[derive(Debug, Clone)]
pub struct ReconciliationConfig {
    /// Interval between reconciliation firings, in seconds.
    pub reconciliation_interval_secs: u64,

    /// Upper bound of the random initial delay, in seconds. Desynchronizes
    /// multiple running replicas.
    pub startup_jitter_secs: u64,

    /// Minimum age of a pending case before it is reconciled, in hours.
    pub case_age_threshold_hours: i64,

    /// Working days the hard-stop window spans before the start date.
    pub hard_stop_window_working_days: u32,

    /// Endpoint of the bank holiday feed.
    pub bank_holiday_url: String,

    /// Jurisdiction division of the feed.
    pub bank_holiday_division: Division,

    /// Daily time (UTC) at which the holiday cache is evicted.
    pub cache_eviction_time: NaiveTime,
}

impl Default for ReconciliationConfig {
    fn default() -> Self {
        Self {
            reconciliation_interval_secs: 3600,
            startup_jitter_secs: 300,
            case_age_threshold_hours: 8,
            hard_stop_window_working_days: 2,
            bank_holiday_url: DEFAULT_BANK_HOLIDAY_URL.to_string(),
            bank_holiday_division: Division::EnglandAndWales,
            // Shortly before midnight, so the first read of the day refetches.
            cache_eviction_time: NaiveTime::from_hms_opt(23, 45, 0)
                .unwrap_or(NaiveTime::MIN),
        }
    }
}

impl ReconciliationConfig {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] for unparseable values. Every
    /// variable has a default; none are required.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_reader(|key| std::env::var(key))
    }

    /// Load configuration from a custom variable reader.
    ///
    /// This allows tests to supply variables without mutating process-global
    /// environment state.
    pub fn from_reader<F>(reader: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Result<String, std::env::VarError>,
    {
        let defaults = Self::default();

        let reconciliation_interval_secs = parse_or(
            &reader,
            "RECONCILIATION_INTERVAL_SECS",
            defaults.reconciliation_interval_secs,
        )?;

        let startup_jitter_secs = parse_or(
            &reader,
            "RECONCILIATION_STARTUP_JITTER_SECS",
            defaults.startup_jitter_secs,
        )?;

        let case_age_threshold_hours = parse_or(
            &reader,
            "CASE_AGE_THRESHOLD_HOURS",
            defaults.case_age_threshold_hours,
        )?;

        let hard_stop_window_working_days = parse_or(
            &reader,
            "HARD_STOP_WINDOW_WORKING_DAYS",
            defaults.hard_stop_window_working_days,
        )?;

        let bank_holiday_url =
            reader("BANK_HOLIDAY_URL").unwrap_or(defaults.bank_holiday_url);

        let bank_holiday_division = match reader("BANK_HOLIDAY_DIVISION") {
            Ok(raw) => raw.parse::<Division>().map_err(|e| {
                ConfigError::InvalidValue("BANK_HOLIDAY_DIVISION".to_string(), e)
            })?,
            Err(_) => defaults.bank_holiday_division,
        };

        let cache_eviction_time = match reader("BANK_HOLIDAY_EVICTION_TIME") {
            Ok(raw) => NaiveTime::parse_from_str(&raw, "%H:%M").map_err(|e| {
                ConfigError::InvalidValue("BANK_HOLIDAY_EVICTION_TIME".to_string(), e.to_string())
            })?,
            Err(_) => defaults.cache_eviction_time,
        };

        Ok(Self {
            reconciliation_interval_secs,
            startup_jitter_secs,
            case_age_threshold_hours,
            hard_stop_window_working_days,
            bank_holiday_url,
            bank_holiday_division,
            cache_eviction_time,
        })
    }
}

fn parse_or<F, T>(reader: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match reader(key) {
        Ok(raw) => raw
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidValue(key.to_string(), e.to_string())),
        Err(_) => Ok(default),
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A variable was set to an unparseable value.
    #[error("invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

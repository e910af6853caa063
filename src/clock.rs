//! Calendar Clock
//!
//! Quota rollover is keyed on the UTC calendar date. Handlers read the date
//! once per request through this trait so tests can pin it.

use chrono::{NaiveDate, Utc};

/// Source of the current UTC calendar date
pub trait Clock: Send + Sync {
    /// Today's date (UTC, no time-of-day component)
    fn today(&self) -> NaiveDate;
}

/// Wall-clock implementation backed by [`chrono::Utc`]
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Utc::now().date_naive()
    }
}

/// A clock pinned to a single date
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}

//! Calendar source for date-relative filters

use chrono::{Local, NaiveDate};
use std::fmt::Debug;

/// Supplies "today" in the user's local calendar
pub trait Clock: Debug + Send + Sync {
    fn today(&self) -> NaiveDate;
}

/// Wall clock in local time
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// Clock pinned to one date
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}

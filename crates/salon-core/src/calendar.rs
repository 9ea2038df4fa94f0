//! # Calendar Months
//!
//! Report windows are whole calendar months in UTC, half-open:
//!
//! ```text
//!   2024-02-01T00:00:00Z                         2024-03-01T00:00:00Z
//!          │◄──────────── included ────────────►│ excluded
//!          [ start                               ) end
//! ```

use chrono::{DateTime, Datelike, Months, NaiveDate, Utc};

use crate::error::ValidationError;

/// A calendar month as a half-open UTC time range `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthWindow {
    first_day: NaiveDate,
    next_first_day: NaiveDate,
}

impl MonthWindow {
    /// Returns the month that contains `date`.
    pub fn containing(date: NaiveDate) -> Result<Self, ValidationError> {
        let first_day = date.with_day(1).ok_or_else(out_of_range)?;
        let next_first_day = first_day
            .checked_add_months(Months::new(1))
            .ok_or_else(out_of_range)?;
        Ok(Self {
            first_day,
            next_first_day,
        })
    }

    /// The month before this one.
    pub fn previous(&self) -> Result<Self, ValidationError> {
        let first_day = self
            .first_day
            .checked_sub_months(Months::new(1))
            .ok_or_else(out_of_range)?;
        Ok(Self {
            first_day,
            next_first_day: self.first_day,
        })
    }

    /// Inclusive lower bound.
    pub fn start(&self) -> DateTime<Utc> {
        self.first_day.and_time(chrono::NaiveTime::MIN).and_utc()
    }

    /// Exclusive upper bound.
    pub fn end(&self) -> DateTime<Utc> {
        self.next_first_day.and_time(chrono::NaiveTime::MIN).and_utc()
    }

    pub fn first_day(&self) -> NaiveDate {
        self.first_day
    }

    /// Number of calendar days in the month (28..=31).
    pub fn days_in_month(&self) -> i64 {
        (self.next_first_day - self.first_day).num_days()
    }

    /// True when `ts` falls inside the window.
    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        ts >= self.start() && ts < self.end()
    }
}

fn out_of_range() -> ValidationError {
    ValidationError::InvalidFormat {
        field: "month".to_string(),
        reason: "date out of supported range".to_string(),
    }
}

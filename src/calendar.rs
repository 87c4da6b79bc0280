//! Business-day calendar contract and date bucketing.
//!
//! The holiday service is an external collaborator; this module defines the
//! contract the engine consumes ([`BusinessCalendar`]) and a default
//! implementation ([`WeekendCalendar`]: Saturday/Sunday non-business plus an
//! explicit holiday set).
//!
//! # Precedence
//! A day is a business day iff it is neither a weekend day nor a holiday.
//! Needs flagged `force_weekend_holiday` bypass the calendar entirely.

use std::collections::BTreeSet;

use chrono::{Datelike, Days, NaiveDate, Weekday};

use crate::models::DateRange;

/// Calendar collaborator contract.
///
/// Implementations must be pure: the same date always yields the same
/// answer within one planning pass.
pub trait BusinessCalendar {
    /// Whether the date is a public holiday.
    fn is_holiday(&self, date: NaiveDate) -> bool;

    /// Whether the date is workable: not a weekend day, not a holiday.
    fn is_business_day(&self, date: NaiveDate) -> bool {
        !matches!(date.weekday(), Weekday::Sat | Weekday::Sun) && !self.is_holiday(date)
    }

    /// Number of business days within the range.
    fn business_days_between(&self, range: &DateRange) -> u32 {
        range.days().filter(|d| self.is_business_day(*d)).count() as u32
    }
}

/// Days of a period a need can actually be staffed on.
///
/// Business days only, unless the need forces weekend/holiday work,
/// in which case every calendar day counts.
pub fn workable_days(
    calendar: &dyn BusinessCalendar,
    period: &DateRange,
    force_weekend_holiday: bool,
) -> Vec<NaiveDate> {
    if force_weekend_holiday {
        period.days().collect()
    } else {
        period
            .days()
            .filter(|d| calendar.is_business_day(*d))
            .collect()
    }
}

/// Default calendar: weekends off, plus registered holidays.
#[derive(Debug, Clone, Default)]
pub struct WeekendCalendar {
    holidays: BTreeSet<NaiveDate>,
}

impl WeekendCalendar {
    /// Creates a calendar with no holidays.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a holiday.
    pub fn with_holiday(mut self, date: NaiveDate) -> Self {
        self.holidays.insert(date);
        self
    }
}

impl BusinessCalendar for WeekendCalendar {
    fn is_holiday(&self, date: NaiveDate) -> bool {
        self.holidays.contains(&date)
    }
}

/// Bucket width for consolidated views.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Granularity {
    /// One bucket per day.
    Day,
    /// ISO weeks (Monday start), clipped to the horizon.
    Week,
    /// Calendar months, clipped to the horizon.
    Month,
}

/// Splits a horizon into consecutive buckets of the given granularity.
///
/// First and last buckets are clipped to the horizon bounds, so bucket
/// union always equals the horizon exactly.
pub fn bucket_ranges(horizon: &DateRange, granularity: Granularity) -> Vec<DateRange> {
    match granularity {
        Granularity::Day => horizon.days().map(DateRange::single).collect(),
        Granularity::Week => split_by(horizon, |d| {
            let week_start =
                d.checked_sub_days(Days::new(d.weekday().num_days_from_monday() as u64));
            week_start.and_then(|s| s.checked_add_days(Days::new(6)))
        }),
        Granularity::Month => split_by(horizon, |d| month_end(d)),
    }
}

/// Walks the horizon, closing a bucket at `bucket_end(cursor)` or the
/// horizon end, whichever comes first.
fn split_by(horizon: &DateRange, bucket_end: impl Fn(NaiveDate) -> Option<NaiveDate>) -> Vec<DateRange> {
    let mut buckets = Vec::new();
    let mut cursor = horizon.start;
    while cursor <= horizon.end {
        let end = bucket_end(cursor)
            .unwrap_or(horizon.end)
            .min(horizon.end);
        buckets.push(DateRange::new(cursor, end));
        match end.checked_add_days(Days::new(1)) {
            Some(next) => cursor = next,
            None => break,
        }
    }
    buckets
}

/// Last day of the month containing `date`.
fn month_end(date: NaiveDate) -> Option<NaiveDate> {
    let (year, month) = (date.year(), date.month());
    let first_of_next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    };
    first_of_next.and_then(|d| d.checked_sub_days(Days::new(1)))
}

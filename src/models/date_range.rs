//! Inclusive calendar date ranges.
//!
//! All planning periods (needs, assignments, absences, transfers) are
//! expressed as whole-day ranges `[start, end]`, both bounds inclusive —
//! a one-day period has `start == end`.

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// An inclusive date range [start, end].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DateRange {
    /// First day of the range (inclusive).
    pub start: NaiveDate,
    /// Last day of the range (inclusive).
    pub end: NaiveDate,
}

impl DateRange {
    /// Creates a new date range. `start` and `end` may be equal.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// Creates a one-day range.
    pub fn single(day: NaiveDate) -> Self {
        Self {
            start: day,
            end: day,
        }
    }

    /// Rejects ranges whose start is after their end.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.start > self.end {
            return Err(ValidationError::InvertedRange {
                start: self.start,
                end: self.end,
            });
        }
        Ok(())
    }

    /// Whether a date falls within this range.
    #[inline]
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }

    /// Whether two ranges share at least one day.
    pub fn overlaps(&self, other: &Self) -> bool {
        self.start <= other.end && other.start <= self.end
    }

    /// The shared days of two ranges, if any.
    pub fn intersect(&self, other: &Self) -> Option<Self> {
        let start = self.start.max(other.start);
        let end = self.end.min(other.end);
        if start <= end {
            Some(Self { start, end })
        } else {
            None
        }
    }

    /// Total calendar days in the range (business or not).
    pub fn day_count(&self) -> u32 {
        (self.end - self.start).num_days() as u32 + 1
    }

    /// Iterates every day of the range in order.
    ///
    /// Finite and restartable: the iterator borrows nothing and can be
    /// re-created at will.
    pub fn days(&self) -> DaysIter {
        DaysIter {
            next: Some(self.start),
            end: self.end,
        }
    }
}

/// Iterator over the days of a [`DateRange`].
#[derive(Debug, Clone)]
pub struct DaysIter {
    next: Option<NaiveDate>,
    end: NaiveDate,
}

impl Iterator for DaysIter {
    type Item = NaiveDate;

    fn next(&mut self) -> Option<NaiveDate> {
        let current = self.next?;
        if current > self.end {
            self.next = None;
            return None;
        }
        self.next = current.checked_add_days(Days::new(1));
        Some(current)
    }
}

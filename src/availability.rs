//! Per-day availability classification.
//!
//! For each (resource, site, engagement, date), exactly one primary status
//! is derived from absence, contract, transfer and assignment facts. The
//! chain is evaluated in strict priority order; the first match wins.
//! Classification is a pure function of current facts — no side effects,
//! no store access.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::calendar::{workable_days, BusinessCalendar};
use crate::models::{Absence, AbsenceKind, Assignment, NeedPeriod, Resource, Transfer};

/// Primary availability status for one resource on one date.
///
/// Ordered by evaluation priority: a training absence beats an ordinary
/// absence, which beats contract end, and so on down to `Available`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Availability {
    /// Training-kind absence overlaps the date.
    Formation,
    /// Any other absence overlaps the date.
    Absent,
    /// Contract end date is set and precedes the date.
    ContractEnded,
    /// An applied transfer blocks the resource at the evaluated site.
    TransferUnavailable,
    /// An assignment on another engagement overlaps the date.
    Conflict,
    /// None of the above.
    Available,
}

impl fmt::Display for Availability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Availability::Formation => "in training",
            Availability::Absent => "absent",
            Availability::ContractEnded => "contract ended",
            Availability::TransferUnavailable => "unavailable due to transfer",
            Availability::Conflict => "assigned to another engagement",
            Availability::Available => "available",
        };
        f.write_str(label)
    }
}

/// Current facts about one resource, as read from the store.
///
/// The fact slices may be whole-table reads; everything not belonging to
/// `resource` is ignored during classification.
#[derive(Debug, Clone, Copy)]
pub struct ResourceFacts<'a> {
    /// The resource being classified.
    pub resource: &'a Resource,
    /// Absence records (any resource; filtered during classification).
    pub absences: &'a [Absence],
    /// Transfer records (any resource; filtered during classification).
    pub transfers: &'a [Transfer],
    /// Existing assignments (any resource; filtered during classification).
    pub assignments: &'a [Assignment],
}

/// Per-day result of classifying a resource over a need period.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeriodAvailability {
    /// The need period the classification was run against.
    pub need_id: String,
    /// Workable days on which the resource classified `Available`.
    pub available_days: Vec<NaiveDate>,
    /// Workable days on which the resource is blocked, with the status.
    pub blocked_days: Vec<BlockedDay>,
}

/// One blocked day and its blocking status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockedDay {
    /// The blocked date.
    pub date: NaiveDate,
    /// The status that blocked it (never `Available`).
    pub status: Availability,
}

impl PeriodAvailability {
    /// Every workable day is free.
    pub fn is_fully_available(&self) -> bool {
        self.blocked_days.is_empty() && !self.available_days.is_empty()
    }

    /// No workable day is free.
    pub fn is_fully_blocked(&self) -> bool {
        self.available_days.is_empty() && !self.blocked_days.is_empty()
    }

    /// Some days free, some blocked — candidate for partial assignment.
    pub fn is_partial(&self) -> bool {
        !self.available_days.is_empty() && !self.blocked_days.is_empty()
    }

    /// The highest-priority blocking status, if any day is blocked.
    ///
    /// "Highest" follows the classification chain order, so a training
    /// day dominates an ordinary absence day for display purposes.
    pub fn dominant_blocker(&self) -> Option<Availability> {
        self.blocked_days.iter().map(|b| b.status).min_by_key(|s| *s as u8)
    }
}

/// Classifies resource availability against the priority chain.
pub struct AvailabilityClassifier<'a> {
    calendar: &'a dyn BusinessCalendar,
}

impl<'a> AvailabilityClassifier<'a> {
    /// Creates a classifier over the given calendar.
    pub fn new(calendar: &'a dyn BusinessCalendar) -> Self {
        Self { calendar }
    }

    /// Classifies one date.
    ///
    /// Evaluation order (first match wins):
    /// 1. `Formation` — training absence overlaps the date.
    /// 2. `Absent` — any other absence overlaps the date.
    /// 3. `ContractEnded` — contract end set and before the date.
    /// 4. `TransferUnavailable` — an applied transfer blocks at `site`.
    /// 5. `Conflict` — assignment on another engagement overlaps.
    /// 6. `Available`.
    pub fn classify_day(
        &self,
        facts: &ResourceFacts<'_>,
        site: &str,
        engagement_id: &str,
        date: NaiveDate,
    ) -> Availability {
        let resource_id = facts.resource.id.as_str();

        let mut has_other_absence = false;
        for absence in facts
            .absences
            .iter()
            .filter(|a| a.resource_id == resource_id && a.covers(date))
        {
            match absence.kind {
                AbsenceKind::Training => return Availability::Formation,
                AbsenceKind::Other => has_other_absence = true,
            }
        }
        if has_other_absence {
            return Availability::Absent;
        }

        if let Some(end) = facts.resource.contract_end {
            if end < date {
                return Availability::ContractEnded;
            }
        }

        if facts
            .transfers
            .iter()
            .any(|t| t.resource_id == resource_id && t.blocks_at(site, date))
        {
            return Availability::TransferUnavailable;
        }

        if facts
            .assignments
            .iter()
            .any(|a| a.resource_id == resource_id && a.engagement_id != engagement_id && a.covers(date))
        {
            return Availability::Conflict;
        }

        Availability::Available
    }

    /// Classifies every workable day of a need period.
    ///
    /// Non-business days are skipped unless the need forces
    /// weekend/holiday work. The result separates free days from blocked
    /// days so callers can offer the free subset as a partial assignment.
    pub fn classify_period(
        &self,
        facts: &ResourceFacts<'_>,
        need: &NeedPeriod,
    ) -> PeriodAvailability {
        let mut available_days = Vec::new();
        let mut blocked_days = Vec::new();

        for date in workable_days(self.calendar, &need.period, need.force_weekend_holiday) {
            match self.classify_day(facts, &need.site, &need.engagement_id, date) {
                Availability::Available => available_days.push(date),
                status => blocked_days.push(BlockedDay { date, status }),
            }
        }

        PeriodAvailability {
            need_id: need.id.clone(),
            available_days,
            blocked_days,
        }
    }
}

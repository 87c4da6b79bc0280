//! Need period model and coverage arithmetic.
//!
//! A need period ("besoin") declares a required headcount for one skill on
//! one site over a date range. Coverage compares that requirement against
//! the distinct resources actually assigned.

use serde::{Deserialize, Serialize};

use super::DateRange;
use crate::error::ValidationError;

/// A declared requirement for N resources with a given skill,
/// on a given site, over a date range.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NeedPeriod {
    /// Unique need identifier.
    pub id: String,
    /// Engagement (project/worksite order) the need belongs to.
    pub engagement_id: String,
    /// Site where the work happens.
    pub site: String,
    /// Required skill.
    pub skill: String,
    /// Date range of the need (inclusive).
    pub period: DateRange,
    /// Required headcount.
    pub required_count: u32,
    /// When set, weekend and holiday days count as workable for this need.
    pub force_weekend_holiday: bool,
}

impl NeedPeriod {
    /// Creates a need period.
    pub fn new(
        id: impl Into<String>,
        engagement_id: impl Into<String>,
        site: impl Into<String>,
        skill: impl Into<String>,
        period: DateRange,
        required_count: u32,
    ) -> Self {
        Self {
            id: id.into(),
            engagement_id: engagement_id.into(),
            site: site.into(),
            skill: skill.into(),
            period,
            required_count,
            force_weekend_holiday: false,
        }
    }

    /// Makes weekend and holiday days workable for this need.
    pub fn with_forced_weekends(mut self) -> Self {
        self.force_weekend_holiday = true;
        self
    }

    /// Structural checks before planning or committing against this need.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.id.is_empty() {
            return Err(ValidationError::MissingField("need.id"));
        }
        if self.engagement_id.is_empty() {
            return Err(ValidationError::MissingField("need.engagement_id"));
        }
        if self.site.is_empty() {
            return Err(ValidationError::MissingField("need.site"));
        }
        if self.skill.is_empty() {
            return Err(ValidationError::MissingField("need.skill"));
        }
        self.period.validate()
    }
}

/// Assigned-versus-required comparison for one need or bucket.
///
/// Derived, never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coverage {
    /// Required headcount.
    pub required: u32,
    /// Distinct resources assigned.
    pub assigned: u32,
}

/// Coverage classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CoverageStatus {
    /// Assigned equals required.
    Ok,
    /// Assigned below required; shortage is non-zero.
    Under,
    /// Assigned above required; surplus is non-zero.
    Over,
}

impl Coverage {
    /// Creates a coverage record.
    pub fn new(required: u32, assigned: u32) -> Self {
        Self { required, assigned }
    }

    /// Headcount still missing: max(0, required − assigned).
    #[inline]
    pub fn shortage(&self) -> u32 {
        self.required.saturating_sub(self.assigned)
    }

    /// Headcount beyond requirement: max(0, assigned − required).
    #[inline]
    pub fn surplus(&self) -> u32 {
        self.assigned.saturating_sub(self.required)
    }

    /// Classifies this coverage.
    pub fn status(&self) -> CoverageStatus {
        match self.assigned.cmp(&self.required) {
            std::cmp::Ordering::Equal => CoverageStatus::Ok,
            std::cmp::Ordering::Less => CoverageStatus::Under,
            std::cmp::Ordering::Greater => CoverageStatus::Over,
        }
    }
}

//! Assignment model.
//!
//! An assignment ("affectation") commits one resource to an engagement,
//! skill and date range. A resource may hold several assignments; overlaps
//! are detected by the conflict detector, not prevented structurally.

use serde::{Deserialize, Serialize};

use super::DateRange;
use crate::error::ValidationError;

/// A resource committed to an engagement/skill/date range.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Assignment {
    /// Unique assignment identifier.
    pub id: String,
    /// Assigned resource.
    pub resource_id: String,
    /// Engagement the assignment belongs to.
    pub engagement_id: String,
    /// Site where the work happens.
    pub site: String,
    /// Skill the resource covers on this assignment.
    pub skill: String,
    /// Date range of the assignment (inclusive).
    pub period: DateRange,
    /// Business-day count of the range, fixed at commit time.
    pub charge: u32,
}

impl Assignment {
    /// Creates an assignment.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: impl Into<String>,
        resource_id: impl Into<String>,
        engagement_id: impl Into<String>,
        site: impl Into<String>,
        skill: impl Into<String>,
        period: DateRange,
        charge: u32,
    ) -> Self {
        Self {
            id: id.into(),
            resource_id: resource_id.into(),
            engagement_id: engagement_id.into(),
            site: site.into(),
            skill: skill.into(),
            period,
            charge,
        }
    }

    /// Structural checks before persisting.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.id.is_empty() {
            return Err(ValidationError::MissingField("assignment.id"));
        }
        if self.resource_id.is_empty() {
            return Err(ValidationError::MissingField("assignment.resource_id"));
        }
        if self.engagement_id.is_empty() {
            return Err(ValidationError::MissingField("assignment.engagement_id"));
        }
        if self.skill.is_empty() {
            return Err(ValidationError::MissingField("assignment.skill"));
        }
        self.period.validate()
    }

    /// Whether this assignment covers the given date.
    #[inline]
    pub fn covers(&self, date: chrono::NaiveDate) -> bool {
        self.period.contains(date)
    }
}

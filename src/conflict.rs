//! Cross-assignment conflict detection.
//!
//! Cross-references a resource's existing assignments against a candidate
//! (engagement, skill, date range). Two kinds come out:
//!
//! - **blocking**: an overlapping assignment on a *different* engagement —
//!   this is what backs the classifier's `Conflict` status;
//! - **advisory**: an overlapping assignment on the *same* engagement but a
//!   different skill — surfaced as a warning indicator, never blocks.
//!
//! Per-day detail is always computed so a range with some blocked and some
//! free days can still be offered for the free subset.

use std::collections::BTreeSet;

use chrono::NaiveDate;

use crate::models::{Assignment, DateRange};

/// The candidate slot a resource is being considered for.
#[derive(Debug, Clone)]
pub struct CandidateSlot {
    /// Target engagement.
    pub engagement_id: String,
    /// Target skill.
    pub skill: String,
    /// Candidate date range.
    pub period: DateRange,
}

impl CandidateSlot {
    /// Creates a candidate slot.
    pub fn new(
        engagement_id: impl Into<String>,
        skill: impl Into<String>,
        period: DateRange,
    ) -> Self {
        Self {
            engagement_id: engagement_id.into(),
            skill: skill.into(),
            period,
        }
    }
}

/// An overlapping assignment on another engagement. Blocking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngagementConflict {
    /// The conflicting assignment.
    pub assignment_id: String,
    /// Its engagement.
    pub engagement_id: String,
    /// The overlapping window.
    pub overlap: DateRange,
}

/// An overlapping assignment on the same engagement, different skill.
/// Advisory only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkillOverlap {
    /// The overlapping assignment.
    pub assignment_id: String,
    /// Its skill, differing from the candidate's.
    pub skill: String,
    /// The overlapping window.
    pub overlap: DateRange,
}

/// Result of checking one resource against a candidate slot.
#[derive(Debug, Clone, Default)]
pub struct ConflictReport {
    /// Blocking cross-engagement conflicts.
    pub blocking: Vec<EngagementConflict>,
    /// Advisory same-engagement cross-skill overlaps.
    pub advisory: Vec<SkillOverlap>,
}

impl ConflictReport {
    /// Whether any blocking conflict exists.
    pub fn has_blocking(&self) -> bool {
        !self.blocking.is_empty()
    }

    /// Distinct days covered by blocking conflicts, in order.
    pub fn blocked_days(&self) -> Vec<NaiveDate> {
        let days: BTreeSet<NaiveDate> = self
            .blocking
            .iter()
            .flat_map(|c| c.overlap.days())
            .collect();
        days.into_iter().collect()
    }
}

/// Checks every assignment of a resource against a candidate slot.
///
/// Assignments of other resources in the slice are ignored, so callers may
/// pass whole-table reads.
pub fn detect_conflicts(
    assignments: &[Assignment],
    resource_id: &str,
    candidate: &CandidateSlot,
) -> ConflictReport {
    let mut report = ConflictReport::default();

    for assignment in assignments.iter().filter(|a| a.resource_id == resource_id) {
        let Some(overlap) = assignment.period.intersect(&candidate.period) else {
            continue;
        };

        if assignment.engagement_id != candidate.engagement_id {
            report.blocking.push(EngagementConflict {
                assignment_id: assignment.id.clone(),
                engagement_id: assignment.engagement_id.clone(),
                overlap,
            });
        } else if assignment.skill != candidate.skill {
            report.advisory.push(SkillOverlap {
                assignment_id: assignment.id.clone(),
                skill: assignment.skill.clone(),
                overlap,
            });
        }
    }

    report
}

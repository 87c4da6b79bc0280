//! Absence model.
//!
//! Absences arrive from administration with a free-form type string. The
//! string is classified once, at construction, into the closed
//! [`AbsenceKind`] variant; downstream code matches on the enum and never
//! re-tests substrings. Training absences block with a distinct, higher
//! priority than ordinary absences.

use serde::{Deserialize, Serialize};

use super::DateRange;

/// A period during which a resource cannot be assigned.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Absence {
    /// The absent resource.
    pub resource_id: String,
    /// Date range of the absence (inclusive).
    pub period: DateRange,
    /// Classified kind, fixed at construction.
    pub kind: AbsenceKind,
    /// Raw type string as declared, kept for display.
    pub label: String,
}

/// Closed classification of absence types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AbsenceKind {
    /// Training ("formation"): blocks with higher priority than
    /// ordinary absence.
    Training,
    /// Any other absence (leave, sickness, unspecified).
    Other,
}

impl AbsenceKind {
    /// Classifies a raw type string by case-insensitive keyword match.
    pub fn classify(raw: &str) -> Self {
        let lowered = raw.to_lowercase();
        if lowered.contains("formation") || lowered.contains("training") {
            AbsenceKind::Training
        } else {
            AbsenceKind::Other
        }
    }
}

impl Absence {
    /// Creates an absence, classifying the raw type string once.
    pub fn new(resource_id: impl Into<String>, period: DateRange, raw_type: &str) -> Self {
        Self {
            resource_id: resource_id.into(),
            period,
            kind: AbsenceKind::classify(raw_type),
            label: raw_type.to_string(),
        }
    }

    /// Whether the absence covers the given date.
    #[inline]
    pub fn covers(&self, date: chrono::NaiveDate) -> bool {
        self.period.contains(date)
    }
}

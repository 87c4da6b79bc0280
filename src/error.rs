//! Failure taxonomy for planning operations.
//!
//! Three families, mirroring how failures reach the operator:
//! - [`ValidationError`]: malformed input, rejected before any store call.
//! - [`StoreError`]: a remote-store call failed; completed steps stand.
//! - [`PlanningError`]: the umbrella type returned by planner and committer
//!   operations, including commit-time availability conflicts.
//!
//! Nothing here is retried automatically. Grid-level consistency warnings are
//! not errors and live in [`crate::grid`].

use chrono::NaiveDate;
use thiserror::Error;

use crate::availability::Availability;

/// Malformed input to the planner or committer.
///
/// Always detected before the first store call; never retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Need periods in one batch must share a single skill.
    #[error("need periods in one batch must share a single skill (expected '{expected}', found '{found}')")]
    MixedSkills {
        /// Skill of the first need period in the batch.
        expected: String,
        /// The differing skill that was encountered.
        found: String,
    },

    /// A required field was empty.
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    /// A date range with start after end.
    #[error("date range start {start} is after end {end}")]
    InvertedRange {
        /// Range start.
        start: NaiveDate,
        /// Range end.
        end: NaiveDate,
    },

    /// A transfer whose origin and destination are the same site.
    #[error("transfer origin and destination are the same site ('{0}')")]
    SameSiteTransfer(String),

    /// A resource may hold at most one Principal competency grant.
    #[error("resource '{resource_id}' already holds a principal competency ('{skill}')")]
    DuplicatePrincipal {
        /// Offending resource.
        resource_id: String,
        /// Skill of the grant that was rejected.
        skill: String,
    },

    /// The batch contains no plannable need periods.
    #[error("batch contains no plannable need periods")]
    EmptyBatch,

    /// Selection beyond the required count, under [`SurplusPolicy::Block`].
    ///
    /// [`SurplusPolicy::Block`]: crate::planner::SurplusPolicy::Block
    #[error("selection exceeds required count ({selected} selected, {required} required)")]
    SurplusBlocked {
        /// Required headcount of the need period.
        required: u32,
        /// Headcount after the attempted selection.
        selected: u32,
    },
}

/// A remote-store call failed.
///
/// The engine surfaces these verbatim; the operator retries or verifies
/// manually.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The referenced record does not exist.
    #[error("record not found: {0}")]
    NotFound(String),

    /// Backend or network failure, message passed through.
    #[error("store backend error: {0}")]
    Backend(String),
}

/// Umbrella error for planner and committer operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlanningError {
    /// Input rejected before any store call.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A selected resource turned out unavailable at commit time
    /// (race with a concurrent change). The operator must re-select.
    #[error("resource '{resource_id}' is not available on {date}: {status}")]
    AvailabilityConflict {
        /// The resource that failed the re-check.
        resource_id: String,
        /// First blocked day found.
        date: NaiveDate,
        /// The blocking classification.
        status: Availability,
    },

    /// A store call failed mid-batch; earlier steps are not rolled back.
    #[error(transparent)]
    Persistence(#[from] StoreError),
}

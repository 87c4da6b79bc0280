//! Workforce planning domain models.
//!
//! Core data types for staffing needs, the resources that cover them, and
//! the records tying the two together. Resources, competency grants,
//! absences and transfers are owned by administration workflows; need
//! periods and assignments are the only entities this engine mutates, and
//! only through [`crate::committer`].

mod absence;
mod assignment;
mod date_range;
mod need;
mod resource;
mod transfer;

pub use absence::{Absence, AbsenceKind};
pub use assignment::Assignment;
pub use date_range::{DateRange, DaysIter};
pub use need::{Coverage, CoverageStatus, NeedPeriod};
pub use resource::{CompetencyGrant, Resource, SkillRank};
pub use transfer::{Transfer, TransferStatus};

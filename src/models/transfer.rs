//! Transfer model.
//!
//! A transfer relocates a resource from its home site to another for a
//! bounded period. Planned transfers are inert; once applied, the resource
//! is unavailable at the origin for the whole range and only available at
//! the destination inside the range.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::DateRange;
use crate::error::ValidationError;

/// A temporary relocation of a resource between sites.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transfer {
    /// Unique transfer identifier.
    pub id: String,
    /// The relocated resource.
    pub resource_id: String,
    /// Site the resource leaves.
    pub site_origin: String,
    /// Site the resource joins.
    pub site_destination: String,
    /// Date range of the relocation (inclusive).
    pub period: DateRange,
    /// Planned until its start date arrives, then applied.
    pub status: TransferStatus,
}

/// Lifecycle status of a transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransferStatus {
    /// Recorded but not yet in effect.
    Planned,
    /// In effect; drives availability classification.
    Applied,
}

impl Transfer {
    /// Creates a transfer.
    pub fn new(
        id: impl Into<String>,
        resource_id: impl Into<String>,
        site_origin: impl Into<String>,
        site_destination: impl Into<String>,
        period: DateRange,
        status: TransferStatus,
    ) -> Self {
        Self {
            id: id.into(),
            resource_id: resource_id.into(),
            site_origin: site_origin.into(),
            site_destination: site_destination.into(),
            period,
            status,
        }
    }

    /// Structural checks before persisting.
    ///
    /// A transfer from a site to itself is meaningless and rejected.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.resource_id.is_empty() {
            return Err(ValidationError::MissingField("transfer.resource_id"));
        }
        if self.site_origin.is_empty() {
            return Err(ValidationError::MissingField("transfer.site_origin"));
        }
        if self.site_destination.is_empty() {
            return Err(ValidationError::MissingField("transfer.site_destination"));
        }
        if self.site_origin == self.site_destination {
            return Err(ValidationError::SameSiteTransfer(self.site_origin.clone()));
        }
        self.period.validate()
    }

    /// Whether this transfer makes the resource unavailable at `site`
    /// on `date`.
    ///
    /// Only applied transfers block. At the origin, the resource is gone
    /// for the whole range; at the destination, it is only present inside
    /// the range. Sites that are neither origin nor destination are not
    /// affected — the planner's site comparison handles those.
    pub fn blocks_at(&self, site: &str, date: NaiveDate) -> bool {
        if self.status != TransferStatus::Applied {
            return false;
        }
        if site == self.site_origin {
            self.period.contains(date)
        } else if site == self.site_destination {
            !self.period.contains(date)
        } else {
            false
        }
    }
}

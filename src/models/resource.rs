//! Resource model.
//!
//! Resources are the people staffing plans allocate: each has a home site,
//! an active flag, contract bounds, and a set of competency grants. Contract
//! end governs automatic unavailability past that date; the grants determine
//! which needs a resource can cover.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// A person that can be assigned to staffing needs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resource {
    /// Unique resource identifier.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Home site. Assignments elsewhere require a transfer.
    pub site: String,
    /// Inactive resources are excluded from planning entirely.
    pub active: bool,
    /// Contract start date, if bounded.
    pub contract_start: Option<NaiveDate>,
    /// Contract end date. Dates past it classify as contract-ended.
    pub contract_end: Option<NaiveDate>,
    /// Competency grants (skill + rank).
    pub grants: Vec<CompetencyGrant>,
}

/// A skill a resource holds, with its rank.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompetencyGrant {
    /// Skill name (e.g., "WELDING").
    pub skill: String,
    /// Principal or secondary competency.
    pub rank: SkillRank,
}

/// Rank of a competency grant.
///
/// A resource holds at most one `Principal` grant across all skills,
/// enforced at write time by [`Resource::validate`], not by storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkillRank {
    /// The resource's main competency.
    Principal,
    /// An additional competency.
    Secondary,
}

impl Resource {
    /// Creates an active resource with the given id and home site.
    pub fn new(id: impl Into<String>, site: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            site: site.into(),
            active: true,
            contract_start: None,
            contract_end: None,
            grants: Vec::new(),
        }
    }

    /// Sets the resource name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Marks the resource inactive.
    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }

    /// Sets the contract start date.
    pub fn with_contract_start(mut self, date: NaiveDate) -> Self {
        self.contract_start = Some(date);
        self
    }

    /// Sets the contract end date.
    pub fn with_contract_end(mut self, date: NaiveDate) -> Self {
        self.contract_end = Some(date);
        self
    }

    /// Adds a competency grant.
    ///
    /// Builder-style, unchecked: call [`Resource::validate`] before
    /// persisting (the store insert path does).
    pub fn with_skill(mut self, skill: impl Into<String>, rank: SkillRank) -> Self {
        self.grants.push(CompetencyGrant {
            skill: skill.into(),
            rank,
        });
        self
    }

    /// Whether this resource holds a grant for the given skill.
    pub fn has_skill(&self, skill: &str) -> bool {
        self.grants.iter().any(|g| g.skill == skill)
    }

    /// Rank of the grant for a skill, if held.
    pub fn skill_rank(&self, skill: &str) -> Option<SkillRank> {
        self.grants
            .iter()
            .find(|g| g.skill == skill)
            .map(|g| g.rank)
    }

    /// Write-time integrity checks.
    ///
    /// Enforces:
    /// 1. Non-empty id and site.
    /// 2. At most one `Principal` grant across all skills.
    /// 3. Contract start not after contract end, when both are set.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.id.is_empty() {
            return Err(ValidationError::MissingField("resource.id"));
        }
        if self.site.is_empty() {
            return Err(ValidationError::MissingField("resource.site"));
        }

        let mut principal: Option<&str> = None;
        for grant in &self.grants {
            if grant.rank == SkillRank::Principal {
                if principal.is_some() {
                    return Err(ValidationError::DuplicatePrincipal {
                        resource_id: self.id.clone(),
                        skill: grant.skill.clone(),
                    });
                }
                principal = Some(&grant.skill);
            }
        }

        if let (Some(start), Some(end)) = (self.contract_start, self.contract_end) {
            if start > end {
                return Err(ValidationError::InvertedRange { start, end });
            }
        }

        Ok(())
    }
}

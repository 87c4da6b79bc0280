//! Persistence collaborator contract.
//!
//! The real system persists to a remote backend; the engine only depends on
//! the [`PlanningStore`] trait — typed-table reads plus the four writes the
//! committer performs. Every call is an independent remote round-trip from
//! the engine's point of view: there is no transaction spanning calls.
//!
//! [`InMemoryStore`] is the development and test implementation, with a
//! one-shot fault-injection hook to exercise partial-batch semantics.

use std::collections::BTreeMap;

use crate::error::{StoreError, ValidationError};
use crate::models::{Absence, Assignment, NeedPeriod, Resource, Transfer, TransferStatus};

/// Typed-table contract the engine plans and commits against.
pub trait PlanningStore {
    /// All resources.
    fn resources(&self) -> Result<Vec<Resource>, StoreError>;

    /// One resource by id.
    fn resource(&self, id: &str) -> Result<Option<Resource>, StoreError>;

    /// Need periods declared for an engagement.
    fn need_periods(&self, engagement_id: &str) -> Result<Vec<NeedPeriod>, StoreError>;

    /// All absence records.
    fn absences(&self) -> Result<Vec<Absence>, StoreError>;

    /// All transfer records.
    fn transfers(&self) -> Result<Vec<Transfer>, StoreError>;

    /// Assignments belonging to an engagement.
    fn assignments_for_engagement(&self, engagement_id: &str)
        -> Result<Vec<Assignment>, StoreError>;

    /// Assignments held by a resource, across all engagements.
    fn assignments_for_resource(&self, resource_id: &str) -> Result<Vec<Assignment>, StoreError>;

    /// Persists a new assignment.
    fn insert_assignment(&mut self, assignment: Assignment) -> Result<(), StoreError>;

    /// Deletes an assignment by id.
    fn delete_assignment(&mut self, assignment_id: &str) -> Result<(), StoreError>;

    /// Persists a new transfer.
    fn insert_transfer(&mut self, transfer: Transfer) -> Result<(), StoreError>;

    /// Updates a transfer's lifecycle status.
    fn set_transfer_status(
        &mut self,
        transfer_id: &str,
        status: TransferStatus,
    ) -> Result<(), StoreError>;
}

/// In-memory store for development and tests.
///
/// Deterministic iteration order (`BTreeMap`-backed) so test output is
/// stable. Not meant for production use.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    resources: BTreeMap<String, Resource>,
    needs: Vec<NeedPeriod>,
    absences: Vec<Absence>,
    assignments: BTreeMap<String, Assignment>,
    transfers: BTreeMap<String, Transfer>,
    fail_after_writes: Option<u32>,
}

impl InMemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a resource, enforcing write-time invariants
    /// (single Principal grant, contract date order).
    pub fn add_resource(&mut self, resource: Resource) -> Result<(), ValidationError> {
        resource.validate()?;
        self.resources.insert(resource.id.clone(), resource);
        Ok(())
    }

    /// Seeds a need period.
    pub fn add_need(&mut self, need: NeedPeriod) -> Result<(), ValidationError> {
        need.validate()?;
        self.needs.push(need);
        Ok(())
    }

    /// Seeds an absence record.
    pub fn add_absence(&mut self, absence: Absence) {
        self.absences.push(absence);
    }

    /// Makes the next write call fail with a backend error.
    ///
    /// One-shot: the hook clears after the failed call. Used to exercise
    /// the committer's non-transactional failure semantics.
    pub fn fail_next_write(&mut self) {
        self.fail_write(1);
    }

    /// Makes the `nth` subsequent write call fail (1-based); the writes
    /// before it land normally.
    pub fn fail_write(&mut self, nth: u32) {
        self.fail_after_writes = Some(nth);
    }

    fn check_write(&mut self) -> Result<(), StoreError> {
        if let Some(countdown) = self.fail_after_writes.as_mut() {
            *countdown -= 1;
            if *countdown == 0 {
                self.fail_after_writes = None;
                return Err(StoreError::Backend("injected write failure".into()));
            }
        }
        Ok(())
    }
}

impl PlanningStore for InMemoryStore {
    fn resources(&self) -> Result<Vec<Resource>, StoreError> {
        Ok(self.resources.values().cloned().collect())
    }

    fn resource(&self, id: &str) -> Result<Option<Resource>, StoreError> {
        Ok(self.resources.get(id).cloned())
    }

    fn need_periods(&self, engagement_id: &str) -> Result<Vec<NeedPeriod>, StoreError> {
        Ok(self
            .needs
            .iter()
            .filter(|n| n.engagement_id == engagement_id)
            .cloned()
            .collect())
    }

    fn absences(&self) -> Result<Vec<Absence>, StoreError> {
        Ok(self.absences.clone())
    }

    fn transfers(&self) -> Result<Vec<Transfer>, StoreError> {
        Ok(self.transfers.values().cloned().collect())
    }

    fn assignments_for_engagement(
        &self,
        engagement_id: &str,
    ) -> Result<Vec<Assignment>, StoreError> {
        Ok(self
            .assignments
            .values()
            .filter(|a| a.engagement_id == engagement_id)
            .cloned()
            .collect())
    }

    fn assignments_for_resource(&self, resource_id: &str) -> Result<Vec<Assignment>, StoreError> {
        Ok(self
            .assignments
            .values()
            .filter(|a| a.resource_id == resource_id)
            .cloned()
            .collect())
    }

    fn insert_assignment(&mut self, assignment: Assignment) -> Result<(), StoreError> {
        self.check_write()?;
        if self.assignments.contains_key(&assignment.id) {
            return Err(StoreError::Backend(format!(
                "duplicate assignment id: {}",
                assignment.id
            )));
        }
        self.assignments.insert(assignment.id.clone(), assignment);
        Ok(())
    }

    fn delete_assignment(&mut self, assignment_id: &str) -> Result<(), StoreError> {
        self.check_write()?;
        self.assignments
            .remove(assignment_id)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(assignment_id.to_string()))
    }

    fn insert_transfer(&mut self, transfer: Transfer) -> Result<(), StoreError> {
        self.check_write()?;
        if self.transfers.contains_key(&transfer.id) {
            return Err(StoreError::Backend(format!(
                "duplicate transfer id: {}",
                transfer.id
            )));
        }
        self.transfers.insert(transfer.id.clone(), transfer);
        Ok(())
    }

    fn set_transfer_status(
        &mut self,
        transfer_id: &str,
        status: TransferStatus,
    ) -> Result<(), StoreError> {
        self.check_write()?;
        match self.transfers.get_mut(transfer_id) {
            Some(transfer) => {
                transfer.status = status;
                Ok(())
            }
            None => Err(StoreError::NotFound(transfer_id.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DateRange, SkillRank};
    use chrono::NaiveDate;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn range() -> DateRange {
        DateRange::new(d(2026, 1, 5), d(2026, 1, 9))
    }

    #[test]
    fn test_resource_seeding_validates() {
        let mut store = InMemoryStore::new();
        store
            .add_resource(Resource::new("R1", "SITE_A").with_skill("WELDING", SkillRank::Principal))
            .unwrap();

        let invalid = Resource::new("R2", "SITE_A")
            .with_skill("WELDING", SkillRank::Principal)
            .with_skill("PIPING", SkillRank::Principal);
        assert!(store.add_resource(invalid).is_err());

        assert_eq!(store.resources().unwrap().len(), 1);
        assert!(store.resource("R1").unwrap().is_some());
        assert!(store.resource("R2").unwrap().is_none());
    }

    #[test]
    fn test_assignment_roundtrip() {
        let mut store = InMemoryStore::new();
        let a = Assignment::new("A1", "R1", "ENG1", "SITE_A", "WELDING", range(), 5);
        store.insert_assignment(a).unwrap();

        assert_eq!(store.assignments_for_engagement("ENG1").unwrap().len(), 1);
        assert_eq!(store.assignments_for_resource("R1").unwrap().len(), 1);
        assert!(store.assignments_for_resource("R2").unwrap().is_empty());

        store.delete_assignment("A1").unwrap();
        assert!(store.assignments_for_engagement("ENG1").unwrap().is_empty());
        assert_eq!(
            store.delete_assignment("A1"),
            Err(StoreError::NotFound("A1".into()))
        );
    }

    #[test]
    fn test_duplicate_assignment_rejected() {
        let mut store = InMemoryStore::new();
        let a = Assignment::new("A1", "R1", "ENG1", "SITE_A", "WELDING", range(), 5);
        store.insert_assignment(a.clone()).unwrap();
        assert!(store.insert_assignment(a).is_err());
    }

    #[test]
    fn test_transfer_status_update() {
        let mut store = InMemoryStore::new();
        let t = Transfer::new("T1", "R2", "SITE_B", "SITE_A", range(), TransferStatus::Planned);
        store.insert_transfer(t).unwrap();

        store
            .set_transfer_status("T1", TransferStatus::Applied)
            .unwrap();
        assert_eq!(
            store.transfers().unwrap()[0].status,
            TransferStatus::Applied
        );
        assert_eq!(
            store.set_transfer_status("T9", TransferStatus::Applied),
            Err(StoreError::NotFound("T9".into()))
        );
    }

    #[test]
    fn test_fault_injection_is_one_shot() {
        let mut store = InMemoryStore::new();
        store.fail_next_write();

        let a = Assignment::new("A1", "R1", "ENG1", "SITE_A", "WELDING", range(), 5);
        assert!(matches!(
            store.insert_assignment(a.clone()),
            Err(StoreError::Backend(_))
        ));
        // Flag cleared: the retry lands.
        store.insert_assignment(a).unwrap();
    }
}

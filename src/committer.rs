//! Batch execution of a human-approved staffing plan.
//!
//! Executes in order: delete deselected assignments, create new assignments
//! over the chosen (possibly partial) ranges, and ensure a transfer exists
//! for every addition whose resource lives on another site.
//!
//! # Failure semantics
//! **Not transactional.** Each step is an independent store call; a failing
//! step aborts the batch but earlier steps are not rolled back. The returned
//! [`CommitError`] carries the partial receipt of completed steps, and
//! callers must treat the batch as "attempted": run [`reconcile`] to
//! re-read state before presenting anything as done.
//!
//! [`reconcile`]: BatchAssignmentCommitter::reconcile

use chrono::NaiveDate;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::availability::{AvailabilityClassifier, ResourceFacts};
use crate::calendar::BusinessCalendar;
use crate::coverage::NeedAggregator;
use crate::error::{PlanningError, StoreError, ValidationError};
use crate::models::{Assignment, Coverage, DateRange, NeedPeriod, Transfer, TransferStatus};
use crate::store::PlanningStore;

/// One approved addition: a resource put on a need period.
#[derive(Debug, Clone)]
pub struct Addition {
    /// The selected resource.
    pub resource_id: String,
    /// The need period being staffed.
    pub need: NeedPeriod,
    /// Operator-chosen partial range; the full need range when absent.
    pub period_override: Option<DateRange>,
}

impl Addition {
    /// Creates an addition over the full need range.
    pub fn new(resource_id: impl Into<String>, need: NeedPeriod) -> Self {
        Self {
            resource_id: resource_id.into(),
            need,
            period_override: None,
        }
    }

    /// Restricts the addition to an explicit sub-range.
    pub fn with_period(mut self, period: DateRange) -> Self {
        self.period_override = Some(period);
        self
    }

    /// The range the assignment will cover.
    pub fn effective_period(&self) -> DateRange {
        self.period_override.unwrap_or(self.need.period)
    }
}

/// A finalized batch: additions, removals, and transfer immediacy.
#[derive(Debug, Clone)]
pub struct CommitPlan {
    /// Resources to add, with their target need and optional sub-range.
    pub additions: Vec<Addition>,
    /// Ids of existing assignments the operator deselected.
    pub removals: Vec<String>,
    /// Status given to transfers created by this batch. `Planned` unless
    /// the caller declares the relocation immediate.
    pub transfer_immediacy: TransferStatus,
}

impl CommitPlan {
    /// Creates an empty plan with planned (non-immediate) transfers.
    pub fn new() -> Self {
        Self {
            additions: Vec::new(),
            removals: Vec::new(),
            transfer_immediacy: TransferStatus::Planned,
        }
    }

    /// Adds an addition.
    pub fn with_addition(mut self, addition: Addition) -> Self {
        self.additions.push(addition);
        self
    }

    /// Marks an existing assignment for removal.
    pub fn with_removal(mut self, assignment_id: impl Into<String>) -> Self {
        self.removals.push(assignment_id.into());
        self
    }

    /// Creates transfers directly in `Applied` status.
    pub fn with_immediate_transfers(mut self) -> Self {
        self.transfer_immediacy = TransferStatus::Applied;
        self
    }
}

impl Default for CommitPlan {
    fn default() -> Self {
        Self::new()
    }
}

/// What a batch actually persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitReceipt {
    /// Assignment ids deleted.
    pub removed: Vec<String>,
    /// Assignment ids created.
    pub created_assignments: Vec<String>,
    /// Transfer ids created.
    pub created_transfers: Vec<String>,
}

/// A failed batch: the error plus everything that had already landed.
///
/// Completed steps are **not** rolled back; re-verify store state before
/// retrying.
#[derive(Debug, Clone, Error)]
#[error("{error}")]
pub struct CommitError {
    /// The failure that aborted the batch.
    pub error: PlanningError,
    /// Steps completed before the failure.
    pub partial: CommitReceipt,
}

/// Per-need coverage snapshot returned by the reconcile step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NeedCoverage {
    /// The need period.
    pub need_id: String,
    /// Required vs assigned, freshly re-read.
    pub coverage: Coverage,
}

/// Executes finalized staffing plans against a store.
pub struct BatchAssignmentCommitter<'a> {
    calendar: &'a dyn BusinessCalendar,
}

impl<'a> BatchAssignmentCommitter<'a> {
    /// Creates a committer over the given calendar.
    pub fn new(calendar: &'a dyn BusinessCalendar) -> Self {
        Self { calendar }
    }

    /// Executes a plan: removals, then additions, then transfers.
    ///
    /// Validation and the commit-time availability re-check happen before
    /// the first write; a plan refused here has touched nothing. After the
    /// first write, failures surface as [`CommitError`] with the partial
    /// receipt.
    pub fn commit<S: PlanningStore>(
        &self,
        store: &mut S,
        plan: &CommitPlan,
    ) -> Result<CommitReceipt, CommitError> {
        let mut receipt = CommitReceipt::default();

        if let Err(error) = self.validate_plan(plan) {
            warn!(%error, "commit plan refused");
            return Err(CommitError {
                error: error.into(),
                partial: receipt,
            });
        }
        if let Err(error) = self.recheck_availability(store, plan) {
            warn!(%error, "commit-time availability re-check failed");
            return Err(CommitError {
                error,
                partial: receipt,
            });
        }

        for assignment_id in &plan.removals {
            debug!(%assignment_id, "deleting deselected assignment");
            if let Err(e) = store.delete_assignment(assignment_id) {
                return Err(self.abort(e, receipt));
            }
            receipt.removed.push(assignment_id.clone());
        }

        for addition in &plan.additions {
            let period = addition.effective_period();
            let charge = self.calendar.business_days_between(&period);
            let assignment = Assignment::new(
                assignment_key(addition, &period),
                &addition.resource_id,
                &addition.need.engagement_id,
                &addition.need.site,
                &addition.need.skill,
                period,
                charge,
            );
            debug!(
                resource_id = %addition.resource_id,
                need_id = %addition.need.id,
                %charge,
                "creating assignment"
            );
            let assignment_id = assignment.id.clone();
            if let Err(e) = store.insert_assignment(assignment) {
                return Err(self.abort(e, receipt));
            }
            receipt.created_assignments.push(assignment_id);

            match self.ensure_transfer(store, plan, addition, &period) {
                Ok(Some(transfer_id)) => receipt.created_transfers.push(transfer_id),
                Ok(None) => {}
                Err(e) => return Err(self.abort(e, receipt)),
            }
        }

        info!(
            removed = receipt.removed.len(),
            created = receipt.created_assignments.len(),
            transfers = receipt.created_transfers.len(),
            "batch committed"
        );
        Ok(receipt)
    }

    /// Compensating read-after-write step.
    ///
    /// Re-reads assignments and recomputes per-need coverage. Callers run
    /// this after every commit attempt — successful or not — before
    /// presenting coverage to the operator.
    pub fn reconcile<S: PlanningStore>(
        &self,
        store: &S,
        needs: &[NeedPeriod],
    ) -> Result<Vec<NeedCoverage>, StoreError> {
        let aggregator = NeedAggregator::new(self.calendar);
        let mut snapshot = Vec::with_capacity(needs.len());
        for need in needs {
            let assignments = store.assignments_for_engagement(&need.engagement_id)?;
            snapshot.push(NeedCoverage {
                need_id: need.id.clone(),
                coverage: aggregator.coverage_for(need, &assignments),
            });
        }
        Ok(snapshot)
    }

    /// Promotes every planned transfer whose start date has arrived.
    ///
    /// Run from a periodic timer by the hosting application. Promotions
    /// already applied when a later one fails are kept, consistent with
    /// the non-transactional model.
    pub fn apply_due_transfers<S: PlanningStore>(
        store: &mut S,
        today: NaiveDate,
    ) -> Result<Vec<String>, StoreError> {
        let mut applied = Vec::new();
        for transfer in store.transfers()? {
            if transfer.status == TransferStatus::Planned && transfer.period.start <= today {
                store.set_transfer_status(&transfer.id, TransferStatus::Applied)?;
                info!(
                    transfer_id = %transfer.id,
                    resource_id = %transfer.resource_id,
                    "transfer applied"
                );
                applied.push(transfer.id);
            }
        }
        Ok(applied)
    }

    /// Structural checks, before any store call.
    fn validate_plan(&self, plan: &CommitPlan) -> Result<(), ValidationError> {
        if plan.additions.is_empty() && plan.removals.is_empty() {
            return Err(ValidationError::EmptyBatch);
        }

        let mut batch_skill: Option<&str> = None;
        for addition in &plan.additions {
            if addition.resource_id.is_empty() {
                return Err(ValidationError::MissingField("addition.resource_id"));
            }
            addition.need.validate()?;
            if let Some(period) = &addition.period_override {
                period.validate()?;
            }
            match batch_skill {
                None => batch_skill = Some(&addition.need.skill),
                Some(expected) if expected != addition.need.skill => {
                    return Err(ValidationError::MixedSkills {
                        expected: expected.to_string(),
                        found: addition.need.skill.clone(),
                    });
                }
                Some(_) => {}
            }
        }

        for assignment_id in &plan.removals {
            if assignment_id.is_empty() {
                return Err(ValidationError::MissingField("removal.assignment_id"));
            }
        }
        Ok(())
    }

    /// Commit-time availability re-check, catching races with concurrent
    /// changes since the plan was built.
    ///
    /// Assignments the plan removes are excluded from the facts: they will
    /// be gone before the additions land.
    fn recheck_availability<S: PlanningStore>(
        &self,
        store: &S,
        plan: &CommitPlan,
    ) -> Result<(), PlanningError> {
        let classifier = AvailabilityClassifier::new(self.calendar);
        let absences = store.absences()?;
        let transfers = store.transfers()?;

        for addition in &plan.additions {
            let resource = store
                .resource(&addition.resource_id)?
                .ok_or_else(|| StoreError::NotFound(addition.resource_id.clone()))?;

            let assignments: Vec<Assignment> = store
                .assignments_for_resource(&addition.resource_id)?
                .into_iter()
                .filter(|a| !plan.removals.contains(&a.id))
                .collect();

            let facts = ResourceFacts {
                resource: &resource,
                absences: &absences,
                transfers: &transfers,
                assignments: &assignments,
            };

            let mut probe = addition.need.clone();
            probe.period = addition.effective_period();
            let result = classifier.classify_period(&facts, &probe);
            if let Some(blocked) = result.blocked_days.first() {
                return Err(PlanningError::AvailabilityConflict {
                    resource_id: addition.resource_id.clone(),
                    date: blocked.date,
                    status: blocked.status,
                });
            }
        }
        Ok(())
    }

    /// Ensures a transfer covers an off-site addition.
    ///
    /// The window-matching rule: same resource, same destination, status
    /// planned or applied, any date overlap with the addition's range. A
    /// match is left untouched — no silent range-widening. Returns the id
    /// of a transfer created here, if any.
    fn ensure_transfer<S: PlanningStore>(
        &self,
        store: &mut S,
        plan: &CommitPlan,
        addition: &Addition,
        period: &DateRange,
    ) -> Result<Option<String>, PlanningError> {
        let resource = store
            .resource(&addition.resource_id)?
            .ok_or_else(|| StoreError::NotFound(addition.resource_id.clone()))?;
        if resource.site == addition.need.site {
            return Ok(None);
        }

        let existing = store.transfers()?.into_iter().any(|t| {
            t.resource_id == addition.resource_id
                && t.site_destination == addition.need.site
                && matches!(t.status, TransferStatus::Planned | TransferStatus::Applied)
                && t.period.overlaps(period)
        });
        if existing {
            debug!(
                resource_id = %addition.resource_id,
                destination = %addition.need.site,
                "transfer already covers the addition window"
            );
            return Ok(None);
        }

        let transfer = Transfer::new(
            transfer_key(&addition.resource_id, &addition.need.site, period),
            &addition.resource_id,
            &resource.site,
            &addition.need.site,
            *period,
            plan.transfer_immediacy,
        );
        transfer.validate()?;
        debug!(
            resource_id = %addition.resource_id,
            origin = %resource.site,
            destination = %addition.need.site,
            status = ?plan.transfer_immediacy,
            "creating transfer"
        );
        let transfer_id = transfer.id.clone();
        store.insert_transfer(transfer)?;
        Ok(Some(transfer_id))
    }

    fn abort(&self, error: impl Into<PlanningError>, partial: CommitReceipt) -> CommitError {
        let error = error.into();
        warn!(%error, "batch aborted; completed steps stand");
        CommitError { error, partial }
    }
}

/// Derived natural key for a created assignment. Backing stores may remap
/// ids; within one batch the key is unique per (resource, need, start).
fn assignment_key(addition: &Addition, period: &DateRange) -> String {
    format!(
        "{}:{}:{}",
        addition.need.id, addition.resource_id, period.start
    )
}

/// Derived natural key for a created transfer.
fn transfer_key(resource_id: &str, destination: &str, period: &DateRange) -> String {
    format!("tr:{}:{}:{}", resource_id, destination, period.start)
}

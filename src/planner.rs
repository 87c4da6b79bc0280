//! Candidate bucketing for staffing a batch of need periods.
//!
//! Combines the availability classifier and the conflict detector to sort
//! every skill-holding resource into one of four buckets: available on the
//! need's site, available but requiring a transfer, partially available
//! (some days blocked), or unavailable. The planner only classifies — a
//! human picks from the plan and the committer executes.
//!
//! Batch invariant: all need periods passed together must share one skill;
//! mixed batches are refused before any work happens.

use serde::{Deserialize, Serialize};

use crate::availability::{Availability, AvailabilityClassifier, PeriodAvailability, ResourceFacts};
use crate::calendar::{workable_days, BusinessCalendar};
use crate::conflict::{detect_conflicts, CandidateSlot, SkillOverlap};
use crate::error::ValidationError;
use crate::models::{Absence, Assignment, NeedPeriod, Resource, SkillRank, Transfer};

/// What happens when a selection exceeds the required count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SurplusPolicy {
    /// Return a confirmation signal the caller must re-confirm (default).
    #[default]
    Confirm,
    /// Reject the selection as a validation error.
    Block,
}

/// Outcome of a selection-count check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionCheck {
    /// Selection within the required count.
    Ok,
    /// Selection exceeds the requirement; the caller must confirm
    /// explicitly before committing.
    WouldExceedRequirement {
        /// Required headcount of the need period.
        required: u32,
        /// Headcount after the attempted selection.
        selected: u32,
    },
}

/// Tables the planner reads. May be whole-table store reads; facts not
/// belonging to a candidate resource are ignored per candidate.
#[derive(Debug, Clone, Copy)]
pub struct PlanningFacts<'a> {
    /// All resources under consideration.
    pub resources: &'a [Resource],
    /// Absence records.
    pub absences: &'a [Absence],
    /// Transfer records.
    pub transfers: &'a [Transfer],
    /// Existing assignments, across engagements.
    pub assignments: &'a [Assignment],
}

/// A resource free on every workable day of every period in the batch.
#[derive(Debug, Clone)]
pub struct Candidate {
    /// The candidate resource.
    pub resource_id: String,
    /// Rank of its grant for the batch skill.
    pub rank: SkillRank,
    /// Same-engagement cross-skill overlaps, for the warning indicator.
    pub advisory: Vec<SkillOverlap>,
}

/// A resource free on some days and blocked on others.
///
/// The operator may select the free subset, or override with an explicit
/// partial date range at commit time.
#[derive(Debug, Clone)]
pub struct PartialCandidate {
    /// The candidate resource.
    pub resource_id: String,
    /// Rank of its grant for the batch skill.
    pub rank: SkillRank,
    /// Per-period day detail (free days and blocked days with status).
    pub windows: Vec<PeriodAvailability>,
    /// Same-engagement cross-skill overlaps, for the warning indicator.
    pub advisory: Vec<SkillOverlap>,
}

/// A resource with no free day on at least one period.
#[derive(Debug, Clone)]
pub struct UnavailableResource {
    /// The rejected resource.
    pub resource_id: String,
    /// The period that rejected it.
    pub need_id: String,
    /// Highest-priority blocking status, for display.
    pub reason: Availability,
}

/// The planner's output: every skill-holding resource, bucketed.
#[derive(Debug, Clone, Default)]
pub struct StaffingPlan {
    /// Skill shared by the whole batch.
    pub skill: String,
    /// Available on all periods, home site matches every need site.
    pub same_site: Vec<Candidate>,
    /// Available on all periods, home site differs from a need site —
    /// committing creates or reuses a transfer.
    pub needs_transfer: Vec<Candidate>,
    /// Free on some days, blocked on others.
    pub partial: Vec<PartialCandidate>,
    /// No free day on at least one period.
    pub unavailable: Vec<UnavailableResource>,
    /// Existing assignments matching the batch, individually deselectable
    /// for removal.
    pub already_assigned: Vec<Assignment>,
}

/// Buckets skill-holding resources against a batch of need periods.
pub struct AssignmentPlanner<'a> {
    calendar: &'a dyn BusinessCalendar,
    surplus_policy: SurplusPolicy,
}

impl<'a> AssignmentPlanner<'a> {
    /// Creates a planner with the soft-confirm surplus policy.
    pub fn new(calendar: &'a dyn BusinessCalendar) -> Self {
        Self {
            calendar,
            surplus_policy: SurplusPolicy::Confirm,
        }
    }

    /// Sets the surplus policy.
    pub fn with_surplus_policy(mut self, policy: SurplusPolicy) -> Self {
        self.surplus_policy = policy;
        self
    }

    /// Builds a staffing plan for a batch of need periods.
    ///
    /// Rejected before any classification: empty batches, structurally
    /// invalid needs, and batches mixing skills. Periods without a single
    /// workable day are dropped from the batch.
    pub fn plan(
        &self,
        needs: &[NeedPeriod],
        facts: &PlanningFacts<'_>,
    ) -> Result<StaffingPlan, ValidationError> {
        let batch = self.validate_batch(needs)?;
        let skill = batch[0].skill.clone();
        let classifier = AvailabilityClassifier::new(self.calendar);

        let mut plan = StaffingPlan {
            skill: skill.clone(),
            ..StaffingPlan::default()
        };

        for resource in facts.resources.iter().filter(|r| r.active) {
            let Some(rank) = resource.skill_rank(&skill) else {
                continue;
            };

            let resource_facts = ResourceFacts {
                resource,
                absences: facts.absences,
                transfers: facts.transfers,
                assignments: facts.assignments,
            };

            let windows: Vec<PeriodAvailability> = batch
                .iter()
                .map(|need| classifier.classify_period(&resource_facts, need))
                .collect();

            if let Some((need, window)) = batch
                .iter()
                .zip(&windows)
                .find(|(_, w)| w.is_fully_blocked())
            {
                plan.unavailable.push(UnavailableResource {
                    resource_id: resource.id.clone(),
                    need_id: need.id.clone(),
                    reason: window
                        .dominant_blocker()
                        .unwrap_or(Availability::Conflict),
                });
                continue;
            }

            let advisory = self.advisory_overlaps(&batch, facts, &resource.id);

            if windows.iter().any(|w| w.is_partial()) {
                plan.partial.push(PartialCandidate {
                    resource_id: resource.id.clone(),
                    rank,
                    windows,
                    advisory,
                });
            } else if batch.iter().all(|need| need.site == resource.site) {
                plan.same_site.push(Candidate {
                    resource_id: resource.id.clone(),
                    rank,
                    advisory,
                });
            } else {
                plan.needs_transfer.push(Candidate {
                    resource_id: resource.id.clone(),
                    rank,
                    advisory,
                });
            }
        }

        plan.already_assigned = facts
            .assignments
            .iter()
            .filter(|a| {
                a.skill == skill
                    && batch.iter().any(|need| {
                        need.engagement_id == a.engagement_id && need.period.overlaps(&a.period)
                    })
            })
            .cloned()
            .collect();

        sort_plan(&mut plan);
        Ok(plan)
    }

    /// Checks a selection count against a need's requirement.
    ///
    /// `already_assigned` counts kept existing assignments; `adding` is the
    /// number of newly selected resources. Under [`SurplusPolicy::Confirm`]
    /// an excess selection returns a signal the caller must re-confirm;
    /// under [`SurplusPolicy::Block`] it is a validation error.
    pub fn check_selection(
        &self,
        need: &NeedPeriod,
        already_assigned: u32,
        adding: u32,
    ) -> Result<SelectionCheck, ValidationError> {
        let selected = already_assigned + adding;
        if selected <= need.required_count {
            return Ok(SelectionCheck::Ok);
        }
        match self.surplus_policy {
            SurplusPolicy::Confirm => Ok(SelectionCheck::WouldExceedRequirement {
                required: need.required_count,
                selected,
            }),
            SurplusPolicy::Block => Err(ValidationError::SurplusBlocked {
                required: need.required_count,
                selected,
            }),
        }
    }

    /// Validates the batch and drops periods with no workable day.
    fn validate_batch<'n>(
        &self,
        needs: &'n [NeedPeriod],
    ) -> Result<Vec<&'n NeedPeriod>, ValidationError> {
        let Some(first) = needs.first() else {
            return Err(ValidationError::EmptyBatch);
        };
        for need in needs {
            need.validate()?;
            if need.skill != first.skill {
                return Err(ValidationError::MixedSkills {
                    expected: first.skill.clone(),
                    found: need.skill.clone(),
                });
            }
        }

        let batch: Vec<&NeedPeriod> = needs
            .iter()
            .filter(|n| {
                !workable_days(self.calendar, &n.period, n.force_weekend_holiday).is_empty()
            })
            .collect();
        if batch.is_empty() {
            return Err(ValidationError::EmptyBatch);
        }
        Ok(batch)
    }

    /// Collects same-engagement cross-skill overlaps across the batch,
    /// deduplicated by assignment.
    fn advisory_overlaps(
        &self,
        batch: &[&NeedPeriod],
        facts: &PlanningFacts<'_>,
        resource_id: &str,
    ) -> Vec<SkillOverlap> {
        let mut advisory: Vec<SkillOverlap> = Vec::new();
        for need in batch {
            let slot = CandidateSlot::new(&need.engagement_id, &need.skill, need.period);
            for overlap in detect_conflicts(facts.assignments, resource_id, &slot).advisory {
                if !advisory
                    .iter()
                    .any(|seen| seen.assignment_id == overlap.assignment_id)
                {
                    advisory.push(overlap);
                }
            }
        }
        advisory
    }
}

/// Principal grants first, then by resource id, so plan output is stable.
fn sort_plan(plan: &mut StaffingPlan) {
    let key = |rank: SkillRank, id: &str| (matches!(rank, SkillRank::Secondary), id.to_string());
    plan.same_site
        .sort_by_key(|c| key(c.rank, &c.resource_id));
    plan.needs_transfer
        .sort_by_key(|c| key(c.rank, &c.resource_id));
    plan.partial.sort_by_key(|c| key(c.rank, &c.resource_id));
    plan.unavailable
        .sort_by(|a, b| a.resource_id.cmp(&b.resource_id));
    plan.already_assigned.sort_by(|a, b| a.id.cmp(&b.id));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::WeekendCalendar;
    use crate::models::{DateRange, TransferStatus};
    use chrono::NaiveDate;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn welding_need() -> NeedPeriod {
        NeedPeriod::new(
            "N1",
            "ENG1",
            "SITE_A",
            "WELDING",
            DateRange::new(d(2026, 1, 5), d(2026, 1, 9)),
            2,
        )
    }

    fn welder(id: &str, site: &str) -> Resource {
        Resource::new(id, site).with_skill("WELDING", SkillRank::Principal)
    }

    #[test]
    fn test_scenario_a_same_site_and_transfer_buckets() {
        let cal = WeekendCalendar::new();
        let planner = AssignmentPlanner::new(&cal);
        let resources = vec![welder("R1", "SITE_A"), welder("R2", "SITE_B")];
        let facts = PlanningFacts {
            resources: &resources,
            absences: &[],
            transfers: &[],
            assignments: &[],
        };

        let plan = planner.plan(&[welding_need()], &facts).unwrap();
        assert_eq!(plan.same_site.len(), 1);
        assert_eq!(plan.same_site[0].resource_id, "R1");
        assert_eq!(plan.needs_transfer.len(), 1);
        assert_eq!(plan.needs_transfer[0].resource_id, "R2");
        assert!(plan.partial.is_empty());
        assert!(plan.unavailable.is_empty());
    }

    #[test]
    fn test_scenario_b_formation_gives_partial() {
        let cal = WeekendCalendar::new();
        let planner = AssignmentPlanner::new(&cal);
        let resources = vec![welder("R3", "SITE_A")];
        let absences = vec![Absence::new(
            "R3",
            DateRange::new(d(2026, 1, 6), d(2026, 1, 7)),
            "FORMATION",
        )];
        let facts = PlanningFacts {
            resources: &resources,
            absences: &absences,
            transfers: &[],
            assignments: &[],
        };

        let plan = planner.plan(&[welding_need()], &facts).unwrap();
        assert_eq!(plan.partial.len(), 1);
        let window = &plan.partial[0].windows[0];
        assert_eq!(
            window.available_days,
            vec![d(2026, 1, 5), d(2026, 1, 8), d(2026, 1, 9)]
        );
        assert!(window
            .blocked_days
            .iter()
            .all(|b| b.status == Availability::Formation));
    }

    #[test]
    fn test_scenario_c_conflict_gives_partial_with_free_days() {
        let cal = WeekendCalendar::new();
        let planner = AssignmentPlanner::new(&cal);
        let resources = vec![welder("R4", "SITE_A")];
        let assignments = vec![Assignment::new(
            "A1",
            "R4",
            "ENG_OTHER",
            "SITE_A",
            "WELDING",
            DateRange::new(d(2026, 1, 5), d(2026, 1, 6)),
            2,
        )];
        let facts = PlanningFacts {
            resources: &resources,
            absences: &[],
            transfers: &[],
            assignments: &assignments,
        };

        let plan = planner.plan(&[welding_need()], &facts).unwrap();
        assert_eq!(plan.partial.len(), 1);
        let window = &plan.partial[0].windows[0];
        assert_eq!(
            window.available_days,
            vec![d(2026, 1, 7), d(2026, 1, 8), d(2026, 1, 9)]
        );
        assert!(window
            .blocked_days
            .iter()
            .all(|b| b.status == Availability::Conflict));
    }

    #[test]
    fn test_fully_absent_resource_is_unavailable() {
        let cal = WeekendCalendar::new();
        let planner = AssignmentPlanner::new(&cal);
        let resources = vec![welder("R5", "SITE_A")];
        let absences = vec![Absence::new(
            "R5",
            DateRange::new(d(2026, 1, 1), d(2026, 1, 31)),
            "Congés payés",
        )];
        let facts = PlanningFacts {
            resources: &resources,
            absences: &absences,
            transfers: &[],
            assignments: &[],
        };

        let plan = planner.plan(&[welding_need()], &facts).unwrap();
        assert_eq!(plan.unavailable.len(), 1);
        assert_eq!(plan.unavailable[0].reason, Availability::Absent);
        assert_eq!(plan.unavailable[0].need_id, "N1");
    }

    #[test]
    fn test_inactive_and_unskilled_excluded() {
        let cal = WeekendCalendar::new();
        let planner = AssignmentPlanner::new(&cal);
        let resources = vec![
            welder("R6", "SITE_A").inactive(),
            Resource::new("R7", "SITE_A").with_skill("PIPING", SkillRank::Principal),
        ];
        let facts = PlanningFacts {
            resources: &resources,
            absences: &[],
            transfers: &[],
            assignments: &[],
        };

        let plan = planner.plan(&[welding_need()], &facts).unwrap();
        assert!(plan.same_site.is_empty());
        assert!(plan.needs_transfer.is_empty());
        assert!(plan.partial.is_empty());
        assert!(plan.unavailable.is_empty());
    }

    #[test]
    fn test_mixed_skills_refused() {
        let cal = WeekendCalendar::new();
        let planner = AssignmentPlanner::new(&cal);
        let mut piping = welding_need();
        piping.id = "N2".into();
        piping.skill = "PIPING".into();
        let facts = PlanningFacts {
            resources: &[],
            absences: &[],
            transfers: &[],
            assignments: &[],
        };

        let err = planner.plan(&[welding_need(), piping], &facts).unwrap_err();
        assert_eq!(
            err,
            ValidationError::MixedSkills {
                expected: "WELDING".into(),
                found: "PIPING".into(),
            }
        );
    }

    #[test]
    fn test_empty_batch_refused() {
        let cal = WeekendCalendar::new();
        let planner = AssignmentPlanner::new(&cal);
        let facts = PlanningFacts {
            resources: &[],
            absences: &[],
            transfers: &[],
            assignments: &[],
        };
        assert_eq!(
            planner.plan(&[], &facts).unwrap_err(),
            ValidationError::EmptyBatch
        );
    }

    #[test]
    fn test_applied_transfer_makes_destination_available() {
        // R2's transfer to SITE_A is applied over the need window, so it
        // classifies available there; its home site still differs, so it
        // stays in the needs-transfer bucket.
        let cal = WeekendCalendar::new();
        let planner = AssignmentPlanner::new(&cal);
        let resources = vec![welder("R2", "SITE_B")];
        let transfers = vec![Transfer::new(
            "T1",
            "R2",
            "SITE_B",
            "SITE_A",
            DateRange::new(d(2026, 1, 5), d(2026, 1, 9)),
            TransferStatus::Applied,
        )];
        let facts = PlanningFacts {
            resources: &resources,
            absences: &[],
            transfers: &transfers,
            assignments: &[],
        };

        let plan = planner.plan(&[welding_need()], &facts).unwrap();
        assert_eq!(plan.needs_transfer.len(), 1);
        assert!(plan.unavailable.is_empty());
    }

    #[test]
    fn test_already_assigned_listed() {
        let cal = WeekendCalendar::new();
        let planner = AssignmentPlanner::new(&cal);
        let resources = vec![welder("R1", "SITE_A")];
        let assignments = vec![
            Assignment::new(
                "A1",
                "R8",
                "ENG1",
                "SITE_A",
                "WELDING",
                DateRange::new(d(2026, 1, 5), d(2026, 1, 9)),
                5,
            ),
            // Other engagement: not part of this batch's existing list.
            Assignment::new(
                "A2",
                "R9",
                "ENG_OTHER",
                "SITE_A",
                "WELDING",
                DateRange::new(d(2026, 1, 5), d(2026, 1, 9)),
                5,
            ),
        ];
        let facts = PlanningFacts {
            resources: &resources,
            absences: &[],
            transfers: &[],
            assignments: &assignments,
        };

        let plan = planner.plan(&[welding_need()], &facts).unwrap();
        assert_eq!(plan.already_assigned.len(), 1);
        assert_eq!(plan.already_assigned[0].id, "A1");
    }

    #[test]
    fn test_advisory_cross_skill_warning() {
        let cal = WeekendCalendar::new();
        let planner = AssignmentPlanner::new(&cal);
        let resources = vec![welder("R1", "SITE_A")];
        // Same engagement, different skill: advisory, never blocking.
        let assignments = vec![Assignment::new(
            "A1",
            "R1",
            "ENG1",
            "SITE_A",
            "PIPING",
            DateRange::new(d(2026, 1, 5), d(2026, 1, 9)),
            5,
        )];
        let facts = PlanningFacts {
            resources: &resources,
            absences: &[],
            transfers: &[],
            assignments: &assignments,
        };

        let plan = planner.plan(&[welding_need()], &facts).unwrap();
        assert_eq!(plan.same_site.len(), 1);
        assert_eq!(plan.same_site[0].advisory.len(), 1);
        assert_eq!(plan.same_site[0].advisory[0].skill, "PIPING");
    }

    #[test]
    fn test_surplus_soft_confirm_and_hard_block() {
        let cal = WeekendCalendar::new();
        let need = welding_need(); // required = 2

        let soft = AssignmentPlanner::new(&cal);
        assert_eq!(soft.check_selection(&need, 1, 1), Ok(SelectionCheck::Ok));
        assert_eq!(
            soft.check_selection(&need, 1, 2),
            Ok(SelectionCheck::WouldExceedRequirement {
                required: 2,
                selected: 3,
            })
        );

        let hard = AssignmentPlanner::new(&cal).with_surplus_policy(SurplusPolicy::Block);
        assert_eq!(
            hard.check_selection(&need, 1, 2),
            Err(ValidationError::SurplusBlocked {
                required: 2,
                selected: 3,
            })
        );
    }

    #[test]
    fn test_principal_rank_sorts_first() {
        let cal = WeekendCalendar::new();
        let planner = AssignmentPlanner::new(&cal);
        let resources = vec![
            Resource::new("R1", "SITE_A").with_skill("WELDING", SkillRank::Secondary),
            Resource::new("R2", "SITE_A").with_skill("WELDING", SkillRank::Principal),
        ];
        let facts = PlanningFacts {
            resources: &resources,
            absences: &[],
            transfers: &[],
            assignments: &[],
        };

        let plan = planner.plan(&[welding_need()], &facts).unwrap();
        assert_eq!(plan.same_site[0].resource_id, "R2");
        assert_eq!(plan.same_site[1].resource_id, "R1");
    }
}

//! Need consolidation and coverage computation.
//!
//! Turns raw declared need periods into a consolidated per-skill,
//! per-bucket view: `required` is the maximum of overlapping declarations,
//! `assigned` counts distinct resources with a matching-skill assignment
//! overlapping the bucket. Pure over its inputs: running it twice on the
//! same data yields the same cells.

use std::collections::BTreeSet;

use crate::calendar::{bucket_ranges, workable_days, BusinessCalendar, Granularity};
use crate::models::{Assignment, Coverage, DateRange, NeedPeriod};

/// One consolidated cell: skill × date bucket with its coverage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoverageCell {
    /// Skill the cell covers.
    pub skill: String,
    /// Date bucket of the cell.
    pub bucket: DateRange,
    /// Required vs assigned headcount.
    pub coverage: Coverage,
}

/// Consolidates need declarations into coverage cells.
pub struct NeedAggregator<'a> {
    calendar: &'a dyn BusinessCalendar,
    granularity: Granularity,
}

impl<'a> NeedAggregator<'a> {
    /// Creates an aggregator with day granularity.
    pub fn new(calendar: &'a dyn BusinessCalendar) -> Self {
        Self {
            calendar,
            granularity: Granularity::Day,
        }
    }

    /// Sets the bucket granularity.
    pub fn with_granularity(mut self, granularity: Granularity) -> Self {
        self.granularity = granularity;
        self
    }

    /// Whether a need takes part in consolidation.
    ///
    /// Excluded: zero required count, and needs whose range falls entirely
    /// on non-business days without the force flag.
    pub fn is_plannable(&self, need: &NeedPeriod) -> bool {
        need.required_count > 0
            && !workable_days(self.calendar, &need.period, need.force_weekend_holiday).is_empty()
    }

    /// Builds the consolidated skill × bucket coverage grid.
    ///
    /// # Algorithm
    /// 1. Drop needs that are not plannable.
    /// 2. Bucket the horizon (min start to max end of remaining needs).
    /// 3. Per skill and bucket: `required` = max of overlapping declared
    ///    counts, `assigned` = distinct resources with a matching-skill
    ///    assignment overlapping the bucket.
    ///
    /// Cells with neither requirement nor assignment are omitted.
    pub fn consolidate(
        &self,
        needs: &[NeedPeriod],
        assignments: &[Assignment],
    ) -> Vec<CoverageCell> {
        let plannable: Vec<&NeedPeriod> =
            needs.iter().filter(|n| self.is_plannable(n)).collect();

        let (Some(start), Some(end)) = (
            plannable.iter().map(|n| n.period.start).min(),
            plannable.iter().map(|n| n.period.end).max(),
        ) else {
            return Vec::new();
        };
        let horizon = DateRange::new(start, end);

        let skills: BTreeSet<&str> = plannable.iter().map(|n| n.skill.as_str()).collect();

        let mut cells = Vec::new();
        for bucket in bucket_ranges(&horizon, self.granularity) {
            for &skill in &skills {
                let required = plannable
                    .iter()
                    .filter(|n| n.skill == skill && n.period.overlaps(&bucket))
                    .map(|n| n.required_count)
                    .max()
                    .unwrap_or(0);

                let assigned = distinct_assigned(assignments, skill, &bucket);

                if required > 0 || assigned > 0 {
                    cells.push(CoverageCell {
                        skill: skill.to_string(),
                        bucket,
                        coverage: Coverage::new(required, assigned),
                    });
                }
            }
        }
        cells
    }

    /// Coverage of a single need period: distinct resources holding a
    /// matching-skill assignment that overlaps the need's range.
    pub fn coverage_for(&self, need: &NeedPeriod, assignments: &[Assignment]) -> Coverage {
        Coverage::new(
            need.required_count,
            distinct_assigned(assignments, &need.skill, &need.period),
        )
    }
}

/// Distinct resources with a matching-skill assignment overlapping `range`.
fn distinct_assigned(assignments: &[Assignment], skill: &str, range: &DateRange) -> u32 {
    let resources: BTreeSet<&str> = assignments
        .iter()
        .filter(|a| a.skill == skill && a.period.overlaps(range))
        .map(|a| a.resource_id.as_str())
        .collect();
    resources.len() as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::WeekendCalendar;
    use crate::models::CoverageStatus;
    use chrono::NaiveDate;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn need(id: &str, skill: &str, range: DateRange, count: u32) -> NeedPeriod {
        NeedPeriod::new(id, "ENG1", "SITE_A", skill, range, count)
    }

    fn assignment(id: &str, resource: &str, skill: &str, range: DateRange) -> Assignment {
        Assignment::new(id, resource, "ENG1", "SITE_A", skill, range, range.day_count())
    }

    #[test]
    fn test_overlapping_declarations_take_max() {
        let cal = WeekendCalendar::new();
        let aggregator = NeedAggregator::new(&cal);
        let needs = vec![
            need("N1", "WELDING", DateRange::new(d(2026, 1, 5), d(2026, 1, 9)), 2),
            need("N2", "WELDING", DateRange::new(d(2026, 1, 7), d(2026, 1, 9)), 3),
        ];

        let cells = aggregator.consolidate(&needs, &[]);
        let on = |day: NaiveDate| {
            cells
                .iter()
                .find(|c| c.bucket.contains(day))
                .unwrap()
                .coverage
        };
        assert_eq!(on(d(2026, 1, 5)).required, 2);
        assert_eq!(on(d(2026, 1, 7)).required, 3); // max of 2 and 3
        assert_eq!(on(d(2026, 1, 9)).required, 3);
    }

    #[test]
    fn test_assigned_counts_distinct_resources() {
        let cal = WeekendCalendar::new();
        let aggregator = NeedAggregator::new(&cal);
        let needs = vec![need(
            "N1",
            "WELDING",
            DateRange::new(d(2026, 1, 5), d(2026, 1, 9)),
            2,
        )];
        // R1 holds two overlapping assignments; still one head.
        let assignments = vec![
            assignment("A1", "R1", "WELDING", DateRange::new(d(2026, 1, 5), d(2026, 1, 7))),
            assignment("A2", "R1", "WELDING", DateRange::new(d(2026, 1, 6), d(2026, 1, 9))),
            assignment("A3", "R2", "WELDING", DateRange::new(d(2026, 1, 5), d(2026, 1, 9))),
            assignment("A4", "R3", "PIPING", DateRange::new(d(2026, 1, 5), d(2026, 1, 9))),
        ];

        let coverage = aggregator.coverage_for(&needs[0], &assignments);
        assert_eq!(coverage.assigned, 2);
        assert_eq!(coverage.status(), CoverageStatus::Ok);
    }

    #[test]
    fn test_shortage_and_surplus_reported() {
        let cal = WeekendCalendar::new();
        let aggregator = NeedAggregator::new(&cal);
        let n = need("N1", "WELDING", DateRange::new(d(2026, 1, 5), d(2026, 1, 9)), 3);

        let one = vec![assignment(
            "A1",
            "R1",
            "WELDING",
            DateRange::new(d(2026, 1, 5), d(2026, 1, 9)),
        )];
        let under = aggregator.coverage_for(&n, &one);
        assert_eq!(under.status(), CoverageStatus::Under);
        assert_eq!(under.shortage(), 2);
        assert_eq!(under.surplus(), 0);

        let four: Vec<Assignment> = (1..=4)
            .map(|i| {
                assignment(
                    &format!("A{i}"),
                    &format!("R{i}"),
                    "WELDING",
                    DateRange::new(d(2026, 1, 5), d(2026, 1, 9)),
                )
            })
            .collect();
        let over = aggregator.coverage_for(&n, &four);
        assert_eq!(over.status(), CoverageStatus::Over);
        assert_eq!(over.surplus(), 1);
        assert_eq!(over.shortage(), 0);
    }

    #[test]
    fn test_zero_required_excluded() {
        let cal = WeekendCalendar::new();
        let aggregator = NeedAggregator::new(&cal);
        let needs = vec![need(
            "N1",
            "WELDING",
            DateRange::new(d(2026, 1, 5), d(2026, 1, 9)),
            0,
        )];
        assert!(aggregator.consolidate(&needs, &[]).is_empty());
    }

    #[test]
    fn test_weekend_only_need_ignored_unless_forced() {
        let cal = WeekendCalendar::new();
        let aggregator = NeedAggregator::new(&cal);
        // Sat 2026-01-10 .. Sun 2026-01-11
        let weekend = DateRange::new(d(2026, 1, 10), d(2026, 1, 11));
        let silent = need("N1", "WELDING", weekend, 2);
        assert!(!aggregator.is_plannable(&silent));
        assert!(aggregator.consolidate(&[silent], &[]).is_empty());

        let forced = need("N2", "WELDING", weekend, 2).with_forced_weekends();
        assert!(aggregator.is_plannable(&forced));
        assert!(!aggregator.consolidate(&[forced], &[]).is_empty());
    }

    #[test]
    fn test_week_granularity_buckets() {
        let cal = WeekendCalendar::new();
        let aggregator = NeedAggregator::new(&cal).with_granularity(Granularity::Week);
        // Two ISO weeks: Mon 01-05..Sun 01-11 and Mon 01-12..
        let needs = vec![need(
            "N1",
            "WELDING",
            DateRange::new(d(2026, 1, 5), d(2026, 1, 14)),
            2,
        )];
        let cells = aggregator.consolidate(&needs, &[]);
        assert_eq!(cells.len(), 2);
        assert_eq!(cells[0].bucket, DateRange::new(d(2026, 1, 5), d(2026, 1, 11)));
        assert_eq!(cells[1].bucket, DateRange::new(d(2026, 1, 12), d(2026, 1, 14)));
    }

    #[test]
    fn test_consolidation_is_idempotent() {
        let cal = WeekendCalendar::new();
        let aggregator = NeedAggregator::new(&cal);
        let needs = vec![
            need("N1", "WELDING", DateRange::new(d(2026, 1, 5), d(2026, 1, 9)), 2),
            need("N2", "PIPING", DateRange::new(d(2026, 1, 7), d(2026, 1, 13)), 1),
        ];
        let assignments = vec![assignment(
            "A1",
            "R1",
            "WELDING",
            DateRange::new(d(2026, 1, 5), d(2026, 1, 9)),
        )];

        let first = aggregator.consolidate(&needs, &assignments);
        let second = aggregator.consolidate(&needs, &assignments);
        assert_eq!(first, second);
    }
}

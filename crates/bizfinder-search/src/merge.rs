//! Merges per-sub-task result lists into one list keyed by `place_id`.
//!
//! The first record seen for a `place_id` is kept. Later duplicates only
//! fill in fields the kept record is missing, so overlapping sub-discs can
//! complete each other without overriding anything already known.

use std::collections::HashMap;

use bizfinder_core::BusinessRecord;
use serde::Serialize;

use crate::executor::TaskReport;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MergeStats {
    pub raw_count: usize,
    pub final_count: usize,
    /// Always `raw_count - final_count`.
    pub duplicates_removed: usize,
    /// Empty fields of kept records filled from later duplicates.
    pub fields_filled: usize,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergeOutcome {
    pub records: Vec<BusinessRecord>,
    pub stats: MergeStats,
}

/// Merge result lists given in task order.
///
/// Output order is first-seen order, so the same input always yields the
/// same output.
pub fn merge<I>(task_results: I) -> MergeOutcome
where
    I: IntoIterator<Item = Vec<BusinessRecord>>,
{
    let mut records: Vec<BusinessRecord> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();
    let mut raw_count = 0usize;
    let mut fields_filled = 0usize;

    for batch in task_results {
        raw_count += batch.len();
        for record in batch {
            if let Some(&position) = positions.get(&record.place_id) {
                fields_filled += records[position].fill_missing_from(&record);
            } else {
                positions.insert(record.place_id.clone(), records.len());
                records.push(record);
            }
        }
    }

    let final_count = records.len();
    MergeOutcome {
        records,
        stats: MergeStats {
            raw_count,
            final_count,
            duplicates_removed: raw_count - final_count,
            fields_filled,
        },
    }
}

/// Merge executor reports after restoring task order.
///
/// Reports arrive in completion order; sorting by task index first keeps the
/// merged output independent of scheduling.
#[must_use]
pub fn merge_reports(reports: &[TaskReport]) -> MergeOutcome {
    let mut ordered: Vec<&TaskReport> = reports.iter().collect();
    ordered.sort_by_key(|report| report.task.index);
    merge(
        ordered
            .into_iter()
            .map(|report| report.outcome.records().to_vec()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use bizfinder_core::Coordinates;
    use proptest::prelude::*;
    use uuid::Uuid;

    use crate::fake::named;
    use crate::fetcher::SubTaskOutcome;
    use crate::request::SubSearchTask;

    fn ids(outcome: &MergeOutcome) -> Vec<&str> {
        outcome
            .records
            .iter()
            .map(|r| r.place_id.as_str())
            .collect()
    }

    #[test]
    fn removes_duplicates_keeping_first_seen_order() {
        let outcome = merge(vec![
            vec![named("a", "A"), named("b", "B")],
            vec![named("b", "B again"), named("c", "C")],
            vec![named("a", "A again")],
        ]);

        assert_eq!(ids(&outcome), ["a", "b", "c"]);
        assert_eq!(outcome.records[1].name.as_deref(), Some("B"));
        assert_eq!(outcome.stats.raw_count, 5);
        assert_eq!(outcome.stats.final_count, 3);
        assert_eq!(outcome.stats.duplicates_removed, 2);
    }

    #[test]
    fn fills_only_missing_fields_from_later_duplicates() {
        let mut first = named("p1", "Blue Bottle");
        first.phone = Some("(415) 555-0100".to_owned());

        let mut second = named("p1", "Blue Bottle Coffee");
        second.phone = Some("(415) 555-9999".to_owned());
        second.website = Some("https://bluebottle.example".to_owned());
        second.rating = Some(4.6);

        let outcome = merge(vec![vec![first], vec![second]]);
        let merged = &outcome.records[0];

        assert_eq!(merged.name.as_deref(), Some("Blue Bottle"));
        assert_eq!(merged.phone.as_deref(), Some("(415) 555-0100"));
        assert_eq!(
            merged.website.as_deref(),
            Some("https://bluebottle.example")
        );
        assert_eq!(merged.rating, Some(4.6));
        assert_eq!(outcome.stats.fields_filled, 2);
    }

    #[test]
    fn merging_is_idempotent() {
        let input = vec![
            vec![named("a", "A"), named("b", "B")],
            vec![named("a", "A"), named("c", "C")],
        ];
        let once = merge(input);
        let twice = merge(vec![once.records.clone()]);

        assert_eq!(once.records, twice.records);
        assert_eq!(twice.stats.duplicates_removed, 0);
    }

    #[test]
    fn merging_a_result_set_with_itself_changes_nothing() {
        let mut with_phone = named("a", "A");
        with_phone.phone = Some("(415) 555-0100".to_owned());
        let mut with_site = BusinessRecord::new("a");
        with_site.website = Some("https://a.example".to_owned());
        let x = vec![with_phone, named("b", "B"), with_site];

        let single = merge(vec![x.clone()]);
        let doubled = merge(vec![x.clone(), x]);

        assert_eq!(doubled.records, single.records);
        assert_eq!(doubled.stats.final_count, single.stats.final_count);
        assert_eq!(doubled.stats.raw_count, 2 * single.stats.raw_count);
        assert_eq!(
            doubled.stats.duplicates_removed,
            single.stats.duplicates_removed + single.stats.raw_count
        );
    }

    /// Record with a small id space so batches collide often.
    fn record_strategy() -> impl Strategy<Value = BusinessRecord> {
        (0u8..12, any::<bool>(), any::<bool>()).prop_map(|(id, phone, website)| {
            let mut record = BusinessRecord::new(format!("p{id}"));
            if phone {
                record.phone = Some(format!("555-01{id:02}"));
            }
            if website {
                record.website = Some(format!("https://p{id}.example"));
            }
            record
        })
    }

    fn batches_strategy() -> impl Strategy<Value = Vec<Vec<BusinessRecord>>> {
        prop::collection::vec(prop::collection::vec(record_strategy(), 0..8), 0..6)
    }

    proptest! {
        #[test]
        fn counts_always_add_up(batches in batches_strategy()) {
            let raw: usize = batches.iter().map(Vec::len).sum();
            let distinct: std::collections::HashSet<String> = batches
                .iter()
                .flatten()
                .map(|r| r.place_id.clone())
                .collect();

            let outcome = merge(batches);

            prop_assert_eq!(outcome.stats.raw_count, raw);
            prop_assert_eq!(outcome.stats.final_count, distinct.len());
            prop_assert_eq!(outcome.records.len(), outcome.stats.final_count);
            prop_assert_eq!(
                outcome.stats.duplicates_removed + outcome.stats.final_count,
                outcome.stats.raw_count
            );
            let unique: std::collections::HashSet<&str> =
                outcome.records.iter().map(|r| r.place_id.as_str()).collect();
            prop_assert_eq!(unique.len(), outcome.records.len());
        }

        #[test]
        fn self_merge_is_idempotent(batches in batches_strategy()) {
            let flat: Vec<BusinessRecord> = batches.into_iter().flatten().collect();
            let single = merge(vec![flat.clone()]);
            let doubled = merge(vec![flat.clone(), flat]);

            prop_assert_eq!(&doubled.records, &single.records);
            prop_assert_eq!(doubled.stats.final_count, single.stats.final_count);
        }
    }

    #[test]
    fn empty_input_yields_zero_stats() {
        let outcome = merge(Vec::<Vec<BusinessRecord>>::new());
        assert!(outcome.records.is_empty());
        assert_eq!(outcome.stats, MergeStats::default());
    }

    #[test]
    fn reports_are_merged_in_task_order() {
        let report = |index: usize, name: &str| TaskReport {
            task: SubSearchTask {
                index,
                center: Coordinates::new(0.0, 0.0),
                radius_m: 1_000.0,
                request_id: Uuid::nil(),
            },
            outcome: SubTaskOutcome::Success(vec![named("shared", name)]),
            duration: Duration::ZERO,
        };

        // Completion order differs from task order.
        let outcome = merge_reports(&[report(2, "third"), report(0, "first"), report(1, "second")]);
        assert_eq!(outcome.records.len(), 1);
        assert_eq!(outcome.records[0].name.as_deref(), Some("first"));
    }
}

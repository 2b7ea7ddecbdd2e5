mod common;

use std::collections::HashSet;
use std::sync::{Arc, OnceLock};

use common::strategies::*;
use proptest::prelude::*;

use enrollment_core::aggregation::{self, summarize, RosterSnapshot, NO_COMPETENCIES};
use enrollment_core::reconciler::dedupe_by_competency;

/// Reconciled fixture roster, built once per test binary
fn fixture_snapshot() -> Arc<RosterSnapshot> {
    static SNAPSHOT: OnceLock<Arc<RosterSnapshot>> = OnceLock::new();
    SNAPSHOT
        .get_or_init(|| {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .expect("test runtime");
            let (_, workspace) = runtime.block_on(common::loaded_workspace());
            workspace.snapshot()
        })
        .clone()
}

fn summary_entries_strategy() -> impl Strategy<Value = Vec<(String, String)>> {
    prop::collection::vec(("[A-Z][a-z]{1,8}", competency_type_strategy()), 0..12)
}

proptest! {
    /// Property: dedupe leaves one record per competency and keeps the first occurrence
    #[test]
    fn dedupe_keeps_first_occurrence(records in record_list_strategy("s1")) {
        let deduped = dedupe_by_competency(records.clone());

        let distinct: HashSet<_> = deduped.iter().map(|r| r.competency_id.clone()).collect();
        prop_assert_eq!(distinct.len(), deduped.len());

        for kept in &deduped {
            let first = records
                .iter()
                .find(|r| r.competency_id == kept.competency_id)
                .unwrap();
            prop_assert_eq!(first, kept);
        }

        let original: HashSet<_> = records.iter().map(|r| r.competency_id.clone()).collect();
        prop_assert_eq!(original, distinct);
    }

    /// Property: a tally never counts more students than were distinctly selected
    #[test]
    fn enrolled_tally_bounded_by_selection(selection in selection_strategy()) {
        let snapshot = fixture_snapshot();
        let tallies = aggregation::enrolled_competencies_for_selection(&snapshot, &selection);

        let distinct_known = selection
            .iter()
            .filter(|id| snapshot.contains(id))
            .collect::<HashSet<_>>()
            .len();
        for tally in &tallies {
            prop_assert!(tally.student_count >= 1);
            prop_assert!(tally.student_count <= distinct_known);
        }
        if selection.is_empty() {
            prop_assert!(tallies.is_empty());
        }
    }

    /// Property: available batches are sorted, distinct, and empty for an empty selection
    #[test]
    fn available_batches_sorted_and_distinct(selection in selection_strategy()) {
        let snapshot = fixture_snapshot();
        let batches = aggregation::available_batches_for_selection(&snapshot, &selection);

        prop_assert!(batches.windows(2).all(|pair| pair[0] < pair[1]));
        if selection.is_empty() {
            prop_assert!(batches.is_empty());
        }
    }

    /// Property: summaries are never empty and follow the short-list rules
    #[test]
    fn summary_follows_count_rules(entries in summary_entries_strategy()) {
        let summary = summarize(entries.iter().map(|(n, t)| (n.as_str(), t.as_str())));
        let types: HashSet<&str> = entries.iter().map(|(_, t)| t.as_str()).collect();

        match entries.len() {
            0 => {
                prop_assert_eq!(summary.as_str(), NO_COMPETENCIES);
            }
            1 => {
                prop_assert_eq!(&summary, &entries[0].0);
            }
            n if types.len() == 1 && n <= 3 => {
                let names: Vec<&str> = entries.iter().map(|(name, _)| name.as_str()).collect();
                prop_assert_eq!(summary, names.join(", "));
            }
            n => {
                let prefix = format!("{n} ");
                prop_assert!(summary.starts_with(&prefix), "summary {:?}", summary);
            }
        }
    }
}

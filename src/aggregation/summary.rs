//! Display-string summaries for competency lists.
//!
//! Rules, applied in order:
//! - no competencies: `"No competencies"`
//! - exactly one: its name
//! - all of one type and at most three: names joined with `", "`
//! - all of one type and more than three: `"<n> <type> competencies"`
//! - mixed types: `"<n> competencies (<type>, <type>)"` with types sorted and
//!   anything past the third type folded into `"+<k> more"`

use std::collections::BTreeSet;

use crate::models::StudentCompetencyRecord;

pub const NO_COMPETENCIES: &str = "No competencies";

const MAX_LISTED_NAMES: usize = 3;
const MAX_LISTED_TYPES: usize = 3;

/// Summarize one student's (or one group's) competency records
pub fn summarize_competencies(records: &[StudentCompetencyRecord]) -> String {
    summarize(
        records
            .iter()
            .map(|record| (record.name.as_str(), record.competency_type.as_str())),
    )
}

/// Summarize `(name, type)` pairs in the order given
pub fn summarize<'a>(entries: impl IntoIterator<Item = (&'a str, &'a str)>) -> String {
    let entries: Vec<(&str, &str)> = entries.into_iter().collect();

    match entries.as_slice() {
        [] => NO_COMPETENCIES.to_string(),
        [(name, _)] => (*name).to_string(),
        _ => {
            let types: BTreeSet<&str> = entries.iter().map(|(_, kind)| *kind).collect();
            let count = entries.len();

            if types.len() == 1 {
                if count <= MAX_LISTED_NAMES {
                    entries
                        .iter()
                        .map(|(name, _)| *name)
                        .collect::<Vec<_>>()
                        .join(", ")
                } else {
                    let kind = types.iter().next().copied().unwrap_or_default();
                    format!("{count} {kind} competencies")
                }
            } else {
                let mut listed: Vec<String> = types
                    .iter()
                    .take(MAX_LISTED_TYPES)
                    .map(|kind| (*kind).to_string())
                    .collect();
                if types.len() > MAX_LISTED_TYPES {
                    listed.push(format!("+{} more", types.len() - MAX_LISTED_TYPES));
                }
                format!("{count} competencies ({})", listed.join(", "))
            }
        }
    }
}

use proptest::prelude::*;

use enrollment_core::models::{StudentCompetencyRecord, StudentId};

/// Strategy for generating competency ids from a small pool so duplicates are common
pub fn competency_id_strategy() -> impl Strategy<Value = String> {
    prop::sample::select(vec!["k-1", "k-2", "k-3", "k-4", "k-5", "k-6"]).prop_map(String::from)
}

/// Strategy for generating competency types
pub fn competency_type_strategy() -> impl Strategy<Value = String> {
    prop::sample::select(vec!["Technical", "Soft Skills", "Analytical", "General"])
        .prop_map(String::from)
}

/// Strategy for generating one reconciled record for `student`
pub fn record_strategy(student: &'static str) -> impl Strategy<Value = StudentCompetencyRecord> {
    (
        competency_id_strategy(),
        "[A-Z][a-z]{2,10}",
        competency_type_strategy(),
        any::<bool>(),
    )
        .prop_map(move |(competency_id, name, competency_type, has_progress)| {
            StudentCompetencyRecord {
                student_id: StudentId::new(student),
                competency_id: competency_id.into(),
                name,
                competency_type,
                is_enrolled: true,
                has_progress,
                progress: None,
            }
        })
}

/// Strategy for generating record lists with likely duplicate competency ids
pub fn record_list_strategy(student: &'static str) -> impl Strategy<Value = Vec<StudentCompetencyRecord>> {
    prop::collection::vec(record_strategy(student), 0..20)
}

/// Strategy for generating selections drawn from the fixture roster (s1..s5), repeats allowed
pub fn selection_strategy() -> impl Strategy<Value = Vec<StudentId>> {
    prop::collection::vec(
        prop::sample::select(vec!["s1", "s2", "s3", "s4", "s5", "ghost"]),
        0..10,
    )
    .prop_map(|ids| ids.into_iter().map(StudentId::from).collect())
}

//! Aggregation views over a refreshed fixture workspace.

mod common;

use enrollment_core::aggregation::{self, BatchKey};
use enrollment_core::models::StudentId;
use enrollment_core::test_helpers::InMemoryGateway;
use enrollment_core::{ReassignmentCoordinator, StudentFilters};

use common::loaded_workspace;

fn ids(raw: &[&str]) -> Vec<StudentId> {
    raw.iter().map(|id| StudentId::new(*id)).collect()
}

#[tokio::test]
async fn test_unique_batches_union_sorted() {
    let (_, workspace) = loaded_workspace().await;
    assert_eq!(
        workspace.unique_batches(),
        vec!["2019", "B-DS-2024", "B-UX-2025", "B-WEB-2024A", "B-WEB-2024B"]
    );
}

#[tokio::test]
async fn test_students_by_batch_includes_unassigned_last() {
    let (_, workspace) = loaded_workspace().await;
    let groups = workspace.students_by_batch();

    let labels: Vec<String> = groups.keys().map(ToString::to_string).collect();
    assert_eq!(
        labels,
        vec!["2019", "B-DS-2024", "B-WEB-2024A", "Unassigned"]
    );

    let web: Vec<&str> = groups[&BatchKey::Batch("B-WEB-2024A".to_string())]
        .iter()
        .map(|s| s.id.as_str())
        .collect();
    let ds: Vec<&str> = groups[&BatchKey::Batch("B-DS-2024".to_string())]
        .iter()
        .map(|s| s.id.as_str())
        .collect();
    // s2 belongs to both groups
    assert_eq!(web, vec!["s1", "s2"]);
    assert_eq!(ds, vec!["s2", "s3"]);
    assert_eq!(groups[&BatchKey::Unassigned][0].id.as_str(), "s5");
}

#[tokio::test]
async fn test_filtering_by_competency_name_uses_reconciled_data() {
    let (_, workspace) = loaded_workspace().await;
    workspace.set_filters(StudentFilters::default().with_competency("communic"));

    let ids: Vec<String> = workspace
        .filtered_students()
        .iter()
        .map(|s| s.id.to_string())
        .collect();
    // s2 via DS fallback, s4 via UX fallback
    assert_eq!(ids, vec!["s2", "s4"]);
}

#[tokio::test]
async fn test_empty_filters_match_everything() {
    let (_, workspace) = loaded_workspace().await;
    workspace.set_filters(StudentFilters::default().with_name("   "));
    assert_eq!(workspace.filtered_students().len(), 5);
}

#[tokio::test]
async fn test_available_batches_empty_selection() {
    let (_, workspace) = loaded_workspace().await;
    assert!(workspace.available_batches_for_selection().is_empty());
}

#[tokio::test]
async fn test_available_batches_shared_by_selection_courses() {
    let (_, workspace) = loaded_workspace().await;
    let snapshot = workspace.snapshot();

    assert_eq!(
        aggregation::available_batches_for_selection(&snapshot, &ids(&["s1"])),
        vec!["B-WEB-2024A", "B-WEB-2024B"]
    );
    // s2 takes WEB and DS; only WEB is common with s1
    assert_eq!(
        aggregation::available_batches_for_selection(&snapshot, &ids(&["s1", "s2"])),
        vec!["B-WEB-2024A", "B-WEB-2024B"]
    );
    // s5 resolves no course and leaves the set unchanged
    assert_eq!(
        aggregation::available_batches_for_selection(&snapshot, &ids(&["s1", "s5"])),
        vec!["B-WEB-2024A", "B-WEB-2024B"]
    );
    assert!(aggregation::available_batches_for_selection(&snapshot, &ids(&["s5"])).is_empty());
}

#[tokio::test]
async fn test_mixed_course_selection_has_no_cross_course_batch() {
    let (_, workspace) = loaded_workspace().await;
    let snapshot = workspace.snapshot();

    // s1 takes only WEB-101, s3 only DS-201
    let mixed = ids(&["s1", "s3"]);
    assert!(aggregation::available_batches_for_selection(&snapshot, &mixed).is_empty());

    let err = ReassignmentCoordinator::<InMemoryGateway>::validate_batch_reassignment(
        &snapshot,
        &mixed,
        "B-DS-2024",
    )
    .unwrap_err();
    assert!(err.is_validation());
}

#[tokio::test]
async fn test_enrolled_competencies_counts_and_order() {
    let (_, workspace) = loaded_workspace().await;
    workspace.select_students(ids(&["s1", "s2"]));

    let tallies = workspace.enrolled_competencies_for_selection();
    let view: Vec<(&str, usize)> = tallies
        .iter()
        .map(|t| (t.name.as_str(), t.student_count))
        .collect();
    assert_eq!(
        view,
        vec![
            ("CSS Layout", 2),
            ("Communication", 1),
            ("HTML Basics", 2),
            ("JavaScript", 1),
            ("SQL", 1),
            ("Statistics", 1),
        ]
    );
}

#[tokio::test]
async fn test_student_summaries() {
    let (_, workspace) = loaded_workspace().await;
    assert_eq!(
        workspace.student_summary(&StudentId::new("s1")),
        "HTML Basics, CSS Layout"
    );
    assert_eq!(
        workspace.student_summary(&StudentId::new("s2")),
        "6 competencies (Analytical, Soft Skills, Technical)"
    );
    assert_eq!(workspace.student_summary(&StudentId::new("s3")), "Statistics");
    assert_eq!(
        workspace.student_summary(&StudentId::new("s5")),
        "No competencies"
    );
}

#[tokio::test]
async fn test_batch_summaries_follow_filters() {
    let (_, workspace) = loaded_workspace().await;
    workspace.set_filters(StudentFilters::default().with_status("graduated"));

    let summaries = workspace.batch_summaries();
    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0].batch.label(), "B-DS-2024");
    assert_eq!(summaries[0].student_count, 1);
    assert_eq!(summaries[0].summary, "Statistics");
}

#[tokio::test]
async fn test_filter_options() {
    let (_, workspace) = loaded_workspace().await;
    let options = workspace.filter_options();
    assert_eq!(options.statuses, vec!["Enrolled", "Graduated"]);
    assert_eq!(options.course_codes, vec!["DS-201", "UX-110", "WEB-101"]);
    assert_eq!(options.batches, workspace.unique_batches());
}

#[tokio::test]
async fn test_views_recompute_after_selection_change() {
    let (_, workspace) = loaded_workspace().await;
    workspace.select_students(ids(&["s3"]));
    assert_eq!(workspace.available_batches_for_selection(), vec!["B-DS-2024"]);

    workspace.clear_selection();
    workspace.select_students(ids(&["s4"]));
    assert_eq!(workspace.available_batches_for_selection(), vec!["B-UX-2025"]);
}

//! # Aggregation Engine
//!
//! Pure views over an immutable [`RosterSnapshot`]. Nothing here caches: every
//! function recomputes from the snapshot, the filters, and the selection it is
//! handed, so a view can never be stale relative to its inputs.

pub mod course_match;
pub mod summary;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fmt;

use crate::models::{
    Catalog, CompetencyId, Course, CourseId, Student, StudentCompetencyRecord, StudentId,
};
use crate::reconciler::CompetencyMap;
use crate::selection::StudentFilters;

pub use course_match::{resolve_course, resolve_course_with_tier, MatchTier};
pub use summary::{summarize, summarize_competencies, NO_COMPETENCIES};

/// Label used for students without any resolvable batch
pub const UNASSIGNED_LABEL: &str = "Unassigned";

/// Roster, catalogs, and reconciled competencies captured at one refresh
///
/// Snapshots are never patched; a refresh builds a new one and swaps it in.
#[derive(Debug, Clone, PartialEq)]
pub struct RosterSnapshot {
    students: Vec<Student>,
    catalog: Catalog,
    competencies: CompetencyMap,
    refreshed_at: DateTime<Utc>,
}

impl Default for RosterSnapshot {
    fn default() -> Self {
        Self::new(Vec::new(), Catalog::default(), CompetencyMap::new())
    }
}

impl RosterSnapshot {
    pub fn new(students: Vec<Student>, catalog: Catalog, competencies: CompetencyMap) -> Self {
        Self {
            students,
            catalog,
            competencies,
            refreshed_at: Utc::now(),
        }
    }

    pub fn students(&self) -> &[Student] {
        &self.students
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn competency_map(&self) -> &CompetencyMap {
        &self.competencies
    }

    pub fn refreshed_at(&self) -> DateTime<Utc> {
        self.refreshed_at
    }

    pub fn student(&self, student_id: &StudentId) -> Option<&Student> {
        self.students.iter().find(|student| &student.id == student_id)
    }

    pub fn contains(&self, student_id: &StudentId) -> bool {
        self.student(student_id).is_some()
    }

    /// Reconciled competency records for one student (empty when unknown)
    pub fn competencies_for(&self, student_id: &StudentId) -> &[StudentCompetencyRecord] {
        self.competencies
            .get(student_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Catalog courses the student's course references resolve to, without repeats
    pub fn courses_for(&self, student: &Student) -> Vec<&Course> {
        let mut seen = HashSet::new();
        student
            .course_refs
            .iter()
            .filter_map(|reference| resolve_course(reference, &self.catalog.courses))
            .filter(|course| seen.insert(&course.id))
            .collect()
    }
}

/// Group key for [`students_by_batch`]; `Unassigned` sorts after every batch
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchKey {
    Batch(String),
    Unassigned,
}

impl BatchKey {
    pub fn label(&self) -> &str {
        match self {
            BatchKey::Batch(batch) => batch,
            BatchKey::Unassigned => UNASSIGNED_LABEL,
        }
    }
}

impl fmt::Display for BatchKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.label())
    }
}

/// One competency aggregated over a set of students
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompetencyTally {
    pub competency_id: CompetencyId,
    pub name: String,
    pub competency_type: String,
    /// Number of distinct students carrying the competency
    pub student_count: usize,
}

/// Distinct values for populating filter inputs
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterOptions {
    pub statuses: Vec<String>,
    pub course_codes: Vec<String>,
    pub batches: Vec<String>,
}

/// Per-batch overview of the filtered roster
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub batch: BatchKey,
    pub student_count: usize,
    pub competencies: Vec<CompetencyTally>,
    pub summary: String,
}

// ===================================================================================
// VIEWS
// ===================================================================================

/// Every batch identifier known to the snapshot, sorted lexically
///
/// Union of membership sets, legacy single-batch values, and offering batches.
pub fn unique_batches(snapshot: &RosterSnapshot) -> Vec<String> {
    let mut batches: BTreeSet<&str> = BTreeSet::new();
    for student in snapshot.students() {
        batches.extend(student.batches.iter().map(String::as_str));
        batches.extend(student.legacy_batch.as_deref());
    }
    batches.extend(
        snapshot
            .catalog()
            .offerings
            .iter()
            .map(|offering| offering.batch_identifier.as_str()),
    );

    batches
        .into_iter()
        .map(str::trim)
        .filter(|batch| !batch.is_empty())
        .map(str::to_string)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Roster entries matching every non-empty filter, in roster order
pub fn filtered_students<'a>(
    snapshot: &'a RosterSnapshot,
    filters: &StudentFilters,
) -> Vec<&'a Student> {
    snapshot
        .students()
        .iter()
        .filter(|student| matches_filters(snapshot, student, filters))
        .collect()
}

/// Filtered students grouped under each batch they resolve to
///
/// A student in two batches appears in both groups; one with none appears
/// under [`BatchKey::Unassigned`].
pub fn students_by_batch<'a>(
    snapshot: &'a RosterSnapshot,
    filters: &StudentFilters,
) -> BTreeMap<BatchKey, Vec<&'a Student>> {
    let mut groups: BTreeMap<BatchKey, Vec<&Student>> = BTreeMap::new();
    for student in filtered_students(snapshot, filters) {
        let batches = student.batch_identifiers();
        if batches.is_empty() {
            groups.entry(BatchKey::Unassigned).or_default().push(student);
        } else {
            for batch in batches {
                groups
                    .entry(BatchKey::Batch(batch.to_string()))
                    .or_default()
                    .push(student);
            }
        }
    }
    groups
}

/// Batches reachable through an offering of a course every relevant selected student shares
///
/// Relevant students are the selected ones that resolve at least one catalog
/// course; students with no resolvable course do not narrow the set. Empty for
/// an empty selection, when no selected student resolves a course, or when the
/// relevant students share no course. Ids not on the roster are ignored.
pub fn available_batches_for_selection(
    snapshot: &RosterSnapshot,
    selected: &[StudentId],
) -> Vec<String> {
    let distinct: BTreeSet<&StudentId> = selected.iter().collect();
    let mut shared: Option<HashSet<&CourseId>> = None;
    for student in distinct
        .into_iter()
        .filter_map(|student_id| snapshot.student(student_id))
    {
        let enrolled: HashSet<&CourseId> = snapshot
            .courses_for(student)
            .into_iter()
            .map(|course| &course.id)
            .collect();
        if enrolled.is_empty() {
            continue;
        }
        shared = Some(match shared {
            Some(common) => common.intersection(&enrolled).copied().collect(),
            None => enrolled,
        });
    }

    let course_ids = shared.unwrap_or_default();
    if course_ids.is_empty() {
        return Vec::new();
    }

    let courses = &snapshot.catalog().courses;
    snapshot
        .catalog()
        .offerings
        .iter()
        .filter(|offering| {
            resolve_course(&offering.course, courses)
                .is_some_and(|course| course_ids.contains(&course.id))
        })
        .map(|offering| offering.batch_identifier.trim())
        .filter(|batch| !batch.is_empty())
        .map(str::to_string)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Enrolled competencies across the selection with per-competency student counts, by name
pub fn enrolled_competencies_for_selection(
    snapshot: &RosterSnapshot,
    selected: &[StudentId],
) -> Vec<CompetencyTally> {
    let distinct: BTreeSet<&StudentId> = selected.iter().collect();
    tally(
        distinct
            .into_iter()
            .map(|student_id| snapshot.competencies_for(student_id)),
    )
}

/// Display summary for one student's reconciled competencies
pub fn student_summary(snapshot: &RosterSnapshot, student_id: &StudentId) -> String {
    summarize_competencies(snapshot.competencies_for(student_id))
}

/// Distinct statuses, course codes, and batches present in the snapshot
pub fn filter_options(snapshot: &RosterSnapshot) -> FilterOptions {
    let statuses: BTreeSet<String> = snapshot
        .students()
        .iter()
        .map(|student| student.status.trim())
        .filter(|status| !status.is_empty())
        .map(str::to_string)
        .collect();
    let course_codes: BTreeSet<String> = snapshot
        .catalog()
        .courses
        .iter()
        .map(|course| course.code.trim())
        .filter(|code| !code.is_empty())
        .map(str::to_string)
        .collect();

    FilterOptions {
        statuses: statuses.into_iter().collect(),
        course_codes: course_codes.into_iter().collect(),
        batches: unique_batches(snapshot),
    }
}

/// One summary per batch group of the filtered roster, in group order
pub fn batch_summaries(snapshot: &RosterSnapshot, filters: &StudentFilters) -> Vec<BatchSummary> {
    students_by_batch(snapshot, filters)
        .into_iter()
        .map(|(batch, students)| {
            let competencies = tally(
                students
                    .iter()
                    .map(|student| snapshot.competencies_for(&student.id)),
            );
            let summary = summarize(
                competencies
                    .iter()
                    .map(|entry| (entry.name.as_str(), entry.competency_type.as_str())),
            );
            BatchSummary {
                batch,
                student_count: students.len(),
                competencies,
                summary,
            }
        })
        .collect()
}

// ===================================================================================
// HELPERS
// ===================================================================================

fn tally<'a>(
    per_student: impl Iterator<Item = &'a [StudentCompetencyRecord]>,
) -> Vec<CompetencyTally> {
    let mut tallies: BTreeMap<&CompetencyId, CompetencyTally> = BTreeMap::new();
    for records in per_student {
        let mut counted: HashSet<&CompetencyId> = HashSet::new();
        for record in records.iter().filter(|record| record.is_enrolled) {
            if !counted.insert(&record.competency_id) {
                continue;
            }
            tallies
                .entry(&record.competency_id)
                .or_insert_with(|| CompetencyTally {
                    competency_id: record.competency_id.clone(),
                    name: record.name.clone(),
                    competency_type: record.competency_type.clone(),
                    student_count: 0,
                })
                .student_count += 1;
        }
    }

    let mut result: Vec<CompetencyTally> = tallies.into_values().collect();
    result.sort_by(|a, b| {
        a.name
            .cmp(&b.name)
            .then_with(|| a.competency_id.cmp(&b.competency_id))
    });
    result
}

fn contains_ci(haystack: &str, needle_lower: &str) -> bool {
    haystack.to_lowercase().contains(needle_lower)
}

fn matches_filters(snapshot: &RosterSnapshot, student: &Student, filters: &StudentFilters) -> bool {
    let name = filters.name.trim().to_lowercase();
    if !name.is_empty() && !contains_ci(&student.name, &name) {
        return false;
    }

    let status = filters.status.trim();
    if !status.is_empty() && !student.status.trim().eq_ignore_ascii_case(status) {
        return false;
    }

    let batch = filters.batch.trim().to_lowercase();
    if !batch.is_empty()
        && !student
            .batch_identifiers()
            .into_iter()
            .any(|candidate| contains_ci(candidate, &batch))
    {
        return false;
    }

    let course = filters.course.trim().to_lowercase();
    if !course.is_empty() {
        let resolved = snapshot.courses_for(student);
        let by_catalog = resolved
            .iter()
            .any(|c| contains_ci(&c.code, &course) || contains_ci(&c.name, &course));
        let by_reference = student
            .course_refs
            .iter()
            .flat_map(|reference| reference.search_terms())
            .any(|term| contains_ci(term, &course));
        if !by_catalog && !by_reference {
            return false;
        }
    }

    let competency = filters.competency.trim().to_lowercase();
    if !competency.is_empty()
        && !snapshot
            .competencies_for(&student.id)
            .iter()
            .any(|record| contains_ci(&record.name, &competency))
    {
        return false;
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CourseOffering;

    fn record(student: &str, id: &str, name: &str, kind: &str) -> StudentCompetencyRecord {
        StudentCompetencyRecord {
            student_id: StudentId::new(student),
            competency_id: id.into(),
            name: name.to_string(),
            competency_type: kind.to_string(),
            is_enrolled: true,
            has_progress: false,
            progress: None,
        }
    }

    fn snapshot() -> RosterSnapshot {
        let courses = vec![
            Course::new("c1", "WEB-101", "Web Development"),
            Course::new("c2", "DS-201", "Data Science"),
        ];
        let mut offering_by_code = CourseOffering::new("o3", "unused", "DS-A");
        offering_by_code.course = crate::models::CourseRef::by_code("ds-201");
        let offerings = vec![
            CourseOffering::new("o1", "c1", "WEB-A"),
            CourseOffering::new("o2", "c1", "WEB-B"),
            offering_by_code,
        ];

        let mut legacy = Student::new("s3", "Carol").with_status("Graduated");
        legacy.legacy_batch = Some("2019".to_string());

        let students = vec![
            Student::new("s1", "Alice")
                .with_status("Enrolled")
                .with_batch("WEB-A")
                .with_batch("DS-A")
                .with_course(crate::models::CourseRef::by_id("c1")),
            Student::new("s2", "Bob")
                .with_status("enrolled")
                .with_course(crate::models::CourseRef::from_text("Data Science")),
            legacy,
        ];

        let mut competencies = CompetencyMap::new();
        competencies.insert(
            StudentId::new("s1"),
            vec![
                record("s1", "k1", "HTML", "Technical"),
                record("s1", "k2", "CSS", "Technical"),
            ],
        );
        competencies.insert(
            StudentId::new("s2"),
            vec![record("s2", "k1", "HTML", "Technical")],
        );

        RosterSnapshot::new(
            students,
            Catalog::new(courses, offerings, Vec::new()),
            competencies,
        )
    }

    #[test]
    fn test_unique_batches_includes_every_source() {
        assert_eq!(
            unique_batches(&snapshot()),
            vec!["2019", "DS-A", "WEB-A", "WEB-B"]
        );
    }

    #[test]
    fn test_status_filter_is_case_insensitive_equality() {
        let snapshot = snapshot();
        let filters = StudentFilters::default().with_status("ENROLLED");
        let names: Vec<&str> = filtered_students(&snapshot, &filters)
            .iter()
            .map(|s| s.name.as_str())
            .collect();
        assert_eq!(names, vec!["Alice", "Bob"]);

        let partial = StudentFilters::default().with_status("enroll");
        assert!(filtered_students(&snapshot, &partial).is_empty());
    }

    #[test]
    fn test_filters_and_combine() {
        let snapshot = snapshot();
        let filters = StudentFilters::default()
            .with_course("web")
            .with_competency("css");
        let ids: Vec<&str> = filtered_students(&snapshot, &filters)
            .iter()
            .map(|s| s.id.as_str())
            .collect();
        assert_eq!(ids, vec!["s1"]);
    }

    #[test]
    fn test_grouping_repeats_multi_batch_students() {
        let snapshot = snapshot();
        let groups = students_by_batch(&snapshot, &StudentFilters::default());
        let keys: Vec<String> = groups.keys().map(ToString::to_string).collect();
        assert_eq!(keys, vec!["2019", "DS-A", "WEB-A", "Unassigned"]);
        assert_eq!(groups[&BatchKey::Unassigned][0].name, "Bob");
        assert_eq!(groups[&BatchKey::Batch("DS-A".to_string())][0].name, "Alice");
    }

    #[test]
    fn test_available_batches_follow_selection_courses() {
        let snapshot = snapshot();
        assert!(available_batches_for_selection(&snapshot, &[]).is_empty());
        assert_eq!(
            available_batches_for_selection(&snapshot, &[StudentId::new("s1")]),
            vec!["WEB-A", "WEB-B"]
        );
        assert_eq!(
            available_batches_for_selection(&snapshot, &[StudentId::new("s2")]),
            vec!["DS-A"]
        );
        assert!(available_batches_for_selection(&snapshot, &[StudentId::new("s3")]).is_empty());
    }

    #[test]
    fn test_available_batches_require_a_shared_course() {
        let snapshot = snapshot();
        let mixed = [StudentId::new("s1"), StudentId::new("s2")];
        assert!(available_batches_for_selection(&snapshot, &mixed).is_empty());

        // s3 resolves no course and does not narrow the selection
        let with_unresolved = [StudentId::new("s1"), StudentId::new("s3")];
        assert_eq!(
            available_batches_for_selection(&snapshot, &with_unresolved),
            vec!["WEB-A", "WEB-B"]
        );
    }

    #[test]
    fn test_enrolled_competencies_count_distinct_students() {
        let snapshot = snapshot();
        let selection = [
            StudentId::new("s1"),
            StudentId::new("s2"),
            StudentId::new("s1"),
        ];
        let tallies = enrolled_competencies_for_selection(&snapshot, &selection);
        let view: Vec<(&str, usize)> = tallies
            .iter()
            .map(|t| (t.name.as_str(), t.student_count))
            .collect();
        assert_eq!(view, vec![("CSS", 1), ("HTML", 2)]);
    }

    #[test]
    fn test_batch_summaries_use_display_rules() {
        let snapshot = snapshot();
        let summaries = batch_summaries(&snapshot, &StudentFilters::default());
        let web = summaries
            .iter()
            .find(|s| s.batch == BatchKey::Batch("WEB-A".to_string()))
            .unwrap();
        assert_eq!(web.student_count, 1);
        assert_eq!(web.summary, "CSS, HTML");

        let legacy = summaries
            .iter()
            .find(|s| s.batch == BatchKey::Batch("2019".to_string()))
            .unwrap();
        assert_eq!(legacy.summary, NO_COMPETENCIES);
    }

    #[test]
    fn test_filter_options_are_distinct_and_sorted() {
        let options = filter_options(&snapshot());
        assert_eq!(options.statuses, vec!["Enrolled", "Graduated", "enrolled"]);
        assert_eq!(options.course_codes, vec!["DS-201", "WEB-101"]);
        assert_eq!(options.batches.len(), 4);
    }
}

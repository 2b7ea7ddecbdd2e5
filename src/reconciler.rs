//! # Competency Reconciler
//!
//! Produces one authoritative, deduplicated competency view per student.
//!
//! The student's own progress list is authoritative. When it is empty or cannot
//! be fetched, competencies are inferred from the student's course enrollments
//! instead (the fallback replaces, never merges with, the authoritative path).
//! Fetch failures at any granularity degrade to an empty list for that student
//! or course and never abort the rest of the roster.

use dashmap::DashMap;
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

use crate::aggregation::course_match::resolve_course;
use crate::api_clients::EnrollmentGateway;
use crate::logging::log_reconciliation;
use crate::models::{
    Catalog, Competency, CompetencyProgress, CourseId, Student, StudentCompetencyRecord,
    StudentId, UNCATEGORIZED,
};

/// Reconciled competency records keyed by student
pub type CompetencyMap = HashMap<StudentId, Vec<StudentCompetencyRecord>>;

/// Which source produced a student's reconciled records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconciliationSource {
    /// Authoritative progress list was non-empty
    Authoritative,
    /// Inferred from course enrollments
    Fallback,
    /// Neither source yielded anything
    Empty,
}

/// Reconciliation outcome for one student
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentReconciliation {
    pub student_id: StudentId,
    pub source: ReconciliationSource,
    pub records: Vec<StudentCompetencyRecord>,
}

/// Merges competency data for students from the progress and enrollment sources
pub struct CompetencyReconciler<G: ?Sized> {
    gateway: Arc<G>,
    max_concurrent: usize,
}

impl<G: ?Sized> std::fmt::Debug for CompetencyReconciler<G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompetencyReconciler")
            .field("max_concurrent", &self.max_concurrent)
            .finish()
    }
}

impl<G: EnrollmentGateway + ?Sized> CompetencyReconciler<G> {
    pub fn new(gateway: Arc<G>) -> Self {
        Self {
            gateway,
            max_concurrent: 8,
        }
    }

    /// Bound the number of students reconciled at once during a roster pass
    #[must_use]
    pub fn with_max_concurrent(mut self, max_concurrent: usize) -> Self {
        self.max_concurrent = max_concurrent.max(1);
        self
    }

    /// Reconcile one student. Never fails: gaps degrade to an empty record list.
    pub async fn reconcile_student(
        &self,
        student_id: &StudentId,
        catalog: &Catalog,
    ) -> StudentReconciliation {
        let authoritative = match self.gateway.student_competency_progress(student_id).await {
            Ok(progress) => progress,
            Err(e) => {
                warn!(
                    student_id = %student_id,
                    error = %e,
                    "Competency progress unavailable, falling back to enrollments"
                );
                Vec::new()
            }
        };

        if !authoritative.is_empty() {
            let records = authoritative
                .iter()
                .map(|progress| progress_record(student_id, progress, catalog))
                .collect();
            return StudentReconciliation {
                student_id: student_id.clone(),
                source: ReconciliationSource::Authoritative,
                records: dedupe_by_competency(records),
            };
        }

        let records = dedupe_by_competency(self.enrollment_records(student_id, catalog).await);
        let source = if records.is_empty() {
            warn!(
                student_id = %student_id,
                "No competency data recoverable from progress or enrollments"
            );
            ReconciliationSource::Empty
        } else {
            ReconciliationSource::Fallback
        };

        StudentReconciliation {
            student_id: student_id.clone(),
            source,
            records,
        }
    }

    /// Reconcile every student on the roster.
    ///
    /// Students are processed concurrently up to the configured bound; each
    /// student key is written exactly once, first result wins if the roster
    /// repeats an id. The map is only returned once every student is done.
    pub async fn reconcile_roster(&self, students: &[Student], catalog: &Catalog) -> CompetencyMap {
        let started = Instant::now();
        let results: DashMap<StudentId, StudentReconciliation> =
            DashMap::with_capacity(students.len());

        stream::iter(students.iter().map((|student: &Student| student.id.clone()) as fn(&Student) -> StudentId))
            .map(|student_id| async move { self.reconcile_student(&student_id, catalog).await })
            .buffer_unordered(self.max_concurrent)
            .for_each(|outcome| {
                results.entry(outcome.student_id.clone()).or_insert(outcome);
                futures::future::ready(())
            })
            .await;

        let mut counts: HashMap<ReconciliationSource, usize> = HashMap::new();
        let map: CompetencyMap = results
            .into_iter()
            .map(|(student_id, outcome)| {
                *counts.entry(outcome.source).or_default() += 1;
                (student_id, outcome.records)
            })
            .collect();

        log_reconciliation(
            map.len(),
            counts.get(&ReconciliationSource::Authoritative).copied().unwrap_or(0),
            counts.get(&ReconciliationSource::Fallback).copied().unwrap_or(0),
            counts.get(&ReconciliationSource::Empty).copied().unwrap_or(0),
            started.elapsed().as_millis() as u64,
        );

        map
    }

    async fn enrollment_records(
        &self,
        student_id: &StudentId,
        catalog: &Catalog,
    ) -> Vec<StudentCompetencyRecord> {
        let enrollments = match self.gateway.student_enrollments(student_id).await {
            Ok(enrollments) => enrollments,
            Err(e) => {
                warn!(student_id = %student_id, error = %e, "Failed to fetch enrollments");
                return Vec::new();
            }
        };

        let mut seen = HashSet::new();
        let course_ids: Vec<CourseId> = enrollments
            .iter()
            .filter_map(|reference| resolve_course(reference, &catalog.courses))
            .map(|course| course.id.clone())
            .filter(|course_id| seen.insert(course_id.clone()))
            .collect();

        debug!(
            student_id = %student_id,
            enrollments = enrollments.len(),
            resolved_courses = course_ids.len(),
            "Resolved enrollments for fallback reconciliation"
        );

        let mut records = Vec::new();
        for course_id in &course_ids {
            match self.gateway.course_competencies(course_id).await {
                Ok(competencies) => records.extend(
                    competencies
                        .iter()
                        .map(|competency| enrolled_record(student_id, competency)),
                ),
                Err(e) => warn!(
                    student_id = %student_id,
                    course_id = %course_id,
                    error = %e,
                    "Failed to fetch course competencies"
                ),
            }
        }
        records
    }
}

fn progress_record(
    student_id: &StudentId,
    progress: &CompetencyProgress,
    catalog: &Catalog,
) -> StudentCompetencyRecord {
    let known = catalog.competency(progress.competency_id.as_str());
    let name = progress
        .competency_name
        .clone()
        .or_else(|| known.map(|c| c.name.clone()).filter(|n| !n.is_empty()))
        .unwrap_or_else(|| progress.competency_id.to_string());
    let competency_type = progress
        .competency_type
        .clone()
        .or_else(|| known.map(|c| c.competency_type.clone()))
        .unwrap_or_else(|| UNCATEGORIZED.to_string());

    StudentCompetencyRecord {
        student_id: student_id.clone(),
        competency_id: progress.competency_id.clone(),
        name,
        competency_type,
        is_enrolled: true,
        has_progress: true,
        progress: Some(progress.payload()),
    }
}

fn enrolled_record(student_id: &StudentId, competency: &Competency) -> StudentCompetencyRecord {
    StudentCompetencyRecord {
        student_id: student_id.clone(),
        competency_id: competency.id.clone(),
        name: if competency.name.is_empty() {
            competency.id.to_string()
        } else {
            competency.name.clone()
        },
        competency_type: competency.competency_type.clone(),
        is_enrolled: true,
        has_progress: false,
        progress: None,
    }
}

/// Keep the first record per competency id, preserving order
pub fn dedupe_by_competency(records: Vec<StudentCompetencyRecord>) -> Vec<StudentCompetencyRecord> {
    let mut seen = HashSet::with_capacity(records.len());
    records
        .into_iter()
        .filter(|record| seen.insert(record.competency_id.clone()))
        .collect()
}

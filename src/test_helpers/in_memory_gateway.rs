//! # In-Memory Gateway
//!
//! An [`EnrollmentGateway`] backed by plain collections. Mutations are applied
//! to the held state so a refresh after a bulk run observes the change, and
//! every operation can be made to fail per student or per course.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};

use crate::api_clients::EnrollmentGateway;
use crate::error::{EnrollmentError, EnrollmentResult};
use crate::models::{
    BatchReassignmentRequest, Competency, CompetencyId, CompetencyProgress, Course, CourseId,
    CourseOffering, CourseRef, ProgressPayload, Student, StudentId,
};

/// Number of times each gateway operation was invoked
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallCounts {
    pub list_students: usize,
    pub progress: usize,
    pub enrollments: usize,
    pub course_competencies: usize,
    pub reassign_batch: usize,
    pub upserts: usize,
}

#[derive(Debug, Default)]
struct GatewayState {
    students: Vec<Student>,
    courses: Vec<Course>,
    offerings: Vec<CourseOffering>,
    competencies: Vec<Competency>,
    progress: HashMap<StudentId, Vec<CompetencyProgress>>,
    enrollments: HashMap<StudentId, Vec<CourseRef>>,
    course_competencies: HashMap<CourseId, Vec<Competency>>,

    fail_roster: bool,
    failing_progress: HashSet<StudentId>,
    failing_enrollments: HashSet<StudentId>,
    failing_courses: HashSet<CourseId>,
    failing_upserts: HashMap<StudentId, String>,
    auth_failing_upserts: HashSet<StudentId>,
    batch_reassign_failure: Option<EnrollmentError>,

    calls: CallCounts,
    batch_requests: Vec<BatchReassignmentRequest>,
    upserts: Vec<(StudentId, CompetencyId, ProgressPayload)>,
}

/// In-memory enrollment backend for tests and demos
#[derive(Debug, Default)]
pub struct InMemoryGateway {
    state: Mutex<GatewayState>,
}

impl InMemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    // ===================================================================================
    // DATA
    // ===================================================================================

    #[must_use]
    pub fn with_students(self, students: Vec<Student>) -> Self {
        self.state.lock().students = students;
        self
    }

    #[must_use]
    pub fn with_courses(self, courses: Vec<Course>) -> Self {
        self.state.lock().courses = courses;
        self
    }

    #[must_use]
    pub fn with_offerings(self, offerings: Vec<CourseOffering>) -> Self {
        self.state.lock().offerings = offerings;
        self
    }

    #[must_use]
    pub fn with_competencies(self, competencies: Vec<Competency>) -> Self {
        self.state.lock().competencies = competencies;
        self
    }

    #[must_use]
    pub fn with_progress(
        self,
        student_id: impl Into<StudentId>,
        progress: Vec<CompetencyProgress>,
    ) -> Self {
        self.state.lock().progress.insert(student_id.into(), progress);
        self
    }

    #[must_use]
    pub fn with_enrollments(
        self,
        student_id: impl Into<StudentId>,
        enrollments: Vec<CourseRef>,
    ) -> Self {
        self.state
            .lock()
            .enrollments
            .insert(student_id.into(), enrollments);
        self
    }

    #[must_use]
    pub fn with_course_competencies(
        self,
        course_id: impl Into<CourseId>,
        competencies: Vec<Competency>,
    ) -> Self {
        self.state
            .lock()
            .course_competencies
            .insert(course_id.into(), competencies);
        self
    }

    // ===================================================================================
    // FAILURE INJECTION
    // ===================================================================================

    /// Make every catalog and roster listing fail
    #[must_use]
    pub fn fail_roster(self) -> Self {
        self.state.lock().fail_roster = true;
        self
    }

    /// Toggle roster listing failures on an already shared gateway
    pub fn set_roster_failure(&self, failing: bool) {
        self.state.lock().fail_roster = failing;
    }

    #[must_use]
    pub fn fail_progress_for(self, student_id: impl Into<StudentId>) -> Self {
        self.state.lock().failing_progress.insert(student_id.into());
        self
    }

    #[must_use]
    pub fn fail_enrollments_for(self, student_id: impl Into<StudentId>) -> Self {
        self.state.lock().failing_enrollments.insert(student_id.into());
        self
    }

    #[must_use]
    pub fn fail_course_competencies_for(self, course_id: impl Into<CourseId>) -> Self {
        self.state.lock().failing_courses.insert(course_id.into());
        self
    }

    /// Reject progress upserts for one student with a 500 carrying `message`
    #[must_use]
    pub fn fail_upsert_for(
        self,
        student_id: impl Into<StudentId>,
        message: impl Into<String>,
    ) -> Self {
        self.state
            .lock()
            .failing_upserts
            .insert(student_id.into(), message.into());
        self
    }

    /// Reject progress upserts for one student as unauthorized
    #[must_use]
    pub fn fail_upsert_with_auth(self, student_id: impl Into<StudentId>) -> Self {
        self.state
            .lock()
            .auth_failing_upserts
            .insert(student_id.into());
        self
    }

    #[must_use]
    pub fn fail_batch_reassign(self, error: EnrollmentError) -> Self {
        self.state.lock().batch_reassign_failure = Some(error);
        self
    }

    // ===================================================================================
    // INSPECTION
    // ===================================================================================

    pub fn calls(&self) -> CallCounts {
        self.state.lock().calls
    }

    pub fn batch_requests(&self) -> Vec<BatchReassignmentRequest> {
        self.state.lock().batch_requests.clone()
    }

    pub fn upserts(&self) -> Vec<(StudentId, CompetencyId, ProgressPayload)> {
        self.state.lock().upserts.clone()
    }

    pub fn student(&self, student_id: &str) -> Option<Student> {
        self.state
            .lock()
            .students
            .iter()
            .find(|student| student.id.as_str() == student_id)
            .cloned()
    }

    pub fn progress_for(&self, student_id: &str) -> Vec<CompetencyProgress> {
        self.state
            .lock()
            .progress
            .get(student_id)
            .cloned()
            .unwrap_or_default()
    }
}

fn injected(operation: &str) -> EnrollmentError {
    EnrollmentError::api_error(500, format!("injected failure: {operation}"))
}

#[async_trait]
impl EnrollmentGateway for InMemoryGateway {
    async fn list_students(&self) -> EnrollmentResult<Vec<Student>> {
        let mut state = self.state.lock();
        state.calls.list_students += 1;
        if state.fail_roster {
            return Err(injected("list_students"));
        }
        Ok(state.students.clone())
    }

    async fn list_courses(&self) -> EnrollmentResult<Vec<Course>> {
        let state = self.state.lock();
        if state.fail_roster {
            return Err(injected("list_courses"));
        }
        Ok(state.courses.clone())
    }

    async fn list_course_offerings(&self) -> EnrollmentResult<Vec<CourseOffering>> {
        let state = self.state.lock();
        if state.fail_roster {
            return Err(injected("list_course_offerings"));
        }
        Ok(state.offerings.clone())
    }

    async fn list_competencies(&self) -> EnrollmentResult<Vec<Competency>> {
        let state = self.state.lock();
        if state.fail_roster {
            return Err(injected("list_competencies"));
        }
        Ok(state.competencies.clone())
    }

    async fn student_competency_progress(
        &self,
        student_id: &StudentId,
    ) -> EnrollmentResult<Vec<CompetencyProgress>> {
        let mut state = self.state.lock();
        state.calls.progress += 1;
        if state.failing_progress.contains(student_id) {
            return Err(injected("student_competency_progress"));
        }
        Ok(state.progress.get(student_id).cloned().unwrap_or_default())
    }

    async fn student_enrollments(&self, student_id: &StudentId) -> EnrollmentResult<Vec<CourseRef>> {
        let mut state = self.state.lock();
        state.calls.enrollments += 1;
        if state.failing_enrollments.contains(student_id) {
            return Err(injected("student_enrollments"));
        }
        Ok(state.enrollments.get(student_id).cloned().unwrap_or_default())
    }

    async fn course_competencies(&self, course_id: &CourseId) -> EnrollmentResult<Vec<Competency>> {
        let mut state = self.state.lock();
        state.calls.course_competencies += 1;
        if state.failing_courses.contains(course_id) {
            return Err(injected("course_competencies"));
        }
        Ok(state
            .course_competencies
            .get(course_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn reassign_batch(&self, request: &BatchReassignmentRequest) -> EnrollmentResult<()> {
        let mut state = self.state.lock();
        state.calls.reassign_batch += 1;
        state.batch_requests.push(request.clone());
        if let Some(error) = state.batch_reassign_failure.take() {
            return Err(error);
        }

        // The target batch replaces whichever batch the student held for the same course
        let target = request.new_batch_identifier.clone();
        let target_courses: HashSet<Option<CourseId>> = state
            .offerings
            .iter()
            .filter(|offering| offering.batch_identifier == target)
            .map(|offering| offering.course.id.clone())
            .collect();
        let same_course_batches: HashSet<String> = state
            .offerings
            .iter()
            .filter(|offering| target_courses.contains(&offering.course.id))
            .map(|offering| offering.batch_identifier.clone())
            .collect();

        for student in state
            .students
            .iter_mut()
            .filter(|student| request.student_ids.contains(&student.id))
        {
            student
                .batches
                .retain(|batch| !same_course_batches.contains(batch));
            student.batches.insert(target.clone());
        }
        Ok(())
    }

    async fn upsert_competency_progress(
        &self,
        student_id: &StudentId,
        competency_id: &CompetencyId,
        payload: &ProgressPayload,
    ) -> EnrollmentResult<()> {
        let mut state = self.state.lock();
        state.calls.upserts += 1;
        if state.auth_failing_upserts.contains(student_id) {
            return Err(EnrollmentError::auth(Some(401), "Session expired"));
        }
        if let Some(message) = state.failing_upserts.get(student_id) {
            return Err(EnrollmentError::api_error(500, message.clone()));
        }

        state
            .upserts
            .push((student_id.clone(), competency_id.clone(), payload.clone()));

        let competency = state
            .competencies
            .iter()
            .find(|competency| &competency.id == competency_id)
            .cloned();
        let entries = state.progress.entry(student_id.clone()).or_default();
        let index = match entries
            .iter()
            .position(|entry| &entry.competency_id == competency_id)
        {
            Some(index) => index,
            None => {
                let mut fresh = CompetencyProgress::new(competency_id.clone());
                if let Some(competency) = competency {
                    fresh.competency_name = Some(competency.name);
                    fresh.competency_type = Some(competency.competency_type);
                }
                entries.push(fresh);
                entries.len() - 1
            }
        };
        let entry = &mut entries[index];
        entry.score = Some(payload.score);
        entry.exam_status = Some(payload.exam_status.clone());
        entry.passed = Some(payload.passed);
        Ok(())
    }
}

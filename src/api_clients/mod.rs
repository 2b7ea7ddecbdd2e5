//! # Remote Data Gateway
//!
//! Typed access to the enrollment REST API. [`EnrollmentGateway`] is the seam
//! every other component depends on; [`EnrollmentApiClient`] is the reqwest
//! implementation and [`wire`] holds the normalization layer that turns
//! loosely typed upstream payloads into the crate's models.

pub mod rest_client;
pub mod wire;

use async_trait::async_trait;

use crate::error::EnrollmentResult;
use crate::models::{
    BatchReassignmentRequest, Competency, CompetencyId, CompetencyProgress, Course, CourseId,
    CourseOffering, CourseRef, ProgressPayload, Student, StudentId,
};

pub use rest_client::{EnrollmentApiClient, EnrollmentApiConfig};

/// Operations the enrollment core consumes from the upstream API.
///
/// Implementations attach the caller's credential to every call and surface
/// non-success responses as typed [`crate::EnrollmentError`]s.
#[async_trait]
pub trait EnrollmentGateway: Send + Sync {
    // ===================================================================================
    // ROSTER AND CATALOGS
    // ===================================================================================

    /// `GET /students`
    async fn list_students(&self) -> EnrollmentResult<Vec<Student>>;

    /// `GET /courses`
    async fn list_courses(&self) -> EnrollmentResult<Vec<Course>>;

    /// `GET /course-offerings`
    async fn list_course_offerings(&self) -> EnrollmentResult<Vec<CourseOffering>>;

    /// `GET /competencies`
    async fn list_competencies(&self) -> EnrollmentResult<Vec<Competency>>;

    // ===================================================================================
    // PER-STUDENT RECONCILIATION INPUTS
    // ===================================================================================

    /// `GET /students/{id}/competency-progress`
    async fn student_competency_progress(
        &self,
        student_id: &StudentId,
    ) -> EnrollmentResult<Vec<CompetencyProgress>>;

    /// `GET /students/{id}/enrollments`
    async fn student_enrollments(&self, student_id: &StudentId)
        -> EnrollmentResult<Vec<CourseRef>>;

    /// `GET /courses/{id}/competencies`
    async fn course_competencies(&self, course_id: &CourseId)
        -> EnrollmentResult<Vec<Competency>>;

    // ===================================================================================
    // MUTATIONS
    // ===================================================================================

    /// `PUT /students/batch-reassign`
    async fn reassign_batch(&self, request: &BatchReassignmentRequest) -> EnrollmentResult<()>;

    /// `PUT /students/{id}/competency-progress/{competencyId}` (upsert)
    async fn upsert_competency_progress(
        &self,
        student_id: &StudentId,
        competency_id: &CompetencyId,
        payload: &ProgressPayload,
    ) -> EnrollmentResult<()>;
}

//! # Domain Models
//!
//! Typed entities for the enrollment core. Every upstream payload variant is
//! normalized into these shapes by `api_clients::wire` before it reaches the
//! reconciler or the aggregation views.

pub mod catalog;
pub mod competency;
pub mod course;
pub mod ids;
pub mod reassignment;
pub mod student;

// Re-export models for easy access
pub use catalog::Catalog;
pub use competency::{
    Competency, CompetencyProgress, ProgressPayload, StudentCompetencyRecord, NOT_TAKEN,
    UNCATEGORIZED,
};
pub use course::{Course, CourseOffering, CourseRef};
pub use ids::{CompetencyId, CourseId, OfferingId, StudentId};
pub use reassignment::BatchReassignmentRequest;
pub use student::Student;

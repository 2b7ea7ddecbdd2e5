use serde::{Deserialize, Serialize};

use super::ids::{CompetencyId, StudentId};

/// Exam status written for progress that has not been attempted
pub const NOT_TAKEN: &str = "Not taken";

/// Category used when upstream omits a competency type
pub const UNCATEGORIZED: &str = "General";

/// Global competency catalog entry, independent of any course
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Competency {
    pub id: CompetencyId,
    pub code: String,
    pub name: String,
    pub competency_type: String,
    pub passing_score: Option<f64>,
}

impl Competency {
    pub fn new(
        id: impl Into<CompetencyId>,
        name: impl Into<String>,
        competency_type: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            code: String::new(),
            name: name.into(),
            competency_type: competency_type.into(),
            passing_score: None,
        }
    }
}

/// One entry of a student's authoritative progress list, as normalized from upstream
///
/// Display fields are optional because some deployments only return the
/// competency id; the reconciler fills them from the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompetencyProgress {
    pub competency_id: CompetencyId,
    pub competency_name: Option<String>,
    pub competency_type: Option<String>,
    pub score: Option<f64>,
    pub exam_status: Option<String>,
    pub passed: Option<bool>,
}

impl CompetencyProgress {
    pub fn new(competency_id: impl Into<CompetencyId>) -> Self {
        Self {
            competency_id: competency_id.into(),
            competency_name: None,
            competency_type: None,
            score: None,
            exam_status: None,
            passed: None,
        }
    }

    /// Progress body with upstream gaps filled by the not-taken defaults
    pub fn payload(&self) -> ProgressPayload {
        ProgressPayload {
            score: self.score.unwrap_or(0.0),
            exam_status: self
                .exam_status
                .clone()
                .unwrap_or_else(|| NOT_TAKEN.to_string()),
            passed: self.passed.unwrap_or(false),
        }
    }
}

/// Progress body for `PUT /students/{id}/competency-progress/{competencyId}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressPayload {
    pub score: f64,
    pub exam_status: String,
    pub passed: bool,
}

impl ProgressPayload {
    /// Zeroed progress: score 0, "Not taken", not passed
    pub fn not_taken() -> Self {
        Self {
            score: 0.0,
            exam_status: NOT_TAKEN.to_string(),
            passed: false,
        }
    }
}

impl Default for ProgressPayload {
    fn default() -> Self {
        Self::not_taken()
    }
}

/// The reconciled unit: one competency as it applies to one student
///
/// After reconciliation a student never holds two records with the same
/// `competency_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentCompetencyRecord {
    pub student_id: StudentId,
    pub competency_id: CompetencyId,
    pub name: String,
    pub competency_type: String,
    pub is_enrolled: bool,
    pub has_progress: bool,
    pub progress: Option<ProgressPayload>,
}

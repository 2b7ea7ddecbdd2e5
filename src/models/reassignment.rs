use serde::{Deserialize, Serialize};

use super::ids::StudentId;

/// Body for `PUT /students/batch-reassign`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchReassignmentRequest {
    pub student_ids: Vec<StudentId>,
    pub new_batch_identifier: String,
}

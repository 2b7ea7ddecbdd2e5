use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{EnrollmentError, EnrollmentResult};
use crate::models::StudentId;

/// Aggregate result of a bulk operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BulkOutcome {
    /// Every student succeeded
    Success,
    /// At least one success and at least one failure or skip
    Partial,
    /// No student succeeded
    Failed,
}

impl fmt::Display for BulkOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => write!(f, "success"),
            Self::Partial => write!(f, "partial"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// What happened to one student
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "status", content = "reason")]
pub enum OutcomeStatus {
    Succeeded,
    Failed(String),
    /// Not attempted because the operation was cancelled first
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentOutcome {
    pub student_id: StudentId,
    #[serde(flatten)]
    pub status: OutcomeStatus,
}

impl StudentOutcome {
    pub fn succeeded(student_id: StudentId) -> Self {
        Self {
            student_id,
            status: OutcomeStatus::Succeeded,
        }
    }

    pub fn failed(student_id: StudentId, reason: impl Into<String>) -> Self {
        Self {
            student_id,
            status: OutcomeStatus::Failed(reason.into()),
        }
    }

    pub fn skipped(student_id: StudentId) -> Self {
        Self {
            student_id,
            status: OutcomeStatus::Skipped,
        }
    }
}

/// Per-student results of one bulk reassignment, in processing order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReassignmentReport {
    pub outcomes: Vec<StudentOutcome>,
    pub cancelled: bool,
}

impl ReassignmentReport {
    pub fn new(outcomes: Vec<StudentOutcome>, cancelled: bool) -> Self {
        Self {
            outcomes,
            cancelled,
        }
    }

    pub fn succeeded(&self) -> usize {
        self.count(|status| matches!(status, OutcomeStatus::Succeeded))
    }

    pub fn failed(&self) -> usize {
        self.count(|status| matches!(status, OutcomeStatus::Failed(_)))
    }

    pub fn skipped(&self) -> usize {
        self.count(|status| matches!(status, OutcomeStatus::Skipped))
    }

    /// Students whose mutation failed, in processing order
    pub fn failed_students(&self) -> Vec<&StudentId> {
        self.outcomes
            .iter()
            .filter(|outcome| matches!(outcome.status, OutcomeStatus::Failed(_)))
            .map(|outcome| &outcome.student_id)
            .collect()
    }

    /// `"<student>: <reason>"` for every failure
    pub fn failure_reasons(&self) -> Vec<String> {
        self.outcomes
            .iter()
            .filter_map(|outcome| match &outcome.status {
                OutcomeStatus::Failed(reason) => Some(format!("{}: {reason}", outcome.student_id)),
                _ => None,
            })
            .collect()
    }

    pub fn outcome(&self) -> BulkOutcome {
        let succeeded = self.succeeded();
        if succeeded == self.outcomes.len() && succeeded > 0 {
            BulkOutcome::Success
        } else if succeeded == 0 {
            BulkOutcome::Failed
        } else {
            BulkOutcome::Partial
        }
    }

    /// Convert into a `Result` so callers can propagate non-success with `?`
    pub fn into_result(self) -> EnrollmentResult<Self> {
        if self.cancelled && self.succeeded() == 0 && self.failed() == 0 {
            return Err(EnrollmentError::Cancelled(format!(
                "{} students skipped before any was processed",
                self.skipped()
            )));
        }

        match self.outcome() {
            BulkOutcome::Success => Ok(self),
            BulkOutcome::Partial => Err(EnrollmentError::PartialBulkFailure {
                succeeded: self.succeeded(),
                failed: self.failed() + self.skipped(),
                reasons: self.failure_reasons(),
            }),
            BulkOutcome::Failed => Err(EnrollmentError::BulkFailed {
                reasons: self.failure_reasons(),
            }),
        }
    }

    fn count(&self, predicate: impl Fn(&OutcomeStatus) -> bool) -> usize {
        self.outcomes
            .iter()
            .filter(|outcome| predicate(&outcome.status))
            .count()
    }
}

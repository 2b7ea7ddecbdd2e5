use serde::{Deserialize, Serialize};
use std::fmt;

use super::report::BulkOutcome;
use crate::error::{EnrollmentError, EnrollmentResult};

/// Lifecycle of one bulk operation
///
/// `Idle -> Validating -> (rejected: Idle) | Executing -> Completed -> Idle`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "phase", content = "outcome")]
pub enum BulkPhase {
    /// No bulk operation in flight
    Idle,
    /// Preconditions are being checked
    Validating,
    /// Mutations are being submitted
    Executing,
    /// The operation finished with the given outcome
    Completed(BulkOutcome),
}

impl BulkPhase {
    /// A bulk operation currently owns the coordinator
    pub fn is_in_flight(&self) -> bool {
        matches!(self, Self::Validating | Self::Executing)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed(_))
    }

    /// Apply `event`, returning the next phase or an invalid transition error
    pub fn apply(self, event: BulkEvent) -> EnrollmentResult<BulkPhase> {
        let next = match (self, event) {
            (Self::Idle, BulkEvent::Submit) => Self::Validating,
            (Self::Validating, BulkEvent::Reject) => Self::Idle,
            (Self::Validating, BulkEvent::Start) => Self::Executing,
            (Self::Executing, BulkEvent::Finish(outcome)) => Self::Completed(outcome),
            (Self::Executing, BulkEvent::Abort) => Self::Idle,
            (Self::Completed(_), BulkEvent::Reset) => Self::Idle,

            (from, event) => {
                return Err(EnrollmentError::InvalidTransition {
                    from: from.to_string(),
                    event: event.event_type().to_string(),
                })
            }
        };
        Ok(next)
    }
}

impl fmt::Display for BulkPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Validating => write!(f, "validating"),
            Self::Executing => write!(f, "executing"),
            Self::Completed(outcome) => write!(f, "completed({outcome})"),
        }
    }
}

/// Events that drive [`BulkPhase`] transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum BulkEvent {
    /// A bulk request was submitted
    Submit,
    /// A precondition failed
    Reject,
    /// Preconditions passed, begin mutating
    Start,
    /// Every student was processed (or skipped)
    Finish(BulkOutcome),
    /// A whole-operation error stopped execution
    Abort,
    /// Selection and operation-local state were reset
    Reset,
}

impl BulkEvent {
    /// Get a string representation of the event type for logging
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Submit => "submit",
            Self::Reject => "reject",
            Self::Start => "start",
            Self::Finish(_) => "finish",
            Self::Abort => "abort",
            Self::Reset => "reset",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path() {
        let phase = BulkPhase::Idle
            .apply(BulkEvent::Submit)
            .and_then(|p| p.apply(BulkEvent::Start))
            .and_then(|p| p.apply(BulkEvent::Finish(BulkOutcome::Partial)))
            .unwrap();
        assert_eq!(phase, BulkPhase::Completed(BulkOutcome::Partial));
        assert_eq!(phase.apply(BulkEvent::Reset).unwrap(), BulkPhase::Idle);
    }

    #[test]
    fn test_rejection_returns_to_idle() {
        let phase = BulkPhase::Idle.apply(BulkEvent::Submit).unwrap();
        assert!(phase.is_in_flight());
        assert_eq!(phase.apply(BulkEvent::Reject).unwrap(), BulkPhase::Idle);
    }

    #[test]
    fn test_double_submit_is_invalid() {
        let phase = BulkPhase::Idle.apply(BulkEvent::Submit).unwrap();
        let err = phase.apply(BulkEvent::Submit).unwrap_err();
        assert!(matches!(err, EnrollmentError::InvalidTransition { .. }));
        assert!(err.to_string().contains("validating"));
    }

    #[test]
    fn test_display() {
        assert_eq!(
            BulkPhase::Completed(BulkOutcome::Success).to_string(),
            "completed(success)"
        );
    }
}

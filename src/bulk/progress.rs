use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::models::{CompetencyProgress, ProgressPayload};

/// How progress moves from the source competency to the target
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressMode {
    /// Carry the prior score, exam status, and pass flag over
    Transfer,
    /// Zero the target
    Reset,
    /// Neither flag set; same zeroed target as `Reset`
    #[default]
    Default,
}

impl ProgressMode {
    /// Build a mode from the two legacy flags; `reset` wins when both are set
    pub fn from_flags(transfer: bool, reset: bool) -> Self {
        match (transfer, reset) {
            (_, true) => Self::Reset,
            (true, false) => Self::Transfer,
            (false, false) => Self::Default,
        }
    }
}

impl fmt::Display for ProgressMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transfer => write!(f, "transfer"),
            Self::Reset => write!(f, "reset"),
            Self::Default => write!(f, "default"),
        }
    }
}

impl FromStr for ProgressMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "transfer" => Ok(Self::Transfer),
            "reset" => Ok(Self::Reset),
            "default" => Ok(Self::Default),
            _ => Err(format!("Invalid progress mode: {s}")),
        }
    }
}

/// Progress to write at the target competency
///
/// Only `Transfer` with existing prior progress carries anything over; every
/// other combination yields the not-taken defaults.
pub fn compute_target_progress(
    mode: ProgressMode,
    prior: Option<&CompetencyProgress>,
) -> ProgressPayload {
    match (mode, prior) {
        (ProgressMode::Transfer, Some(prior)) => prior.payload(),
        _ => ProgressPayload::not_taken(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NOT_TAKEN;

    fn prior() -> CompetencyProgress {
        let mut progress = CompetencyProgress::new("from");
        progress.score = Some(92.5);
        progress.exam_status = Some("Passed".to_string());
        progress.passed = Some(true);
        progress
    }

    #[test]
    fn test_reset_wins_over_transfer() {
        assert_eq!(ProgressMode::from_flags(true, true), ProgressMode::Reset);
        assert_eq!(ProgressMode::from_flags(true, false), ProgressMode::Transfer);
        assert_eq!(ProgressMode::from_flags(false, false), ProgressMode::Default);
    }

    #[test]
    fn test_transfer_carries_prior_progress() {
        let payload = compute_target_progress(ProgressMode::Transfer, Some(&prior()));
        assert_eq!(payload.score, 92.5);
        assert_eq!(payload.exam_status, "Passed");
        assert!(payload.passed);
    }

    #[test]
    fn test_transfer_without_prior_is_zeroed() {
        let payload = compute_target_progress(ProgressMode::Transfer, None);
        assert_eq!(payload, ProgressPayload::not_taken());
    }

    #[test]
    fn test_reset_and_default_ignore_prior() {
        for mode in [ProgressMode::Reset, ProgressMode::Default] {
            let payload = compute_target_progress(mode, Some(&prior()));
            assert_eq!(payload.score, 0.0);
            assert_eq!(payload.exam_status, NOT_TAKEN);
            assert!(!payload.passed);
        }
    }

    #[test]
    fn test_parse_mode() {
        assert_eq!("Transfer".parse::<ProgressMode>().unwrap(), ProgressMode::Transfer);
        assert!("merge".parse::<ProgressMode>().is_err());
    }
}

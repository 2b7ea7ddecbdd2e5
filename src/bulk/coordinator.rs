use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

use super::cancellation::CancellationToken;
use super::progress::{compute_target_progress, ProgressMode};
use super::report::{BulkOutcome, OutcomeStatus, ReassignmentReport, StudentOutcome};
use super::state::{BulkEvent, BulkPhase};
use crate::aggregation::{
    available_batches_for_selection, enrolled_competencies_for_selection, RosterSnapshot,
};
use crate::api_clients::EnrollmentGateway;
use crate::error::{EnrollmentError, EnrollmentResult};
use crate::logging::log_bulk_operation;
use crate::models::{BatchReassignmentRequest, CompetencyId, StudentId};

/// Rejection message for a submission while another bulk operation is in flight
pub const ALREADY_IN_PROGRESS: &str = "a bulk operation is already in progress";

/// Parameters for moving a selection from one competency to another
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompetencyReassignment {
    pub student_ids: Vec<StudentId>,
    pub from: Option<CompetencyId>,
    pub to: Option<CompetencyId>,
    pub mode: ProgressMode,
}

impl CompetencyReassignment {
    pub fn new(
        student_ids: Vec<StudentId>,
        from: impl Into<CompetencyId>,
        to: impl Into<CompetencyId>,
        mode: ProgressMode,
    ) -> Self {
        Self {
            student_ids,
            from: Some(from.into()),
            to: Some(to.into()),
            mode,
        }
    }
}

/// Drives one bulk operation at a time through [`BulkPhase`]
pub struct ReassignmentCoordinator<G: ?Sized> {
    gateway: Arc<G>,
    phase: Mutex<BulkPhase>,
}

impl<G: ?Sized> std::fmt::Debug for ReassignmentCoordinator<G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReassignmentCoordinator")
            .field("phase", &*self.phase.lock())
            .finish()
    }
}

/// Returns the coordinator to `Idle` if an operation is dropped before it finishes
struct PhaseGuard<'a> {
    phase: &'a Mutex<BulkPhase>,
    settled: bool,
}

impl<'a> PhaseGuard<'a> {
    fn advance(&mut self, event: BulkEvent) -> EnrollmentResult<BulkPhase> {
        let mut phase = self.phase.lock();
        let from = *phase;
        let next = from.apply(event)?;
        debug!(from = %from, to = %next, event = event.event_type(), "Bulk phase transition");
        *phase = next;
        if !next.is_in_flight() {
            self.settled = true;
        }
        Ok(next)
    }
}

impl Drop for PhaseGuard<'_> {
    fn drop(&mut self) {
        if !self.settled {
            *self.phase.lock() = BulkPhase::Idle;
        }
    }
}

impl<G: EnrollmentGateway + ?Sized> ReassignmentCoordinator<G> {
    pub fn new(gateway: Arc<G>) -> Self {
        Self {
            gateway,
            phase: Mutex::new(BulkPhase::Idle),
        }
    }

    pub fn phase(&self) -> BulkPhase {
        *self.phase.lock()
    }

    /// Leave `Completed` once selection and operation-local state have been reset
    pub fn reset(&self) -> EnrollmentResult<()> {
        let mut phase = self.phase.lock();
        if phase.is_terminal() {
            *phase = phase.apply(BulkEvent::Reset)?;
        }
        Ok(())
    }

    fn begin(&self) -> EnrollmentResult<PhaseGuard<'_>> {
        let mut phase = self.phase.lock();
        if phase.is_in_flight() {
            return Err(EnrollmentError::validation(ALREADY_IN_PROGRESS));
        }
        if phase.is_terminal() {
            *phase = phase.apply(BulkEvent::Reset)?;
        }
        *phase = phase.apply(BulkEvent::Submit)?;
        Ok(PhaseGuard {
            phase: &self.phase,
            settled: false,
        })
    }

    // ===================================================================================
    // BATCH REASSIGNMENT
    // ===================================================================================

    /// Check batch reassignment preconditions in order, reporting the first failure
    ///
    /// Ids not on the snapshot roster do not count as selected.
    pub fn validate_batch_reassignment(
        snapshot: &RosterSnapshot,
        student_ids: &[StudentId],
        target_batch: &str,
    ) -> EnrollmentResult<()> {
        let student_ids = known_in_order(snapshot, student_ids);
        if student_ids.is_empty() {
            return Err(EnrollmentError::validation("No students selected"));
        }

        let available = available_batches_for_selection(snapshot, &student_ids);
        if available.is_empty() {
            return Err(EnrollmentError::validation(
                "Selected students have no course offerings to reassign into",
            ));
        }

        let target = target_batch.trim();
        if target.is_empty() {
            return Err(EnrollmentError::validation("Target batch is required"));
        }
        if !available.iter().any(|batch| batch == target) {
            return Err(EnrollmentError::validation(format!(
                "Batch {target} is not available for the selected students"
            )));
        }
        Ok(())
    }

    /// Move every selected student into `target_batch` with one request
    ///
    /// The backend applies the request as a whole, so a failure is reported for
    /// the whole operation rather than per student.
    pub async fn reassign_batch(
        &self,
        snapshot: &RosterSnapshot,
        student_ids: &[StudentId],
        target_batch: &str,
    ) -> EnrollmentResult<ReassignmentReport> {
        let mut guard = self.begin()?;
        let student_ids = known_in_order(snapshot, student_ids);

        if let Err(e) = Self::validate_batch_reassignment(snapshot, &student_ids, target_batch) {
            guard.advance(BulkEvent::Reject)?;
            warn!(error = %e, "Batch reassignment rejected");
            return Err(e);
        }
        guard.advance(BulkEvent::Start)?;

        let request = BatchReassignmentRequest {
            student_ids: student_ids.clone(),
            new_batch_identifier: target_batch.trim().to_string(),
        };
        info!(
            student_count = request.student_ids.len(),
            target_batch = %request.new_batch_identifier,
            "Submitting batch reassignment"
        );

        if let Err(e) = self.gateway.reassign_batch(&request).await {
            guard.advance(BulkEvent::Abort)?;
            log_bulk_operation(
                "reassign_batch",
                request.student_ids.len(),
                0,
                request.student_ids.len(),
                "failed",
                Some(&e.to_string()),
            );
            return Err(e);
        }

        let report = ReassignmentReport::new(
            student_ids.into_iter().map(StudentOutcome::succeeded).collect(),
            false,
        );
        guard.advance(BulkEvent::Finish(BulkOutcome::Success))?;
        log_bulk_operation(
            "reassign_batch",
            report.outcomes.len(),
            report.succeeded(),
            0,
            "completed",
            Some(&request.new_batch_identifier),
        );
        Ok(report)
    }

    // ===================================================================================
    // COMPETENCY REASSIGNMENT
    // ===================================================================================

    /// Check competency reassignment preconditions in order, returning `(from, to)`
    pub fn validate_competency_reassignment(
        snapshot: &RosterSnapshot,
        request: &CompetencyReassignment,
    ) -> EnrollmentResult<(CompetencyId, CompetencyId)> {
        let student_ids = known_in_order(snapshot, &request.student_ids);
        if student_ids.is_empty() {
            return Err(EnrollmentError::validation("No students selected"));
        }

        let from = non_blank(&request.from).ok_or_else(|| {
            EnrollmentError::validation("Select a competency to reassign from")
        })?;
        let to = non_blank(&request.to)
            .ok_or_else(|| EnrollmentError::validation("Select a competency to reassign to"))?;
        if from == to {
            return Err(EnrollmentError::validation(
                "Source and target competencies must differ",
            ));
        }

        let enrolled = enrolled_competencies_for_selection(snapshot, &student_ids);
        if !enrolled.iter().any(|tally| tally.competency_id == from) {
            return Err(EnrollmentError::validation(format!(
                "Competency {from} is not enrolled for any selected student"
            )));
        }
        if snapshot.catalog().competency(to.as_str()).is_none() {
            return Err(EnrollmentError::validation(format!(
                "Unknown target competency {to}"
            )));
        }

        Ok((from, to))
    }

    /// Write target progress for each selected student, one student at a time
    ///
    /// Per-student failures are recorded and the loop continues. An auth
    /// failure aborts the remaining students and is returned as an error;
    /// students already written keep their new progress. Cancellation is
    /// honored between students and leaves the rest as skipped.
    pub async fn reassign_competency(
        &self,
        snapshot: &RosterSnapshot,
        request: &CompetencyReassignment,
        cancellation: &CancellationToken,
    ) -> EnrollmentResult<ReassignmentReport> {
        let mut guard = self.begin()?;

        let (from, to) = match Self::validate_competency_reassignment(snapshot, request) {
            Ok(pair) => pair,
            Err(e) => {
                guard.advance(BulkEvent::Reject)?;
                warn!(error = %e, "Competency reassignment rejected");
                return Err(e);
            }
        };
        guard.advance(BulkEvent::Start)?;

        let student_ids = known_in_order(snapshot, &request.student_ids);
        info!(
            student_count = student_ids.len(),
            from = %from,
            to = %to,
            mode = %request.mode,
            "Starting competency reassignment"
        );

        let started = Instant::now();
        let mut outcomes = Vec::with_capacity(student_ids.len());
        let mut cancelled = false;

        for student_id in &student_ids {
            if cancelled || cancellation.is_cancelled() {
                cancelled = true;
                outcomes.push(StudentOutcome::skipped(student_id.clone()));
                continue;
            }

            match self
                .reassign_student(student_id, &from, &to, request.mode)
                .await
            {
                Ok(()) => outcomes.push(StudentOutcome::succeeded(student_id.clone())),
                Err(e) if e.is_auth() => {
                    guard.advance(BulkEvent::Abort)?;
                    let succeeded = outcomes
                        .iter()
                        .filter(|outcome| outcome.status == OutcomeStatus::Succeeded)
                        .count();
                    log_bulk_operation(
                        "reassign_competency",
                        student_ids.len(),
                        succeeded,
                        outcomes.len() - succeeded + 1,
                        "aborted",
                        Some(&e.to_string()),
                    );
                    return Err(e);
                }
                Err(e) => {
                    warn!(student_id = %student_id, error = %e, "Competency reassignment failed for student");
                    outcomes.push(StudentOutcome::failed(student_id.clone(), e.to_string()));
                }
            }
        }

        let report = ReassignmentReport::new(outcomes, cancelled);
        let outcome = report.outcome();
        guard.advance(BulkEvent::Finish(outcome))?;

        let details = format!(
            "{from} -> {to} ({}), {} skipped, {}ms",
            request.mode,
            report.skipped(),
            started.elapsed().as_millis()
        );
        log_bulk_operation(
            "reassign_competency",
            student_ids.len(),
            report.succeeded(),
            report.failed(),
            &outcome.to_string(),
            Some(&details),
        );
        Ok(report)
    }

    async fn reassign_student(
        &self,
        student_id: &StudentId,
        from: &CompetencyId,
        to: &CompetencyId,
        mode: ProgressMode,
    ) -> EnrollmentResult<()> {
        // Prior progress only matters when it is carried over
        let prior = if mode == ProgressMode::Transfer {
            match self.gateway.student_competency_progress(student_id).await {
                Ok(progress) => progress
                    .into_iter()
                    .find(|entry| &entry.competency_id == from),
                Err(e) if e.is_auth() => return Err(e),
                Err(e) => {
                    debug!(student_id = %student_id, error = %e, "Prior progress unavailable");
                    None
                }
            }
        } else {
            None
        };

        let payload = compute_target_progress(mode, prior.as_ref());
        self.gateway
            .upsert_competency_progress(student_id, to, &payload)
            .await
    }
}

fn non_blank(value: &Option<CompetencyId>) -> Option<CompetencyId> {
    value
        .as_ref()
        .filter(|id| !id.as_str().trim().is_empty())
        .cloned()
}

/// Distinct ids in first-seen order, keeping only students on the snapshot roster
fn known_in_order(snapshot: &RosterSnapshot, student_ids: &[StudentId]) -> Vec<StudentId> {
    let mut seen = HashSet::with_capacity(student_ids.len());
    let known: Vec<StudentId> = student_ids
        .iter()
        .filter(|id| seen.insert(*id))
        .filter(|id| snapshot.contains(id))
        .cloned()
        .collect();
    if known.len() < seen.len() {
        warn!(
            dropped = seen.len() - known.len(),
            "Ignoring selected students missing from the roster snapshot"
        );
    }
    known
}

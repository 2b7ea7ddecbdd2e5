//! # Bulk Reassignment Coordinator
//!
//! Validates and executes batch and competency reassignment over a selection.
//! Batch reassignment is one request for the whole selection; competency
//! reassignment is a sequential per-student loop whose failures are recorded,
//! not propagated, and never roll back students already processed.

pub mod cancellation;
pub mod coordinator;
pub mod progress;
pub mod report;
pub mod state;

pub use cancellation::CancellationToken;
pub use coordinator::{CompetencyReassignment, ReassignmentCoordinator, ALREADY_IN_PROGRESS};
pub use progress::{compute_target_progress, ProgressMode};
pub use report::{BulkOutcome, OutcomeStatus, ReassignmentReport, StudentOutcome};
pub use state::{BulkEvent, BulkPhase};

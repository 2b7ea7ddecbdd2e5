#![allow(clippy::doc_markdown)] // Allow technical terms like REST, JSON in docs
#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Enrollment Core Rust
//!
//! Competency reconciliation, batch views, and bulk reassignment for a student
//! enrollment backend.
//!
//! ## Overview
//!
//! Student, course, and competency data arrives from a REST API in several
//! inconsistent shapes. This crate normalizes it at the gateway boundary,
//! merges each student's authoritative progress with enrollment-derived
//! competencies, exposes deterministic roster views, and coordinates bulk batch
//! and competency reassignments that tolerate per-student failures.
//!
//! ## Module Organization
//!
//! - [`api_clients`] - Remote data gateway trait, REST client, wire normalization
//! - [`reconciler`] - Per-student competency reconciliation with enrollment fallback
//! - [`aggregation`] - Pure views over immutable roster snapshots
//! - [`selection`] - Roster filters and the current student selection
//! - [`bulk`] - Batch and competency reassignment with per-student results
//! - [`workspace`] - Façade owning the current snapshot and wiring everything together
//! - [`models`] - Typed domain entities
//! - [`config`] - Layered client configuration
//! - [`error`] - Structured error handling
//! - [`logging`] - Structured logging bootstrap
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use enrollment_core::{ClientConfig, EnrollmentApiClient, EnrollmentApiConfig, EnrollmentWorkspace};
//! use enrollment_core::bulk::{CancellationToken, ProgressMode};
//!
//! # async fn example() -> enrollment_core::EnrollmentResult<()> {
//! let config = ClientConfig::load()?;
//! let client = EnrollmentApiClient::new(EnrollmentApiConfig::from(&config.api))?;
//! let workspace = EnrollmentWorkspace::with_config(Arc::new(client), &config);
//!
//! workspace.refresh().await?;
//! workspace.select_students(["17".into(), "42".into()]);
//!
//! let report = workspace
//!     .reassign_selected_competency("html", "css", ProgressMode::Transfer, &CancellationToken::new())
//!     .await?;
//! println!("{} succeeded, {} failed", report.succeeded(), report.failed());
//! # Ok(())
//! # }
//! ```
//!
//! ## Testing
//!
//! ```bash
//! cargo test --lib    # Unit tests
//! cargo test          # Unit, integration, HTTP, and property tests
//! ```

pub mod aggregation;
pub mod api_clients;
pub mod bulk;
pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod reconciler;
pub mod selection;
pub mod test_helpers;
pub mod utils;
pub mod workspace;

pub use aggregation::{BatchKey, BatchSummary, CompetencyTally, FilterOptions, RosterSnapshot};
pub use api_clients::{EnrollmentApiClient, EnrollmentApiConfig, EnrollmentGateway};
pub use bulk::{
    BulkOutcome, BulkPhase, CancellationToken, CompetencyReassignment, ProgressMode,
    ReassignmentCoordinator, ReassignmentReport,
};
pub use config::ClientConfig;
pub use error::{EnrollmentError, EnrollmentResult};
pub use reconciler::{CompetencyMap, CompetencyReconciler, ReconciliationSource};
pub use selection::{SelectionStore, StudentFilters};
pub use workspace::EnrollmentWorkspace;

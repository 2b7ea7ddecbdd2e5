//! # Enrollment Workspace
//!
//! Wires the gateway, reconciler, aggregation views, selection store, and bulk
//! coordinator together. The workspace owns the only shared mutable state: the
//! current [`RosterSnapshot`], which is always replaced wholesale after a
//! refresh and never patched in place. Every refresh takes a generation number
//! when its fetch starts; a snapshot is only installed over an older one, so
//! overlapping refreshes can never roll the views back.

use parking_lot::{Mutex, RwLock};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::aggregation::{
    self, BatchKey, BatchSummary, CompetencyTally, FilterOptions, RosterSnapshot,
};
use crate::api_clients::EnrollmentGateway;
use crate::bulk::{
    CancellationToken, CompetencyReassignment, ProgressMode, ReassignmentCoordinator,
    ReassignmentReport,
};
use crate::config::ClientConfig;
use crate::error::EnrollmentResult;
use crate::logging::log_error;
use crate::models::{Catalog, CompetencyId, Student, StudentCompetencyRecord, StudentId};
use crate::reconciler::CompetencyReconciler;
use crate::selection::{SelectionStore, StudentFilters};

/// Installed snapshot plus the refresh generations that produced or outdated it
#[derive(Debug, Default)]
struct SnapshotSlot {
    snapshot: Arc<RosterSnapshot>,
    generation: u64,
    /// Newest failed post-mutation refresh newer than `generation`
    failed_generation: Option<u64>,
}

impl SnapshotSlot {
    /// Install `snapshot` unless a newer generation is already in place
    fn install(&mut self, generation: u64, snapshot: Arc<RosterSnapshot>) -> bool {
        if generation <= self.generation {
            return false;
        }
        self.generation = generation;
        self.snapshot = snapshot;
        if self
            .failed_generation
            .is_some_and(|failed| failed < generation)
        {
            self.failed_generation = None;
        }
        true
    }

    fn mark_failed(&mut self, generation: u64) {
        if generation > self.generation {
            let newest = self
                .failed_generation
                .map_or(generation, |failed| failed.max(generation));
            self.failed_generation = Some(newest);
        }
    }
}

pub struct EnrollmentWorkspace<G: ?Sized> {
    gateway: Arc<G>,
    reconciler: CompetencyReconciler<G>,
    coordinator: ReassignmentCoordinator<G>,
    slot: RwLock<SnapshotSlot>,
    next_generation: AtomicU64,
    selection: Mutex<SelectionStore>,
}

impl<G: ?Sized> std::fmt::Debug for EnrollmentWorkspace<G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let slot = self.slot.read();
        f.debug_struct("EnrollmentWorkspace")
            .field("students", &slot.snapshot.students().len())
            .field("generation", &slot.generation)
            .field("selected", &self.selection.lock().len())
            .field("stale", &slot.failed_generation.is_some())
            .finish()
    }
}

impl<G: EnrollmentGateway + ?Sized> EnrollmentWorkspace<G> {
    /// Create an empty workspace; call [`refresh`](Self::refresh) to load data
    pub fn new(gateway: Arc<G>) -> Self {
        Self {
            reconciler: CompetencyReconciler::new(gateway.clone()),
            coordinator: ReassignmentCoordinator::new(gateway.clone()),
            gateway,
            slot: RwLock::new(SnapshotSlot::default()),
            next_generation: AtomicU64::new(0),
            selection: Mutex::new(SelectionStore::new()),
        }
    }

    pub fn with_config(gateway: Arc<G>, config: &ClientConfig) -> Self {
        let mut workspace = Self::new(gateway);
        workspace.reconciler = workspace
            .reconciler
            .with_max_concurrent(config.reconciliation.max_concurrent_students);
        workspace
    }

    pub fn gateway(&self) -> &Arc<G> {
        &self.gateway
    }

    /// Current snapshot; cheap to clone and safe to hold across a refresh
    pub fn snapshot(&self) -> Arc<RosterSnapshot> {
        self.slot.read().snapshot.clone()
    }

    /// True when the last post-mutation refresh failed and views predate that mutation
    pub fn is_stale(&self) -> bool {
        self.slot.read().failed_generation.is_some()
    }

    pub fn coordinator(&self) -> &ReassignmentCoordinator<G> {
        &self.coordinator
    }

    // ===================================================================================
    // LOADING
    // ===================================================================================

    /// Fetch roster and catalogs, reconcile every student, and swap in the result
    ///
    /// On error the previous snapshot stays in place. When a refresh that
    /// started later has already installed its snapshot, this one is discarded
    /// and the newer snapshot is returned.
    pub async fn refresh(&self) -> EnrollmentResult<Arc<RosterSnapshot>> {
        let generation = self.begin_refresh();
        self.refresh_generation(generation).await
    }

    fn begin_refresh(&self) -> u64 {
        self.next_generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    async fn refresh_generation(&self, generation: u64) -> EnrollmentResult<Arc<RosterSnapshot>> {
        let (students, courses, offerings, competencies) = tokio::try_join!(
            self.gateway.list_students(),
            self.gateway.list_courses(),
            self.gateway.list_course_offerings(),
            self.gateway.list_competencies(),
        )?;
        let catalog = Catalog::new(courses, offerings, competencies);
        let reconciled = self.reconciler.reconcile_roster(&students, &catalog).await;
        let snapshot = Arc::new(RosterSnapshot::new(students, catalog, reconciled));

        {
            let mut slot = self.slot.write();
            if !slot.install(generation, snapshot.clone()) {
                debug!(
                    generation,
                    installed = slot.generation,
                    "Discarding superseded roster snapshot"
                );
                return Ok(slot.snapshot.clone());
            }
        }

        let dropped = self
            .selection
            .lock()
            .retain(|student_id| snapshot.contains(student_id));
        info!(
            generation,
            students = snapshot.students().len(),
            courses = snapshot.catalog().courses.len(),
            offerings = snapshot.catalog().offerings.len(),
            dropped_selection = dropped,
            "Roster snapshot refreshed"
        );
        Ok(snapshot)
    }

    async fn refresh_after_mutation(&self, operation: &str) {
        let generation = self.begin_refresh();
        if let Err(e) = self.refresh_generation(generation).await {
            self.slot.write().mark_failed(generation);
            log_error(
                "workspace",
                operation,
                &e.to_string(),
                Some("post-mutation refresh failed; keeping previous snapshot"),
            );
        }
    }

    // ===================================================================================
    // SELECTION & FILTERS
    // ===================================================================================

    pub fn filters(&self) -> StudentFilters {
        self.selection.lock().filters().clone()
    }

    pub fn set_filters(&self, filters: StudentFilters) {
        self.selection.lock().set_filters(filters);
    }

    pub fn clear_filters(&self) {
        self.selection.lock().clear_filters();
    }

    pub fn selected_ids(&self) -> Vec<StudentId> {
        self.selection.lock().selected_ids()
    }

    pub fn toggle_student(&self, student_id: StudentId) -> bool {
        self.selection.lock().toggle(student_id)
    }

    pub fn select_students(&self, student_ids: impl IntoIterator<Item = StudentId>) {
        self.selection.lock().select_many(student_ids);
    }

    pub fn deselect_student(&self, student_id: &StudentId) {
        self.selection.lock().deselect(student_id);
    }

    pub fn clear_selection(&self) {
        self.selection.lock().clear();
    }

    /// Select exactly the students visible under the current filters
    pub fn select_all_filtered(&self) -> usize {
        let snapshot = self.snapshot();
        let mut selection = self.selection.lock();
        let ids: Vec<StudentId> =
            aggregation::filtered_students(&snapshot, selection.filters())
                .into_iter()
                .map(|student| student.id.clone())
                .collect();
        let count = ids.len();
        selection.select_all(ids);
        count
    }

    /// Add every filtered student of one batch group to the selection
    pub fn select_batch_group(&self, batch: &BatchKey) -> usize {
        let snapshot = self.snapshot();
        let mut selection = self.selection.lock();
        let ids: Vec<StudentId> = aggregation::students_by_batch(&snapshot, selection.filters())
            .remove(batch)
            .unwrap_or_default()
            .into_iter()
            .map(|student| student.id.clone())
            .collect();
        let count = ids.len();
        selection.select_many(ids);
        count
    }

    // ===================================================================================
    // VIEWS
    // ===================================================================================

    pub fn unique_batches(&self) -> Vec<String> {
        aggregation::unique_batches(&self.snapshot())
    }

    pub fn filtered_students(&self) -> Vec<Student> {
        let snapshot = self.snapshot();
        let filters = self.filters();
        aggregation::filtered_students(&snapshot, &filters)
            .into_iter()
            .cloned()
            .collect()
    }

    pub fn students_by_batch(&self) -> BTreeMap<BatchKey, Vec<Student>> {
        let snapshot = self.snapshot();
        let filters = self.filters();
        aggregation::students_by_batch(&snapshot, &filters)
            .into_iter()
            .map(|(key, students)| (key, students.into_iter().cloned().collect()))
            .collect()
    }

    pub fn available_batches_for_selection(&self) -> Vec<String> {
        aggregation::available_batches_for_selection(&self.snapshot(), &self.selected_ids())
    }

    pub fn enrolled_competencies_for_selection(&self) -> Vec<CompetencyTally> {
        aggregation::enrolled_competencies_for_selection(&self.snapshot(), &self.selected_ids())
    }

    pub fn competencies_for(&self, student_id: &StudentId) -> Vec<StudentCompetencyRecord> {
        self.snapshot().competencies_for(student_id).to_vec()
    }

    pub fn student_summary(&self, student_id: &StudentId) -> String {
        aggregation::student_summary(&self.snapshot(), student_id)
    }

    pub fn filter_options(&self) -> FilterOptions {
        aggregation::filter_options(&self.snapshot())
    }

    pub fn batch_summaries(&self) -> Vec<BatchSummary> {
        aggregation::batch_summaries(&self.snapshot(), &self.filters())
    }

    // ===================================================================================
    // BULK OPERATIONS
    // ===================================================================================

    /// Move the current selection into `target_batch`
    ///
    /// On success the selection is cleared and the roster is refreshed from the
    /// backend; a failed refresh marks the workspace stale but still returns
    /// the report.
    pub async fn reassign_selected_batch(
        &self,
        target_batch: &str,
    ) -> EnrollmentResult<ReassignmentReport> {
        let snapshot = self.snapshot();
        let selected = self.selected_ids();

        let report = self
            .coordinator
            .reassign_batch(&snapshot, &selected, target_batch)
            .await?;
        self.complete("reassign_batch").await?;
        Ok(report)
    }

    /// Move the current selection from one competency to another
    ///
    /// The report is returned for full, partial, and failed outcomes alike;
    /// only validation, in-flight, and auth errors come back as `Err`.
    pub async fn reassign_selected_competency(
        &self,
        from: impl Into<CompetencyId>,
        to: impl Into<CompetencyId>,
        mode: ProgressMode,
        cancellation: &CancellationToken,
    ) -> EnrollmentResult<ReassignmentReport> {
        let snapshot = self.snapshot();
        let request = CompetencyReassignment::new(self.selected_ids(), from, to, mode);

        let result = self
            .coordinator
            .reassign_competency(&snapshot, &request, cancellation)
            .await;

        match result {
            Ok(report) => {
                self.complete("reassign_competency").await?;
                Ok(report)
            }
            Err(e) => {
                // Aborted runs may still have written progress for earlier students
                if !e.is_validation() {
                    warn!(error = %e, "Competency reassignment aborted; refreshing roster");
                    self.refresh_after_mutation("reassign_competency").await;
                }
                Err(e)
            }
        }
    }

    async fn complete(&self, operation: &str) -> EnrollmentResult<()> {
        self.selection.lock().clear();
        self.coordinator.reset()?;
        self.refresh_after_mutation(operation).await;
        Ok(())
    }
}

//! # Selection & Filter Store
//!
//! Holds the current roster filters and the set of selected student ids.
//! Views never read this directly; callers hand a snapshot of it to the
//! aggregation functions so every view is recomputed from explicit inputs.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::models::StudentId;

/// Roster filters. Every field is AND-combined; an empty value matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StudentFilters {
    /// Case-insensitive substring of the student's name
    pub name: String,
    /// Case-insensitive substring of any course the student is enrolled in
    pub course: String,
    /// Case-insensitive substring of any batch the student belongs to
    pub batch: String,
    /// Case-insensitive equality with the student's status
    pub status: String,
    /// Case-insensitive substring of any reconciled competency name
    pub competency: String,
}

impl StudentFilters {
    pub fn is_empty(&self) -> bool {
        [
            &self.name,
            &self.course,
            &self.batch,
            &self.status,
            &self.competency,
        ]
        .iter()
        .all(|value| value.trim().is_empty())
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    #[must_use]
    pub fn with_course(mut self, course: impl Into<String>) -> Self {
        self.course = course.into();
        self
    }

    #[must_use]
    pub fn with_batch(mut self, batch: impl Into<String>) -> Self {
        self.batch = batch.into();
        self
    }

    #[must_use]
    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = status.into();
        self
    }

    #[must_use]
    pub fn with_competency(mut self, competency: impl Into<String>) -> Self {
        self.competency = competency.into();
        self
    }
}

/// Current filters plus the selected student ids
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionStore {
    selected: BTreeSet<StudentId>,
    filters: StudentFilters,
}

impl SelectionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selected(&self) -> &BTreeSet<StudentId> {
        &self.selected
    }

    /// Selected ids in a stable order
    pub fn selected_ids(&self) -> Vec<StudentId> {
        self.selected.iter().cloned().collect()
    }

    pub fn is_selected(&self, student_id: &StudentId) -> bool {
        self.selected.contains(student_id)
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    /// Flip one student's selection; returns whether it is now selected
    pub fn toggle(&mut self, student_id: StudentId) -> bool {
        if self.selected.remove(&student_id) {
            false
        } else {
            self.selected.insert(student_id);
            true
        }
    }

    pub fn select(&mut self, student_id: StudentId) {
        self.selected.insert(student_id);
    }

    pub fn deselect(&mut self, student_id: &StudentId) {
        self.selected.remove(student_id);
    }

    pub fn select_many(&mut self, student_ids: impl IntoIterator<Item = StudentId>) {
        self.selected.extend(student_ids);
    }

    /// Replace the selection with exactly `student_ids`
    pub fn select_all(&mut self, student_ids: impl IntoIterator<Item = StudentId>) {
        self.selected = student_ids.into_iter().collect();
    }

    pub fn clear(&mut self) {
        self.selected.clear();
    }

    /// Drop selected ids for which `keep` returns false; returns how many were dropped
    pub fn retain(&mut self, mut keep: impl FnMut(&StudentId) -> bool) -> usize {
        let before = self.selected.len();
        self.selected.retain(|id| keep(id));
        before - self.selected.len()
    }

    pub fn filters(&self) -> &StudentFilters {
        &self.filters
    }

    pub fn set_filters(&mut self, filters: StudentFilters) {
        self.filters = filters;
    }

    pub fn clear_filters(&mut self) {
        self.filters = StudentFilters::default();
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::course::CourseRef;
use super::ids::StudentId;

/// Student represents one roster entry as normalized from the upstream API
///
/// Created and persisted upstream; this crate only reads students and
/// triggers batch membership changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Student {
    pub id: StudentId,
    pub name: String,
    pub email: String,
    /// Graduation status, e.g. "Enrolled" or "Graduated"
    pub status: String,
    /// Batch memberships; a student may sit in one batch per enrolled course
    pub batches: BTreeSet<String>,
    /// Legacy single-batch (batch year) field from older records
    pub legacy_batch: Option<String>,
    /// Course enrollment references, possibly free text
    pub course_refs: Vec<CourseRef>,
    pub registered_at: Option<DateTime<Utc>>,
}

impl Student {
    /// Create a student with no batches or course references
    pub fn new(id: impl Into<StudentId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            email: String::new(),
            status: String::new(),
            batches: BTreeSet::new(),
            legacy_batch: None,
            course_refs: Vec::new(),
            registered_at: None,
        }
    }

    /// Builder-style helper adding a batch membership
    #[must_use]
    pub fn with_batch(mut self, batch: impl Into<String>) -> Self {
        self.batches.insert(batch.into());
        self
    }

    /// Builder-style helper adding a course reference
    #[must_use]
    pub fn with_course(mut self, course: CourseRef) -> Self {
        self.course_refs.push(course);
        self
    }

    /// Builder-style helper setting the graduation status
    #[must_use]
    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = status.into();
        self
    }

    /// Batch identifiers this student resolves to.
    ///
    /// The membership set wins; the legacy single-batch field is only used when
    /// the set is empty. An empty result means the student is unassigned.
    pub fn batch_identifiers(&self) -> BTreeSet<&str> {
        if !self.batches.is_empty() {
            return self.batches.iter().map(String::as_str).collect();
        }
        self.legacy_batch
            .as_deref()
            .filter(|batch| !batch.trim().is_empty())
            .into_iter()
            .collect()
    }

    /// Check whether the student already belongs to `batch`
    pub fn is_in_batch(&self, batch: &str) -> bool {
        self.batch_identifiers().contains(batch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memberships_take_precedence_over_legacy_batch() {
        let mut student = Student::new("s1", "Ada").with_batch("B-2");
        student.legacy_batch = Some("2019".to_string());

        let batches: Vec<&str> = student.batch_identifiers().into_iter().collect();
        assert_eq!(batches, vec!["B-2"]);
    }

    #[test]
    fn test_legacy_batch_used_when_no_memberships() {
        let mut student = Student::new("s1", "Ada");
        assert!(student.batch_identifiers().is_empty());

        student.legacy_batch = Some("2019".to_string());
        assert!(student.is_in_batch("2019"));
    }
}

//! Test data builders for cohort-sized scenarios.

use enrollment_core::models::{
    Competency, CompetencyProgress, Course, CourseOffering, CourseRef, Student, StudentId,
};
use enrollment_core::test_helpers::InMemoryGateway;

/// Builder for a cohort of students sharing one course and batch
///
/// Every student is enrolled in `WEB-101`, sits in batch `B-1`, and holds
/// progress on `k-html`. Offerings exist for `B-1` and `B-2`.
pub struct CohortBuilder {
    size: usize,
    progress_score: f64,
    failing_upserts: Vec<usize>,
    extra_offerings: Vec<(String, String)>,
}

impl CohortBuilder {
    pub fn new(size: usize) -> Self {
        Self {
            size,
            progress_score: 70.0,
            failing_upserts: Vec::new(),
            extra_offerings: Vec::new(),
        }
    }

    pub fn with_progress_score(mut self, score: f64) -> Self {
        self.progress_score = score;
        self
    }

    /// Make the upsert fail for the student at 1-based `position`
    pub fn failing_upsert_at(mut self, position: usize) -> Self {
        self.failing_upserts.push(position);
        self
    }

    pub fn with_offering(mut self, course_id: &str, batch: &str) -> Self {
        self.extra_offerings
            .push((course_id.to_string(), batch.to_string()));
        self
    }

    pub fn student_ids(&self) -> Vec<StudentId> {
        (1..=self.size).map(cohort_student_id).collect()
    }

    pub fn build(self) -> InMemoryGateway {
        let mut offerings = vec![
            CourseOffering::new("o-1", "c-web", "B-1"),
            CourseOffering::new("o-2", "c-web", "B-2"),
        ];
        offerings.extend(
            self.extra_offerings
                .iter()
                .enumerate()
                .map(|(i, (course, batch))| {
                    CourseOffering::new(format!("o-extra-{i}"), course.as_str(), batch.as_str())
                }),
        );

        let competencies = vec![
            Competency::new("k-html", "HTML Basics", "Technical"),
            Competency::new("k-css", "CSS Layout", "Technical"),
            Competency::new("k-js", "JavaScript", "Technical"),
        ];

        let students: Vec<Student> = (1..=self.size)
            .map(|n| {
                Student::new(cohort_student_id(n), format!("Student {n}"))
                    .with_status("Enrolled")
                    .with_batch("B-1")
                    .with_course(CourseRef::by_id("c-web"))
            })
            .collect();

        let mut gateway = InMemoryGateway::new()
            .with_students(students)
            .with_courses(vec![
                Course::new("c-web", "WEB-101", "Web Development"),
                Course::new("c-ux", "UX-110", "UX Design"),
            ])
            .with_offerings(offerings)
            .with_competencies(competencies.clone())
            .with_course_competencies("c-web", competencies);

        for n in 1..=self.size {
            let mut progress = CompetencyProgress::new("k-html");
            progress.competency_name = Some("HTML Basics".to_string());
            progress.competency_type = Some("Technical".to_string());
            progress.score = Some(self.progress_score);
            progress.exam_status = Some("Passed".to_string());
            progress.passed = Some(true);
            gateway = gateway.with_progress(cohort_student_id(n), vec![progress]);
        }

        for position in self.failing_upserts {
            gateway = gateway.fail_upsert_for(cohort_student_id(position), "upstream rejected write");
        }
        gateway
    }
}

pub fn cohort_student_id(position: usize) -> StudentId {
    StudentId::new(format!("st-{position}"))
}

//! Shared roster fixture.
//!
//! Five students covering every reconciliation path:
//!
//! | id | batches | progress | enrollments |
//! |----|---------|----------|-------------|
//! | s1 | B-WEB-2024A | HTML, CSS | (not consulted) |
//! | s2 | B-WEB-2024A, B-DS-2024 | none | WEB-101, "Data Science evening" |
//! | s3 | B-DS-2024 | Statistics | (not consulted) |
//! | s4 | legacy "2019" | fetch fails | "UX Design" |
//! | s5 | none | none | none |

use crate::models::{
    Catalog, Competency, CompetencyProgress, Course, CourseOffering, CourseRef, Student,
};

use super::InMemoryGateway;

pub fn sample_courses() -> Vec<Course> {
    vec![
        Course::new("c-web", "WEB-101", "Web Development"),
        Course::new("c-ds", "DS-201", "Data Science"),
        Course::new("c-ux", "UX-110", "UX Design"),
    ]
}

pub fn sample_offerings() -> Vec<CourseOffering> {
    vec![
        CourseOffering::new("o1", "c-web", "B-WEB-2024A"),
        CourseOffering::new("o2", "c-web", "B-WEB-2024B"),
        CourseOffering::new("o3", "c-ds", "B-DS-2024"),
        CourseOffering::new("o4", "c-ux", "B-UX-2025"),
    ]
}

pub fn sample_competencies() -> Vec<Competency> {
    vec![
        Competency::new("k-html", "HTML Basics", "Technical"),
        Competency::new("k-css", "CSS Layout", "Technical"),
        Competency::new("k-js", "JavaScript", "Technical"),
        Competency::new("k-stats", "Statistics", "Analytical"),
        Competency::new("k-sql", "SQL", "Technical"),
        Competency::new("k-comm", "Communication", "Soft Skills"),
    ]
}

pub fn sample_catalog() -> Catalog {
    Catalog::new(sample_courses(), sample_offerings(), sample_competencies())
}

pub fn sample_students() -> Vec<Student> {
    let mut katherine = Student::new("s4", "Katherine Johnson")
        .with_status("Enrolled")
        .with_course(CourseRef::from_text("UX Design"));
    katherine.legacy_batch = Some("2019".to_string());

    vec![
        Student::new("s1", "Ada Lovelace")
            .with_status("Enrolled")
            .with_batch("B-WEB-2024A")
            .with_course(CourseRef::by_id("c-web")),
        Student::new("s2", "Grace Hopper")
            .with_status("Enrolled")
            .with_batch("B-WEB-2024A")
            .with_batch("B-DS-2024")
            .with_course(CourseRef::by_code("WEB-101"))
            .with_course(CourseRef::from_text("Data Science")),
        Student::new("s3", "Alan Turing")
            .with_status("Graduated")
            .with_batch("B-DS-2024")
            .with_course(CourseRef::by_id("c-ds")),
        katherine,
        Student::new("s5", "Linus Torvalds").with_status("Enrolled"),
    ]
}

fn progress(id: &str, score: f64, status: &str, passed: bool) -> CompetencyProgress {
    let mut entry = CompetencyProgress::new(id);
    entry.score = Some(score);
    entry.exam_status = Some(status.to_string());
    entry.passed = Some(passed);
    entry
}

/// Gateway populated with the full fixture; `s4`'s progress fetch fails
pub fn sample_gateway() -> InMemoryGateway {
    let competencies = sample_competencies();
    let pick = |ids: &[&str]| -> Vec<Competency> {
        ids.iter()
            .filter_map(|id| competencies.iter().find(|c| c.id.as_str() == *id).cloned())
            .collect()
    };

    InMemoryGateway::new()
        .with_students(sample_students())
        .with_courses(sample_courses())
        .with_offerings(sample_offerings())
        .with_competencies(sample_competencies())
        .with_course_competencies("c-web", pick(&["k-html", "k-css", "k-js"]))
        .with_course_competencies("c-ds", pick(&["k-stats", "k-sql", "k-comm"]))
        .with_course_competencies("c-ux", pick(&["k-comm"]))
        .with_progress(
            "s1",
            vec![
                progress("k-html", 80.0, "Passed", true),
                progress("k-css", 40.0, "Failed", false),
            ],
        )
        .with_progress("s3", vec![progress("k-stats", 90.0, "Passed", true)])
        .fail_progress_for("s4")
        .with_enrollments(
            "s2",
            vec![
                CourseRef::by_code("WEB-101"),
                CourseRef::from_text("Data Science evening"),
            ],
        )
        .with_enrollments("s4", vec![CourseRef::from_text("UX Design")])
}

use serde::{Deserialize, Serialize};

use super::competency::Competency;
use super::course::{Course, CourseOffering};

/// Reference data fetched alongside the roster: courses, offerings, competencies
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    pub courses: Vec<Course>,
    pub offerings: Vec<CourseOffering>,
    pub competencies: Vec<Competency>,
}

impl Catalog {
    pub fn new(
        courses: Vec<Course>,
        offerings: Vec<CourseOffering>,
        competencies: Vec<Competency>,
    ) -> Self {
        Self {
            courses,
            offerings,
            competencies,
        }
    }

    pub fn course(&self, id: &str) -> Option<&Course> {
        self.courses.iter().find(|course| course.id.as_str() == id)
    }

    pub fn competency(&self, id: &str) -> Option<&Competency> {
        self.competencies
            .iter()
            .find(|competency| competency.id.as_str() == id)
    }
}

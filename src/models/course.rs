use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::ids::{CourseId, OfferingId};

/// Course catalog entry. Immutable from this crate's perspective.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    pub id: CourseId,
    /// Unique human-readable code, e.g. "WEB-101"
    pub code: String,
    pub name: String,
}

impl Course {
    pub fn new(id: impl Into<CourseId>, code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            code: code.into(),
            name: name.into(),
        }
    }
}

/// A scheduled run of a course tied to one batch identifier
///
/// Offerings are the source of truth for which batches are valid targets for
/// students enrolled in a course.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseOffering {
    pub id: OfferingId,
    pub course: CourseRef,
    pub batch_identifier: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub schedule: Option<String>,
}

impl CourseOffering {
    pub fn new(
        id: impl Into<OfferingId>,
        course_id: impl Into<CourseId>,
        batch_identifier: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            course: CourseRef::by_id(course_id),
            batch_identifier: batch_identifier.into(),
            start_date: None,
            end_date: None,
            schedule: None,
        }
    }
}

/// A reference to a course as it appears upstream
///
/// Enrollment data is inconsistent: some sources carry the course id, some a
/// code or name, and older records only a free-text label. All are kept so the
/// course matcher can pick the strongest signal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseRef {
    pub id: Option<CourseId>,
    pub code: Option<String>,
    pub name: Option<String>,
    /// Free-text label such as "Web Development (WEB-101) - evening"
    pub text: Option<String>,
}

impl CourseRef {
    pub fn by_id(id: impl Into<CourseId>) -> Self {
        Self {
            id: Some(id.into()),
            ..Self::default()
        }
    }

    pub fn by_code(code: impl Into<String>) -> Self {
        Self {
            code: Some(code.into()),
            ..Self::default()
        }
    }

    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::default()
        }
    }

    /// True when the reference carries no usable signal at all
    pub fn is_empty(&self) -> bool {
        self.id.is_none()
            && [&self.code, &self.name, &self.text]
                .iter()
                .all(|field| field.as_deref().map_or(true, |s| s.trim().is_empty()))
    }

    /// Textual fields in matching order: text, then name, then code
    pub fn search_terms(&self) -> impl Iterator<Item = &str> {
        [&self.text, &self.name, &self.code]
            .into_iter()
            .filter_map(|field| field.as_deref())
            .map(str::trim)
            .filter(|term| !term.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_reference_detection() {
        assert!(CourseRef::default().is_empty());
        assert!(CourseRef::from_text("   ").is_empty());
        assert!(!CourseRef::by_code("WEB-101").is_empty());
        assert!(!CourseRef::by_id("7").is_empty());
    }

    #[test]
    fn test_search_terms_order() {
        let reference = CourseRef {
            id: None,
            code: Some("WEB-101".to_string()),
            name: Some("Web Development".to_string()),
            text: Some("evening web class".to_string()),
        };
        let terms: Vec<&str> = reference.search_terms().collect();
        assert_eq!(terms, vec!["evening web class", "Web Development", "WEB-101"]);
    }
}

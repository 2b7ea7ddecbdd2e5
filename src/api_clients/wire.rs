//! # Wire Normalization
//!
//! Upstream payloads are loosely typed: list endpoints return bare arrays or
//! envelope objects, identifiers are strings or numbers, and the same field
//! appears under several names depending on the API version. The types here
//! accept every known variant and convert into the crate's typed models, so
//! nothing past the gateway ever sees an alias or an optional id.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeSet;
use tracing::warn;

use crate::error::{EnrollmentError, EnrollmentResult};
use crate::models::{
    Competency, CompetencyId, CompetencyProgress, Course, CourseId, CourseOffering, CourseRef,
    OfferingId, Student, StudentId, UNCATEGORIZED,
};
use crate::utils::serde::{
    deserialize_flexible_id, deserialize_optional_flag, deserialize_optional_flexible_id,
    deserialize_optional_score, deserialize_string_or_seq,
};

/// Generic envelope keys tried after the resource-specific ones
const ENVELOPE_KEYS: [&str; 3] = ["data", "items", "results"];

/// Extract a list payload from a bare array or an envelope object.
///
/// Items that fail to deserialize or normalize are skipped with a warning so a
/// single malformed row cannot hide the rest of the roster.
pub fn extract_list<W, T>(
    value: Value,
    resource_keys: &[&str],
    normalize: impl Fn(W) -> Option<T>,
) -> EnrollmentResult<Vec<T>>
where
    W: DeserializeOwned,
{
    let resource = resource_keys.first().copied().unwrap_or("items");
    let items = unwrap_envelope(value, resource_keys).ok_or_else(|| {
        EnrollmentError::invalid_response(resource, "expected an array or an envelope object")
    })?;

    let total = items.len();
    let normalized: Vec<T> = items
        .into_iter()
        .enumerate()
        .filter_map(|(index, item)| match serde_json::from_value::<W>(item) {
            Ok(wire) => {
                let model = normalize(wire);
                if model.is_none() {
                    warn!(resource, index, "Skipping upstream item missing required fields");
                }
                model
            }
            Err(e) => {
                warn!(resource, index, error = %e, "Skipping malformed upstream item");
                None
            }
        })
        .collect();

    if normalized.len() < total {
        warn!(
            resource,
            total,
            kept = normalized.len(),
            "Normalized list with skipped items"
        );
    }

    Ok(normalized)
}

fn unwrap_envelope(value: Value, resource_keys: &[&str]) -> Option<Vec<Value>> {
    match value {
        Value::Array(items) => Some(items),
        Value::Object(mut map) => {
            let keys = resource_keys.iter().chain(ENVELOPE_KEYS.iter());
            for key in keys {
                match map.remove(*key) {
                    Some(Value::Array(items)) => return Some(items),
                    Some(nested @ Value::Object(_)) => {
                        if let Some(items) = unwrap_envelope(nested, resource_keys) {
                            return Some(items);
                        }
                    }
                    _ => {}
                }
            }
            None
        }
        Value::Null => Some(Vec::new()),
        _ => None,
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Parse a timestamp that may be RFC 3339, a naive datetime, or a bare date
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Some(naive.and_utc());
    }
    parse_date(raw).and_then(|date| date.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc()))
}

/// Parse the date portion of a date or timestamp string
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    raw.get(..10)
        .and_then(|prefix| NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok())
}

// ===================================================================================
// STUDENTS
// ===================================================================================

#[derive(Debug, Deserialize)]
pub struct WireStudent {
    #[serde(alias = "_id", alias = "student_id", deserialize_with = "deserialize_flexible_id")]
    id: String,
    #[serde(default, alias = "full_name", alias = "student_name")]
    name: Option<String>,
    #[serde(default)]
    email: Option<String>,
    #[serde(default, alias = "graduation_status", alias = "student_status")]
    status: Option<String>,
    #[serde(
        default,
        alias = "batch_identifiers",
        deserialize_with = "deserialize_string_or_seq"
    )]
    batches: Vec<String>,
    #[serde(default, deserialize_with = "deserialize_optional_flexible_id")]
    batch_identifier: Option<String>,
    #[serde(
        default,
        alias = "batch",
        deserialize_with = "deserialize_optional_flexible_id"
    )]
    batch_year: Option<String>,
    #[serde(default, alias = "enrolled_courses", alias = "course_enrollments")]
    courses: Option<Vec<WireCourseRef>>,
    #[serde(default, alias = "registered_at", alias = "registration_date")]
    created_at: Option<String>,
}

impl WireStudent {
    pub fn into_model(self) -> Option<Student> {
        let mut batches: BTreeSet<String> = self
            .batches
            .into_iter()
            .map(|batch| batch.trim().to_string())
            .filter(|batch| !batch.is_empty())
            .collect();
        if let Some(batch) = self.batch_identifier {
            batches.insert(batch);
        }

        let course_refs = self
            .courses
            .unwrap_or_default()
            .into_iter()
            .map(WireCourseRef::into_model)
            .filter(|course| !course.is_empty())
            .collect();

        Some(Student {
            id: StudentId::new(self.id),
            name: non_blank(self.name).unwrap_or_default(),
            email: non_blank(self.email).unwrap_or_default(),
            status: non_blank(self.status).unwrap_or_default(),
            batches,
            legacy_batch: self.batch_year,
            course_refs,
            registered_at: self.created_at.as_deref().and_then(parse_timestamp),
        })
    }
}

/// A course reference embedded in a student or offering record
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum WireCourseRef {
    Text(String),
    Number(serde_json::Number),
    Object(WireCourseRefObject),
}

#[derive(Debug, Deserialize)]
pub struct WireCourseRefObject {
    #[serde(
        default,
        alias = "_id",
        deserialize_with = "deserialize_optional_flexible_id"
    )]
    id: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_flexible_id")]
    course_id: Option<String>,
    #[serde(default, alias = "course_code")]
    code: Option<String>,
    #[serde(default, alias = "course_name", alias = "title")]
    name: Option<String>,
}

impl WireCourseRef {
    /// Bare strings are free text; bare numbers are course ids.
    /// In object form `course_id` wins over `id`.
    pub fn into_model(self) -> CourseRef {
        match self {
            WireCourseRef::Text(text) => CourseRef::from_text(text),
            WireCourseRef::Number(number) => CourseRef::by_id(number.to_string()),
            WireCourseRef::Object(object) => CourseRef {
                id: object.course_id.or(object.id).map(CourseId::new),
                code: non_blank(object.code),
                name: non_blank(object.name),
                text: None,
            },
        }
    }
}

// ===================================================================================
// ENROLLMENTS
// ===================================================================================

/// One row of `GET /students/{id}/enrollments`
///
/// The row's own `id` is the enrollment id and is ignored.
#[derive(Debug, Deserialize)]
pub struct WireEnrollment {
    #[serde(default, deserialize_with = "deserialize_optional_flexible_id")]
    course_id: Option<String>,
    #[serde(default)]
    course_code: Option<String>,
    #[serde(default, alias = "course_title")]
    course_name: Option<String>,
    #[serde(default)]
    course: Option<WireCourseRef>,
}

impl WireEnrollment {
    pub fn into_model(self) -> Option<CourseRef> {
        let mut reference = self
            .course
            .map(WireCourseRef::into_model)
            .unwrap_or_default();
        if let Some(id) = self.course_id {
            reference.id = Some(CourseId::new(id));
        }
        if reference.code.is_none() {
            reference.code = non_blank(self.course_code);
        }
        if reference.name.is_none() {
            reference.name = non_blank(self.course_name);
        }
        (!reference.is_empty()).then_some(reference)
    }
}

// ===================================================================================
// CATALOGS
// ===================================================================================

#[derive(Debug, Deserialize)]
pub struct WireCourse {
    #[serde(alias = "_id", deserialize_with = "deserialize_flexible_id")]
    id: String,
    #[serde(default, alias = "course_code")]
    code: Option<String>,
    #[serde(default, alias = "course_name", alias = "title")]
    name: Option<String>,
}

impl WireCourse {
    pub fn into_model(self) -> Option<Course> {
        Some(Course {
            id: CourseId::new(self.id),
            code: non_blank(self.code).unwrap_or_default(),
            name: non_blank(self.name).unwrap_or_default(),
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct WireOffering {
    #[serde(alias = "_id", deserialize_with = "deserialize_flexible_id")]
    id: String,
    #[serde(default, deserialize_with = "deserialize_optional_flexible_id")]
    course_id: Option<String>,
    #[serde(default)]
    course: Option<WireCourseRef>,
    #[serde(
        default,
        alias = "batch",
        alias = "batch_id",
        deserialize_with = "deserialize_optional_flexible_id"
    )]
    batch_identifier: Option<String>,
    #[serde(default)]
    start_date: Option<String>,
    #[serde(default)]
    end_date: Option<String>,
    #[serde(default)]
    schedule: Option<Value>,
}

impl WireOffering {
    pub fn into_model(self) -> Option<CourseOffering> {
        let mut course = self
            .course
            .map(WireCourseRef::into_model)
            .unwrap_or_default();
        if let Some(id) = self.course_id {
            course.id = Some(CourseId::new(id));
        }
        if course.is_empty() {
            return None;
        }
        let batch_identifier = self.batch_identifier?;

        let schedule = match self.schedule {
            Some(Value::String(s)) => non_blank(Some(s)),
            Some(Value::Null) | None => None,
            Some(other) => Some(other.to_string()),
        };

        Some(CourseOffering {
            id: OfferingId::new(self.id),
            course,
            batch_identifier,
            start_date: self.start_date.as_deref().and_then(parse_date),
            end_date: self.end_date.as_deref().and_then(parse_date),
            schedule,
        })
    }
}

/// A competency, or a course-competency assignment row wrapping one
///
/// Identity resolves as nested `competency`, then `competency_id`, then `id`.
#[derive(Debug, Deserialize)]
pub struct WireCompetency {
    #[serde(
        default,
        alias = "_id",
        deserialize_with = "deserialize_optional_flexible_id"
    )]
    id: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_flexible_id")]
    competency_id: Option<String>,
    #[serde(default, alias = "competency_code")]
    code: Option<String>,
    #[serde(default, alias = "competency_name", alias = "title")]
    name: Option<String>,
    #[serde(default, rename = "type", alias = "competency_type", alias = "category")]
    competency_type: Option<String>,
    #[serde(
        default,
        alias = "passing_threshold",
        alias = "pass_mark",
        deserialize_with = "deserialize_optional_score"
    )]
    passing_score: Option<f64>,
    #[serde(default)]
    competency: Option<Box<WireCompetency>>,
}

impl WireCompetency {
    pub fn into_model(self) -> Option<Competency> {
        if let Some(nested) = self.competency {
            let mut model = nested.into_model()?;
            if model.name.is_empty() {
                model.name = non_blank(self.name).unwrap_or_default();
            }
            return Some(model);
        }

        let id = self.competency_id.or(self.id)?;
        Some(Competency {
            id: CompetencyId::new(id),
            code: non_blank(self.code).unwrap_or_default(),
            name: non_blank(self.name).unwrap_or_default(),
            competency_type: non_blank(self.competency_type)
                .unwrap_or_else(|| UNCATEGORIZED.to_string()),
            passing_score: self.passing_score,
        })
    }
}

// ===================================================================================
// PROGRESS
// ===================================================================================

#[derive(Debug, Deserialize)]
pub struct WireProgressCompetency {
    #[serde(
        default,
        alias = "_id",
        deserialize_with = "deserialize_optional_flexible_id"
    )]
    id: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default, rename = "type", alias = "competency_type", alias = "category")]
    competency_type: Option<String>,
}

/// One entry under `competency_progress`
#[derive(Debug, Deserialize)]
pub struct WireProgress {
    #[serde(default, deserialize_with = "deserialize_optional_flexible_id")]
    competency_id: Option<String>,
    #[serde(default)]
    competency: Option<WireProgressCompetency>,
    #[serde(default, alias = "name")]
    competency_name: Option<String>,
    #[serde(default, alias = "type")]
    competency_type: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_score")]
    score: Option<f64>,
    #[serde(default, alias = "status")]
    exam_status: Option<String>,
    #[serde(default, alias = "is_passed", deserialize_with = "deserialize_optional_flag")]
    passed: Option<bool>,
}

impl WireProgress {
    pub fn into_model(self) -> Option<CompetencyProgress> {
        let (nested_id, nested_name, nested_type) = match self.competency {
            Some(nested) => (nested.id, nested.name, nested.competency_type),
            None => (None, None, None),
        };
        let competency_id = self.competency_id.or(nested_id)?;

        Some(CompetencyProgress {
            competency_id: CompetencyId::new(competency_id),
            competency_name: non_blank(self.competency_name).or_else(|| non_blank(nested_name)),
            competency_type: non_blank(self.competency_type).or_else(|| non_blank(nested_type)),
            score: self.score,
            exam_status: non_blank(self.exam_status),
            passed: self.passed,
        })
    }
}

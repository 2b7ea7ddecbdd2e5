//! # Course Reference Resolution
//!
//! Maps a loosely specified [`CourseRef`] onto at most one catalog [`Course`].
//!
//! Tiers are tried in order and the first tier with any candidate decides:
//!
//! 1. exact identifier
//! 2. exact code (case-insensitive)
//! 3. exact name (case-insensitive)
//! 4. a free-text term equal to some course's code or name
//! 5. a free-text term containing some course's code
//! 6. a free-text term containing some course's name
//!
//! Every case-insensitive comparison folds with Unicode lowercase. Ties inside
//! a tier go to the lexically smallest `(code, id)`.

use crate::models::{Course, CourseRef};

/// Precedence tier a reference resolved through, strongest first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MatchTier {
    Id,
    Code,
    Name,
    TextExact,
    TextContainsCode,
    TextContainsName,
}

/// Resolve a reference to a single course
pub fn resolve_course<'a>(reference: &CourseRef, courses: &'a [Course]) -> Option<&'a Course> {
    resolve_course_with_tier(reference, courses).map(|(course, _)| course)
}

/// Resolve a reference and report which tier matched
pub fn resolve_course_with_tier<'a>(
    reference: &CourseRef,
    courses: &'a [Course],
) -> Option<(&'a Course, MatchTier)> {
    if reference.is_empty() {
        return None;
    }

    if let Some(id) = &reference.id {
        if let Some(course) = best(courses.iter().filter(|course| &course.id == id)) {
            return Some((course, MatchTier::Id));
        }
    }

    if let Some(code) = non_blank(&reference.code) {
        if let Some(course) = best(courses.iter().filter(|course| eq_ci(&course.code, code))) {
            return Some((course, MatchTier::Code));
        }
    }

    if let Some(name) = non_blank(&reference.name) {
        if let Some(course) = best(courses.iter().filter(|course| eq_ci(&course.name, name))) {
            return Some((course, MatchTier::Name));
        }
    }

    let terms: Vec<String> = reference.search_terms().map(fold).collect();
    if terms.is_empty() {
        return None;
    }

    let tiers: [(MatchTier, fn(&str, &Course) -> bool); 3] = [
        (MatchTier::TextExact, |term, course| {
            eq_ci(&course.code, term) || eq_ci(&course.name, term)
        }),
        (MatchTier::TextContainsCode, |term, course| {
            contains_lower(term, &course.code)
        }),
        (MatchTier::TextContainsName, |term, course| {
            contains_lower(term, &course.name)
        }),
    ];

    tiers.iter().find_map(|(tier, matches)| {
        best(
            courses
                .iter()
                .filter(|course| terms.iter().any(|term| matches(term, course))),
        )
        .map(|course| (course, *tier))
    })
}

fn best<'a>(candidates: impl Iterator<Item = &'a Course>) -> Option<&'a Course> {
    candidates.min_by(|a, b| (&a.code, &a.id).cmp(&(&b.code, &b.id)))
}

fn non_blank(field: &Option<String>) -> Option<&str> {
    field.as_deref().map(str::trim).filter(|value| !value.is_empty())
}

fn fold(value: &str) -> String {
    value.trim().to_lowercase()
}

fn eq_ci(left: &str, right: &str) -> bool {
    let left = fold(left);
    !left.is_empty() && left == fold(right)
}

/// `folded_term` must already be folded
fn contains_lower(folded_term: &str, needle: &str) -> bool {
    let needle = fold(needle);
    !needle.is_empty() && folded_term.contains(&needle)
}

//! The in-memory course catalog.
//!
//! A [`Catalog`] is built once at startup and shared read-only by every
//! stage of the query router. Construction enforces the course invariants:
//! ids are unique 4-digit strings in `1000..=4999` and titles are non-empty.
//! Records that break them are skipped with a warning rather than aborting
//! the load.

use std::collections::{BTreeMap, HashSet};
use std::sync::LazyLock;

use regex::Regex;
use tracing::warn;

use crate::models::{Chunk, Course};

/// Lowest valid course id.
pub const MIN_COURSE_ID: u32 = 1000;
/// Highest valid course id.
pub const MAX_COURSE_ID: u32 = 4999;

static COURSE_ID_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b([1-4][0-9]{3})\b").expect("course id pattern is valid"));

/// Returns true if `id` is a 4-digit course id within the valid range.
pub fn is_valid_course_id(id: &str) -> bool {
    id.len() == 4
        && id.bytes().all(|b| b.is_ascii_digit())
        && id
            .parse::<u32>()
            .map(|n| (MIN_COURSE_ID..=MAX_COURSE_ID).contains(&n))
            .unwrap_or(false)
}

/// Find the leftmost course-id-shaped token in free text.
///
/// A token must be exactly four ASCII digits in the valid range and stand
/// on word boundaries, so `"CSE4361"` and `"43610"` contain no id while
/// `"course 4361?"` does.
pub fn find_course_id(query: &str) -> Option<&str> {
    COURSE_ID_TOKEN
        .captures(query)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Ordered, immutable collection of courses.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    courses: Vec<Course>,
}

impl Catalog {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a catalog, keeping input order and dropping invalid or
    /// duplicate records (the first record with a given id wins).
    pub fn from_courses(courses: Vec<Course>) -> Self {
        let mut seen = HashSet::new();
        let mut kept = Vec::with_capacity(courses.len());

        for course in courses {
            if !is_valid_course_id(&course.id) {
                warn!(id = %course.id, "skipping course with invalid id");
                continue;
            }
            if course.title.trim().is_empty() {
                warn!(id = %course.id, "skipping course with empty title");
                continue;
            }
            if !seen.insert(course.id.clone()) {
                warn!(id = %course.id, "skipping duplicate course id");
                continue;
            }
            kept.push(course);
        }

        Self { courses: kept }
    }

    pub fn courses(&self) -> &[Course] {
        &self.courses
    }

    pub fn len(&self) -> usize {
        self.courses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.courses.is_empty()
    }

    /// Exact id lookup.
    pub fn find_by_id(&self, id: &str) -> Option<&Course> {
        self.courses.iter().find(|c| c.id == id)
    }

    /// First course, in catalog order, whose full title appears in `query`
    /// (case-insensitive). Not the longest match: with titles
    /// `"Data Structures"` and `"Advanced Data Structures"` both present,
    /// whichever comes first in the catalog wins.
    pub fn find_by_title_in(&self, query: &str) -> Option<&Course> {
        let query_lower = query.to_lowercase();
        self.courses
            .iter()
            .find(|c| query_lower.contains(&c.title.to_lowercase()))
    }

    /// One chunk per course, ready to be indexed by a content store.
    pub fn index_chunks(&self) -> Vec<Chunk> {
        self.courses
            .iter()
            .map(|course| {
                let mut properties = BTreeMap::new();
                properties.insert("title".to_string(), course.title.clone());
                properties.insert("id".to_string(), course.id.clone());
                Chunk {
                    document_id: course.id.clone(),
                    chunk_id: "0".to_string(),
                    total_chunks: 1,
                    text: format!("{}: {}", course.title, course.description),
                    properties,
                }
            })
            .collect()
    }
}

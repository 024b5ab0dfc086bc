//! Core data models: catalog records and retrieved context chunks.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A single course record from the catalog.
///
/// Identity is the `id`, a 4-digit string in `1000..=4999`. Records are
/// created once at load time and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    pub id: String,
    pub title: String,
    pub description: String,
}

impl Course {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: description.into(),
        }
    }
}

/// A unit of indexed text returned by a content store search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    /// Identifier of the source document (the course id for catalog chunks).
    pub document_id: String,
    /// Identifier of this chunk within its document.
    pub chunk_id: String,
    /// Number of chunks the source document was split into.
    pub total_chunks: usize,
    pub text: String,
    /// Arbitrary key/value metadata (`title`, `id` for catalog chunks).
    pub properties: BTreeMap<String, String>,
}

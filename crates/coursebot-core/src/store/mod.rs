//! Content store abstraction.
//!
//! The [`ContentStore`] trait is the only way retrieval strategies reach
//! indexed text. It mirrors the external store contract: index a batch of
//! chunks, then answer top-`k` similarity queries with chunks ordered from
//! most to least relevant.
//!
//! Implementations must be `Send + Sync` to work with async runtimes.

pub mod memory;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::Chunk;

#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Index chunks for later similarity search.
    async fn store(&self, chunks: &[Chunk]) -> Result<()>;

    /// Return at most `k` chunks, most similar to `query` first.
    async fn find_relevant_chunks(&self, query: &str, k: usize) -> Result<Vec<Chunk>>;
}

//! In-memory [`ContentStore`] backed by an [`Embedder`].
//!
//! Chunks are embedded in batches when stored and kept in a `Vec` behind a
//! `std::sync::RwLock`. Search is brute-force cosine similarity over every
//! stored vector; ties keep insertion order.

use std::sync::{Arc, RwLock};

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use tracing::debug;

use crate::embedding::{cosine_similarity, Embedder};
use crate::models::Chunk;

use super::ContentStore;

const DEFAULT_BATCH_SIZE: usize = 64;

struct StoredChunk {
    chunk: Chunk,
    vector: Vec<f32>,
}

pub struct InMemoryContentStore {
    embedder: Arc<dyn Embedder>,
    batch_size: usize,
    chunks: RwLock<Vec<StoredChunk>>,
}

impl InMemoryContentStore {
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        Self {
            embedder,
            batch_size: DEFAULT_BATCH_SIZE,
            chunks: RwLock::new(Vec::new()),
        }
    }

    /// Number of texts sent to the embedder per call while indexing.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn len(&self) -> usize {
        self.chunks.read().map(|c| c.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ContentStore for InMemoryContentStore {
    async fn store(&self, chunks: &[Chunk]) -> Result<()> {
        let mut embedded = Vec::with_capacity(chunks.len());

        for batch in chunks.chunks(self.batch_size) {
            let texts: Vec<String> = batch.iter().map(|c| c.text.clone()).collect();
            let vectors = self.embedder.embed(&texts).await?;
            if vectors.len() != batch.len() {
                bail!(
                    "embedder '{}' returned {} vectors for {} texts",
                    self.embedder.model_name(),
                    vectors.len(),
                    batch.len()
                );
            }
            for (chunk, vector) in batch.iter().zip(vectors) {
                embedded.push(StoredChunk {
                    chunk: chunk.clone(),
                    vector,
                });
            }
        }

        let mut stored = self
            .chunks
            .write()
            .map_err(|_| anyhow!("content store lock poisoned"))?;
        stored.extend(embedded);
        debug!(total = stored.len(), "indexed chunks");
        Ok(())
    }

    async fn find_relevant_chunks(&self, query: &str, k: usize) -> Result<Vec<Chunk>> {
        if k == 0 || self.is_empty() {
            return Ok(Vec::new());
        }

        let query_vec = self
            .embedder
            .embed(&[query.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("empty embedding response for query"))?;

        let stored = self
            .chunks
            .read()
            .map_err(|_| anyhow!("content store lock poisoned"))?;

        let mut scored: Vec<(f32, &Chunk)> = stored
            .iter()
            .map(|sc| {
                let score = cosine_similarity(&query_vec, &sc.vector);
                // NaN (from non-finite vectors) ranks below every real score.
                let score = if score.is_nan() { f32::NEG_INFINITY } else { score };
                (score, &sc.chunk)
            })
            .collect();
        scored.sort_by(|a, b| b.0.total_cmp(&a.0));
        scored.truncate(k);

        Ok(scored.into_iter().map(|(_, c)| c.clone()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Embeds text as keyword presence over a tiny fixed vocabulary.
    struct KeywordEmbedder {
        calls: AtomicUsize,
    }

    const VOCAB: [&str; 4] = ["tree", "graph", "pattern", "network"];

    #[async_trait]
    impl Embedder for KeywordEmbedder {
        fn model_name(&self) -> &str {
            "keyword"
        }

        async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(texts
                .iter()
                .map(|t| {
                    let lower = t.to_lowercase();
                    VOCAB
                        .iter()
                        .map(|w| if lower.contains(w) { 1.0 } else { 0.0 })
                        .collect()
                })
                .collect())
        }
    }

    struct ShortEmbedder;

    #[async_trait]
    impl Embedder for ShortEmbedder {
        fn model_name(&self) -> &str {
            "short"
        }

        async fn embed(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Ok(vec![vec![1.0]])
        }
    }

    fn chunk(id: &str, text: &str) -> Chunk {
        Chunk {
            document_id: id.to_string(),
            chunk_id: "0".to_string(),
            total_chunks: 1,
            text: text.to_string(),
            properties: BTreeMap::new(),
        }
    }

    fn keyword_store() -> (Arc<KeywordEmbedder>, InMemoryContentStore) {
        let embedder = Arc::new(KeywordEmbedder {
            calls: AtomicUsize::new(0),
        });
        let store = InMemoryContentStore::new(embedder.clone()).with_batch_size(2);
        (embedder, store)
    }

    #[tokio::test]
    async fn test_store_batches_embedding_calls() {
        let (embedder, store) = keyword_store();
        store
            .store(&[
                chunk("1", "tree"),
                chunk("2", "graph"),
                chunk("3", "pattern"),
            ])
            .await
            .unwrap();
        assert_eq!(store.len(), 3);
        assert_eq!(embedder.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_find_orders_by_similarity() {
        let (_, store) = keyword_store();
        store
            .store(&[
                chunk("1310", "Networks: network protocols"),
                chunk("2320", "Data Structures: tree and graph"),
                chunk("4361", "Design: pattern catalog"),
            ])
            .await
            .unwrap();

        let results = store.find_relevant_chunks("which pattern", 2).await.unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].document_id, "4361");
    }

    #[tokio::test]
    async fn test_find_truncates_to_k() {
        let (_, store) = keyword_store();
        store
            .store(&[chunk("1", "tree"), chunk("2", "tree graph"), chunk("3", "graph")])
            .await
            .unwrap();
        let results = store.find_relevant_chunks("tree", 1).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].document_id, "1");
    }

    #[tokio::test]
    async fn test_empty_store_skips_embedder() {
        let (embedder, store) = keyword_store();
        let results = store.find_relevant_chunks("tree", 3).await.unwrap();
        assert!(results.is_empty());
        assert_eq!(embedder.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_zero_k_returns_nothing() {
        let (_, store) = keyword_store();
        store.store(&[chunk("1", "tree")]).await.unwrap();
        assert!(store.find_relevant_chunks("tree", 0).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_vector_count_mismatch_is_error() {
        let store = InMemoryContentStore::new(Arc::new(ShortEmbedder));
        let err = store
            .store(&[chunk("1", "a"), chunk("2", "b")])
            .await
            .unwrap_err();
        assert!(err.to_string().contains("returned 1 vectors for 2 texts"));
        assert!(store.is_empty());
    }

    /// Embeds any text containing "inf" as an infinite vector.
    struct NonFiniteEmbedder;

    #[async_trait]
    impl Embedder for NonFiniteEmbedder {
        fn model_name(&self) -> &str {
            "non-finite"
        }

        async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Ok(texts
                .iter()
                .map(|t| {
                    if t.contains("inf") {
                        vec![f32::INFINITY, 0.0]
                    } else {
                        vec![1.0, 0.0]
                    }
                })
                .collect())
        }
    }

    #[tokio::test]
    async fn test_nan_scores_rank_last() {
        let store = InMemoryContentStore::new(Arc::new(NonFiniteEmbedder));
        store
            .store(&[
                chunk("1", "inf one"),
                chunk("2", "plain two"),
                chunk("3", "inf three"),
                chunk("4", "plain four"),
            ])
            .await
            .unwrap();

        let ids: Vec<String> = store
            .find_relevant_chunks("query", 4)
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.document_id)
            .collect();
        assert_eq!(ids, vec!["2", "4", "1", "3"]);
    }
}

//! Retrieval strategies.
//!
//! A [`RetrievalStrategy`] decides how many chunks to request from the
//! content store for a question. Every variant issues one top-`k`
//! similarity lookup; they differ in `k` and in how the results are meant
//! to be read downstream:
//!
//! | Strategy | Name | Lookup size |
//! |----------|------|-------------|
//! | Top-N | `top_n` | `n` (default 3) |
//! | Window | `window` | 3 |
//! | Document | `document` | 5 |
//! | Hierarchical | `hierarchical` | 3 |
//!
//! Window, Document and Hierarchical do not yet expand matches to
//! neighbouring chunks, whole documents or parent chunks. With one chunk
//! per course there is nothing to expand into.

use std::fmt;
use std::str::FromStr;

use anyhow::Result;
use tracing::debug;

use crate::error::AssistantError;
use crate::models::Chunk;
use crate::store::ContentStore;

pub const DEFAULT_TOP_N: usize = 3;
pub const DEFAULT_WINDOW_SIZE: usize = 1;

const WINDOW_LOOKUP_K: usize = 3;
const DOCUMENT_LOOKUP_K: usize = 5;
const HIERARCHICAL_LOOKUP_K: usize = 3;

/// Strategy names accepted by [`StrategyKind::from_str`].
pub const STRATEGY_NAMES: [&str; 4] = ["top_n", "window", "document", "hierarchical"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StrategyKind {
    TopN,
    Window,
    Document,
    Hierarchical,
}

impl StrategyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyKind::TopN => "top_n",
            StrategyKind::Window => "window",
            StrategyKind::Document => "document",
            StrategyKind::Hierarchical => "hierarchical",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Case-sensitive: `"Window"` is rejected.
impl FromStr for StrategyKind {
    type Err = AssistantError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "top_n" => Ok(StrategyKind::TopN),
            "window" => Ok(StrategyKind::Window),
            "document" => Ok(StrategyKind::Document),
            "hierarchical" => Ok(StrategyKind::Hierarchical),
            other => Err(AssistantError::UnknownStrategy(other.to_string())),
        }
    }
}

/// Tunable parameters used when instantiating a strategy by kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StrategyParams {
    pub top_n: usize,
    pub window_size: usize,
}

impl Default for StrategyParams {
    fn default() -> Self {
        Self {
            top_n: DEFAULT_TOP_N,
            window_size: DEFAULT_WINDOW_SIZE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetrievalStrategy {
    /// The `n` most similar chunks.
    TopN { n: usize },
    /// A matched chunk plus `window_size` neighbours on each side.
    Window { window_size: usize },
    /// A matched chunk expanded to its whole source document.
    Document,
    /// A precise child-chunk match with its parent chunk as context.
    Hierarchical,
}

impl Default for RetrievalStrategy {
    fn default() -> Self {
        RetrievalStrategy::TopN { n: DEFAULT_TOP_N }
    }
}

impl RetrievalStrategy {
    pub fn from_kind(kind: StrategyKind, params: &StrategyParams) -> Self {
        match kind {
            StrategyKind::TopN => RetrievalStrategy::TopN { n: params.top_n },
            StrategyKind::Window => RetrievalStrategy::Window {
                window_size: params.window_size,
            },
            StrategyKind::Document => RetrievalStrategy::Document,
            StrategyKind::Hierarchical => RetrievalStrategy::Hierarchical,
        }
    }

    pub fn kind(&self) -> StrategyKind {
        match self {
            RetrievalStrategy::TopN { .. } => StrategyKind::TopN,
            RetrievalStrategy::Window { .. } => StrategyKind::Window,
            RetrievalStrategy::Document => StrategyKind::Document,
            RetrievalStrategy::Hierarchical => StrategyKind::Hierarchical,
        }
    }

    /// Number of chunks requested from the store.
    pub fn lookup_size(&self) -> usize {
        match self {
            RetrievalStrategy::TopN { n } => *n,
            RetrievalStrategy::Window { .. } => WINDOW_LOOKUP_K,
            RetrievalStrategy::Document => DOCUMENT_LOOKUP_K,
            RetrievalStrategy::Hierarchical => HIERARCHICAL_LOOKUP_K,
        }
    }

    /// Retrieve context chunks for `query`.
    ///
    /// With no store available the result is empty rather than an error.
    pub async fn retrieve(
        &self,
        query: &str,
        store: Option<&dyn ContentStore>,
    ) -> Result<Vec<Chunk>> {
        let Some(store) = store else {
            debug!(strategy = %self.kind(), "no content store; empty context");
            return Ok(Vec::new());
        };
        let k = self.lookup_size();
        let chunks = store.find_relevant_chunks(query, k).await?;
        debug!(strategy = %self.kind(), k, found = chunks.len(), "retrieved context");
        Ok(chunks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::BTreeMap;
    use std::sync::Mutex;

    /// Records requested `k` values and returns that many numbered chunks.
    #[derive(Default)]
    struct CountingStore {
        requests: Mutex<Vec<usize>>,
    }

    #[async_trait]
    impl ContentStore for CountingStore {
        async fn store(&self, _chunks: &[Chunk]) -> Result<()> {
            Ok(())
        }

        async fn find_relevant_chunks(&self, _query: &str, k: usize) -> Result<Vec<Chunk>> {
            self.requests.lock().unwrap().push(k);
            Ok((0..k)
                .map(|i| Chunk {
                    document_id: i.to_string(),
                    chunk_id: "0".to_string(),
                    total_chunks: 1,
                    text: format!("chunk {i}"),
                    properties: BTreeMap::new(),
                })
                .collect())
        }
    }

    #[test]
    fn test_parse_names() {
        for name in STRATEGY_NAMES {
            let kind: StrategyKind = name.parse().unwrap();
            assert_eq!(kind.as_str(), name);
        }
    }

    #[test]
    fn test_parse_is_case_sensitive() {
        assert!(matches!(
            "Window".parse::<StrategyKind>(),
            Err(AssistantError::UnknownStrategy(name)) if name == "Window"
        ));
        assert!("topn".parse::<StrategyKind>().is_err());
    }

    #[test]
    fn test_lookup_sizes() {
        let params = StrategyParams {
            top_n: 7,
            window_size: 2,
        };
        let size = |k| RetrievalStrategy::from_kind(k, &params).lookup_size();
        assert_eq!(size(StrategyKind::TopN), 7);
        assert_eq!(size(StrategyKind::Window), 3);
        assert_eq!(size(StrategyKind::Document), 5);
        assert_eq!(size(StrategyKind::Hierarchical), 3);
    }

    #[test]
    fn test_from_kind_keeps_params() {
        let params = StrategyParams {
            top_n: 3,
            window_size: 4,
        };
        assert_eq!(
            RetrievalStrategy::from_kind(StrategyKind::Window, &params),
            RetrievalStrategy::Window { window_size: 4 }
        );
        assert_eq!(RetrievalStrategy::default().kind(), StrategyKind::TopN);
    }

    #[tokio::test]
    async fn test_retrieve_requests_lookup_size() {
        let store = CountingStore::default();
        let chunks = RetrievalStrategy::Document
            .retrieve("anything", Some(&store))
            .await
            .unwrap();
        assert_eq!(chunks.len(), 5);
        assert_eq!(*store.requests.lock().unwrap(), vec![5]);
    }

    #[tokio::test]
    async fn test_retrieve_without_store_is_empty() {
        let chunks = RetrievalStrategy::default()
            .retrieve("anything", None)
            .await
            .unwrap();
        assert!(chunks.is_empty());
    }
}

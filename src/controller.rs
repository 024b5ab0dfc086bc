//! Application wiring: catalog, content store, backends and router.
//!
//! A [`Controller`] is built once at startup and then serves questions and
//! hot-swap commands. The active strategy and backend live in one
//! [`ActivePolicy`] shared with the router's semantic stage, so
//! [`Controller::set_strategy`] and [`Controller::set_backend`] update the
//! controller and the router in a single write.

use std::sync::Arc;

use anyhow::Result;
use tracing::{info, warn};

use coursebot_core::backend::{BackendKind, BackendRegistry};
use coursebot_core::catalog::Catalog;
use coursebot_core::embedding::Embedder;
use coursebot_core::error::AssistantError;
use coursebot_core::policy::ActivePolicy;
use coursebot_core::router::{QueryRouter, Resolution};
use coursebot_core::store::memory::InMemoryContentStore;
use coursebot_core::store::ContentStore;
use coursebot_core::strategy::{RetrievalStrategy, StrategyKind, StrategyParams};

use crate::catalog::load_catalog;
use crate::config::Config;
use crate::embedding::create_embedder;
use crate::generation::build_backends;

pub struct Controller {
    catalog: Arc<Catalog>,
    params: StrategyParams,
    backends: BackendRegistry,
    policy: Arc<ActivePolicy>,
    router: QueryRouter,
}

impl Controller {
    /// Build a controller from config: load and index the catalog, create
    /// the backends and select the configured strategy and backend.
    pub async fn from_config(config: &Config) -> Result<Self> {
        let catalog = Arc::new(load_catalog(&config.catalog.path));

        let store = match create_embedder(&config.embedding)? {
            Some(embedder) => index_catalog(&catalog, embedder, config.embedding.batch_size).await,
            None => {
                info!("embedding disabled; semantic answers will have no context");
                None
            }
        };

        let backends = build_backends(&config.generation)?;

        Ok(Self::new(
            catalog,
            store,
            config.retrieval.params(),
            backends,
            config.strategy_kind()?,
            config.backend_kind()?,
        )?)
    }

    pub fn new(
        catalog: Arc<Catalog>,
        store: Option<Arc<dyn ContentStore>>,
        params: StrategyParams,
        backends: BackendRegistry,
        strategy: StrategyKind,
        backend: BackendKind,
    ) -> Result<Self, AssistantError> {
        let backend = backends
            .get(backend)
            .ok_or(AssistantError::BackendUnavailable(backend))?;
        let policy = Arc::new(ActivePolicy::new(
            RetrievalStrategy::from_kind(strategy, &params),
            backend,
        ));
        let router = QueryRouter::new(Arc::clone(&catalog), store, Arc::clone(&policy));

        Ok(Self {
            catalog,
            params,
            backends,
            policy,
            router,
        })
    }

    /// Answer a question.
    pub async fn ask(&self, question: &str) -> Result<String, AssistantError> {
        self.router.handle(question).await
    }

    /// Answer a question and report which stage produced the answer.
    pub async fn resolve(&self, question: &str) -> Result<Resolution, AssistantError> {
        self.router.resolve(question).await
    }

    /// Switch the retrieval strategy by name.
    ///
    /// An unknown name is an error and leaves the active strategy as it was.
    pub fn set_strategy(&self, name: &str) -> Result<StrategyKind, AssistantError> {
        let kind: StrategyKind = name.parse()?;
        self.policy
            .set_strategy(RetrievalStrategy::from_kind(kind, &self.params));
        Ok(kind)
    }

    /// Switch the answer backend by name.
    ///
    /// An unknown name is an error and leaves the active backend as it was.
    pub fn set_backend(&self, name: &str) -> Result<BackendKind, AssistantError> {
        let backend = self.backends.resolve(name)?;
        let kind = backend.kind();
        self.policy.set_backend(backend);
        Ok(kind)
    }

    pub fn active_strategy(&self) -> Option<StrategyKind> {
        self.policy.strategy().map(|s| s.kind())
    }

    pub fn active_backend(&self) -> Option<BackendKind> {
        self.policy.backend_kind()
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn router(&self) -> &QueryRouter {
        &self.router
    }
}

/// Embed every catalog course into a fresh in-memory store.
///
/// Returns `None` (with a warning) if the embedding service fails, so the
/// assistant still answers id and title questions.
pub async fn index_catalog(
    catalog: &Catalog,
    embedder: Arc<dyn Embedder>,
    batch_size: usize,
) -> Option<Arc<dyn ContentStore>> {
    let model = embedder.model_name().to_string();
    let store = InMemoryContentStore::new(embedder).with_batch_size(batch_size);

    match store.store(&catalog.index_chunks()).await {
        Ok(()) => {
            info!(model = %model, chunks = store.len(), "catalog indexed");
            Some(Arc::new(store))
        }
        Err(e) => {
            warn!(
                model = %model,
                error = %format!("{e:#}"),
                "failed to index catalog; semantic answers will have no context"
            );
            None
        }
    }
}

//! The active retrieval strategy and answer backend.
//!
//! [`ActivePolicy`] is the one place the active pair lives. The controller
//! and the router's semantic stage share the same `Arc<ActivePolicy>`, so a
//! swap is a single write under the lock and there is no second copy that
//! could go stale.
//!
//! Readers take a [`PolicySnapshot`] once at call entry. A question already
//! in flight keeps the strategy and backend it started with, even if a swap
//! lands before it finishes.

use std::sync::{Arc, PoisonError, RwLock};

use tracing::info;

use crate::backend::{AnswerBackend, BackendKind};
use crate::strategy::RetrievalStrategy;

/// The strategy/backend pair seen by one semantic-stage call.
#[derive(Clone, Default)]
pub struct PolicySnapshot {
    pub strategy: Option<RetrievalStrategy>,
    pub backend: Option<Arc<dyn AnswerBackend>>,
}

impl PolicySnapshot {
    pub fn backend_kind(&self) -> Option<BackendKind> {
        self.backend.as_ref().map(|b| b.kind())
    }
}

#[derive(Default)]
pub struct ActivePolicy {
    current: RwLock<PolicySnapshot>,
}

impl ActivePolicy {
    /// A policy with neither strategy nor backend set.
    pub fn unset() -> Self {
        Self::default()
    }

    pub fn new(strategy: RetrievalStrategy, backend: Arc<dyn AnswerBackend>) -> Self {
        Self {
            current: RwLock::new(PolicySnapshot {
                strategy: Some(strategy),
                backend: Some(backend),
            }),
        }
    }

    pub fn snapshot(&self) -> PolicySnapshot {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn strategy(&self) -> Option<RetrievalStrategy> {
        self.snapshot().strategy
    }

    pub fn backend_kind(&self) -> Option<BackendKind> {
        self.snapshot().backend_kind()
    }

    pub fn set_strategy(&self, strategy: RetrievalStrategy) {
        let kind = strategy.kind();
        self.current
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .strategy = Some(strategy);
        info!(strategy = %kind, "active strategy changed");
    }

    pub fn set_backend(&self, backend: Arc<dyn AnswerBackend>) {
        let kind = backend.kind();
        self.current
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .backend = Some(backend);
        info!(backend = %kind, "active backend changed");
    }
}

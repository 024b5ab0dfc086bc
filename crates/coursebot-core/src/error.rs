//! Errors surfaced to callers of the query router and controller.

use std::fmt;

use thiserror::Error;

use crate::backend::BackendKind;

/// External collaborators the semantic stage depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExternalService {
    /// Embedding + similarity search.
    ContentStore,
    /// Answer generation.
    Generation,
}

impl fmt::Display for ExternalService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExternalService::ContentStore => f.write_str("content store"),
            ExternalService::Generation => f.write_str("generation service"),
        }
    }
}

#[derive(Debug, Error)]
pub enum AssistantError {
    #[error("unknown strategy: {0} (expected one of: top_n, window, document, hierarchical)")]
    UnknownStrategy(String),

    #[error("unknown backend: {0} (expected one of: ollama, openai, gemini)")]
    UnknownBackend(String),

    #[error("backend '{0}' is not configured")]
    BackendUnavailable(BackendKind),

    #[error("{service} unavailable: {source:#}")]
    ServiceUnavailable {
        service: ExternalService,
        #[source]
        source: anyhow::Error,
    },
}

impl AssistantError {
    pub fn service(service: ExternalService, source: anyhow::Error) -> Self {
        AssistantError::ServiceUnavailable { service, source }
    }
}

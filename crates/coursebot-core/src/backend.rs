//! Answer generation backends.
//!
//! An [`AnswerBackend`] turns a question plus retrieved context into an
//! answer string tagged with the backend's name (`[Ollama] …`). Backends
//! reach the actual language model through a [`Generator`], implemented by
//! the application crate for each HTTP API.
//!
//! | Kind | Name | Backend |
//! |------|------|---------|
//! | Ollama | `ollama` | [`LocalModelBackend`] |
//! | OpenAI | `openai` | [`RemoteApiBackend`] |
//! | Gemini | `gemini` | [`RemoteApiBackend`] |

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;

use crate::error::AssistantError;
use crate::models::Chunk;

/// Characters of context shown in a placeholder answer.
pub const CONTEXT_PREVIEW_CHARS: usize = 100;

/// Backend names accepted by [`BackendKind::from_str`].
pub const BACKEND_NAMES: [&str; 3] = ["ollama", "openai", "gemini"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendKind {
    Ollama,
    OpenAi,
    Gemini,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Ollama => "ollama",
            BackendKind::OpenAi => "openai",
            BackendKind::Gemini => "gemini",
        }
    }

    /// Tag prefixed to every answer produced by this backend.
    pub fn tag(&self) -> &'static str {
        match self {
            BackendKind::Ollama => "[Ollama]",
            BackendKind::OpenAi => "[OpenAI]",
            BackendKind::Gemini => "[Gemini]",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackendKind {
    type Err = AssistantError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ollama" => Ok(BackendKind::Ollama),
            "openai" => Ok(BackendKind::OpenAi),
            "gemini" => Ok(BackendKind::Gemini),
            other => Err(AssistantError::UnknownBackend(other.to_string())),
        }
    }
}

/// A language-model call: question and context text in, prose out.
#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(&self, question: &str, context: &str) -> Result<String>;
}

/// Turns a question plus context chunks into an answer.
///
/// Implementations must not mutate the context and must accept an empty
/// context slice.
#[async_trait]
pub trait AnswerBackend: Send + Sync {
    fn kind(&self) -> BackendKind;

    async fn generate(&self, question: &str, context: &[Chunk]) -> Result<String>;
}

/// Chunk texts joined with newlines.
pub fn context_text(context: &[Chunk]) -> String {
    context
        .iter()
        .map(|c| c.text.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}

/// First [`CONTEXT_PREVIEW_CHARS`] characters of the context, or
/// `"No context"` when nothing was retrieved.
pub fn context_preview(context: &[Chunk]) -> String {
    if context.is_empty() {
        return "No context".to_string();
    }
    context_text(context)
        .chars()
        .take(CONTEXT_PREVIEW_CHARS)
        .collect()
}

/// Backend for a locally hosted model (Ollama).
pub struct LocalModelBackend {
    generator: Arc<dyn Generator>,
}

impl LocalModelBackend {
    pub fn new(generator: Arc<dyn Generator>) -> Self {
        Self { generator }
    }
}

#[async_trait]
impl AnswerBackend for LocalModelBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Ollama
    }

    async fn generate(&self, question: &str, context: &[Chunk]) -> Result<String> {
        let answer = self
            .generator
            .generate(question, &context_text(context))
            .await?;
        Ok(format!("{} {}", BackendKind::Ollama.tag(), answer))
    }
}

/// Backend for a hosted API (OpenAI, Gemini).
///
/// Without a client (no API key configured) it answers with a
/// deterministic placeholder that embeds a preview of the context.
pub struct RemoteApiBackend {
    kind: BackendKind,
    client: Option<Arc<dyn Generator>>,
}

impl RemoteApiBackend {
    pub fn new(kind: BackendKind, client: Arc<dyn Generator>) -> Self {
        Self {
            kind,
            client: Some(client),
        }
    }

    pub fn placeholder(kind: BackendKind) -> Self {
        Self { kind, client: None }
    }

    pub fn is_placeholder(&self) -> bool {
        self.client.is_none()
    }
}

#[async_trait]
impl AnswerBackend for RemoteApiBackend {
    fn kind(&self) -> BackendKind {
        self.kind
    }

    async fn generate(&self, question: &str, context: &[Chunk]) -> Result<String> {
        match &self.client {
            Some(client) => {
                let answer = client.generate(question, &context_text(context)).await?;
                Ok(format!("{} {}", self.kind.tag(), answer))
            }
            None => Ok(format!(
                "{} Answer for '{}' based on: {}...",
                self.kind.tag(),
                question,
                context_preview(context)
            )),
        }
    }
}

/// The backends available for hot-swapping, one per kind.
#[derive(Default, Clone)]
pub struct BackendRegistry {
    backends: HashMap<BackendKind, Arc<dyn AnswerBackend>>,
}

impl BackendRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a backend under its own kind, replacing any previous one.
    pub fn register(&mut self, backend: Arc<dyn AnswerBackend>) {
        self.backends.insert(backend.kind(), backend);
    }

    pub fn get(&self, kind: BackendKind) -> Option<Arc<dyn AnswerBackend>> {
        self.backends.get(&kind).cloned()
    }

    /// Look up a backend by its case-sensitive name.
    pub fn resolve(&self, name: &str) -> Result<Arc<dyn AnswerBackend>, AssistantError> {
        let kind: BackendKind = name.parse()?;
        self.get(kind)
            .ok_or(AssistantError::BackendUnavailable(kind))
    }

    pub fn kinds(&self) -> Vec<BackendKind> {
        let mut kinds: Vec<BackendKind> = self.backends.keys().copied().collect();
        kinds.sort_by_key(|k| k.as_str());
        kinds
    }
}

//! Completion clients and backend registry construction.
//!
//! Each client implements [`Generator`] for one HTTP API and is wrapped in
//! the matching [`AnswerBackend`](coursebot_core::backend::AnswerBackend):
//!
//! | Backend | Client | Endpoint |
//! |---------|--------|----------|
//! | `ollama` | [`OllamaGenerator`] | `POST {url}/api/generate` |
//! | `openai` | [`OpenAiChatClient`] | `POST {url}` (`/v1/chat/completions`) |
//! | `gemini` | [`GeminiClient`] | `POST {url}/models/{model}:generateContent` |
//!
//! The OpenAI and Gemini backends fall back to placeholder answers when
//! their API key variable is unset, so every backend name can be selected
//! on a machine without hosted credentials.

use std::sync::Arc;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use coursebot_core::backend::{
    BackendKind, BackendRegistry, Generator, LocalModelBackend, RemoteApiBackend,
};

use crate::config::{GenerationConfig, OllamaGenerationConfig, RemoteApiConfig};
use crate::http;

const SYSTEM_PROMPT: &str = "You are a course catalog assistant. Answer the question using only \
the course information in the context. If the context does not contain the answer, say that \
you do not know.";

/// User-turn prompt combining retrieved context and the question.
pub fn build_prompt(question: &str, context: &str) -> String {
    let context = if context.trim().is_empty() {
        "(no course information was retrieved)"
    } else {
        context
    };
    format!("Context:\n{context}\n\nQuestion: {question}")
}

/// Build one backend per kind from config.
pub fn build_backends(config: &GenerationConfig) -> Result<BackendRegistry> {
    let mut registry = BackendRegistry::new();

    let ollama = OllamaGenerator::new(&config.ollama, config)?;
    registry.register(Arc::new(LocalModelBackend::new(Arc::new(ollama))));

    registry.register(Arc::new(remote_backend(
        BackendKind::OpenAi,
        &config.openai,
        |key| Ok(Arc::new(OpenAiChatClient::new(&config.openai, key, config)?)),
    )?));
    registry.register(Arc::new(remote_backend(
        BackendKind::Gemini,
        &config.gemini,
        |key| Ok(Arc::new(GeminiClient::new(&config.gemini, key, config)?)),
    )?));

    Ok(registry)
}

fn remote_backend<F>(
    kind: BackendKind,
    api: &RemoteApiConfig,
    make_client: F,
) -> Result<RemoteApiBackend>
where
    F: FnOnce(String) -> Result<Arc<dyn Generator>>,
{
    let backend = match api.api_key() {
        Some(key) => RemoteApiBackend::new(kind, make_client(key)?),
        None => RemoteApiBackend::placeholder(kind),
    };
    if backend.is_placeholder() {
        info!(
            backend = %kind,
            env = %api.api_key_env,
            "API key not set; backend will return placeholder answers"
        );
    } else {
        debug!(backend = %kind, model = %api.model, "hosted backend configured");
    }
    Ok(backend)
}

// ============ Ollama ============

pub struct OllamaGenerator {
    client: reqwest::Client,
    url: String,
    model: String,
    max_retries: u32,
}

impl OllamaGenerator {
    pub fn new(ollama: &OllamaGenerationConfig, config: &GenerationConfig) -> Result<Self> {
        Ok(Self {
            client: http::client(config.timeout_secs)?,
            url: ollama.url.trim_end_matches('/').to_string(),
            model: ollama.model.clone(),
            max_retries: config.max_retries,
        })
    }
}

#[derive(Debug, Serialize)]
struct OllamaGenerateRequest<'a> {
    model: &'a str,
    system: &'a str,
    prompt: String,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct OllamaGenerateResponse {
    response: String,
}

#[async_trait]
impl Generator for OllamaGenerator {
    async fn generate(&self, question: &str, context: &str) -> Result<String> {
        let payload = OllamaGenerateRequest {
            model: &self.model,
            system: SYSTEM_PROMPT,
            prompt: build_prompt(question, context),
            stream: false,
        };
        let endpoint = format!("{}/api/generate", self.url);
        debug!(model = %self.model, context_len = context.len(), "sending Ollama generate request");

        let json = http::post_json_with_retry("Ollama", self.max_retries, || {
            self.client.post(&endpoint).json(&payload)
        })
        .await?;

        let parsed: OllamaGenerateResponse = serde_json::from_value(json)
            .map_err(|e| anyhow!("Invalid Ollama response: {e}"))?;
        Ok(parsed.response.trim().to_string())
    }
}

// ============ OpenAI ============

pub struct OpenAiChatClient {
    client: reqwest::Client,
    url: String,
    model: String,
    api_key: String,
    max_retries: u32,
}

impl OpenAiChatClient {
    pub fn new(api: &RemoteApiConfig, api_key: String, config: &GenerationConfig) -> Result<Self> {
        Ok(Self {
            client: http::client(config.timeout_secs)?,
            url: api.url.clone(),
            model: api.model.clone(),
            api_key,
            max_retries: config.max_retries,
        })
    }
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

fn parse_chat_completion(json: serde_json::Value) -> Result<String> {
    let parsed: ChatCompletionResponse =
        serde_json::from_value(json).map_err(|e| anyhow!("Invalid OpenAI response: {e}"))?;
    parsed
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| anyhow!("Invalid OpenAI response: empty or missing content"))
}

#[async_trait]
impl Generator for OpenAiChatClient {
    async fn generate(&self, question: &str, context: &str) -> Result<String> {
        let payload = ChatCompletionRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: build_prompt(question, context),
                },
            ],
        };
        debug!(model = %self.model, "sending OpenAI chat request");

        let json = http::post_json_with_retry("OpenAI", self.max_retries, || {
            self.client
                .post(&self.url)
                .bearer_auth(&self.api_key)
                .json(&payload)
        })
        .await?;

        parse_chat_completion(json)
    }
}

// ============ Gemini ============

pub struct GeminiClient {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    max_retries: u32,
}

impl GeminiClient {
    pub fn new(api: &RemoteApiConfig, api_key: String, config: &GenerationConfig) -> Result<Self> {
        Ok(Self {
            client: http::client(config.timeout_secs)?,
            endpoint: format!(
                "{}/models/{}:generateContent",
                api.url.trim_end_matches('/'),
                api.model
            ),
            api_key,
            max_retries: config.max_retries,
        })
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiPart {
    text: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    system_instruction: GeminiContent,
    contents: Vec<GeminiContent>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: GeminiContent,
}

fn parse_gemini_response(json: serde_json::Value) -> Result<String> {
    let parsed: GeminiResponse =
        serde_json::from_value(json).map_err(|e| anyhow!("Invalid Gemini response: {e}"))?;
    let text: String = parsed
        .candidates
        .into_iter()
        .next()
        .map(|c| {
            c.content
                .parts
                .into_iter()
                .map(|p| p.text)
                .collect::<Vec<_>>()
                .join("")
        })
        .unwrap_or_default();
    let text = text.trim();
    if text.is_empty() {
        return Err(anyhow!("Invalid Gemini response: no candidate text"));
    }
    Ok(text.to_string())
}

#[async_trait]
impl Generator for GeminiClient {
    async fn generate(&self, question: &str, context: &str) -> Result<String> {
        let payload = GeminiRequest {
            system_instruction: GeminiContent {
                parts: vec![GeminiPart {
                    text: SYSTEM_PROMPT.to_string(),
                }],
            },
            contents: vec![GeminiContent {
                parts: vec![GeminiPart {
                    text: build_prompt(question, context),
                }],
            }],
        };
        debug!(endpoint = %self.endpoint, "sending Gemini generateContent request");

        let json = http::post_json_with_retry("Gemini", self.max_retries, || {
            self.client
                .post(&self.endpoint)
                .header("x-goog-api-key", &self.api_key)
                .json(&payload)
        })
        .await?;

        parse_gemini_response(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_prompt_includes_context_and_question() {
        let prompt = build_prompt("Who teaches 4361?", "Software Design Patterns: GoF");
        assert!(prompt.starts_with("Context:\nSoftware Design Patterns: GoF"));
        assert!(prompt.ends_with("Question: Who teaches 4361?"));
    }

    #[test]
    fn test_prompt_marks_empty_context() {
        let prompt = build_prompt("anything", "  ");
        assert!(prompt.contains("(no course information was retrieved)"));
    }

    #[test]
    fn test_parse_chat_completion() {
        let json = json!({
            "choices": [{ "message": { "role": "assistant", "content": "  CSE 4361.  " } }]
        });
        assert_eq!(parse_chat_completion(json).unwrap(), "CSE 4361.");
    }

    #[test]
    fn test_parse_chat_completion_empty_content() {
        let json = json!({ "choices": [{ "message": { "content": null } }] });
        assert!(parse_chat_completion(json).is_err());
        assert!(parse_chat_completion(json!({ "choices": [] })).is_err());
    }

    #[test]
    fn test_parse_gemini_response_joins_parts() {
        let json = json!({
            "candidates": [{
                "content": { "role": "model", "parts": [{ "text": "Design " }, { "text": "Patterns" }] }
            }]
        });
        assert_eq!(parse_gemini_response(json).unwrap(), "Design Patterns");
    }

    #[test]
    fn test_parse_gemini_response_without_candidates() {
        assert!(parse_gemini_response(json!({ "promptFeedback": {} })).is_err());
    }

    #[test]
    fn test_gemini_request_uses_camel_case() {
        let payload = GeminiRequest {
            system_instruction: GeminiContent { parts: vec![] },
            contents: vec![],
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert!(json.get("systemInstruction").is_some());
    }

    #[test]
    fn test_registry_has_every_backend() {
        let config = GenerationConfig {
            openai: RemoteApiConfig {
                api_key_env: "COURSEBOT_TEST_UNSET_OPENAI_KEY".to_string(),
                ..GenerationConfig::default().openai
            },
            gemini: RemoteApiConfig {
                api_key_env: "COURSEBOT_TEST_UNSET_GEMINI_KEY".to_string(),
                ..GenerationConfig::default().gemini
            },
            ..GenerationConfig::default()
        };
        let registry = build_backends(&config).unwrap();
        assert_eq!(
            registry.kinds(),
            vec![BackendKind::Gemini, BackendKind::Ollama, BackendKind::OpenAi]
        );
    }

    #[test]
    fn test_remote_backend_without_key_is_placeholder() {
        let api = RemoteApiConfig {
            api_key_env: "COURSEBOT_TEST_UNSET_REMOTE_KEY".to_string(),
            ..GenerationConfig::default().openai
        };
        let backend = remote_backend(BackendKind::OpenAi, &api, |_| {
            panic!("no client is built without a key")
        })
        .unwrap();
        assert!(backend.is_placeholder());
    }

    #[test]
    fn test_remote_backend_with_key_uses_client() {
        let env = "COURSEBOT_TEST_SET_GEMINI_KEY";
        std::env::set_var(env, "test-key");
        let generation = GenerationConfig::default();
        let api = RemoteApiConfig {
            api_key_env: env.to_string(),
            ..generation.gemini.clone()
        };
        let backend = remote_backend(BackendKind::Gemini, &api, |key| {
            assert_eq!(key, "test-key");
            Ok(Arc::new(GeminiClient::new(&api, key, &generation)?))
        })
        .unwrap();
        assert!(!backend.is_placeholder());
    }
}

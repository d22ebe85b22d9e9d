//! Chat completion client
//!
//! A thin client for OpenAI-compatible `/v1/chat/completions` endpoints,
//! used to send analysis prompts. Two presets cover the hosted Moonshot API
//! and a local bridge server.

use crate::error::{ChatError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// Hosted Moonshot endpoint
pub const MOONSHOT_ENDPOINT: &str = "https://api.moonshot.cn/v1/chat/completions";
/// Default Moonshot model
pub const MOONSHOT_MODEL: &str = "moonshot-v1-8k";
/// Local bridge endpoint
pub const LOCAL_BRIDGE_ENDPOINT: &str = "http://127.0.0.1:8765/v1/chat/completions";

/// Most recent history messages sent with each request
pub const MAX_HISTORY: usize = 10;

/// Error bodies are quoted up to this many characters
const MAX_ERROR_BODY_CHARS: usize = 500;

/// Who wrote a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Instructions
    System,
    /// The person asking
    User,
    /// The model
    Assistant,
}

/// One chat message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Author role
    pub role: Role,
    /// Message text
    pub content: String,
}

impl ChatMessage {
    /// A user message
    pub fn user<S: Into<String>>(content: S) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// An assistant message
    pub fn assistant<S: Into<String>>(content: S) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }

    /// A system message
    pub fn system<S: Into<String>>(content: S) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }
}

/// Endpoint settings
#[derive(Debug, Clone)]
pub struct ChatConfig {
    /// Full chat-completions URL
    pub endpoint: String,
    /// Bearer token; required unless `requires_key` is false
    pub api_key: Option<String>,
    /// Whether requests without a key are refused up front
    pub requires_key: bool,
    /// Model name
    pub model: String,
    /// Sampling temperature (default: 0.7)
    pub temperature: f32,
    /// Request timeout in milliseconds (default: 120000)
    pub timeout_ms: u64,
}

impl ChatConfig {
    /// The hosted Moonshot API
    pub fn moonshot<S: Into<String>>(api_key: Option<S>) -> Self {
        Self {
            endpoint: MOONSHOT_ENDPOINT.to_string(),
            api_key: api_key.map(Into::into),
            requires_key: true,
            model: MOONSHOT_MODEL.to_string(),
            temperature: 0.7,
            timeout_ms: 120_000,
        }
    }

    /// A bridge server on localhost; no key needed
    pub fn local_bridge() -> Self {
        Self {
            endpoint: LOCAL_BRIDGE_ENDPOINT.to_string(),
            api_key: None,
            requires_key: false,
            model: MOONSHOT_MODEL.to_string(),
            temperature: 0.7,
            timeout_ms: 300_000,
        }
    }

    /// Override the model
    pub fn with_model<S: Into<String>>(mut self, model: S) -> Self {
        self.model = model.into();
        self
    }

    /// `/health` next to the chat endpoint
    pub fn health_url(&self) -> Option<String> {
        let mut url = url::Url::parse(&self.endpoint).ok()?;
        url.set_path("/health");
        url.set_query(None);
        Some(url.into())
    }
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    temperature: f32,
    stream: bool,
}

#[derive(Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: Option<ChoiceMessage>,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Chat completion client
pub struct ChatClient {
    http: reqwest::Client,
    config: ChatConfig,
}

impl ChatClient {
    /// Create a client
    pub fn new(config: ChatConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| ChatError::Network(e.to_string()))?;
        Ok(Self { http, config })
    }

    /// Endpoint settings
    pub fn config(&self) -> &ChatConfig {
        &self.config
    }

    /// Send `system` plus the last [`MAX_HISTORY`] messages of `history`
    /// and return the assistant's reply
    #[instrument(skip(self, system, history), fields(endpoint = %self.config.endpoint))]
    pub async fn complete(&self, system: &str, history: &[ChatMessage]) -> Result<String> {
        if self.config.requires_key && self.config.api_key.as_deref().map_or(true, str::is_empty) {
            return Err(ChatError::Unauthorized.into());
        }

        let body = CompletionRequest {
            model: &self.config.model,
            messages: build_messages(system, history),
            temperature: self.config.temperature,
            stream: false,
        };

        let mut request = self.http.post(&self.config.endpoint).json(&body);
        if let Some(key) = &self.config.api_key {
            request = request.bearer_auth(key);
        }

        debug!("Sending {} messages to {}", body.messages.len(), self.config.model);
        let response = request
            .send()
            .await
            .map_err(|e| ChatError::Network(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ChatError::Network(e.to_string()))?;

        if !status.is_success() {
            warn!("Chat API returned {}", status);
            return Err(ChatError::Http {
                status: status.as_u16(),
                message: error_message(&text),
            }
            .into());
        }

        let parsed: CompletionResponse = serde_json::from_str(&text)?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message)
            .and_then(|m| m.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| ChatError::EmptyResponse.into())
    }

    /// Whether the server answers its `/health` probe
    #[instrument(skip(self))]
    pub async fn health(&self) -> bool {
        let Some(url) = self.config.health_url() else {
            return false;
        };
        match self.http.get(&url).timeout(Duration::from_secs(3)).send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                debug!("Health probe failed: {}", e);
                false
            }
        }
    }
}

/// System message, then the tail of the history without system messages
pub fn build_messages(system: &str, history: &[ChatMessage]) -> Vec<ChatMessage> {
    let start = history.len().saturating_sub(MAX_HISTORY);
    std::iter::once(ChatMessage::system(system))
        .chain(
            history[start..]
                .iter()
                .filter(|m| m.role != Role::System)
                .cloned(),
        )
        .collect()
}

/// `error.message`, `message` or `error` of a JSON body, else the body itself
fn error_message(body: &str) -> String {
    let from_json = serde_json::from_str::<Value>(body).ok().and_then(|json| {
        [
            json.pointer("/error/message"),
            json.get("message"),
            json.get("error"),
        ]
        .into_iter()
        .flatten()
        .find_map(|v| v.as_str().map(str::to_string))
    });
    from_json.unwrap_or_else(|| body.chars().take(MAX_ERROR_BODY_CHARS).collect())
}

//! OpenAI implementation of the [`LanguageModel`] trait.
//!
//! Plain chat-completions over reqwest; no streaming, no tool use. The
//! base URL is overridable for proxies and compatible providers.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::{AdapterError, Result};
use crate::traits::model::LanguageModel;

const DEFAULT_BASE_URL: &str = "https://api.openai.com";
const DEFAULT_MODEL: &str = "gpt-4o";
const DEFAULT_MAX_COMPLETION_TOKENS: u32 = 1200;

/// OpenAI chat-completions client.
#[derive(Clone)]
pub struct OpenAiModel {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
    max_completion_tokens: u32,
}

impl OpenAiModel {
    /// Create a client with the given API key and defaults.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            max_completion_tokens: DEFAULT_MAX_COMPLETION_TOKENS,
        }
    }

    /// Create from environment variables: `OPENAI_API_KEY` (required),
    /// `OPENAI_BASE_URL`, `OPENAI_MODEL`, `OPENAI_MAX_COMPLETION_TOKENS`.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| AdapterError::Config("missing openai api key".to_string()))?;
        let mut model = Self::new(api_key);

        if let Ok(base_url) = std::env::var("OPENAI_BASE_URL") {
            if !base_url.is_empty() {
                model.base_url = base_url;
            }
        }
        if let Ok(name) = std::env::var("OPENAI_MODEL") {
            if !name.is_empty() {
                model.model = name;
            }
        }
        if let Ok(raw) = std::env::var("OPENAI_MAX_COMPLETION_TOKENS") {
            if !raw.is_empty() {
                model.max_completion_tokens = raw.parse().map_err(|_| {
                    AdapterError::Config(format!("invalid OPENAI_MAX_COMPLETION_TOKENS: {raw}"))
                })?;
            }
        }

        Ok(model)
    }

    /// Set the chat model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set a custom base URL (for proxies or compatible providers).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    max_completion_tokens: u32,
    temperature: f32,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[async_trait]
impl LanguageModel for OpenAiModel {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let endpoint = format!(
            "{}/v1/chat/completions",
            self.base_url.trim_end_matches('/')
        );
        let request = ChatRequest {
            model: &self.model,
            max_completion_tokens: self.max_completion_tokens,
            temperature: 0.2,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
        };

        let response = self
            .client
            .post(&endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|err| AdapterError::Model(err.into()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AdapterError::Model(
                format!("openai error: {status} {body}").into(),
            ));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|err| AdapterError::Model(err.into()))?;
        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .unwrap_or_default();

        Ok(content)
    }
}

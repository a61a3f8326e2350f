//! Adapter for OpenAI-compatible chat-completions servers.
//!
//! Defaults target a model server running on the local machine, which accepts
//! any API key. Point `base_url` at `https://api.openai.com/v1/` and supply a
//! key to use the hosted API instead.

use std::{env, fmt, time::Duration};

use async_trait::async_trait;
use futures::stream;
use hyper::Uri;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::http_client::{HyperClient, build_https_client, post_json};
use crate::traits::{
    AdapterError, AdapterMetadata, AdapterResult, AdapterStream, InferenceChunk, InferenceRequest,
    ModelAdapter, PromptMessage,
};

/// Environment variable consulted by [`OpenAiConfig::from_env`].
pub const OPENAI_API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Base URL of the local model server.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8080/v1/";

/// Configuration for the OpenAI-compatible adapter.
#[derive(Clone, Debug)]
pub struct OpenAiConfig {
    api_key: Option<String>,
    model: String,
    base_url: String,
    timeout: Duration,
    default_temperature: Option<f32>,
}

impl OpenAiConfig {
    /// Creates a configuration for `model` against the local default server.
    #[must_use]
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            api_key: None,
            model: model.into(),
            base_url: DEFAULT_BASE_URL.to_owned(),
            timeout: Duration::from_secs(60),
            default_temperature: None,
        }
    }

    /// Loads the API key from the `OPENAI_API_KEY` environment variable.
    #[must_use]
    pub fn from_env(model: impl Into<String>) -> Self {
        let mut cfg = Self::new(model);
        cfg.api_key = env::var(OPENAI_API_KEY_ENV).ok();
        cfg
    }

    /// Overrides the base URL; `chat/completions` is appended to it.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError::Configuration`] if the supplied URL is invalid.
    pub fn with_base_url(mut self, base_url: impl AsRef<str>) -> AdapterResult<Self> {
        self.base_url = sanitize_base_url(base_url.as_ref())?;
        Ok(self)
    }

    /// Sets the default sampling temperature used when requests omit it.
    #[must_use]
    pub fn with_default_temperature(mut self, temperature: f32) -> Self {
        self.default_temperature = Some(temperature);
        self
    }

    /// Sets the HTTP request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Supplies an explicit API key.
    #[must_use]
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Returns the sanitised base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

/// Adapter that posts chat completions to an OpenAI-compatible server.
pub struct OpenAiAdapter {
    client: HyperClient,
    endpoint: Uri,
    metadata: AdapterMetadata,
    api_key: Option<String>,
    timeout: Duration,
    default_temperature: Option<f32>,
}

impl fmt::Debug for OpenAiAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAiAdapter")
            .field("model", &self.metadata.model())
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

impl OpenAiAdapter {
    /// Constructs a new adapter with the provided configuration.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError::Configuration`] if the endpoint cannot be parsed.
    #[allow(clippy::needless_pass_by_value)]
    pub fn new(config: OpenAiConfig) -> AdapterResult<Self> {
        let metadata = AdapterMetadata::new("openai", config.model.clone());
        let endpoint = format!("{}chat/completions", config.base_url)
            .parse::<Uri>()
            .map_err(|err| {
                AdapterError::configuration(format!("invalid chat completions endpoint: {err}"))
            })?;

        Ok(Self {
            client: build_https_client()?,
            endpoint,
            metadata,
            api_key: config.api_key.clone(),
            timeout: config.timeout,
            default_temperature: config.default_temperature,
        })
    }

    fn build_request(&self, request: &InferenceRequest) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: self.metadata.model().to_owned(),
            messages: request.messages().iter().map(map_prompt_message).collect(),
            temperature: request.temperature().or(self.default_temperature),
            max_tokens: request.max_output_tokens(),
            stop: request.stop().to_vec(),
            stream: false,
        }
    }
}

#[async_trait]
impl ModelAdapter for OpenAiAdapter {
    fn metadata(&self) -> &AdapterMetadata {
        &self.metadata
    }

    async fn infer(&self, request: InferenceRequest) -> AdapterResult<AdapterStream> {
        let payload = self.build_request(&request);
        let body = serde_json::to_vec(&payload).map_err(|err| {
            AdapterError::invalid_request(format!("failed to encode chat request: {err}"))
        })?;

        debug!(
            model = self.metadata.model(),
            messages = payload.messages.len(),
            "sending chat completion"
        );

        let raw = post_json(
            &self.client,
            &self.endpoint,
            body,
            self.api_key.as_deref(),
            Some(self.timeout),
            "chat completions",
        )
        .await?;

        if !raw.status.is_success() {
            return Err(AdapterError::Status {
                service: "chat completions".to_owned(),
                status: raw.status.as_u16(),
                body: String::from_utf8_lossy(&raw.body).into_owned(),
            });
        }

        let response: ChatCompletionResponse = serde_json::from_slice(&raw.body)
            .map_err(|err| AdapterError::response(format!("failed to decode chat response: {err}")))?;

        let content = first_choice_content(response);
        let stream = stream::once(async move { Ok(InferenceChunk::new(content, true)) });
        Ok(Box::pin(stream))
    }
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    stop: Vec<String>,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    #[serde(default)]
    message: Option<ChoiceMessage>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

fn first_choice_content(response: ChatCompletionResponse) -> String {
    response
        .choices
        .into_iter()
        .find_map(|choice| choice.message.and_then(|message| message.content))
        .unwrap_or_default()
}

fn map_prompt_message(message: &PromptMessage) -> ChatMessage {
    ChatMessage {
        role: message.role().to_string(),
        content: message.content().to_owned(),
    }
}

pub(crate) fn sanitize_base_url(input: &str) -> AdapterResult<String> {
    let mut base = input.trim().to_owned();
    if !(base.starts_with("http://") || base.starts_with("https://")) {
        return Err(AdapterError::configuration(
            "base URL must start with http:// or https://",
        ));
    }
    if !base.ends_with('/') {
        base.push('/');
    }
    base.parse::<Uri>()
        .map_err(|err| AdapterError::configuration(format!("invalid base URL: {err}")))?;
    Ok(base)
}

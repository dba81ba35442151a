//! LLM cost strategy over an OpenRouter-compatible endpoint.
//!
//! Only active when a provider key is configured. The completion is parsed
//! for its first decimal; anything missing, non-positive or unparsable is an
//! error the caller downgrades to the rule strategy.

use async_openai::{
    config::OpenAIConfig,
    types::{
        ChatCompletionRequestMessage, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use regex::Regex;
use std::env;
use std::sync::{Arc, LazyLock};
use thiserror::Error;

/// Default OpenRouter base URL.
pub const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1";

/// Default model to use.
pub const DEFAULT_MODEL: &str = "openai/gpt-4o-mini";

/// Estimates above this are rejected as hallucinated.
const MAX_ESTIMATE: f64 = 200.0;

const MAX_COMPLETION_TOKENS: u32 = 16;
const TEMPERATURE: f32 = 0.2;

#[derive(Error, Debug)]
pub enum LlmError {
    #[error("API error: {0}")]
    Api(String),

    #[error("no usable number in completion: {0:?}")]
    Unparsable(String),
}

/// LLM client configuration.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
}

impl LlmConfig {
    /// Load configuration from environment variables.
    ///
    /// Required:
    /// - `OPENROUTER_API_KEY`: provider key; absent means the LLM strategy
    ///   is disabled and only the rule strategy runs.
    ///
    /// Optional:
    /// - `PANIER_LLM_MODEL`: model name (default: "openai/gpt-4o-mini")
    /// - `PANIER_LLM_BASE_URL`: API base URL (default: OpenRouter)
    pub fn from_env() -> Option<Self> {
        let api_key = env::var("OPENROUTER_API_KEY").ok()?;
        Some(Self {
            api_key,
            model: env::var("PANIER_LLM_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string()),
            base_url: env::var("PANIER_LLM_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
        })
    }
}

/// Seam over the text completion provider.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(
        &self,
        prompt: &str,
        max_tokens: u32,
        temperature: f32,
    ) -> Result<String, LlmError>;
}

/// Production completion client using an OpenAI-compatible API.
pub struct OpenRouterClient {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenRouterClient {
    pub fn new(config: &LlmConfig) -> Self {
        let openai_config = OpenAIConfig::new()
            .with_api_key(&config.api_key)
            .with_api_base(&config.base_url);
        Self {
            client: Client::with_config(openai_config),
            model: config.model.clone(),
        }
    }
}

#[async_trait]
impl CompletionClient for OpenRouterClient {
    async fn complete(
        &self,
        prompt: &str,
        max_tokens: u32,
        temperature: f32,
    ) -> Result<String, LlmError> {
        let message: ChatCompletionRequestMessage = ChatCompletionRequestUserMessageArgs::default()
            .content(prompt.to_string())
            .build()
            .map(Into::into)
            .map_err(|e| LlmError::Api(format!("Failed to build message: {}", e)))?;

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(vec![message])
            .max_completion_tokens(max_tokens)
            .temperature(temperature)
            .build()
            .map_err(|e| LlmError::Api(e.to_string()))?;

        tracing::debug!(model = %self.model, "calling completion API");
        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| LlmError::Api(e.to_string()))?;

        Ok(response
            .choices
            .first()
            .and_then(|c| c.message.content.clone())
            .unwrap_or_default())
    }
}

/// Render the cost estimation prompt with the regional pricing context.
pub fn render_cost_prompt(title: &str, snippet: &str) -> String {
    format!(
        r#"Tu estimes le coût total des ingrédients d'une recette pour environ 4 portions, selon les prix courants en épicerie au Québec, en dollars canadiens.

Recette :
- Titre : {title}
- Description : {snippet}

Réponds uniquement avec un nombre, sans texte ni symbole."#,
        title = title,
        snippet = snippet
    )
}

/// The LLM estimation strategy.
pub struct LlmEstimator {
    client: Arc<dyn CompletionClient>,
}

impl LlmEstimator {
    pub fn new(client: Arc<dyn CompletionClient>) -> Self {
        Self { client }
    }

    /// Build from environment; None when no provider key is configured.
    pub fn from_env() -> Option<Self> {
        LlmConfig::from_env().map(|config| Self::new(Arc::new(OpenRouterClient::new(&config))))
    }

    pub async fn estimate(&self, title: &str, snippet: &str) -> Result<f64, LlmError> {
        let prompt = render_cost_prompt(title, snippet);
        let completion = self
            .client
            .complete(&prompt, MAX_COMPLETION_TOKENS, TEMPERATURE)
            .await?;
        parse_estimate(&completion)
    }
}

static DECIMAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+(?:[.,]\d+)?").expect("Invalid decimal regex"));

/// Extract the first decimal from a completion and validate it.
fn parse_estimate(completion: &str) -> Result<f64, LlmError> {
    let matched = DECIMAL
        .find(completion)
        .ok_or_else(|| LlmError::Unparsable(completion.to_string()))?;
    let value: f64 = matched
        .as_str()
        .replace(',', ".")
        .parse()
        .map_err(|_| LlmError::Unparsable(completion.to_string()))?;
    if value <= 0.0 {
        return Err(LlmError::Unparsable(completion.to_string()));
    }
    Ok(value.min(MAX_ESTIMATE))
}

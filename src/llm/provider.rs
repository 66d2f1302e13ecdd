//! The draft-provider seam and the retrying draft generator shared by all
//! providers.

use std::fmt;

use async_trait::async_trait;
use reqwest::RequestBuilder;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{error, info};

use crate::analysis::BranchAnalysis;
use crate::error::LlmError;

use super::anthropic::AnthropicProvider;
use super::google::GoogleProvider;
use super::json::extract_json;
use super::openai::OpenAiProvider;
use super::prompt::build_prompt;
use super::retry::{MAX_ATTEMPTS, retry_with_backoff};

/// Completion token budget per request.
pub const MAX_TOKENS: u32 = 1024;

/// Supported LLM providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    OpenAi,
    Anthropic,
    Google,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "openai",
            ProviderKind::Anthropic => "anthropic",
            ProviderKind::Google => "google",
        }
    }

    /// Model used when the configuration names none.
    pub fn default_model(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "gpt-4o-mini",
            ProviderKind::Anthropic => "claude-3-5-haiku-latest",
            ProviderKind::Google => "gemini-1.5-flash",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which provider to call and how.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LlmConfig {
    pub provider: ProviderKind,
    pub api_key: String,
    pub model: String,
}

/// A structured blog draft produced by a model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogDraft {
    pub title: String,
    pub key_points: Vec<String>,
    pub code_explanation: String,
}

/// Parse a model reply into a [`BlogDraft`].
///
/// A missing or empty title becomes `Untitled`, a non-array `keyPoints`
/// becomes empty and a missing explanation becomes an empty string. A reply
/// with no parseable JSON object is an error.
pub fn parse_draft(reply: &str) -> Result<BlogDraft, LlmError> {
    let json = extract_json(reply);
    let value: Value =
        serde_json::from_str(&json).map_err(|e| LlmError::InvalidJson(e.to_string()))?;
    if !value.is_object() {
        return Err(LlmError::InvalidJson(format!("expected an object, got {}", value)));
    }

    let title = value
        .get("title")
        .and_then(Value::as_str)
        .filter(|t| !t.is_empty())
        .unwrap_or("Untitled")
        .to_string();

    let key_points = value
        .get("keyPoints")
        .and_then(Value::as_array)
        .map(|points| {
            points
                .iter()
                .filter_map(|p| p.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default();

    let code_explanation = value
        .get("codeExplanation")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    Ok(BlogDraft {
        title,
        key_points,
        code_explanation,
    })
}

/// A model that can turn a branch analysis into a blog draft.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DraftProvider: Send + Sync {
    fn kind(&self) -> ProviderKind;

    /// One completion call, returning the model's text.
    async fn complete(&self, prompt: &str) -> Result<String, LlmError>;

    /// Generate a draft, retrying failed attempts. `None` once every attempt
    /// has failed.
    async fn generate_draft(&self, input: &BranchAnalysis) -> Option<BlogDraft> {
        generate_with_retry(self, input).await
    }
}

/// Prompt `provider` for a draft of `input`, retrying with backoff.
///
/// A failed call or an unparseable reply both count as a failed attempt.
pub async fn generate_with_retry<P>(provider: &P, input: &BranchAnalysis) -> Option<BlogDraft>
where
    P: DraftProvider + ?Sized,
{
    let prompt = build_prompt(input);
    let prompt = prompt.as_str();
    let mut attempt = 0;

    let result = retry_with_backoff(
        move || {
            attempt += 1;
            info!(
                "Attempt {}/{}: generating blog draft with {}",
                attempt,
                MAX_ATTEMPTS,
                provider.kind()
            );
            async move {
                let reply = provider.complete(prompt).await?;
                parse_draft(&reply)
            }
        },
        |e| LlmError::RetriesExhausted(Box::new(e)),
    )
    .await;

    match result {
        Ok(draft) => {
            info!("Blog draft generated for {}", input.branch_name);
            Some(draft)
        }
        Err(e) => {
            error!("Failed after {} attempts: {}", MAX_ATTEMPTS, e);
            None
        }
    }
}

/// Construct the provider selected by `config`.
pub fn build_provider(config: &LlmConfig) -> Box<dyn DraftProvider> {
    let api_key = config.api_key.clone();
    let model = config.model.clone();
    match config.provider {
        ProviderKind::OpenAi => Box::new(OpenAiProvider::new(api_key, model)),
        ProviderKind::Anthropic => Box::new(AnthropicProvider::new(api_key, model)),
        ProviderKind::Google => Box::new(GoogleProvider::new(api_key, model)),
    }
}

/// Send a provider request and decode a successful JSON body.
pub(crate) async fn send_json<T: DeserializeOwned>(
    provider: &'static str,
    request: RequestBuilder,
) -> Result<T, LlmError> {
    let response = request
        .send()
        .await
        .map_err(|source| LlmError::Request { provider, source })?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(LlmError::Status {
            provider,
            status: status.as_u16(),
            body,
        });
    }

    response
        .json::<T>()
        .await
        .map_err(|source| LlmError::Request { provider, source })
}

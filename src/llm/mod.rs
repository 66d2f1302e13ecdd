//! Blog draft generation through OpenAI, Anthropic or Google models.

pub mod anthropic;
pub mod google;
pub mod json;
pub mod openai;
pub mod prompt;
pub mod provider;
pub mod retry;

pub use anthropic::AnthropicProvider;
pub use google::GoogleProvider;
pub use json::extract_json;
pub use openai::OpenAiProvider;
pub use prompt::build_prompt;
pub use provider::{
    BlogDraft, DraftProvider, LlmConfig, ProviderKind, build_provider, generate_with_retry,
    parse_draft,
};

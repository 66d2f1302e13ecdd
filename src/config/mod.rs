//! User configuration at `~/.config/blog-material-gen/config.json`.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::llm::{LlmConfig, ProviderKind};

/// Environment variable pointing at an alternative config file.
pub const CONFIG_ENV: &str = "BLOG_MATERIAL_GEN_CONFIG";

const APP_DIR: &str = "blog-material-gen";
const CONFIG_FILE: &str = "config.json";

#[derive(Clone, Default, Serialize, Deserialize)]
pub struct UserConfig {
    /// Notion integration key.
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub database_id: String,
    pub database_name: Option<String>,
    pub slack_webhook_url: Option<String>,
    pub llm_provider: Option<ProviderKind>,
    pub llm_api_key: Option<String>,
    pub llm_model: Option<String>,
    pub openai_api_key: Option<String>,
    pub openai_model: Option<String>,
}

impl fmt::Debug for UserConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |v: &Option<String>| v.as_ref().map(|_| "[REDACTED]");
        f.debug_struct("UserConfig")
            .field("api_key", &"[REDACTED]")
            .field("database_id", &self.database_id)
            .field("database_name", &self.database_name)
            .field("slack_webhook_url", &redact(&self.slack_webhook_url))
            .field("llm_provider", &self.llm_provider)
            .field("llm_api_key", &redact(&self.llm_api_key))
            .field("llm_model", &self.llm_model)
            .field("openai_api_key", &redact(&self.openai_api_key))
            .field("openai_model", &self.openai_model)
            .finish()
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl UserConfig {
    /// Load the configuration from [`config_path`].
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&config_path()?)
    }

    /// Load and validate the configuration at `path`.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.display().to_string()));
        }
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadFailed)?;
        let config: UserConfig =
            serde_json::from_str(&content).map_err(ConfigError::ParseFailed)?;

        if config.api_key.trim().is_empty() {
            return Err(ConfigError::MissingField("api_key"));
        }
        if config.database_id.trim().is_empty() {
            return Err(ConfigError::MissingField("database_id"));
        }
        Ok(config)
    }

    /// LLM settings, if any provider is configured.
    ///
    /// `llm_api_key` (with `llm_provider`, default OpenAI) takes precedence
    /// over the legacy `openai_api_key`/`openai_model` pair. A missing model
    /// falls back to the provider's default.
    pub fn llm_config(&self) -> Option<LlmConfig> {
        if let Some(api_key) = non_empty(&self.llm_api_key) {
            let provider = self.llm_provider.unwrap_or_default();
            let model = non_empty(&self.llm_model).unwrap_or(provider.default_model());
            return Some(LlmConfig {
                provider,
                api_key: api_key.to_string(),
                model: model.to_string(),
            });
        }

        let api_key = non_empty(&self.openai_api_key)?;
        let model =
            non_empty(&self.openai_model).unwrap_or(ProviderKind::OpenAi.default_model());
        Some(LlmConfig {
            provider: ProviderKind::OpenAi,
            api_key: api_key.to_string(),
            model: model.to_string(),
        })
    }

    pub fn slack_webhook(&self) -> Option<&str> {
        non_empty(&self.slack_webhook_url)
    }
}

/// `~/.config/blog-material-gen`
pub fn config_dir() -> Result<PathBuf, ConfigError> {
    dirs::home_dir()
        .map(|home| home.join(".config").join(APP_DIR))
        .ok_or(ConfigError::NoHomeDir)
}

/// Config file location, honoring [`CONFIG_ENV`].
pub fn config_path() -> Result<PathBuf, ConfigError> {
    if let Ok(path) = std::env::var(CONFIG_ENV)
        && !path.trim().is_empty()
    {
        return Ok(PathBuf::from(path));
    }
    Ok(config_dir()?.join(CONFIG_FILE))
}

/// Directory holding the daily run logs.
pub fn log_dir() -> Result<PathBuf, ConfigError> {
    Ok(config_dir()?.join("logs"))
}

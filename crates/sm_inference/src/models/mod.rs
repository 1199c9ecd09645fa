use std::sync::Arc;
use sm_core::{CompletionModel, Error, Result};
use tracing::info;
use crate::Config;

pub mod chat;
pub mod dummy;
pub mod ollama;

pub use chat::ChatCompletionModel;
pub use dummy::DummyModel;
pub use ollama::OllamaModel;

const DEEPSEEK_URL: &str = "https://api.deepseek.com/v1";
const OPENAI_URL: &str = "https://api.openai.com/v1";
const OPENROUTER_URL: &str = "https://openrouter.ai/api/v1";

pub fn available_models() -> &'static [&'static str] {
    &["deepseek", "openai", "openrouter", "ollama", "dummy"]
}

/// Build the completion backend named by `config.provider`.
pub fn create_model(config: &Config) -> Result<Arc<dyn CompletionModel>> {
    let model: Arc<dyn CompletionModel> = match config.provider.as_str() {
        "deepseek" => Arc::new(ChatCompletionModel::new(
            config.model_url.as_deref().unwrap_or(DEEPSEEK_URL),
            config.api_key.clone(),
            config.model_name.as_deref().unwrap_or("deepseek-chat"),
            config.timeout,
        )?),
        "openai" => Arc::new(ChatCompletionModel::new(
            config.model_url.as_deref().unwrap_or(OPENAI_URL),
            config.api_key.clone(),
            config.model_name.as_deref().unwrap_or("gpt-4o-mini"),
            config.timeout,
        )?),
        "openrouter" => Arc::new(ChatCompletionModel::new(
            config.model_url.as_deref().unwrap_or(OPENROUTER_URL),
            config.api_key.clone(),
            config.model_name.as_deref().unwrap_or("anthropic/claude-3.5-haiku"),
            config.timeout,
        )?),
        "ollama" => Arc::new(OllamaModel::from_url(
            config.model_url.as_deref(),
            config.model_name.as_deref(),
            config.timeout,
        )?),
        "dummy" => Arc::new(DummyModel),
        other => {
            return Err(Error::Config(format!(
                "Unknown model '{}'. Available models: {}",
                other,
                available_models().join(", ")
            )))
        }
    };

    info!("🧠 Completion model initialized (using {})", model.name());
    Ok(model)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_dummy_model() {
        let model = create_model(&Config::default()).unwrap();
        assert_eq!(model.name(), "Dummy");
    }

    #[test]
    fn test_create_chat_model_requires_key() {
        let config = Config {
            provider: "deepseek".to_string(),
            ..Config::default()
        };
        assert!(create_model(&config).is_err());

        let config = Config {
            provider: "deepseek".to_string(),
            api_key: Some("test-key".to_string()),
            ..Config::default()
        };
        assert_eq!(create_model(&config).unwrap().name(), "deepseek-chat");
    }

    #[test]
    fn test_unknown_model() {
        let config = Config {
            provider: "clippy".to_string(),
            ..Config::default()
        };
        let err = create_model(&config).unwrap_err();
        assert!(err.to_string().contains("Available models"));
    }
}

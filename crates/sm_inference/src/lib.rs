use std::time::Duration;

pub mod models;

/// Settings for the completion backend.
#[derive(Debug, Clone)]
pub struct Config {
    /// Backend name: `deepseek`, `openai`, `openrouter`, `ollama` or `dummy`
    pub provider: String,
    pub api_key: Option<String>,
    pub model_name: Option<String>,
    /// Overrides the provider's default endpoint
    pub model_url: Option<String>,
    pub timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            provider: "dummy".to_string(),
            api_key: None,
            model_name: None,
            model_url: None,
            timeout: Duration::from_secs(60),
        }
    }
}

pub mod prelude {
    pub use super::Config;
    pub use super::models::create_model;
    pub use sm_core::{CompletionModel, Error, Result};
}

pub use models::{available_models, create_model};

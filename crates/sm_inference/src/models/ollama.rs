use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use sm_core::{CompletionModel, Error, Result};
use std::fmt;
use std::time::Duration;
use url::Url;

const DEFAULT_URL: &str = "http://localhost:11434";
const DEFAULT_MODEL: &str = "gemma3:12b";

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

pub struct OllamaModel {
    client: Client,
    endpoint: Url,
    model: String,
}

impl fmt::Debug for OllamaModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OllamaModel")
            .field("endpoint", &self.endpoint.as_str())
            .field("model", &self.model)
            .finish()
    }
}

impl OllamaModel {
    /// Accepts `http://host:port` or `http://host:port/model-name`; an explicit
    /// `model_name` wins over the one embedded in the URL path.
    pub fn from_url(url: Option<&str>, model_name: Option<&str>, timeout: Duration) -> Result<Self> {
        let url = url.unwrap_or(DEFAULT_URL);
        let parsed = Url::parse(url).map_err(|e| Error::Config(format!("Invalid Ollama URL '{}': {}", url, e)))?;

        let path_model = parsed.path().trim_matches('/').to_string();
        let model = model_name
            .map(str::to_string)
            .or_else(|| (!path_model.is_empty()).then_some(path_model))
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());

        let mut endpoint = parsed;
        endpoint.set_path("/api/generate");

        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            endpoint,
            model,
        })
    }
}

#[async_trait]
impl CompletionModel for OllamaModel {
    fn name(&self) -> &str {
        &self.model
    }

    async fn complete(&self, prompt: &str) -> Result<String> {
        let request = GenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
        };

        let response = self.client
            .post(self.endpoint.clone())
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Completion(format!(
                "Ollama is not available at {}: {}. Please ensure Ollama is running and the model '{}' is installed.",
                self.endpoint, e, self.model
            )))?;

        if !response.status().is_success() {
            return Err(Error::Completion(format!("Ollama returned {}", response.status())));
        }

        Ok(response.json::<GenerateResponse>().await?.response)
    }
}

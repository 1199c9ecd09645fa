use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use sm_core::{CompletionModel, Error, Result};
use std::fmt;
use std::time::Duration;
use url::Url;

#[derive(Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Deserialize)]
struct Message {
    content: Option<String>,
}

const SYSTEM_PROMPT: &str =
    "You are a documentary researcher reviewing historical newspaper archives. Respond with JSON only.";

/// Client for any OpenAI-compatible `/chat/completions` endpoint (DeepSeek, OpenAI, OpenRouter).
pub struct ChatCompletionModel {
    client: Client,
    api_key: String,
    endpoint: Url,
    model: String,
}

impl fmt::Debug for ChatCompletionModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChatCompletionModel")
            .field("client", &"<reqwest::Client>")
            .field("api_key", &"<redacted>")
            .field("endpoint", &self.endpoint.as_str())
            .field("model", &self.model)
            .finish()
    }
}

impl ChatCompletionModel {
    pub fn new(base_url: &str, api_key: Option<String>, model: &str, timeout: Duration) -> Result<Self> {
        let api_key = api_key
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| Error::Config(format!("An API key is required for {}", base_url)))?;

        let endpoint = chat_endpoint(base_url)?;
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            api_key,
            endpoint,
            model: model.to_string(),
        })
    }
}

fn chat_endpoint(base_url: &str) -> Result<Url> {
    let base = if base_url.ends_with('/') {
        base_url.to_string()
    } else {
        format!("{}/", base_url)
    };
    Url::parse(&base)
        .and_then(|u| u.join("chat/completions"))
        .map_err(|e| Error::Config(format!("Invalid model URL '{}': {}", base_url, e)))
}

#[async_trait]
impl CompletionModel for ChatCompletionModel {
    fn name(&self) -> &str {
        &self.model
    }

    async fn complete(&self, prompt: &str) -> Result<String> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: prompt.to_string(),
                },
            ],
            temperature: 0.7,
        };

        let response = self.client
            .post(self.endpoint.clone())
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    Error::Completion(format!("{} timed out", self.model))
                } else {
                    Error::Completion(format!("request to {} failed: {}", self.model, e))
                }
            })?;

        match response.status() {
            StatusCode::TOO_MANY_REQUESTS => {
                return Err(Error::Completion(format!("{} is rate limited", self.model)));
            }
            status if !status.is_success() => {
                return Err(Error::Completion(format!("{} returned {}", self.model, status)));
            }
            _ => {}
        }

        let body = response.json::<ChatResponse>().await?;
        body.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| Error::Completion(format!("{} returned no content", self.model)))
    }
}

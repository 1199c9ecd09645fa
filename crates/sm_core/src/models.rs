use async_trait::async_trait;
use std::fmt;
use crate::Result;

/// A text-completion service. Output has no guaranteed schema.
#[async_trait]
pub trait CompletionModel: Send + Sync + fmt::Debug {
    fn name(&self) -> &str;

    /// Complete a single prompt, failing on network, timeout or rate-limit conditions
    async fn complete(&self, prompt: &str) -> Result<String>;
}

use async_trait::async_trait;
use sm_core::{CompletionModel, Result};

/// Offline model that never proposes stories, leaving all work to the heuristics.
#[derive(Debug, Default, Clone, Copy)]
pub struct DummyModel;

#[async_trait]
impl CompletionModel for DummyModel {
    fn name(&self) -> &str {
        "Dummy"
    }

    async fn complete(&self, _prompt: &str) -> Result<String> {
        Ok(r#"{"stories": []}"#.to_string())
    }
}

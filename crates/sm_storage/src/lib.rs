use async_trait::async_trait;
use sm_core::{ArticleStore, Error, Result};
use std::sync::Arc;
use tracing::info;

pub mod backends;
pub mod loader;

pub use backends::*;
pub use loader::{load_articles_json, seed_storage, RawArticle};

#[async_trait]
pub trait StorageBackend: Send + Sync {
    fn get_error_message() -> &'static str where Self: Sized;
    async fn new() -> Result<Self> where Self: Sized;
    fn config(&self) -> &BackendConfig;
}

/// Where a backend lives.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    pub url: String,
}

impl BackendConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

/// Build a storage backend by name (`memory` or `sqlite`).
pub async fn create_storage(kind: &str, url: Option<&str>) -> Result<Arc<dyn ArticleStore>> {
    match kind {
        "memory" => {
            let storage = <InMemoryStorage as StorageBackend>::new().await?;
            info!("🏦 Using in-memory article storage ({})", storage.config().url);
            Ok(Arc::new(storage))
        }
        #[cfg(feature = "sqlite")]
        "sqlite" => {
            let storage = match url {
                Some(url) => SQLiteStorage::new_with_url(url).await,
                None => <SQLiteStorage as StorageBackend>::new().await,
            }
            .map_err(|e| Error::StorageUnavailable(format!("{} ({})", SQLiteStorage::get_error_message(), e)))?;
            info!("🏦 Using SQLite article storage at {}", storage.config().url);
            Ok(Arc::new(storage))
        }
        other => {
            let _ = url;
            Err(Error::Config(format!(
                "Unsupported storage backend '{}' (available: {})",
                other,
                available_backends().join(", ")
            )))
        }
    }
}

pub fn available_backends() -> Vec<&'static str> {
    let mut backends = vec!["memory"];
    if cfg!(feature = "sqlite") {
        backends.push("sqlite");
    }
    backends
}

pub mod prelude {
    pub use super::{create_storage, BackendConfig, StorageBackend};
    pub use super::backends::*;
}

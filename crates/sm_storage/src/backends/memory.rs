use async_trait::async_trait;
use sm_core::{ArticleRecord, ArticleStore, Result, YearRange};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use tokio::sync::RwLock;
use crate::{BackendConfig, StorageBackend};

pub struct MemoryStore {
    articles: Vec<ArticleRecord>,
    seed: u64,
}

impl MemoryStore {
    pub fn new(seed: u64) -> Self {
        Self {
            articles: Vec::new(),
            seed,
        }
    }

    pub fn store_article(&mut self, article: &ArticleRecord) {
        if let Some(existing) = self.articles.iter_mut().find(|a| a.id == article.id) {
            *existing = article.clone();
        } else {
            self.articles.push(article.clone());
        }
    }

    /// Randomized tie-break that stays fixed for the lifetime of the store
    fn tie_break(&self, id: &str) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.seed.hash(&mut hasher);
        id.hash(&mut hasher);
        hasher.finish()
    }

    pub fn fetch(&self, category: Option<&str>, years: YearRange, limit: usize, offset: u64) -> Vec<ArticleRecord> {
        let mut matching: Vec<(u64, &ArticleRecord)> = self.articles.iter()
            .filter(|a| match category {
                Some(category) => a.category.as_deref()
                    .map(|c| c.eq_ignore_ascii_case(category))
                    .unwrap_or(false),
                None => true,
            })
            .filter(|a| years.contains(a.year))
            .map(|a| (self.tie_break(&a.id), a))
            .collect();

        matching.sort_by(|(tie_a, a), (tie_b, b)| {
            b.content_length.cmp(&a.content_length).then(tie_a.cmp(tie_b))
        });

        matching.into_iter()
            .skip(offset as usize)
            .take(limit)
            .map(|(_, a)| a.clone())
            .collect()
    }

    pub fn get(&self, id: &str) -> Option<ArticleRecord> {
        self.articles.iter().find(|a| a.id == id).cloned()
    }

    pub fn len(&self) -> usize {
        self.articles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.articles.is_empty()
    }
}

pub struct InMemoryStorage {
    store: Arc<RwLock<MemoryStore>>,
    config: BackendConfig,
}

impl InMemoryStorage {
    pub fn with_seed(seed: u64) -> Self {
        Self {
            store: Arc::new(RwLock::new(MemoryStore::new(seed))),
            config: BackendConfig::new("memory://"),
        }
    }

    pub async fn with_articles(articles: Vec<ArticleRecord>) -> Self {
        let storage = Self::with_seed(rand::random());
        {
            let mut store = storage.store.write().await;
            for article in &articles {
                store.store_article(article);
            }
        }
        storage
    }

    pub async fn len(&self) -> usize {
        self.store.read().await.len()
    }
}

#[async_trait]
impl StorageBackend for InMemoryStorage {
    fn get_error_message() -> &'static str {
        "Memory storage should be available"
    }

    async fn new() -> Result<Self> {
        Ok(Self::with_seed(rand::random()))
    }

    fn config(&self) -> &BackendConfig {
        &self.config
    }
}

#[async_trait]
impl ArticleStore for InMemoryStorage {
    async fn fetch_articles(
        &self,
        category: Option<&str>,
        years: YearRange,
        limit: usize,
        offset: u64,
    ) -> Result<Vec<ArticleRecord>> {
        let store = self.store.read().await;
        Ok(store.fetch(category, years, limit, offset))
    }

    async fn get_article(&self, id: &str) -> Result<Option<ArticleRecord>> {
        let store = self.store.read().await;
        Ok(store.get(id))
    }

    async fn store_article(&self, article: &ArticleRecord) -> Result<()> {
        let mut store = self.store.write().await;
        store.store_article(article);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn article(id: &str, category: &str, year: i32, content_length: usize) -> ArticleRecord {
        ArticleRecord {
            id: id.to_string(),
            title: Some(format!("Headline {}", id)),
            content_preview: Some("Preview text".to_string()),
            content_length,
            publication_date: None,
            year,
            category: Some(category.to_string()),
            existing_potential: None,
            existing_narrative_score: None,
        }
    }

    #[tokio::test]
    async fn test_fetch_filters_and_orders_by_length() {
        let storage = InMemoryStorage::with_articles(vec![
            article("a", "sports", 1951, 100),
            article("b", "sports", 1953, 900),
            article("c", "politics", 1952, 5000),
            article("d", "Sports", 1960, 700),
            article("e", "sports", 1955, 400),
        ]).await;

        let years = YearRange::new(1950, 1955).unwrap();
        let page = storage.fetch_articles(Some("sports"), years, 10, 0).await.unwrap();
        let ids: Vec<_> = page.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "e", "a"]);

        let all = storage.fetch_articles(None, YearRange::all(), 10, 0).await.unwrap();
        assert_eq!(all.len(), 5);
        assert_eq!(all[0].id, "c");
    }

    #[tokio::test]
    async fn test_offset_pages_are_disjoint_with_ties() {
        let articles = (0..30).map(|i| article(&format!("t{}", i), "war", 1942, 500)).collect();
        let storage = InMemoryStorage::with_articles(articles).await;
        let years = YearRange::new(1940, 1945).unwrap();

        let first = storage.fetch_articles(Some("war"), years, 12, 0).await.unwrap();
        let second = storage.fetch_articles(Some("war"), years, 12, 12).await.unwrap();
        let third = storage.fetch_articles(Some("war"), years, 12, 24).await.unwrap();
        let past_end = storage.fetch_articles(Some("war"), years, 12, 36).await.unwrap();

        assert_eq!(third.len(), 6);
        assert!(past_end.is_empty());

        let ids: HashSet<_> = first.iter().chain(&second).chain(&third).map(|a| a.id.clone()).collect();
        assert_eq!(ids.len(), 30);
    }

    #[tokio::test]
    async fn test_store_replaces_by_id() {
        let storage = InMemoryStorage::with_seed(7);
        storage.store_article(&article("x", "crime", 1921, 10)).await.unwrap();
        storage.store_article(&article("x", "crime", 1921, 20)).await.unwrap();
        assert_eq!(storage.len().await, 1);
        let found = storage.get_article("x").await.unwrap().unwrap();
        assert_eq!(found.content_length, 20);
        assert!(storage.get_article("missing").await.unwrap().is_none());
    }
}

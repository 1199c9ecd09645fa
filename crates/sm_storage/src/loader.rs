use chrono::{Datelike, NaiveDate};
use serde::Deserialize;
use sm_core::{normalize_score, ArticleRecord, ArticleStore, Error, Result};
use std::path::Path;
use tracing::{debug, info};

/// Longest preview kept on an imported article
const PREVIEW_CHARS: usize = 1500;

/// Article as it appears in JSON exports. Accepts both camelCase and snake_case
/// keys and scores expressed either as 0-1 fractions or 0-100 values.
#[derive(Debug, Clone, Deserialize)]
pub struct RawArticle {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, alias = "contentPreview", alias = "content_preview")]
    pub content: Option<String>,
    #[serde(default, alias = "contentLength")]
    pub content_length: Option<usize>,
    #[serde(default, alias = "publicationDate")]
    pub publication_date: Option<String>,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default, alias = "existingPotential", alias = "documentary_potential", alias = "quality_score")]
    pub existing_potential: Option<f64>,
    #[serde(default, alias = "existingNarrativeScore", alias = "narrative_score")]
    pub existing_narrative_score: Option<f64>,
}

impl RawArticle {
    pub fn into_record(self) -> Result<ArticleRecord> {
        let publication_date = match self.publication_date.as_deref() {
            Some(date) => Some(
                NaiveDate::parse_from_str(date.get(..10).unwrap_or(date), "%Y-%m-%d")
                    .map_err(|e| Error::Validation(format!("article {}: bad publication date '{}': {}", self.id, date, e)))?,
            ),
            None => None,
        };

        let year = self.year
            .or_else(|| publication_date.map(|d| d.year()))
            .ok_or_else(|| Error::Validation(format!("article {} has neither year nor publication date", self.id)))?;

        let content_length = self.content_length
            .unwrap_or_else(|| self.content.as_deref().map(|c| c.chars().count()).unwrap_or(0));
        let content_preview = self.content.map(|c| c.chars().take(PREVIEW_CHARS).collect());

        Ok(ArticleRecord {
            id: self.id,
            title: self.title,
            content_preview,
            content_length,
            publication_date,
            year,
            category: self.category,
            existing_potential: self.existing_potential.map(normalize_score),
            existing_narrative_score: self.existing_narrative_score.map(normalize_score),
        })
    }
}

/// Read a JSON array of articles from disk.
pub fn load_articles_json(path: &Path) -> Result<Vec<ArticleRecord>> {
    let data = std::fs::read_to_string(path)?;
    parse_articles_json(&data)
}

pub fn parse_articles_json(data: &str) -> Result<Vec<ArticleRecord>> {
    let raw: Vec<RawArticle> = serde_json::from_str(data)?;
    let mut records = Vec::with_capacity(raw.len());
    for article in raw {
        match article.into_record() {
            Ok(record) => records.push(record),
            Err(e) => debug!("Skipping article during import: {}", e),
        }
    }
    Ok(records)
}

/// Store every article, returning how many were written.
pub async fn seed_storage(storage: &dyn ArticleStore, articles: &[ArticleRecord]) -> Result<usize> {
    for article in articles {
        storage.store_article(article).await?;
    }
    info!("📥 Imported {} articles", articles.len());
    Ok(articles.len())
}

use async_trait::async_trait;
use chrono::NaiveDate;
use sm_core::{normalize_score, ArticleRecord, ArticleStore, Error, Result, YearRange};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqliteRow};
use sqlx::Row;
use std::str::FromStr;
use std::sync::Arc;
use crate::{BackendConfig, StorageBackend};

const DEFAULT_URL: &str = "sqlite:articles.db";

/// Modulus of the seeded tie-break; keeps `rowid * seed` inside i64
const TIE_BREAK_MODULUS: i64 = 1_000_003;

const MIGRATIONS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS articles (
        id TEXT PRIMARY KEY,
        title TEXT,
        content_preview TEXT,
        content_length INTEGER NOT NULL DEFAULT 0,
        publication_date TEXT,
        year INTEGER NOT NULL,
        category TEXT,
        existing_potential REAL,
        existing_narrative_score REAL
    )
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS idx_articles_category_year
        ON articles (category, year)
    "#,
];

pub struct SQLiteStorage {
    pool: Arc<SqlitePool>,
    config: BackendConfig,
    seed: i64,
}

#[async_trait]
impl StorageBackend for SQLiteStorage {
    fn get_error_message() -> &'static str {
        "SQLite database should be available at ./articles.db"
    }

    async fn new() -> Result<Self> {
        Self::new_with_url(DEFAULT_URL).await
    }

    fn config(&self) -> &BackendConfig {
        &self.config
    }
}

impl SQLiteStorage {
    pub async fn new_with_url(url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)
            .map_err(|e| Error::Config(format!("Invalid SQLite URL '{}': {}", url, e)))?
            .create_if_missing(true);

        let pool = SqlitePool::connect_with(options)
            .await
            .map_err(|e| Error::StorageUnavailable(format!("Failed to connect to database: {}", e)))?;

        for (i, migration) in MIGRATIONS.iter().enumerate() {
            sqlx::query(migration)
                .execute(&pool)
                .await
                .map_err(|e| Error::StorageUnavailable(format!("Failed to run migration {}: {}", i, e)))?;
        }

        Ok(Self {
            pool: Arc::new(pool),
            config: BackendConfig::new(url),
            seed: rand::random::<i64>().rem_euclid(TIE_BREAK_MODULUS - 1) + 1,
        })
    }

    fn row_to_article(row: &SqliteRow) -> Result<ArticleRecord> {
        let publication_date = row.get::<Option<String>, _>("publication_date")
            .map(|d| NaiveDate::parse_from_str(&d, "%Y-%m-%d"))
            .transpose()
            .map_err(|e| Error::StorageUnavailable(format!("Failed to parse date: {}", e)))?;

        Ok(ArticleRecord {
            id: row.get("id"),
            title: row.get("title"),
            content_preview: row.get("content_preview"),
            content_length: row.get::<i64, _>("content_length").max(0) as usize,
            publication_date,
            year: row.get::<i64, _>("year") as i32,
            category: row.get("category"),
            existing_potential: row.get::<Option<f64>, _>("existing_potential").map(normalize_score),
            existing_narrative_score: row.get::<Option<f64>, _>("existing_narrative_score").map(normalize_score),
        })
    }
}

#[async_trait]
impl ArticleStore for SQLiteStorage {
    async fn fetch_articles(
        &self,
        category: Option<&str>,
        years: YearRange,
        limit: usize,
        offset: u64,
    ) -> Result<Vec<ArticleRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM articles
            WHERE (? IS NULL OR lower(category) = lower(?))
              AND year BETWEEN ? AND ?
            ORDER BY content_length DESC, (rowid * ?) % ?
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(category)
        .bind(category)
        .bind(years.start)
        .bind(years.end)
        .bind(self.seed)
        .bind(TIE_BREAK_MODULUS)
        .bind(limit as i64)
        .bind(offset as i64)
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| Error::StorageUnavailable(format!("Failed to fetch articles: {}", e)))?;

        rows.iter().map(Self::row_to_article).collect()
    }

    async fn get_article(&self, id: &str) -> Result<Option<ArticleRecord>> {
        let row = sqlx::query("SELECT * FROM articles WHERE id = ?")
            .bind(id)
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| Error::StorageUnavailable(format!("Failed to get article: {}", e)))?;

        row.as_ref().map(Self::row_to_article).transpose()
    }

    async fn store_article(&self, article: &ArticleRecord) -> Result<()> {
        sqlx::query(
            r#"
            INSERT OR REPLACE INTO articles
            (id, title, content_preview, content_length, publication_date, year, category,
             existing_potential, existing_narrative_score)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&article.id)
        .bind(article.title.as_deref())
        .bind(article.content_preview.as_deref())
        .bind(article.content_length as i64)
        .bind(article.publication_date.map(|d| d.format("%Y-%m-%d").to_string()))
        .bind(article.year)
        .bind(article.category.as_deref())
        .bind(article.existing_potential.map(f64::from))
        .bind(article.existing_narrative_score.map(f64::from))
        .execute(&*self.pool)
        .await
        .map_err(|e| Error::StorageUnavailable(format!("Failed to store article: {}", e)))?;

        Ok(())
    }
}

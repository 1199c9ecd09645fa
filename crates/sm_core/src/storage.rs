use async_trait::async_trait;
use crate::types::{ArticleRecord, YearRange};
use crate::Result;

#[async_trait]
pub trait ArticleStore: Send + Sync {
    /// Fetch a page of candidate articles for a category and year range.
    ///
    /// Rows are ordered by content length (longest first) with a randomized but
    /// store-stable tie-break, so consecutive offsets never overlap. An offset
    /// past the end of the matching corpus yields an empty page.
    async fn fetch_articles(
        &self,
        category: Option<&str>,
        years: YearRange,
        limit: usize,
        offset: u64,
    ) -> Result<Vec<ArticleRecord>>;

    /// Look up a single article by id
    async fn get_article(&self, id: &str) -> Result<Option<ArticleRecord>>;

    /// Store or replace an article
    async fn store_article(&self, article: &ArticleRecord) -> Result<()>;
}

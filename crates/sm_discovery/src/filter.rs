use sm_core::{ArticleRecord, YearRange};
use thiserror::Error;
use tracing::debug;
use crate::config::DiscoveryConfig;
use crate::taxonomy::{validate_title, TitleRejection};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("missing title")]
    MissingTitle,
    #[error("missing content preview")]
    MissingPreview,
    #[error("content preview too thin ({0} chars)")]
    ThinPreview(usize),
    #[error("rejected title: {0}")]
    Title(#[from] TitleRejection),
    #[error("year {0} outside supported range")]
    YearOutOfRange(i32),
}

/// Stateless structural classifier run before any expensive analysis.
#[derive(Debug, Clone)]
pub struct QualityPreFilter {
    min_preview_chars: usize,
    years: YearRange,
}

impl QualityPreFilter {
    pub fn new(min_preview_chars: usize, years: YearRange) -> Self {
        Self { min_preview_chars, years }
    }

    pub fn from_config(config: &DiscoveryConfig) -> Self {
        Self::new(config.min_preview_chars, config.supported_years)
    }

    pub fn check(&self, article: &ArticleRecord) -> Result<(), Rejection> {
        let title = article.title.as_deref()
            .filter(|t| !t.trim().is_empty())
            .ok_or(Rejection::MissingTitle)?;
        let preview = article.content_preview.as_deref()
            .filter(|p| !p.trim().is_empty())
            .ok_or(Rejection::MissingPreview)?;

        let preview_len = preview.chars().count();
        if preview_len < self.min_preview_chars {
            return Err(Rejection::ThinPreview(preview_len));
        }

        validate_title(title)?;

        if !self.years.contains(article.year) {
            return Err(Rejection::YearOutOfRange(article.year));
        }
        Ok(())
    }

    pub fn keep(&self, article: &ArticleRecord) -> bool {
        match self.check(article) {
            Ok(()) => true,
            Err(reason) => {
                debug!("🚮 Dropping article {} ({})", article.id, reason);
                false
            }
        }
    }

    /// Order-preserving filter over a fetched page.
    pub fn filter(&self, articles: &[ArticleRecord]) -> Vec<ArticleRecord> {
        articles.iter().filter(|a| self.keep(a)).cloned().collect()
    }
}

impl Default for QualityPreFilter {
    fn default() -> Self {
        Self::from_config(&DiscoveryConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{article, long_preview};

    #[test]
    fn test_keeps_well_formed_article() {
        let filter = QualityPreFilter::default();
        let a = article("a1", "Miners Strike Over Unsafe Shafts", 1934);
        assert_eq!(filter.check(&a), Ok(()));
    }

    #[test]
    fn test_rejection_reasons() {
        let filter = QualityPreFilter::default();

        let mut a = article("a", "Miners Strike Over Unsafe Shafts", 1934);
        a.title = None;
        assert_eq!(filter.check(&a), Err(Rejection::MissingTitle));

        let mut a = article("a", "Miners Strike Over Unsafe Shafts", 1934);
        a.content_preview = None;
        assert_eq!(filter.check(&a), Err(Rejection::MissingPreview));

        let mut a = article("a", "Miners Strike Over Unsafe Shafts", 1934);
        a.content_preview = Some("Too short to matter.".to_string());
        assert_eq!(filter.check(&a), Err(Rejection::ThinPreview(20)));

        let a = article("a", "Miners Strike Over Unsafe Shafts", 2015);
        assert_eq!(filter.check(&a), Err(Rejection::YearOutOfRange(2015)));

        for title in ["BY F. M. WILLIAMS", "PAGE 14", "FIRST PRESBYTERIAN.", "Abc"] {
            let a = article("a", title, 1930);
            assert!(matches!(filter.check(&a), Err(Rejection::Title(_))), "{} should be rejected", title);
        }
    }

    #[test]
    fn test_filter_preserves_order_and_is_deterministic() {
        let filter = QualityPreFilter::default();
        let articles = vec![
            article("1", "Flood Sweeps Valley Towns", 1927),
            article("2", "PAGE 3", 1927),
            article("3", "Senate Passes Relief Bill", 1933),
            article("4", "Airship Lands at Lakehurst", 1899 + 200),
        ];

        let first: Vec<_> = filter.filter(&articles).into_iter().map(|a| a.id).collect();
        assert_eq!(first, vec!["1", "3"]);

        for a in &articles {
            let decision = filter.keep(a);
            for _ in 0..5 {
                assert_eq!(filter.keep(a), decision);
                assert_eq!(filter.filter(std::slice::from_ref(a)).len(), decision as usize);
            }
        }
    }

    #[test]
    fn test_preview_threshold_counts_characters() {
        let filter = QualityPreFilter::new(300, YearRange::all());
        let mut a = article("a", "Strike Ends at Dawn", 1930);
        a.content_preview = Some("é".repeat(299));
        assert_eq!(filter.check(&a), Err(Rejection::ThinPreview(299)));
        a.content_preview = Some(long_preview("é", 300));
        assert_eq!(filter.check(&a), Ok(()));
    }
}

use sm_core::{
    ArticleRecord, ArticleStore, CompletionModel, DiscoverOptions, DiscoveryMetadata, DiscoveryResult,
    DiscoverySource, ExploreResult, QueryKey, Result, StoryCandidate, StoryOrigin, YearRange,
};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};
use crate::config::DiscoveryConfig;
use crate::dispatcher::{BatchDispatcher, DispatchContext};
use crate::fallback::{curated_stories, find_curated};
use crate::filter::QualityPreFilter;
use crate::heuristic::HeuristicStoryBuilder;
use crate::pagination::{PaginationStore, PaginationTracker};
use crate::taxonomy::TAXONOMY;

/// Entry point for discovery and exploration.
///
/// `discover` never fails: storage outages yield curated stories, completion
/// outages yield rule-based ones.
pub struct DiscoveryEngine {
    storage: Arc<dyn ArticleStore>,
    pagination: Arc<dyn PaginationStore>,
    config: DiscoveryConfig,
    filter: QualityPreFilter,
    builder: HeuristicStoryBuilder,
    dispatcher: BatchDispatcher,
}

struct Page {
    articles: Vec<ArticleRecord>,
    offset: u64,
}

impl DiscoveryEngine {
    pub fn new(storage: Arc<dyn ArticleStore>, model: Arc<dyn CompletionModel>, config: DiscoveryConfig) -> Self {
        Self::with_pagination(storage, model, Arc::new(PaginationTracker::new()), config)
    }

    pub fn with_pagination(
        storage: Arc<dyn ArticleStore>,
        model: Arc<dyn CompletionModel>,
        pagination: Arc<dyn PaginationStore>,
        config: DiscoveryConfig,
    ) -> Self {
        info!("🚀 Discovery engine ready (model: {}, batch size {}, {} concurrent calls, taxonomy v{})",
            model.name(), config.batch_size, config.concurrency, TAXONOMY.version);
        Self {
            filter: QualityPreFilter::from_config(&config),
            builder: HeuristicStoryBuilder::default(),
            dispatcher: BatchDispatcher::new(model, &config),
            storage,
            pagination,
            config,
        }
    }

    pub fn config(&self) -> &DiscoveryConfig {
        &self.config
    }

    pub fn pagination(&self) -> &Arc<dyn PaginationStore> {
        &self.pagination
    }

    pub async fn discover(&self, options: DiscoverOptions) -> DiscoveryResult {
        let years = YearRange::parse_optional(options.year_range.as_deref()).unwrap_or_else(|e| {
            warn!("⚠️ {}; searching all years", e);
            YearRange::all()
        });
        let key = QueryKey::new(options.category.as_deref(), years);
        let requested = self.config.requested_count(options.count);
        self.discover_key(&key, requested).await
    }

    /// Discover up to `requested` stories for `key`. Counts above the
    /// configured maximum are capped and reported as unfulfilled.
    pub async fn discover_key(&self, key: &QueryKey, requested: usize) -> DiscoveryResult {
        let count = self.config.story_target(requested);
        if count < requested {
            warn!("⚠️ Requested {} stories, capping at {}", requested, count);
        }
        info!("🔍 Discovering {} stories for {}", count, key);
        if count == 0 {
            return self.result(key, Vec::new(), requested, 0, 0);
        }

        let page = match self.fetch_page(key).await {
            Ok(page) => page,
            Err(e) => {
                warn!("⚠️ Article storage unavailable, serving curated stories: {}", e);
                return self.fallback_result(key, requested);
            }
        };
        if page.articles.is_empty() {
            info!("📭 No articles found for {}", key);
            return self.result(key, Vec::new(), requested, 0, page.offset);
        }

        let survivors = self.filter.filter(&page.articles);
        debug!("{} of {} articles passed the pre-filter", survivors.len(), page.articles.len());

        let (fast, rest): (Vec<ArticleRecord>, Vec<ArticleRecord>) = survivors.into_iter()
            .partition(|a| a.existing_potential.map_or(false, |p| p > self.config.fast_track_threshold));
        let mut stories: Vec<StoryCandidate> = fast.iter()
            .filter_map(|a| self.builder.build_with_origin(a, StoryOrigin::FastTrack))
            .collect();
        if !stories.is_empty() {
            info!("⚡ Fast-tracked {} articles with known documentary scores", stories.len());
        }

        let ctx = DispatchContext::from(key);
        let round_size = self.config.dispatch_round.max(1);
        let mut pending = rest.as_slice();
        while stories.len() < count && !pending.is_empty() {
            let (round, remaining) = pending.split_at(pending.len().min(round_size));
            pending = remaining;
            stories.extend(self.dispatcher.dispatch(round, &ctx).await);
        }

        if stories.len() < count {
            self.pad(&mut stories, &page.articles, count);
        }

        self.result(key, stories, requested, page.articles.len(), page.offset)
    }

    /// Reads the next page for `key` while holding its lock, starting over once
    /// when the current offset is past the end.
    async fn fetch_page(&self, key: &QueryKey) -> Result<Page> {
        let _guard = self.pagination.lock(key).await;
        let mut offset = self.pagination.get(key).await;
        let mut articles = self.fetch_at(key, offset).await?;

        if articles.is_empty() && offset > 0 {
            info!("🔁 Offset {} exhausted for {}, starting over", offset, key);
            self.pagination.reset(key).await;
            offset = 0;
            articles = self.fetch_at(key, offset).await?;
        }

        if !articles.is_empty() {
            let next = self.pagination.advance(key, articles.len() as u64).await;
            debug!("Read {} articles for {} at offset {}, next offset {}", articles.len(), key, offset, next);
        }
        Ok(Page { articles, offset })
    }

    async fn fetch_at(&self, key: &QueryKey, offset: u64) -> Result<Vec<ArticleRecord>> {
        self.storage
            .fetch_articles(key.category_filter(), key.years, self.config.fetch_limit, offset)
            .await
    }

    /// Fill a shortfall with rule-based stories from page articles not yet used.
    fn pad(&self, stories: &mut Vec<StoryCandidate>, page: &[ArticleRecord], count: usize) {
        let mut used: HashSet<String> = stories.iter()
            .filter_map(|s| s.source_article_id.clone())
            .collect();
        let before = stories.len();

        for article in page {
            if stories.len() >= count {
                break;
            }
            if used.contains(&article.id) {
                continue;
            }
            if let Some(story) = self.builder.build(article) {
                used.insert(article.id.clone());
                stories.push(story);
            }
        }

        if stories.len() > before {
            info!("🧩 Padded with {} rule-based stories", stories.len() - before);
        }
    }

    fn result(
        &self,
        key: &QueryKey,
        mut stories: Vec<StoryCandidate>,
        requested: usize,
        articles_analyzed: usize,
        offset: u64,
    ) -> DiscoveryResult {
        rank(&mut stories);
        stories.truncate(self.config.story_target(requested));

        let by_origin = |origin: StoryOrigin| stories.iter().filter(|s| s.origin == origin).count();
        let completion_stories = by_origin(StoryOrigin::Completion);
        let heuristic_stories = by_origin(StoryOrigin::Heuristic);
        let fast_tracked = by_origin(StoryOrigin::FastTrack);
        let fulfilled = stories.len() == requested;
        if !fulfilled {
            info!("📉 Only {} of {} requested stories available for {}", stories.len(), requested, key);
        }
        info!("✅ Discovery complete for {}: {} stories ({} from {})",
            key, stories.len(), completion_stories, self.dispatcher.model_name());

        DiscoveryResult {
            success: true,
            metadata: DiscoveryMetadata {
                source: if completion_stories > 0 { DiscoverySource::Completion } else { DiscoverySource::Heuristic },
                category: key.category.clone(),
                year_range: key.years.to_string(),
                articles_analyzed,
                stories_generated: stories.len(),
                fulfilled,
                offset,
                fast_tracked,
                completion_stories,
                heuristic_stories,
            },
            stories,
        }
    }

    fn fallback_result(&self, key: &QueryKey, requested: usize) -> DiscoveryResult {
        let stories = curated_stories(key.category_filter(), key.years, self.config.story_target(requested));
        DiscoveryResult {
            success: true,
            metadata: DiscoveryMetadata {
                source: DiscoverySource::Fallback,
                category: key.category.clone(),
                year_range: key.years.to_string(),
                articles_analyzed: 0,
                stories_generated: stories.len(),
                fulfilled: stories.len() == requested,
                offset: 0,
                fast_tracked: 0,
                completion_stories: 0,
                heuristic_stories: 0,
            },
            stories,
        }
    }

    /// Deep dive into one article. Curated stories resolve by their own ids.
    pub async fn explore(&self, story_id: &str) -> ExploreResult {
        let article = match self.storage.get_article(story_id).await {
            Ok(article) => article,
            Err(e) => {
                warn!("⚠️ Article storage unavailable while exploring {}: {}", story_id, e);
                None
            }
        };

        let story = match article {
            Some(article) => {
                let category = article.category.as_deref().map(str::to_lowercase).unwrap_or_else(|| "all".to_string());
                let ctx = DispatchContext::new(category, YearRange::all());
                self.dispatcher.analyze(&article, &ctx).await
            }
            None => find_curated(story_id),
        };

        if story.is_none() {
            info!("❓ No story found for {}", story_id);
        }
        ExploreResult { success: story.is_some(), story }
    }
}

/// Dedupe by source article, then order by documentary potential with
/// narrative score breaking ties.
fn rank(stories: &mut Vec<StoryCandidate>) {
    stories.sort_by(|a, b| {
        b.documentary_potential.cmp(&a.documentary_potential)
            .then(b.narrative_score.cmp(&a.narrative_score))
    });
    let mut seen = HashSet::new();
    stories.retain(|s| seen.insert(s.source_article_id.clone().unwrap_or_else(|| s.id.clone())));
}

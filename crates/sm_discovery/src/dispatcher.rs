use sm_core::{
    ArticleRecord, CompletionModel, Error, QueryKey, Result, StoryCandidate, StoryOrigin, YearRange,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use crate::config::DiscoveryConfig;
use crate::heuristic::HeuristicStoryBuilder;
use crate::parser::{ParsedStory, ResponseParser};
use crate::pool::BoundedPool;

const BASELINE_POTENTIAL: u8 = 75;
const BASELINE_NARRATIVE: u8 = 70;

/// What the caller asked for, used to frame prompts and default categories.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchContext {
    pub category: String,
    pub years: YearRange,
}

impl DispatchContext {
    pub fn new(category: impl Into<String>, years: YearRange) -> Self {
        Self { category: category.into(), years }
    }

    fn category_hint(&self) -> Option<String> {
        if self.category == "all" { None } else { Some(self.category.clone()) }
    }
}

impl From<&QueryKey> for DispatchContext {
    fn from(key: &QueryKey) -> Self {
        Self::new(key.category.clone(), key.years)
    }
}

#[derive(Debug, Clone, Default)]
pub struct DispatchReport {
    pub stories: Vec<StoryCandidate>,
    pub batches: usize,
    pub failed_batches: usize,
}

/// Splits articles into batches and runs them against the completion model
/// with bounded concurrency. Batches that fail fall back to the heuristic builder.
#[derive(Debug, Clone)]
pub struct BatchDispatcher {
    model: Arc<dyn CompletionModel>,
    pool: BoundedPool,
    parser: ResponseParser,
    builder: HeuristicStoryBuilder,
    batch_size: usize,
    preview_chars: usize,
    call_timeout: Duration,
}

impl BatchDispatcher {
    pub fn new(model: Arc<dyn CompletionModel>, config: &DiscoveryConfig) -> Self {
        Self {
            model,
            pool: BoundedPool::new(config.concurrency),
            parser: ResponseParser::default(),
            builder: HeuristicStoryBuilder::default(),
            batch_size: config.batch_size.max(1),
            preview_chars: config.prompt_preview_chars,
            call_timeout: config.call_timeout,
        }
    }

    pub fn model_name(&self) -> &str {
        self.model.name()
    }

    pub fn partition<'a>(&self, articles: &'a [ArticleRecord]) -> Vec<&'a [ArticleRecord]> {
        articles.chunks(self.batch_size).collect()
    }

    pub async fn dispatch(&self, articles: &[ArticleRecord], ctx: &DispatchContext) -> Vec<StoryCandidate> {
        self.dispatch_report(articles, ctx).await.stories
    }

    pub async fn dispatch_report(&self, articles: &[ArticleRecord], ctx: &DispatchContext) -> DispatchReport {
        let batches = self.partition(articles);
        if batches.is_empty() {
            return DispatchReport::default();
        }
        info!("📦 Dispatching {} articles in {} batches to {} ({} in flight)",
            articles.len(), batches.len(), self.model.name(), self.pool.limit());

        let outcomes = self.pool
            .run_all(batches.iter().map(|batch| self.run_batch(batch, ctx)))
            .await;

        let mut report = DispatchReport { batches: batches.len(), ..Default::default() };
        for (i, (batch, outcome)) in batches.iter().zip(outcomes).enumerate() {
            match outcome {
                Ok(stories) => {
                    debug!("Batch {} produced {} stories from {} articles", i + 1, stories.len(), batch.len());
                    report.stories.extend(stories);
                }
                Err(e) => {
                    warn!("⚠️ Batch {} failed, using heuristics: {}", i + 1, e);
                    report.failed_batches += 1;
                    report.stories.extend(batch.iter().filter_map(|a| self.builder.build(a)));
                }
            }
        }
        info!("✨ Dispatch finished: {} stories, {}/{} batches failed",
            report.stories.len(), report.failed_batches, report.batches);
        report
    }

    /// Single-article deep dive, falling back to the heuristic builder.
    pub async fn analyze(&self, article: &ArticleRecord, ctx: &DispatchContext) -> Option<StoryCandidate> {
        match self.run_batch(std::slice::from_ref(article), ctx).await {
            Ok(stories) if !stories.is_empty() => stories.into_iter().next(),
            Ok(_) => self.builder.build(article),
            Err(e) => {
                warn!("⚠️ Analysis of article {} failed, using heuristics: {}", article.id, e);
                self.builder.build(article)
            }
        }
    }

    async fn run_batch(&self, batch: &[ArticleRecord], ctx: &DispatchContext) -> Result<Vec<StoryCandidate>> {
        let prompt = self.build_prompt(batch, ctx);
        let raw = tokio::time::timeout(self.call_timeout, self.model.complete(&prompt))
            .await
            .map_err(|_| Error::Completion(format!("no response within {:?}", self.call_timeout)))??;
        let parsed = self.parser.parse(&raw)?;
        debug!("Parsed {} stories with the {} strategy", parsed.stories.len(), parsed.strategy);
        Ok(self.assign_stories(batch, parsed.stories, ctx))
    }

    pub fn build_prompt(&self, batch: &[ArticleRecord], ctx: &DispatchContext) -> String {
        let scope = match ctx.category_hint() {
            Some(category) => format!("{} coverage from {}", category, ctx.years),
            None => format!("coverage from {}", ctx.years),
        };

        let mut prompt = format!(
            "You are a documentary researcher reviewing historical newspaper {}.\n\
             Propose one documentary story for EVERY article below. Return ALL {} articles; do not skip any.\n\n\
             ARTICLES:\n",
            scope,
            batch.len()
        );
        for (i, article) in batch.iter().enumerate() {
            prompt.push_str(&format!(
                "{}. ID: {} | YEAR: {} | TITLE: {}\n   PREVIEW: {}\n",
                i + 1,
                article.id,
                article.year,
                collapse(article.title_str()),
                truncate_chars(&collapse(article.preview_str()), self.preview_chars),
            ));
        }
        prompt.push_str(
            "\nRespond with JSON only, in exactly this shape:\n\
             {\"stories\": [{\"article_id\": \"<ID from the list>\", \"title\": \"...\", \"summary\": \"...\", \
             \"year\": 1900, \"category\": \"...\", \"documentary_potential\": 0-100, \"narrative_score\": 0-100, \
             \"themes\": [\"...\"], \"production_notes\": \"...\"}]}\n",
        );
        prompt
    }

    /// Tie parsed stories to batch articles: by `article_id` first, then in
    /// order over the articles nobody claimed. Stories left over are dropped.
    fn assign_stories(&self, batch: &[ArticleRecord], drafts: Vec<ParsedStory>, ctx: &DispatchContext) -> Vec<StoryCandidate> {
        let mut claimed = vec![false; batch.len()];
        let mut assigned: Vec<(usize, ParsedStory)> = Vec::new();
        let mut unmatched = Vec::new();

        for draft in drafts {
            let position = draft.article_id.as_deref()
                .and_then(|id| batch.iter().position(|a| a.id == id));
            match position {
                Some(i) if claimed[i] => debug!("Dropping duplicate story for article {}", batch[i].id),
                Some(i) => {
                    claimed[i] = true;
                    assigned.push((i, draft));
                }
                None => unmatched.push(draft),
            }
        }

        for draft in unmatched {
            match claimed.iter().position(|c| !c) {
                Some(i) => {
                    claimed[i] = true;
                    assigned.push((i, draft));
                }
                None => debug!("Dropping story {:?} with no source article left", draft.title),
            }
        }

        assigned.sort_by_key(|(i, _)| *i);
        assigned.into_iter()
            .map(|(i, draft)| self.to_candidate(&batch[i], draft, ctx))
            .collect()
    }

    fn to_candidate(&self, article: &ArticleRecord, draft: ParsedStory, ctx: &DispatchContext) -> StoryCandidate {
        if let Some(year) = draft.year.filter(|y| *y != article.year) {
            debug!("Story for {} claims year {}, keeping article year {}", article.id, year, article.year);
        }

        let (heuristic_category, heuristic_themes) = self.builder.classify(article);
        let category = draft.category
            .or_else(|| ctx.category_hint())
            .unwrap_or(heuristic_category);
        let themes = if draft.themes.is_empty() { heuristic_themes } else { draft.themes };
        let summary = match draft.summary {
            Some(summary) => summary,
            None => self.builder.summarize(&draft.title, article, &category),
        };
        let production_notes = match draft.production_notes {
            Some(notes) => format!("{} (from {} reporting)", notes, article.year),
            None => format!("Drawn from {} reporting.", article.year),
        };

        StoryCandidate {
            id: article.id.clone(),
            title: draft.title,
            summary,
            year: article.year,
            category,
            documentary_potential: draft.documentary_potential.unwrap_or(BASELINE_POTENTIAL),
            narrative_score: draft.narrative_score.unwrap_or(BASELINE_NARRATIVE),
            themes,
            production_notes,
            source_article_id: Some(article.id.clone()),
            origin: StoryOrigin::Completion,
        }
    }
}

fn collapse(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{article, ScriptedModel};

    fn batch(n: usize) -> Vec<ArticleRecord> {
        (0..n).map(|i| article(&format!("a{}", i), &format!("Pennant Race Story Number {}", i), 1952)).collect()
    }

    fn ctx() -> DispatchContext {
        DispatchContext::new("sports", YearRange::new(1950, 1955).unwrap())
    }

    fn dispatcher(model: Arc<dyn CompletionModel>) -> BatchDispatcher {
        BatchDispatcher::new(model, &DiscoveryConfig::default())
    }

    fn draft(article_id: Option<&str>, title: &str) -> ParsedStory {
        ParsedStory {
            article_id: article_id.map(str::to_string),
            title: title.to_string(),
            summary: None,
            year: None,
            category: None,
            documentary_potential: None,
            narrative_score: None,
            themes: Vec::new(),
            production_notes: None,
        }
    }

    #[test]
    fn test_partition_into_batches_of_ten() {
        let d = dispatcher(Arc::new(ScriptedModel::echo()));
        let articles = batch(23);
        let sizes: Vec<usize> = d.partition(&articles).iter().map(|b| b.len()).collect();
        assert_eq!(sizes, vec![10, 10, 3]);
        assert!(d.partition(&[]).is_empty());
    }

    #[test]
    fn test_prompt_is_compact_and_complete() {
        let d = dispatcher(Arc::new(ScriptedModel::echo()));
        let mut articles = batch(2);
        articles[0].content_preview = Some("x".repeat(1000));

        let prompt = d.build_prompt(&articles, &ctx());
        assert!(prompt.contains("sports coverage from 1950-1955"));
        assert!(prompt.contains("Return ALL 2 articles"));
        assert!(prompt.contains("1. ID: a0 | YEAR: 1952 | TITLE: Pennant Race Story Number 0"));
        assert!(prompt.contains("2. ID: a1 |"));
        assert!(prompt.contains("\"article_id\""));
        assert!(prompt.contains(&format!("PREVIEW: {}...", "x".repeat(280))));
        assert!(!prompt.contains(&"x".repeat(281)));
    }

    #[test]
    fn test_assign_by_id_then_position() {
        let d = dispatcher(Arc::new(ScriptedModel::echo()));
        let articles = batch(3);
        let drafts = vec![
            draft(Some("a2"), "Third Article Story"),
            draft(None, "Unlabelled Story Goes First"),
            draft(Some("a2"), "Duplicate For Third"),
            draft(Some("zzz"), "Unknown Id Story"),
            draft(None, "One Story Too Many"),
        ];

        let stories = d.assign_stories(&articles, drafts, &ctx());
        let pairs: Vec<(&str, &str)> = stories.iter().map(|s| (s.id.as_str(), s.title.as_str())).collect();
        assert_eq!(pairs, vec![
            ("a0", "Unlabelled Story Goes First"),
            ("a1", "Unknown Id Story"),
            ("a2", "Third Article Story"),
        ]);
        assert!(stories.iter().all(|s| s.origin == StoryOrigin::Completion));
        assert!(stories.iter().all(|s| s.category == "sports"));
        assert!(stories.iter().all(|s| s.production_notes.contains("1952")));
        assert_eq!(stories[0].documentary_potential, 75);
    }

    #[tokio::test]
    async fn test_dispatch_with_working_model() {
        let model = Arc::new(ScriptedModel::echo());
        let d = dispatcher(model.clone());
        let report = d.dispatch_report(&batch(25), &ctx()).await;

        assert_eq!(report.batches, 3);
        assert_eq!(report.failed_batches, 0);
        assert_eq!(report.stories.len(), 25);
        assert_eq!(model.calls(), 3);
        assert!(model.peak_in_flight() <= 3);
        assert_eq!(report.stories[0].themes, vec!["Archival Drama"]);
        assert_eq!(report.stories[0].production_notes, "Strong photographic record (from 1952 reporting)");
    }

    #[tokio::test]
    async fn test_failed_batches_fall_back_to_heuristics() {
        let d = dispatcher(Arc::new(ScriptedModel::failing()));
        let report = d.dispatch_report(&batch(12), &ctx()).await;

        assert_eq!(report.batches, 2);
        assert_eq!(report.failed_batches, 2);
        assert_eq!(report.stories.len(), 12);
        assert!(report.stories.iter().all(|s| s.origin == StoryOrigin::Heuristic));
    }

    #[tokio::test]
    async fn test_analyze_falls_back() {
        let a = article("solo", "Pennant Race Goes to the Wire", 1951);

        let story = dispatcher(Arc::new(ScriptedModel::echo())).analyze(&a, &ctx()).await.unwrap();
        assert_eq!(story.origin, StoryOrigin::Completion);

        let story = dispatcher(Arc::new(ScriptedModel::failing())).analyze(&a, &ctx()).await.unwrap();
        assert_eq!(story.origin, StoryOrigin::Heuristic);
        assert_eq!(story.category, "sports");
    }
}

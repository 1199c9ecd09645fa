use async_trait::async_trait;
use serde_json::json;
use sm_core::{ArticleRecord, ArticleStore, CompletionModel, Error, Result, YearRange};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

const FILLER: &str = "Witnesses described the scene in careful detail and named those who were present. \
    Reporters spoke with residents about what they had seen and heard that afternoon. ";

/// Exactly `chars` characters built by cycling `seed`.
pub fn long_preview(seed: &str, chars: usize) -> String {
    seed.chars().cycle().take(chars).collect()
}

/// A structurally sound article whose preview carries no category keywords.
pub fn article(id: &str, title: &str, year: i32) -> ArticleRecord {
    ArticleRecord {
        id: id.to_string(),
        title: Some(title.to_string()),
        content_preview: Some(FILLER.repeat(3)),
        content_length: 2000,
        publication_date: None,
        year,
        category: None,
        existing_potential: None,
        existing_narrative_score: None,
    }
}

pub fn article_in(id: &str, title: &str, year: i32, category: &str) -> ArticleRecord {
    ArticleRecord {
        category: Some(category.to_string()),
        ..article(id, title, year)
    }
}

/// Insertion-ordered store that records the offsets it was asked for.
#[derive(Default)]
pub struct MockStore {
    articles: Vec<ArticleRecord>,
    unavailable: bool,
    pub offsets: Mutex<Vec<u64>>,
}

impl MockStore {
    pub fn new(articles: Vec<ArticleRecord>) -> Self {
        Self { articles, ..Default::default() }
    }

    pub fn unavailable() -> Self {
        Self { unavailable: true, ..Default::default() }
    }

    pub fn offsets(&self) -> Vec<u64> {
        self.offsets.lock().unwrap().clone()
    }
}

#[async_trait]
impl ArticleStore for MockStore {
    async fn fetch_articles(
        &self,
        category: Option<&str>,
        years: YearRange,
        limit: usize,
        offset: u64,
    ) -> Result<Vec<ArticleRecord>> {
        if self.unavailable {
            return Err(Error::StorageUnavailable("connection refused".to_string()));
        }
        self.offsets.lock().unwrap().push(offset);
        Ok(self.articles.iter()
            .filter(|a| category.map_or(true, |c| a.category.as_deref().map_or(false, |ac| ac.eq_ignore_ascii_case(c))))
            .filter(|a| years.contains(a.year))
            .skip(offset as usize)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn get_article(&self, id: &str) -> Result<Option<ArticleRecord>> {
        if self.unavailable {
            return Err(Error::StorageUnavailable("connection refused".to_string()));
        }
        Ok(self.articles.iter().find(|a| a.id == id).cloned())
    }

    async fn store_article(&self, _article: &ArticleRecord) -> Result<()> {
        Err(Error::StorageUnavailable("read-only mock".to_string()))
    }
}

/// Completion model that answers every `ID: .. | YEAR: .. | TITLE: ..` prompt line
/// with a story, optionally failing or under-delivering.
#[derive(Debug, Default)]
pub struct ScriptedModel {
    fail: bool,
    per_call: Option<usize>,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

impl ScriptedModel {
    pub fn echo() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self { fail: true, ..Default::default() }
    }

    /// Answers for at most `n` articles per call
    pub fn at_most(n: usize) -> Self {
        Self { per_call: Some(n), ..Default::default() }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn peak_in_flight(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

fn prompt_articles(prompt: &str) -> Vec<(String, String)> {
    prompt.lines()
        .filter_map(|line| line.split_once("ID: "))
        .filter_map(|(_, rest)| {
            let (id, rest) = rest.split_once(" | YEAR: ")?;
            let (_, title) = rest.split_once(" | TITLE: ")?;
            Some((id.trim().to_string(), title.trim().to_string()))
        })
        .collect()
}

#[async_trait]
impl CompletionModel for ScriptedModel {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, prompt: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(15)).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.fail {
            return Err(Error::Completion("503 service unavailable".to_string()));
        }

        let stories: Vec<_> = prompt_articles(prompt)
            .into_iter()
            .take(self.per_call.unwrap_or(usize::MAX))
            .enumerate()
            .map(|(i, (id, title))| json!({
                "article_id": id,
                "title": title,
                "summary": format!("A documentary treatment of {}.", title),
                "documentary_potential": 90 - i as u64,
                "narrative_score": 80,
                "themes": ["Archival Drama"],
                "production_notes": "Strong photographic record",
            }))
            .collect();

        Ok(format!("Here are the stories:\n{}\n", json!({ "stories": stories })))
    }
}

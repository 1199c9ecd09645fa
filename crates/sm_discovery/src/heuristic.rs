//! Rule-based story construction, used both to fast-track articles with known
//! scores and as the last resort when the completion service lets us down.

use sm_core::{ArticleRecord, Error, Result, StoryCandidate, StoryOrigin};
use tracing::debug;
use crate::taxonomy::{validate_title, Taxonomy, TAXONOMY};

const BASELINE_POTENTIAL: u8 = 75;
const BASELINE_NARRATIVE: u8 = 70;
const MAX_THEMES: usize = 3;
const QUOTE_CHARS: usize = 200;
const DEFAULT_CATEGORY: &str = "general";
const DEFAULT_THEME: &str = "Local History";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Era {
    PreDepression,
    Depression,
    Wartime,
    PostWar,
}

impl Era {
    pub fn from_year(year: i32) -> Self {
        match year {
            y if y < 1930 => Era::PreDepression,
            1930..=1939 => Era::Depression,
            1940..=1945 => Era::Wartime,
            _ => Era::PostWar,
        }
    }

    fn context(self) -> &'static str {
        match self {
            Era::PreDepression => "Set in the years before the Great Depression, it reflects a nation rushing into modern life.",
            Era::Depression => "Unfolding during the Great Depression, it shows a country under severe economic strain.",
            Era::Wartime => "Reported during the Second World War, it carries the urgency of a nation at war.",
            Era::PostWar => "From the post-war years, it captures a society remaking itself after victory.",
        }
    }
}

#[derive(Debug, Clone)]
pub struct HeuristicStoryBuilder {
    taxonomy: &'static Taxonomy,
}

impl Default for HeuristicStoryBuilder {
    fn default() -> Self {
        Self { taxonomy: &TAXONOMY }
    }
}

impl HeuristicStoryBuilder {
    pub fn new(taxonomy: &'static Taxonomy) -> Self {
        Self { taxonomy }
    }

    pub fn build(&self, article: &ArticleRecord) -> Option<StoryCandidate> {
        self.build_with_origin(article, StoryOrigin::Heuristic)
    }

    /// Never fails: any problem with the article yields `None`.
    pub fn build_with_origin(&self, article: &ArticleRecord, origin: StoryOrigin) -> Option<StoryCandidate> {
        match self.try_build(article, origin) {
            Ok(story) => Some(story),
            Err(e) => {
                debug!("Heuristic builder skipped article {}: {}", article.id, e);
                None
            }
        }
    }

    fn try_build(&self, article: &ArticleRecord, origin: StoryOrigin) -> Result<StoryCandidate> {
        let title = article.title.as_deref()
            .map(tidy)
            .ok_or_else(|| Error::Validation("missing title".to_string()))?;
        validate_title(&title).map_err(|e| Error::Validation(e.to_string()))?;

        let (category, themes) = self.classify(article);
        let summary = self.summarize(&title, article, &category);

        Ok(StoryCandidate {
            id: article.id.clone(),
            title,
            summary,
            year: article.year,
            production_notes: format!(
                "Rule-based selection from {} {} coverage; archival newspaper reporting available.",
                article.year, category
            ),
            category,
            documentary_potential: article.existing_potential.unwrap_or(BASELINE_POTENTIAL),
            narrative_score: article.existing_narrative_score.unwrap_or(BASELINE_NARRATIVE),
            themes,
            source_article_id: Some(article.id.clone()),
            origin,
        })
    }

    /// Category and up to three themes from keyword hits over title and preview.
    pub fn classify(&self, article: &ArticleRecord) -> (String, Vec<String>) {
        let text = format!("{} {}", article.title_str(), article.preview_str());
        let hits = self.taxonomy.classify(&text);

        let category = hits.first()
            .map(|(rule, _)| rule.name.to_string())
            .or_else(|| article.category.as_ref().map(|c| c.to_lowercase()))
            .unwrap_or_else(|| DEFAULT_CATEGORY.to_string());

        let mut themes: Vec<String> = hits.iter()
            .take(MAX_THEMES)
            .map(|(rule, _)| rule.theme.to_string())
            .collect();
        if themes.is_empty() {
            themes.push(DEFAULT_THEME.to_string());
        }
        (category, themes)
    }

    /// Templated summary keyed on category and historical era.
    pub fn summarize(&self, title: &str, article: &ArticleRecord, category: &str) -> String {
        let lead = match category {
            "politics" => "captures a contest for political power and the people caught up in it.",
            "crime" => "follows a crime that gripped the community and the search for justice that followed.",
            "war" => "documents how conflict reached into ordinary lives.",
            "business" => "traces the fortunes of workers, owners and markets in a changing economy.",
            "sports" => "recounts a sporting contest and the personalities who made it memorable.",
            "social-history" => "reveals the changing roles of women in public and private life.",
            "reform" => "chronicles citizens organizing to demand change.",
            "education" => "explores the struggle for learning and opportunity.",
            "entertainment" => "revisits the stage, screen and sound that entertained a generation.",
            _ => "offers a window into everyday life as it was reported at the time.",
        };

        let mut summary = format!("\"{}\" {} {}", title, lead, Era::from_year(article.year).context());
        if let Some(quote) = first_sentence(article.preview_str()) {
            summary.push_str(&format!(" The original report begins: \"{}\"", quote));
        }
        summary
    }
}

fn tidy(title: &str) -> String {
    title.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn first_sentence(preview: &str) -> Option<String> {
    let preview = tidy(preview);
    if preview.is_empty() {
        return None;
    }
    let end = preview.find(|c: char| matches!(c, '.' | '!' | '?')).map(|i| i + 1).unwrap_or(preview.len());
    let sentence: String = preview[..end].chars().take(QUOTE_CHARS).collect();
    Some(sentence)
}

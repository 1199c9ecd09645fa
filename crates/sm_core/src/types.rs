use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use crate::Error;

/// Oldest publication year the corpus is expected to carry
pub const EARLIEST_YEAR: i32 = 1800;
/// Newest publication year the corpus is expected to carry
pub const LATEST_YEAR: i32 = 1999;

/// An article row as read from storage. Scores are already normalized to 0-100.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ArticleRecord {
    pub id: String,
    pub title: Option<String>,
    pub content_preview: Option<String>,
    pub content_length: usize,
    pub publication_date: Option<NaiveDate>,
    pub year: i32,
    pub category: Option<String>,
    pub existing_potential: Option<u8>,
    pub existing_narrative_score: Option<u8>,
}

impl ArticleRecord {
    pub fn title_str(&self) -> &str {
        self.title.as_deref().unwrap_or("")
    }

    pub fn preview_str(&self) -> &str {
        self.content_preview.as_deref().unwrap_or("")
    }
}

/// Map a score that may be expressed as a 0-1 fraction or a 0-100 value onto 0-100.
pub fn normalize_score(value: f64) -> u8 {
    if !value.is_finite() || value <= 0.0 {
        return 0;
    }
    let scaled = if value <= 1.0 { value * 100.0 } else { value };
    scaled.round().min(100.0) as u8
}

/// Inclusive range of publication years.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct YearRange {
    pub start: i32,
    pub end: i32,
}

impl YearRange {
    pub fn new(start: i32, end: i32) -> crate::Result<Self> {
        if start > end {
            return Err(Error::Validation(format!("year range {}-{} is reversed", start, end)));
        }
        Ok(Self { start, end })
    }

    /// The full supported historical range
    pub fn all() -> Self {
        Self { start: EARLIEST_YEAR, end: LATEST_YEAR }
    }

    pub fn contains(&self, year: i32) -> bool {
        year >= self.start && year <= self.end
    }

    /// Parse an optional user-supplied range, treating absence as the full range.
    pub fn parse_optional(value: Option<&str>) -> crate::Result<Self> {
        match value {
            Some(v) => v.parse(),
            None => Ok(Self::all()),
        }
    }
}

impl Default for YearRange {
    fn default() -> Self {
        Self::all()
    }
}

impl fmt::Display for YearRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

impl FromStr for YearRange {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() || s.eq_ignore_ascii_case("all") {
            return Ok(Self::all());
        }

        let parse_year = |part: &str| {
            part.trim()
                .parse::<i32>()
                .map_err(|_| Error::Validation(format!("invalid year '{}' in range '{}'", part.trim(), s)))
        };

        match s.split_once('-') {
            Some((start, end)) => Self::new(parse_year(start)?, parse_year(end)?),
            None => {
                let year = parse_year(s)?;
                Self::new(year, year)
            }
        }
    }
}

/// Identifies one pagination lineage.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey {
    pub category: String,
    pub years: YearRange,
}

impl QueryKey {
    pub fn new(category: Option<&str>, years: YearRange) -> Self {
        let category = category
            .map(|c| c.trim().to_lowercase())
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| "all".to_string());
        Self { category, years }
    }

    /// The category to hand to storage, `None` meaning no filter
    pub fn category_filter(&self) -> Option<&str> {
        if self.category == "all" {
            None
        } else {
            Some(&self.category)
        }
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.category, self.years)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StoryOrigin {
    Completion,
    Heuristic,
    FastTrack,
    Curated,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StoryCandidate {
    pub id: String,
    pub title: String,
    pub summary: String,
    pub year: i32,
    pub category: String,
    pub documentary_potential: u8,
    pub narrative_score: u8,
    pub themes: Vec<String>,
    pub production_notes: String,
    pub source_article_id: Option<String>,
    pub origin: StoryOrigin,
}

/// Options accepted by the discovery entry point.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoverOptions {
    pub category: Option<String>,
    pub year_range: Option<String>,
    pub count: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiscoverySource {
    Completion,
    Heuristic,
    Fallback,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveryMetadata {
    pub source: DiscoverySource,
    pub category: String,
    pub year_range: String,
    pub articles_analyzed: usize,
    pub stories_generated: usize,
    pub fulfilled: bool,
    pub offset: u64,
    pub fast_tracked: usize,
    pub completion_stories: usize,
    pub heuristic_stories: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveryResult {
    pub success: bool,
    pub stories: Vec<StoryCandidate>,
    pub metadata: DiscoveryMetadata,
}

impl DiscoveryResult {
    pub fn fulfilled(&self) -> bool {
        self.metadata.fulfilled
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExploreResult {
    pub success: bool,
    pub story: Option<StoryCandidate>,
}

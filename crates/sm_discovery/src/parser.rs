//! Turns free-form completion output into story drafts.
//!
//! The completion service is a text generator, not a typed API, so its output is
//! read through an ordered list of increasingly forgiving strategies. The first
//! one that yields a JSON object with a `stories` array wins.

use lazy_static::lazy_static;
use regex::Regex;
use serde_json::{Map, Value};
use sm_core::{normalize_score, Error, Result};
use tracing::debug;
use crate::taxonomy::is_valid_title;

type Strategy = fn(&str) -> Result<Value>;

lazy_static! {
    static ref OBJECT_SPAN: Regex = Regex::new(r"(?s)\{.*\}").unwrap();
    static ref FENCED_BLOCK: Regex = Regex::new(r"(?s)```(?:json|JSON)?\s*(.*?)```").unwrap();
    static ref TRAILING_COMMA: Regex = Regex::new(r",\s*([}\]])").unwrap();
}

/// Story fields as proposed by the completion service, before they are tied to
/// a source article.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedStory {
    pub article_id: Option<String>,
    pub title: String,
    pub summary: Option<String>,
    pub year: Option<i32>,
    pub category: Option<String>,
    pub documentary_potential: Option<u8>,
    pub narrative_score: Option<u8>,
    pub themes: Vec<String>,
    pub production_notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParsedResponse {
    pub stories: Vec<ParsedStory>,
    /// Name of the strategy that produced the stories
    pub strategy: &'static str,
}

#[derive(Debug, Clone)]
pub struct ResponseParser {
    strategies: &'static [(&'static str, Strategy)],
}

const STRATEGIES: &[(&str, Strategy)] = &[
    ("object-span", parse_object_span),
    ("fenced-block", parse_fenced_block),
    ("cleaned-span", parse_cleaned_span),
];

impl Default for ResponseParser {
    fn default() -> Self {
        Self { strategies: STRATEGIES }
    }
}

impl ResponseParser {
    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|(name, _)| *name).collect()
    }

    pub fn parse(&self, raw: &str) -> Result<ParsedResponse> {
        let mut failures = Vec::new();
        for &(name, strategy) in self.strategies {
            let value = match strategy(raw) {
                Ok(value) => value,
                Err(e) => {
                    failures.push(format!("{}: {}", name, e));
                    continue;
                }
            };
            match value.get("stories").and_then(Value::as_array) {
                Some(entries) => {
                    let stories = entries.iter()
                        .filter_map(Value::as_object)
                        .filter_map(read_story)
                        .collect();
                    return Ok(ParsedResponse { stories, strategy: name });
                }
                None => failures.push(format!("{}: no stories array", name)),
            }
        }
        Err(Error::Parse(failures.join("; ")))
    }
}

fn parse_object_span(raw: &str) -> Result<Value> {
    let span = OBJECT_SPAN.find(raw)
        .ok_or_else(|| Error::Parse("no JSON object".to_string()))?;
    Ok(serde_json::from_str(span.as_str())?)
}

fn parse_fenced_block(raw: &str) -> Result<Value> {
    let inner = FENCED_BLOCK.captures(raw)
        .and_then(|c| c.get(1))
        .ok_or_else(|| Error::Parse("no fenced block".to_string()))?;
    Ok(serde_json::from_str(inner.as_str().trim())?)
}

fn parse_cleaned_span(raw: &str) -> Result<Value> {
    let span = OBJECT_SPAN.find(raw)
        .ok_or_else(|| Error::Parse("no JSON object".to_string()))?;
    let stripped: String = span.as_str().chars().filter(|c| !c.is_control()).collect();
    let cleaned = TRAILING_COMMA.replace_all(&stripped, "$1").replace('\'', "\"");
    Ok(serde_json::from_str(&cleaned)?)
}

fn field<'a>(obj: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().find_map(|k| obj.get(*k)).filter(|v| !v.is_null())
}

fn text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().trim_end_matches('%').parse().ok(),
        _ => None,
    }
}

fn read_story(obj: &Map<String, Value>) -> Option<ParsedStory> {
    let title = field(obj, &["title", "headline"]).and_then(text)?;
    if !is_valid_title(&title) {
        debug!("Dropping parsed story with invalid title: {:?}", title);
        return None;
    }

    let themes = match field(obj, &["themes", "theme"]) {
        Some(Value::Array(items)) => items.iter().filter_map(text).collect(),
        Some(Value::String(s)) => s.split(',').map(|t| t.trim().to_string()).filter(|t| !t.is_empty()).collect(),
        _ => Vec::new(),
    };

    Some(ParsedStory {
        article_id: field(obj, &["article_id", "articleId", "id"]).and_then(text),
        title,
        summary: field(obj, &["summary", "description"]).and_then(text),
        year: field(obj, &["year"]).and_then(number).map(|y| y as i32),
        category: field(obj, &["category"]).and_then(text).map(|c| c.to_lowercase()),
        documentary_potential: field(obj, &["documentary_potential", "documentaryPotential"])
            .and_then(number)
            .map(normalize_score),
        narrative_score: field(obj, &["narrative_score", "narrativeScore"])
            .and_then(number)
            .map(normalize_score),
        themes,
        production_notes: field(obj, &["production_notes", "productionNotes"]).and_then(text),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const BODY: &str = r#"{"stories": [
        {"article_id": "a1", "title": "Bonus Army Marches on Washington", "summary": "Veterans camp in the capital.",
         "year": 1932, "category": "Reform", "documentary_potential": 88, "narrative_score": 81,
         "themes": ["Protest", "Veterans"], "production_notes": "Newsreel footage survives"},
        {"article_id": "a2", "title": "Dust Storm Buries Kansas Farms", "documentary_potential": 0.7,
         "narrative_score": "64", "themes": "Drought, Migration"}
    ]}"#;

    #[test]
    fn test_equivalent_wrappings_parse_the_same() {
        let parser = ResponseParser::default();

        let prose = format!("Here are the stories you asked for:\n{}\nLet me know if you need more.", BODY);
        let fenced = format!("```json\n{}\n```\nNote: scores use the usual {{0-100}} scale.", BODY);
        let sloppy = BODY.replace('"', "'").replace("]}", "],}").replace("'Veterans']", "'Veterans',]");

        let from_prose = parser.parse(&prose).unwrap();
        let from_fence = parser.parse(&fenced).unwrap();
        let from_sloppy = parser.parse(&sloppy).unwrap();

        assert_eq!(from_prose.strategy, "object-span");
        assert_eq!(from_fence.strategy, "fenced-block");
        assert_eq!(from_sloppy.strategy, "cleaned-span");

        assert_eq!(from_prose.stories, from_fence.stories);
        assert_eq!(from_prose.stories, from_sloppy.stories);
        assert_eq!(from_prose.stories.len(), 2);
    }

    #[test]
    fn test_lenient_fields() {
        let parsed = ResponseParser::default().parse(BODY).unwrap();
        let first = &parsed.stories[0];
        assert_eq!(first.article_id.as_deref(), Some("a1"));
        assert_eq!(first.category.as_deref(), Some("reform"));
        assert_eq!(first.year, Some(1932));
        assert_eq!(first.themes, vec!["Protest", "Veterans"]);

        let second = &parsed.stories[1];
        assert_eq!(second.documentary_potential, Some(70));
        assert_eq!(second.narrative_score, Some(64));
        assert_eq!(second.themes, vec!["Drought", "Migration"]);
        assert_eq!(second.summary, None);
    }

    #[test]
    fn test_invalid_titles_dropped() {
        let raw = r#"{"stories": [{"title": "PAGE 14"}, {"title": "Abc"}, {"summary": "no title"},
            {"title": "Relief Camp Opens for Drifters"}, "not an object"]}"#;
        let parsed = ResponseParser::default().parse(raw).unwrap();
        assert_eq!(parsed.stories.len(), 1);
        assert_eq!(parsed.stories[0].title, "Relief Camp Opens for Drifters");
    }

    #[test]
    fn test_failures() {
        let parser = ResponseParser::default();
        assert!(matches!(parser.parse("I could not find any stories."), Err(Error::Parse(_))));
        assert!(matches!(parser.parse(r#"{"articles": []}"#), Err(Error::Parse(_))));
        assert!(matches!(parser.parse(r#"{"stories": {"title": "x"}}"#), Err(Error::Parse(_))));

        let empty = parser.parse(r#"{"stories": []}"#).unwrap();
        assert!(empty.stories.is_empty());
        assert_eq!(parser.strategy_names(), vec!["object-span", "fenced-block", "cleaned-span"]);
    }
}

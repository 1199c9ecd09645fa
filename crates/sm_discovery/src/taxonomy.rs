//! Category keywords and title rules shared by the pre-filter and the heuristic builder.

use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;

pub const TITLE_MIN_CHARS: usize = 5;
pub const TITLE_MAX_CHARS: usize = 100;

/// One category with the keywords that signal it and the theme it contributes.
#[derive(Debug)]
pub struct CategoryRule {
    pub name: &'static str,
    pub theme: &'static str,
    pub keywords: &'static [&'static str],
}

#[derive(Debug)]
pub struct Taxonomy {
    pub version: &'static str,
    pub categories: &'static [CategoryRule],
}

pub static TAXONOMY: Taxonomy = Taxonomy {
    version: "2",
    categories: &[
        CategoryRule {
            name: "politics",
            theme: "Political Power",
            keywords: &[
                "election", "senate", "senator", "congress", "governor", "mayor", "president",
                "vote", "voters", "campaign", "legislature", "candidate", "political", "democrat",
                "republican", "ballot",
            ],
        },
        CategoryRule {
            name: "crime",
            theme: "Crime and Justice",
            keywords: &[
                "murder", "police", "arrested", "trial", "robbery", "jury", "sheriff", "court",
                "convicted", "bandit", "theft", "prison", "gang", "bootlegger", "kidnapping",
            ],
        },
        CategoryRule {
            name: "war",
            theme: "War and Conflict",
            keywords: &[
                "war", "army", "navy", "soldiers", "troops", "battle", "enemy", "military",
                "bombing", "invasion", "allied", "regiment", "armistice", "draft", "veterans",
            ],
        },
        CategoryRule {
            name: "business",
            theme: "Economic Change",
            keywords: &[
                "business", "bank", "company", "market", "stock", "trade", "industry", "factory",
                "merchants", "prices", "depression", "railroad", "corporation", "wages", "farmers",
            ],
        },
        CategoryRule {
            name: "sports",
            theme: "Sporting Triumph",
            keywords: &[
                "baseball", "football", "championship", "team", "boxing", "season", "league",
                "coach", "stadium", "olympic", "pennant", "athlete", "tournament", "race",
            ],
        },
        CategoryRule {
            name: "social-history",
            theme: "Women's History",
            keywords: &[
                "women", "woman", "suffrage", "mother", "wife", "housewife", "girls", "feminist",
                "equal rights", "nurse", "family", "workforce",
            ],
        },
        CategoryRule {
            name: "reform",
            theme: "Social Reform",
            keywords: &[
                "strike", "protest", "reform", "union", "rally", "march", "boycott", "picket",
                "demonstration", "civil rights", "temperance", "prohibition", "labor",
            ],
        },
        CategoryRule {
            name: "education",
            theme: "Education and Opportunity",
            keywords: &[
                "school", "university", "college", "students", "teacher", "education", "professor",
                "classroom", "graduates", "scholarship",
            ],
        },
        CategoryRule {
            name: "entertainment",
            theme: "Popular Culture",
            keywords: &[
                "theater", "theatre", "film", "movie", "radio", "music", "concert", "circus",
                "actress", "actor", "hollywood", "orchestra", "vaudeville", "dance",
            ],
        },
    ],
};

impl Taxonomy {
    /// Categories with at least one keyword hit, most hits first; ties keep table order.
    pub fn classify(&self, text: &str) -> Vec<(&'static CategoryRule, usize)> {
        let normalized = normalize_words(text);
        let mut hits: Vec<(&'static CategoryRule, usize)> = self.categories.iter()
            .map(|rule| {
                let count = rule.keywords.iter()
                    .filter(|kw| normalized.contains(&format!(" {} ", kw)))
                    .count();
                (rule, count)
            })
            .filter(|(_, count)| *count > 0)
            .collect();
        hits.sort_by(|a, b| b.1.cmp(&a.1));
        hits
    }

    pub fn rule(&self, name: &str) -> Option<&CategoryRule> {
        self.categories.iter().find(|r| r.name == name)
    }
}

/// Lowercase, collapse every non-alphanumeric run to one space and pad both ends,
/// so keywords can be matched as ` keyword `.
fn normalize_words(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push(' ');
    for c in text.chars().flat_map(char::to_lowercase) {
        if c.is_alphanumeric() {
            out.push(c);
        } else if !out.ends_with(' ') {
            out.push(' ');
        }
    }
    if !out.ends_with(' ') {
        out.push(' ');
    }
    out
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TitleRejection {
    #[error("title is empty")]
    Empty,
    #[error("title length {0} outside 5-100 characters")]
    Length(usize),
    #[error("single-word title")]
    SingleToken,
    #[error("newspaper masthead")]
    Masthead,
    #[error("byline")]
    Byline,
    #[error("professional title")]
    ProfessionalSuffix,
    #[error("institutional fragment")]
    InstitutionalFragment,
    #[error("OCR corruption")]
    OcrCorruption,
}

const DENOMINATIONS: &[&str] = &[
    "PRESBYTERIAN", "METHODIST", "BAPTIST", "EPISCOPAL", "LUTHERAN", "CATHOLIC",
    "CONGREGATIONAL", "UNITARIAN", "PRESBYTERIANS", "METHODISTS", "BAPTISTS",
];

/// Garbled renderings of common words produced by newspaper OCR
const OCR_TOKENS: &[&str] = &[
    "TIIE", "TLIE", "THF", "TBE", "WIIO", "WHICII", "TIIAT", "AVITH", "AVAS", "AVHO", "AVERE",
];

lazy_static! {
    static ref MASTHEAD_WORD: Regex = Regex::new(r"\b(NEWSPAPER|STANDARD|EDITION|VOLUME|PAGE)\b").unwrap();
    static ref MASTHEAD_LEAD: Regex = Regex::new(r"^(NEWSPAPER|STANDARD|EDITION|VOLUME|PAGE)\b").unwrap();
    static ref PAGE_NUMBER: Regex = Regex::new(r"\b(PAGE|VOLUME|VOL\.?)\s*\d+\b").unwrap();
    static ref SYMBOL_RUN: Regex = Regex::new(r"[^\p{L}\p{N}\s]{3,}").unwrap();
    static ref MIXED_TOKEN: Regex = Regex::new(r"\p{L}+\d+\p{L}+").unwrap();
}

/// Structural validation of a headline. Deterministic for a given input.
pub fn validate_title(title: &str) -> Result<(), TitleRejection> {
    let title = title.trim();
    if title.is_empty() {
        return Err(TitleRejection::Empty);
    }

    let len = title.chars().count();
    if !(TITLE_MIN_CHARS..=TITLE_MAX_CHARS).contains(&len) {
        return Err(TitleRejection::Length(len));
    }

    let tokens: Vec<&str> = title.split_whitespace().collect();
    if tokens.len() < 2 && !title.contains('-') {
        return Err(TitleRejection::SingleToken);
    }

    let upper = title.to_uppercase();
    // Masthead words only count at the start, in short titles, or as page numbers.
    let short_masthead = tokens.len() <= 3 && MASTHEAD_WORD.is_match(&upper);
    if MASTHEAD_LEAD.is_match(&upper) || short_masthead || PAGE_NUMBER.is_match(&upper) {
        return Err(TitleRejection::Masthead);
    }
    if upper.starts_with("BY ") || upper.starts_with("FROM ") {
        return Err(TitleRejection::Byline);
    }
    if upper.contains(", M. D.") || upper.contains(", M.D.") || upper.ends_with(", DR.") || upper.ends_with(", DR") {
        return Err(TitleRejection::ProfessionalSuffix);
    }

    if tokens.len() <= 3 {
        let last = tokens.last()
            .map(|t| t.trim_matches(|c: char| !c.is_alphabetic()).to_uppercase())
            .unwrap_or_default();
        if DENOMINATIONS.contains(&last.as_str()) {
            return Err(TitleRejection::InstitutionalFragment);
        }
    }

    if is_ocr_corrupted(&upper) {
        return Err(TitleRejection::OcrCorruption);
    }

    Ok(())
}

pub fn is_valid_title(title: &str) -> bool {
    validate_title(title).is_ok()
}

fn is_ocr_corrupted(upper: &str) -> bool {
    let known_token = upper.split_whitespace()
        .map(|t| t.trim_matches(|c: char| !c.is_alphanumeric()))
        .any(|t| OCR_TOKENS.contains(&t));
    if known_token || SYMBOL_RUN.is_match(upper) || MIXED_TOKEN.is_match(upper) {
        return true;
    }

    let mut run = 0;
    let mut prev = None;
    for c in upper.chars() {
        if c.is_whitespace() {
            run = 0;
            prev = None;
        } else if Some(c) == prev {
            run += 1;
            if run >= 4 {
                return true;
            }
        } else {
            run = 1;
            prev = Some(c);
        }
    }

    let visible: Vec<char> = upper.chars().filter(|c| !c.is_whitespace()).collect();
    let alphanumeric = visible.iter().filter(|c| c.is_alphanumeric()).count();
    (alphanumeric as f64) < (visible.len() as f64) * 0.7
}

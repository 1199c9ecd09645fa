//! Hand-picked stories served when the article store cannot be reached.

use sm_core::{StoryCandidate, StoryOrigin, YearRange};

struct Curated {
    id: &'static str,
    title: &'static str,
    summary: &'static str,
    year: i32,
    category: &'static str,
    documentary_potential: u8,
    narrative_score: u8,
    themes: &'static [&'static str],
    production_notes: &'static str,
}

const CURATED: &[Curated] = &[
    Curated {
        id: "curated-pearl-harbor-1941",
        title: "Roosevelt Declares War After Pearl Harbor Attack",
        summary: "In an address to Congress, President Roosevelt called December 7, 1941 \"a date which will live in infamy\" and asked for a declaration of war against Japan.",
        year: 1941,
        category: "war",
        documentary_potential: 95,
        narrative_score: 92,
        themes: &["War and Conflict", "Political Power"],
        production_notes: "Speech audio and newsreel footage are widely archived.",
    },
    Curated {
        id: "curated-third-term-1941",
        title: "Roosevelt Begins Third Term as War Looms",
        summary: "Roosevelt is inaugurated for an unprecedented third term while war rages in Europe and tension with Japan builds in the Pacific.",
        year: 1941,
        category: "politics",
        documentary_potential: 92,
        narrative_score: 86,
        themes: &["Political Power"],
        production_notes: "Inauguration footage and contemporary editorials available.",
    },
    Curated {
        id: "curated-atlantic-charter-1941",
        title: "Churchill and Roosevelt Meet Aboard Warships",
        summary: "A secret meeting aboard naval vessels in the Atlantic produces the Atlantic Charter, a joint statement of post-war aims.",
        year: 1941,
        category: "politics",
        documentary_potential: 89,
        narrative_score: 88,
        themes: &["Political Power", "War and Conflict"],
        production_notes: "Shipboard photographs and the charter text survive.",
    },
    Curated {
        id: "curated-civil-rights-1941",
        title: "Civil Rights Leaders Meet at White House",
        summary: "A. Philip Randolph and Walter White press Roosevelt on discrimination in defense industries under the threat of a march on Washington.",
        year: 1941,
        category: "reform",
        documentary_potential: 88,
        narrative_score: 90,
        themes: &["Social Reform", "Political Power"],
        production_notes: "Black press coverage offers a rich counterpoint to mainstream papers.",
    },
    Curated {
        id: "curated-women-workforce-1942",
        title: "Women Join Workforce as War Production Accelerates",
        summary: "Factories fill with women as millions of men enter the armed forces, and Rosie the Riveter becomes a national symbol.",
        year: 1942,
        category: "social-history",
        documentary_potential: 85,
        narrative_score: 84,
        themes: &["Women's History", "Economic Change"],
        production_notes: "Government recruitment posters and oral histories available.",
    },
    Curated {
        id: "curated-bonus-army-1932",
        title: "Bonus Army Marches on Washington",
        summary: "Thousands of unemployed veterans camp in the capital to demand early payment of their service bonus until troops drive them out.",
        year: 1932,
        category: "reform",
        documentary_potential: 90,
        narrative_score: 89,
        themes: &["Social Reform", "War and Conflict"],
        production_notes: "Photographs of the burning camps are well documented.",
    },
    Curated {
        id: "curated-dust-storms-1935",
        title: "Black Blizzards Sweep the Southern Plains",
        summary: "Dust storms bury farms across Kansas and Oklahoma, pushing families west in search of work.",
        year: 1935,
        category: "business",
        documentary_potential: 87,
        narrative_score: 85,
        themes: &["Economic Change"],
        production_notes: "Farm Security Administration photographs cover the region.",
    },
    Curated {
        id: "curated-owens-berlin-1936",
        title: "Jesse Owens Wins Four Gold Medals in Berlin",
        summary: "An American sprinter dominates the Berlin Olympic Games staged as a showcase for the Nazi regime.",
        year: 1936,
        category: "sports",
        documentary_potential: 91,
        narrative_score: 93,
        themes: &["Sporting Triumph", "Political Power"],
        production_notes: "Olympic film footage and wire photos are readily licensed.",
    },
];

impl Curated {
    fn to_story(&self) -> StoryCandidate {
        StoryCandidate {
            id: self.id.to_string(),
            title: self.title.to_string(),
            summary: self.summary.to_string(),
            year: self.year,
            category: self.category.to_string(),
            documentary_potential: self.documentary_potential,
            narrative_score: self.narrative_score,
            themes: self.themes.iter().map(|t| t.to_string()).collect(),
            production_notes: self.production_notes.to_string(),
            source_article_id: None,
            origin: StoryOrigin::Curated,
        }
    }
}

/// Curated stories matching the query, or every curated story when none match.
pub fn curated_stories(category: Option<&str>, years: YearRange, count: usize) -> Vec<StoryCandidate> {
    let matching: Vec<&Curated> = CURATED.iter()
        .filter(|c| category.map_or(true, |cat| c.category.eq_ignore_ascii_case(cat)))
        .filter(|c| years.contains(c.year))
        .collect();

    let chosen = if matching.is_empty() { CURATED.iter().collect() } else { matching };
    let mut stories: Vec<StoryCandidate> = chosen.into_iter().map(Curated::to_story).collect();
    stories.sort_by(|a, b| b.documentary_potential.cmp(&a.documentary_potential));
    stories.truncate(count);
    stories
}

pub fn find_curated(id: &str) -> Option<StoryCandidate> {
    CURATED.iter().find(|c| c.id == id).map(Curated::to_story)
}

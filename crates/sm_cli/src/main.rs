use anyhow::Context;
use clap::{Parser, Subcommand};
use sm_core::{ArticleStore, DiscoverOptions, DiscoveryResult, StoryCandidate};
use sm_discovery::{DiscoveryConfig, DiscoveryEngine};
use sm_storage::{create_storage, load_articles_json, seed_storage};
use sm_web::{create_app, AppState};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

mod logging;

/// Parse `90`, `90s`, `2m` or `1m30s` into a duration.
fn parse_duration(s: &str) -> Result<Duration, String> {
    let mut total = 0u64;
    let mut digits = String::new();

    for c in s.trim().chars() {
        if c.is_ascii_digit() {
            digits.push(c);
            continue;
        }
        let value: u64 = digits.parse().map_err(|_| format!("missing number before '{}'", c))?;
        total += match c {
            's' => value,
            'm' => value * 60,
            'h' => value * 3600,
            _ => return Err(format!("unknown duration unit '{}'", c)),
        };
        digits.clear();
    }
    if !digits.is_empty() {
        total += digits.parse::<u64>().map_err(|e| e.to_string())?;
    }
    if total == 0 {
        return Err("duration must be positive".to_string());
    }
    Ok(Duration::from_secs(total))
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Find documentary-worthy stories in historical newspapers", long_about = None)]
struct Cli {
    /// Article storage backend: memory or sqlite
    #[arg(long, env = "STORYMINE_STORAGE", default_value = "memory")]
    storage: String,
    #[arg(long, env = "STORYMINE_DATABASE_URL")]
    database_url: Option<String>,
    /// JSON file of articles loaded into storage at startup
    #[arg(long, env = "STORYMINE_ARTICLES")]
    articles: Option<PathBuf>,
    #[arg(long, env = "STORYMINE_MODEL", default_value = "deepseek",
        help = "Completion model: deepseek (default), openai, openrouter, ollama, dummy")]
    model: String,
    #[arg(long, env = "STORYMINE_MODEL_URL")]
    model_url: Option<String>,
    #[arg(long, env = "STORYMINE_MODEL_NAME")]
    model_name: Option<String>,
    /// Falls back to DEEPSEEK_API_KEY
    #[arg(long, env = "STORYMINE_API_KEY", hide_env_values = true)]
    api_key: Option<String>,
    /// Completion call timeout (e.g. 90s, 2m)
    #[arg(long, env = "STORYMINE_TIMEOUT", default_value = "90s", value_parser = parse_duration)]
    timeout: Duration,
    #[arg(short, long)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Discover candidate stories
    Discover {
        #[arg(long)]
        category: Option<String>,
        /// Year or range, e.g. 1941 or 1950-1955
        #[arg(long)]
        years: Option<String>,
        #[arg(long)]
        count: Option<usize>,
        /// Print the raw result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Deep dive into one story by id
    Explore {
        id: String,
    },
    /// Serve the HTTP API
    Serve {
        #[arg(long, env = "STORYMINE_BIND", default_value = "127.0.0.1:3000")]
        bind: String,
    },
    /// Load a JSON file of articles into storage
    Import {
        file: PathBuf,
    },
}

async fn import(storage: &dyn ArticleStore, file: &Path) -> anyhow::Result<usize> {
    let articles = load_articles_json(file)
        .with_context(|| format!("reading articles from {}", file.display()))?;
    let stored = seed_storage(storage, &articles).await?;
    info!("📥 Imported {} articles from {}", stored, file.display());
    Ok(stored)
}

fn print_story(rank: usize, story: &StoryCandidate) {
    println!("{:>2}. [{}] {} ({}, {})", rank, story.documentary_potential, story.title, story.year, story.category);
    println!("    {}", story.summary);
    if !story.themes.is_empty() {
        println!("    Themes: {}", story.themes.join(", "));
    }
}

fn print_result(result: &DiscoveryResult) {
    for (i, story) in result.stories.iter().enumerate() {
        print_story(i + 1, story);
    }
    let meta = &result.metadata;
    println!(
        "\n{} stories for {} {} (source: {:?}, offset {}, {} articles read){}",
        meta.stories_generated,
        meta.category,
        meta.year_range,
        meta.source,
        meta.offset,
        meta.articles_analyzed,
        if meta.fulfilled { "" } else { ", fewer than requested" }
    );
}

fn build_engine(cli: &Cli, storage: Arc<dyn ArticleStore>) -> anyhow::Result<Arc<DiscoveryEngine>> {
    let model_config = sm_inference::Config {
        provider: cli.model.clone(),
        api_key: cli.api_key.clone().or_else(|| std::env::var("DEEPSEEK_API_KEY").ok()),
        model_name: cli.model_name.clone(),
        model_url: cli.model_url.clone(),
        timeout: cli.timeout,
    };
    let model = sm_inference::create_model(&model_config)?;
    let config = DiscoveryConfig { call_timeout: cli.timeout, ..Default::default() };
    Ok(Arc::new(DiscoveryEngine::new(storage, model, config)))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    logging::init_logging(cli.verbose);

    let storage = create_storage(&cli.storage, cli.database_url.as_deref()).await?;
    if let Some(path) = &cli.articles {
        import(storage.as_ref(), path).await?;
    }

    match &cli.command {
        Commands::Import { file } => {
            let stored = import(storage.as_ref(), file).await?;
            println!("Imported {} articles", stored);
        }
        Commands::Discover { category, years, count, json } => {
            let engine = build_engine(&cli, storage)?;
            engine.config().check_count(*count)?;
            let options = DiscoverOptions {
                category: category.clone(),
                year_range: years.clone(),
                count: *count,
            };
            let result = engine.discover(options).await;
            if *json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                print_result(&result);
            }
        }
        Commands::Explore { id } => {
            let engine = build_engine(&cli, storage)?;
            let result = engine.explore(id).await;
            match &result.story {
                Some(story) => {
                    print_story(1, story);
                    println!("    Notes: {}", story.production_notes);
                }
                None => return Err(sm_core::Error::NotFound(format!("story '{}'", id)).into()),
            }
        }
        Commands::Serve { bind } => {
            let engine = build_engine(&cli, storage)?;
            let listener = tokio::net::TcpListener::bind(bind.as_str())
                .await
                .with_context(|| format!("binding {}", bind))?;
            info!("🌐 Serving StoryMine API on http://{}", bind);
            axum::serve(listener, create_app(AppState::new(engine))).await?;
        }
    }

    Ok(())
}

//! Documentary discovery over a historical newspaper corpus.
//!
//! A [`DiscoveryEngine`] reads a page of articles for a category and year range,
//! drops structurally unusable ones, fast-tracks articles that already carry a
//! high documentary score, sends the rest to a completion model in bounded
//! concurrent batches and pads any shortfall with rule-based stories.

pub mod config;
pub mod dispatcher;
pub mod fallback;
pub mod filter;
pub mod heuristic;
pub mod orchestrator;
pub mod pagination;
pub mod parser;
pub mod pool;
pub mod taxonomy;

#[cfg(test)]
pub(crate) mod test_utils;

pub use config::DiscoveryConfig;
pub use dispatcher::{BatchDispatcher, DispatchContext, DispatchReport};
pub use filter::{QualityPreFilter, Rejection};
pub use heuristic::HeuristicStoryBuilder;
pub use orchestrator::DiscoveryEngine;
pub use pagination::{PaginationStore, PaginationTracker};
pub use parser::{ParsedResponse, ParsedStory, ResponseParser};
pub use pool::BoundedPool;
pub use taxonomy::{TitleRejection, Taxonomy, TAXONOMY};

pub mod prelude {
    pub use super::{DiscoveryConfig, DiscoveryEngine, PaginationTracker};
    pub use sm_core::{DiscoverOptions, DiscoveryResult, ExploreResult, Result, Error, StoryCandidate};
}

pub mod error;
pub mod models;
pub mod storage;
pub mod types;

pub use error::{Error, Result};
pub use models::CompletionModel;
pub use storage::ArticleStore;
pub use types::{
    normalize_score, ArticleRecord, DiscoverOptions, DiscoveryMetadata, DiscoveryResult,
    DiscoverySource, ExploreResult, QueryKey, StoryCandidate, StoryOrigin, YearRange,
};

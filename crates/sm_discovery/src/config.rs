use sm_core::{Error, Result, YearRange};
use std::time::Duration;

/// Tuning knobs for a discovery run.
#[derive(Debug, Clone)]
pub struct DiscoveryConfig {
    /// Rows requested from storage per discovery call
    pub fetch_limit: usize,
    /// Articles per completion call
    pub batch_size: usize,
    /// Completion calls allowed in flight at once
    pub concurrency: usize,
    /// Articles whose stored potential is above this skip the completion service
    pub fast_track_threshold: u8,
    /// Shortest content preview worth analyzing, in characters
    pub min_preview_chars: usize,
    /// Publication years the corpus is expected to cover
    pub supported_years: YearRange,
    /// Most pre-filtered articles sent to the completion service per round
    pub dispatch_round: usize,
    /// Preview characters included per article in a prompt
    pub prompt_preview_chars: usize,
    /// Upper bound on a single completion call
    pub call_timeout: Duration,
    pub default_count: usize,
    pub max_count: usize,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            fetch_limit: 500,
            batch_size: 10,
            concurrency: 3,
            fast_track_threshold: 70,
            min_preview_chars: 300,
            supported_years: YearRange::all(),
            dispatch_round: 50,
            prompt_preview_chars: 280,
            call_timeout: Duration::from_secs(90),
            default_count: 10,
            max_count: 50,
        }
    }
}

impl DiscoveryConfig {
    /// Requested story count, or the default when none was given.
    pub fn requested_count(&self, requested: Option<usize>) -> usize {
        requested.unwrap_or(self.default_count)
    }

    /// Most stories a single discovery call will produce for `requested`.
    pub fn story_target(&self, requested: usize) -> usize {
        requested.min(self.max_count)
    }

    /// Validate a caller-supplied count before it reaches the engine.
    pub fn check_count(&self, requested: Option<usize>) -> Result<usize> {
        match self.requested_count(requested) {
            0 => Err(Error::Validation("count must be at least 1".to_string())),
            n if n > self.max_count => Err(Error::Validation(format!(
                "count {} exceeds the maximum of {}", n, self.max_count
            ))),
            n => Ok(n),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_story_count() {
        let config = DiscoveryConfig::default();
        assert_eq!(config.requested_count(None), 10);
        assert_eq!(config.requested_count(Some(60)), 60);
        assert_eq!(config.story_target(60), 50);
        assert_eq!(config.story_target(25), 25);
    }

    #[test]
    fn test_check_count_rejects_both_edges() {
        let config = DiscoveryConfig::default();
        assert_eq!(config.check_count(None).unwrap(), 10);
        assert_eq!(config.check_count(Some(50)).unwrap(), 50);
        assert!(matches!(config.check_count(Some(0)), Err(Error::Validation(_))));
        assert!(matches!(config.check_count(Some(51)), Err(Error::Validation(_))));
    }
}

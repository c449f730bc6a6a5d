//! Tunables for the agentic chunker service.

use std::time::Duration;

/// Configuration for [`AgenticChunkerService`](crate::service::AgenticChunkerService).
///
/// All knobs have conservative defaults; construct with [`Default`] and adjust
/// with the `with_*` setters.
#[derive(Clone, Debug)]
pub struct ChunkerConfig {
    /// Retries per oracle call after a transient failure, on top of the
    /// initial attempt. Malformed responses are never retried.
    pub max_oracle_retries: usize,
    /// Base delay between retries; doubles on each subsequent attempt.
    pub retry_backoff: Duration,
    /// Character budget for the placeholder title used when the oracle cannot
    /// produce one.
    pub fallback_title_chars: usize,
    /// Character budget for the placeholder summary.
    pub fallback_summary_chars: usize,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            max_oracle_retries: 2,
            retry_backoff: Duration::from_millis(250),
            fallback_title_chars: 48,
            fallback_summary_chars: 160,
        }
    }
}

impl ChunkerConfig {
    #[must_use]
    pub fn with_max_oracle_retries(mut self, retries: usize) -> Self {
        self.max_oracle_retries = retries;
        self
    }

    #[must_use]
    pub fn with_retry_backoff(mut self, backoff: Duration) -> Self {
        self.retry_backoff = backoff;
        self
    }

    #[must_use]
    pub fn with_fallback_title_chars(mut self, chars: usize) -> Self {
        self.fallback_title_chars = chars;
        self
    }

    #[must_use]
    pub fn with_fallback_summary_chars(mut self, chars: usize) -> Self {
        self.fallback_summary_chars = chars;
        self
    }
}

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while collecting metrics for a song.
#[derive(Debug, Error)]
pub enum CollectError {
    #[error("fetch timed out after {secs}s")]
    Timeout { secs: u64 },

    #[error("fetch failed: {message}")]
    Fetch { message: String },

    #[error("failed to spawn fetch command `{program}`")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("unusable fetch output: {reason}")]
    Output { reason: String },

    #[error("checkpoint I/O failed at {path}")]
    Checkpoint {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Storage(#[from] songtrend_db::DbError),
}

impl CollectError {
    /// Whether a retry has a chance of succeeding.
    ///
    /// Scrape-side failures are usually transient (page load hiccups, slow
    /// renders, rate limiting). Storage and checkpoint failures are local and
    /// deterministic, so retrying the fetch would only repeat the work.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Timeout { .. } | Self::Fetch { .. } | Self::Spawn { .. } | Self::Output { .. }
        )
    }
}

//! Batch orchestration: walks the song catalog in fixed-size batches,
//! retries transient scrape failures with linear backoff, persists results,
//! and checkpoints progress after every batch.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use songtrend_core::{
    rank_hashtags, AppConfig, Platform, DEFAULT_NOISE_TAGS, TOP_HASHTAG_LIMIT,
};
use songtrend_db::SongRow;
use sqlx::SqlitePool;
use tracing::{debug, info, warn};

use crate::checkpoint::{Checkpoint, FailedSong};
use crate::error::CollectError;
use crate::fetch::{FetchResult, SongFetcher};

const DEFAULT_BATCH_SIZE: usize = 12;
const DEFAULT_MAX_RETRIES: u32 = 3;
const DEFAULT_PER_SONG_TIMEOUT_SECS: u64 = 180;
const DEFAULT_INTER_SONG_DELAY_SECS: u64 = 2;
const DEFAULT_INTER_BATCH_REST_SECS: u64 = 5;
const DEFAULT_RETRY_BACKOFF_BASE_SECS: u64 = 2;

/// Pacing and retry knobs for one collection run.
#[derive(Debug, Clone)]
pub struct CollectorConfig {
    pub batch_size: usize,
    pub max_retries: u32,
    pub per_song_timeout_secs: u64,
    pub inter_song_delay_secs: u64,
    pub inter_batch_rest_secs: u64,
    pub retry_backoff_base_secs: u64,
    pub checkpoint_path: PathBuf,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            max_retries: DEFAULT_MAX_RETRIES,
            per_song_timeout_secs: DEFAULT_PER_SONG_TIMEOUT_SECS,
            inter_song_delay_secs: DEFAULT_INTER_SONG_DELAY_SECS,
            inter_batch_rest_secs: DEFAULT_INTER_BATCH_REST_SECS,
            retry_backoff_base_secs: DEFAULT_RETRY_BACKOFF_BASE_SECS,
            checkpoint_path: PathBuf::from("./data/collect_progress.json"),
        }
    }
}

impl CollectorConfig {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            batch_size: config.collector_batch_size,
            max_retries: config.collector_max_retries,
            per_song_timeout_secs: config.collector_per_song_timeout_secs,
            inter_song_delay_secs: config.collector_inter_song_delay_secs,
            inter_batch_rest_secs: config.collector_inter_batch_rest_secs,
            retry_backoff_base_secs: config.collector_retry_backoff_base_secs,
            checkpoint_path: config.checkpoint_path.clone(),
        }
    }
}

/// Outcome of one collection run.
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// Songs matching the platform filter, including checkpointed ones.
    pub total: usize,
    pub success_count: usize,
    pub failed_count: usize,
    /// Songs skipped because a prior run already completed them.
    pub skipped_count: usize,
    pub batches_completed: usize,
    pub failed_songs: Vec<FailedSong>,
    pub duration: Duration,
    /// True when the run stopped early on a cancellation request.
    pub interrupted: bool,
}

impl RunSummary {
    /// Fraction of attempted songs that succeeded, in `0.0..=1.0`.
    #[must_use]
    pub fn success_rate(&self) -> f64 {
        let attempted = self.success_count + self.failed_count;
        if attempted == 0 {
            return 1.0;
        }
        #[allow(clippy::cast_precision_loss)]
        {
            self.success_count as f64 / attempted as f64
        }
    }
}

/// Drives UGC collection for every song on a platform.
pub struct BatchController {
    pool: SqlitePool,
    config: CollectorConfig,
    platform: Platform,
    store_hashtags: bool,
    cancel: Arc<AtomicBool>,
}

impl BatchController {
    #[must_use]
    pub fn new(
        pool: SqlitePool,
        config: CollectorConfig,
        platform: Platform,
        store_hashtags: bool,
    ) -> Self {
        Self {
            pool,
            config,
            platform,
            store_hashtags,
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Flag that stops the run at the next between-songs boundary. Progress
    /// up to that point is checkpointed, so a later run resumes cleanly.
    #[must_use]
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    /// Runs collection over the given songs, usually the output of
    /// [`songtrend_db::list_by_platform`].
    ///
    /// Per-song failures are recorded in the summary and the checkpoint, not
    /// returned; only infrastructure failures abort the run.
    ///
    /// # Errors
    ///
    /// Returns [`CollectError::Checkpoint`] if progress cannot be saved.
    pub async fn run(
        &self,
        songs: Vec<SongRow>,
        fetcher: &dyn SongFetcher,
    ) -> Result<RunSummary, CollectError> {
        let started = Instant::now();
        let total = songs.len();

        let mut checkpoint = Checkpoint::load(&self.config.checkpoint_path);
        let pending: Vec<SongRow> = songs
            .into_iter()
            .filter(|song| !checkpoint.is_completed(song.id))
            .collect();
        let skipped_count = total - pending.len();

        info!(
            platform = %self.platform,
            total,
            skipped = skipped_count,
            batch_size = self.config.batch_size,
            "starting collection run"
        );

        let batch_size = self.config.batch_size.max(1);
        let batch_total = pending.chunks(batch_size).count();

        let mut success_count = 0usize;
        let mut failed_count = 0usize;
        let mut batches_completed = 0usize;
        let mut interrupted = false;

        'batches: for (batch_index, batch) in pending.chunks(batch_size).enumerate() {
            debug!(batch = batch_index + 1, of = batch_total, songs = batch.len(), "batch start");

            for (position, song) in batch.iter().enumerate() {
                if self.cancel.load(Ordering::Relaxed) {
                    interrupted = true;
                    break 'batches;
                }

                match self.collect_song(fetcher, song).await {
                    Ok(()) => {
                        checkpoint.mark_completed(song.id);
                        success_count += 1;
                    }
                    Err(err) => {
                        warn!(song_id = song.id, title = %song.title, error = %err, "song failed");
                        checkpoint.record_failure(song, &err);
                        failed_count += 1;
                    }
                }

                if position + 1 < batch.len() {
                    tokio::time::sleep(Duration::from_secs(self.config.inter_song_delay_secs))
                        .await;
                }
            }

            checkpoint.save(&self.config.checkpoint_path)?;
            batches_completed += 1;

            if batch_index + 1 < batch_total {
                tokio::time::sleep(Duration::from_secs(self.config.inter_batch_rest_secs)).await;
            }
        }

        if interrupted {
            checkpoint.save(&self.config.checkpoint_path)?;
            info!("collection interrupted, progress checkpointed");
        } else if failed_count == 0 {
            // A clean run leaves nothing to resume.
            Checkpoint::remove(&self.config.checkpoint_path)?;
        } else {
            checkpoint.save(&self.config.checkpoint_path)?;
        }

        let summary = RunSummary {
            total,
            success_count,
            failed_count,
            skipped_count,
            batches_completed,
            failed_songs: checkpoint.failed_songs.clone(),
            duration: started.elapsed(),
            interrupted,
        };

        info!(
            success = summary.success_count,
            failed = summary.failed_count,
            skipped = summary.skipped_count,
            interrupted = summary.interrupted,
            "collection run finished"
        );

        Ok(summary)
    }

    /// Fetches one song with the retry budget, then persists the result.
    ///
    /// The budget covers transient failures only: a fetch that succeeds but
    /// whose persistence fails returns immediately, since re-scraping cannot
    /// fix a storage problem.
    async fn collect_song(
        &self,
        fetcher: &dyn SongFetcher,
        song: &SongRow,
    ) -> Result<(), CollectError> {
        let per_song_timeout = Duration::from_secs(self.config.per_song_timeout_secs);
        let mut attempt = 0u32;

        loop {
            let outcome = match tokio::time::timeout(per_song_timeout, fetcher.fetch(song)).await {
                Ok(outcome) => outcome,
                Err(_) => Err(CollectError::Timeout {
                    secs: self.config.per_song_timeout_secs,
                }),
            };

            let err = match outcome {
                Ok(result) if result.success => return self.persist(song, &result).await,
                Ok(result) => CollectError::Fetch {
                    message: result
                        .error_message
                        .unwrap_or_else(|| "scraper reported failure".to_owned()),
                },
                Err(err) => err,
            };

            if !err.is_retryable() || attempt >= self.config.max_retries {
                return Err(err);
            }

            attempt += 1;
            let backoff =
                Duration::from_secs(self.config.retry_backoff_base_secs * u64::from(attempt));
            warn!(
                song_id = song.id,
                attempt,
                backoff_secs = backoff.as_secs(),
                error = %err,
                "retrying song"
            );
            tokio::time::sleep(backoff).await;
        }
    }

    async fn persist(&self, song: &SongRow, result: &FetchResult) -> Result<(), CollectError> {
        let has_tiktok_id = song.tiktok_id.as_deref().is_some_and(|id| !id.is_empty());
        let (youtube_count, tiktok_count) = match self.platform {
            Platform::Youtube => (Some(result.video_count), None),
            Platform::Tiktok => (None, Some(result.video_count)),
            Platform::Both if has_tiktok_id => (None, Some(result.video_count)),
            Platform::Both => (Some(result.video_count), None),
        };

        let updated =
            songtrend_db::update_ugc_counts(&self.pool, song.id, youtube_count, tiktok_count)
                .await?;
        if !updated {
            debug!(song_id = song.id, "scrape produced no usable counter");
        }

        let mut stored_hashtags = 0;
        if self.store_hashtags && !result.hashtags.is_empty() {
            let ranked = rank_hashtags(
                result.hashtags.iter().map(String::as_str),
                DEFAULT_NOISE_TAGS,
                TOP_HASHTAG_LIMIT,
            );
            if !ranked.is_empty() {
                songtrend_db::replace_top_hashtags(
                    &self.pool,
                    song.id,
                    Utc::now().date_naive(),
                    &ranked,
                )
                .await?;
                stored_hashtags = ranked.len();
            }
        }

        info!(
            song_id = song.id,
            title = %song.title,
            video_count = result.video_count,
            hashtags = stored_hashtags,
            "stored song metrics"
        );
        Ok(())
    }
}

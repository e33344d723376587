//! Batch collection of short-form-video engagement metrics.
//!
//! The pipeline: [`controller::BatchController`] walks the song catalog,
//! calls a [`fetch::SongFetcher`] per song with retries and pacing, persists
//! counts and hashtags through `songtrend-db`, and checkpoints progress so
//! interrupted runs resume where they left off. [`ingest`] handles the
//! separate chart-export path.

pub mod checkpoint;
pub mod controller;
pub mod error;
pub mod fetch;
pub mod ingest;

pub use checkpoint::{Checkpoint, FailedSong};
pub use controller::{BatchController, CollectorConfig, RunSummary};
pub use error::CollectError;
pub use fetch::{song_platform_url, CommandFetcher, FetchFuture, FetchResult, SongFetcher};
pub use ingest::{ingest_chart_entries, ChartEntry, IngestStats};

//! Collection command handlers for the CLI.
//!
//! These are called from `main` after the pool and config are established.
//! Per-song failures are absorbed by the batch controller and reported in
//! the run summary rather than aborting the whole run.

use std::str::FromStr;
use std::sync::atomic::Ordering;

use clap::Subcommand;
use songtrend_collector::{BatchController, CollectorConfig, CommandFetcher, RunSummary};
use songtrend_core::{AppConfig, Platform};
use sqlx::SqlitePool;

/// Sub-commands available under `collect`.
#[derive(Debug, Subcommand)]
pub enum CollectCommands {
    /// Collect UGC video counts for every song with a platform id
    Ugc {
        /// Platform to collect from: youtube, tiktok, or both
        #[arg(long, default_value = "both", value_parser = Platform::from_str)]
        platform: Platform,

        /// Only collect the first N songs
        #[arg(long)]
        limit: Option<usize>,

        /// Restrict collection to a single song
        #[arg(long)]
        song_id: Option<i64>,
    },
    /// Collect UGC video counts plus each song's top hashtags
    Hashtags {
        /// Platform to collect from; hashtag data comes from TikTok pages
        #[arg(long, default_value = "tiktok", value_parser = Platform::from_str)]
        platform: Platform,

        /// Only collect the first N songs
        #[arg(long)]
        limit: Option<usize>,

        /// Restrict collection to a single song
        #[arg(long)]
        song_id: Option<i64>,
    },
}

/// Run a batch collection over the catalog for the requested platform.
///
/// Installs a ctrl-c handler that stops the run at the next song boundary;
/// progress is checkpointed so a rerun resumes where this one stopped.
///
/// # Errors
///
/// Returns an error if no fetch command is configured, or if the run aborts
/// on an infrastructure failure (song listing, checkpoint writes).
pub(crate) async fn run(
    pool: &SqlitePool,
    config: &AppConfig,
    command: CollectCommands,
) -> anyhow::Result<()> {
    let (platform, store_hashtags, limit, song_id) = match command {
        CollectCommands::Ugc {
            platform,
            limit,
            song_id,
        } => (platform, false, limit, song_id),
        CollectCommands::Hashtags {
            platform,
            limit,
            song_id,
        } => (platform, true, limit, song_id),
    };

    let Some(command_line) = config.fetch_command.as_deref() else {
        anyhow::bail!("SONGTREND_FETCH_COMMAND is not set; configure the scraper command first");
    };
    let fetcher = CommandFetcher::from_command_line(command_line, platform)
        .ok_or_else(|| anyhow::anyhow!("SONGTREND_FETCH_COMMAND is blank"))?;

    let mut songs = songtrend_db::list_by_platform(pool, platform).await?;
    if let Some(id) = song_id {
        songs.retain(|song| song.id == id);
        if songs.is_empty() {
            anyhow::bail!("song {id} not found or has no {platform} id");
        }
    }
    if let Some(limit) = limit {
        songs.truncate(limit);
    }
    if songs.is_empty() {
        println!("no songs with a {platform} id; nothing to collect");
        return Ok(());
    }

    let controller = BatchController::new(
        pool.clone(),
        CollectorConfig::from_app_config(config),
        platform,
        store_hashtags,
    );

    let cancel = controller.cancel_flag();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupt received; stopping after the current song");
            cancel.store(true, Ordering::SeqCst);
        }
    });

    let summary = controller.run(songs, &fetcher).await?;
    print_summary(&summary);
    Ok(())
}

fn print_summary(summary: &RunSummary) {
    println!("collection finished in {:.1?}", summary.duration);
    println!("  songs:   {}", summary.total);
    println!("  ok:      {}", summary.success_count);
    println!("  failed:  {}", summary.failed_count);
    println!("  skipped: {}", summary.skipped_count);
    println!("  success rate: {:.1}%", summary.success_rate() * 100.0);
    if summary.interrupted {
        println!("  interrupted: progress checkpointed, rerun to resume");
    }
    for failed in &summary.failed_songs {
        println!(
            "  failed: {} - {}: {}",
            failed.artist, failed.title, failed.error
        );
    }
}

//! Chart-export ingestion: turns a scraped chart listing into song rows,
//! daily trend snapshots, and trend tags.

use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::json;
use songtrend_core::chart::NO_PREVIOUS_RANK;
use songtrend_core::{analyze_chart_position, parse_metric, ChartTagPolicy, NewSong};
use songtrend_db::NewTrendSnapshot;
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::CollectError;

/// One row of a scraped chart export.
///
/// View counts arrive as display strings (`"1.2M"`, `"8,345"`); rank is
/// 1-based within the chart. `previous_rank` is a string because the export
/// uses `"n/a"` for songs that were not ranked the previous day.
#[derive(Debug, Clone, Deserialize)]
pub struct ChartEntry {
    pub title: String,
    pub artist: String,
    pub rank: i64,
    #[serde(default)]
    pub previous_rank: Option<String>,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    #[serde(default)]
    pub youtube_id: Option<String>,
    #[serde(default)]
    pub tiktok_id: Option<String>,
    #[serde(default)]
    pub daily_views: Option<String>,
    #[serde(default)]
    pub weekly_views: Option<String>,
    #[serde(default)]
    pub engagement_rate: Option<f64>,
}

/// Counters from one chart ingestion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestStats {
    pub snapshots: usize,
    pub trending: usize,
    pub new_hits: usize,
}

/// Ingests a chart export for one `(source, category, date)`.
///
/// Each entry is resolved against the song registry by `(title, artist)`,
/// its snapshot row is upserted for the date, and its trend tags are
/// re-derived from the rank movement. Re-running the same export is
/// idempotent.
///
/// # Errors
///
/// Returns [`CollectError::Storage`] on the first entry whose writes fail;
/// earlier entries stay written.
pub async fn ingest_chart_entries(
    pool: &SqlitePool,
    source: &str,
    category: &str,
    date: NaiveDate,
    entries: &[ChartEntry],
    policy: ChartTagPolicy,
) -> Result<IngestStats, CollectError> {
    let mut stats = IngestStats::default();

    for entry in entries {
        let mut song = NewSong::new(&entry.title, &entry.artist);
        song.thumbnail_url = entry.thumbnail_url.clone();
        song.youtube_id = entry.youtube_id.clone();
        song.tiktok_id = entry.tiktok_id.clone();
        let song_id = songtrend_db::resolve_or_create(pool, &song).await?;

        let mut snapshot = NewTrendSnapshot::new(song_id, source, category, entry.rank, date);
        snapshot.daily_view_count = entry.daily_views.as_deref().and_then(parse_metric);
        snapshot.weekly_view_count = entry.weekly_views.as_deref().and_then(parse_metric);
        snapshot.engagement_rate = entry.engagement_rate;
        if entry.daily_views.is_some() || entry.weekly_views.is_some() {
            snapshot.metrics = Some(json!({
                "daily_views": entry.daily_views,
                "weekly_views": entry.weekly_views,
            }));
        }
        songtrend_db::upsert_snapshot(pool, &snapshot).await?;
        stats.snapshots += 1;

        let previous_rank = entry.previous_rank.as_deref().unwrap_or(NO_PREVIOUS_RANK);
        let tags = analyze_chart_position(entry.rank, previous_rank, policy);
        // Tags reflect today's chart; re-deriving both flags also clears
        // stale ones from earlier days.
        songtrend_db::update_tags(
            pool,
            &entry.title,
            &entry.artist,
            Some(tags.is_trending),
            Some(tags.is_new_hit),
        )
        .await?;

        if tags.is_trending {
            stats.trending += 1;
        }
        if tags.is_new_hit {
            stats.new_hits += 1;
        }
        debug!(song_id, rank = entry.rank, title = %entry.title, "chart entry ingested");
    }

    info!(
        source,
        category,
        %date,
        snapshots = stats.snapshots,
        trending = stats.trending,
        new_hits = stats.new_hits,
        "chart ingestion finished"
    );
    Ok(stats)
}

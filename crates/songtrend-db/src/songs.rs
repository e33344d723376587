//! Database operations for the `songs` registry.

use chrono::{DateTime, Utc};
use songtrend_core::{NewSong, Platform};
use sqlx::SqlitePool;

use crate::DbError;

const SONG_COLUMNS: &str = "id, title, artist, thumbnail_url, youtube_id, tiktok_id, \
                            is_approved, youtube_ugc_count, tiktok_ugc_count, \
                            ugc_last_updated, is_trending, is_new_hit, created_at";

/// A row from the `songs` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SongRow {
    pub id: i64,
    pub title: String,
    pub artist: String,
    pub thumbnail_url: Option<String>,
    pub youtube_id: Option<String>,
    pub tiktok_id: Option<String>,
    /// `NOT NULL DEFAULT 0` — unknown approval is stored as not approved.
    pub is_approved: bool,
    pub youtube_ugc_count: Option<i64>,
    pub tiktok_ugc_count: Option<i64>,
    pub ugc_last_updated: Option<DateTime<Utc>>,
    pub is_trending: bool,
    pub is_new_hit: bool,
    pub created_at: DateTime<Utc>,
}

/// Resolves a song by its `(title, artist)` natural key, creating it if absent.
///
/// The insert is a conditional no-op on conflict followed by a read, so
/// duplicate and concurrent calls for the same pair all converge on one row
/// and the same id. An unspecified approval flag is stored as `false`, never
/// NULL.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert or the id read-back fails.
pub async fn resolve_or_create(pool: &SqlitePool, song: &NewSong) -> Result<i64, DbError> {
    sqlx::query(
        "INSERT INTO songs (title, artist, thumbnail_url, youtube_id, tiktok_id, is_approved) \
         VALUES (?, ?, ?, ?, ?, ?) \
         ON CONFLICT (title, artist) DO NOTHING",
    )
    .bind(&song.title)
    .bind(&song.artist)
    .bind(&song.thumbnail_url)
    .bind(&song.youtube_id)
    .bind(&song.tiktok_id)
    .bind(song.is_approved.unwrap_or(false))
    .execute(pool)
    .await?;

    let id = sqlx::query_scalar::<_, i64>("SELECT id FROM songs WHERE title = ? AND artist = ?")
        .bind(&song.title)
        .bind(&song.artist)
        .fetch_one(pool)
        .await?;

    Ok(id)
}

/// Updates whichever UGC counters are provided and stamps `ugc_last_updated`.
///
/// Zero and negative counts are treated as not provided: a transient scrape
/// failure reports zero, and it must not erase a previously known good value.
/// Returns `false` when no usable counter was supplied or no row matched
/// `song_id`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the update fails.
pub async fn update_ugc_counts(
    pool: &SqlitePool,
    song_id: i64,
    youtube_count: Option<i64>,
    tiktok_count: Option<i64>,
) -> Result<bool, DbError> {
    let youtube = youtube_count.filter(|c| *c > 0);
    let tiktok = tiktok_count.filter(|c| *c > 0);

    let now = Utc::now();
    let result = match (youtube, tiktok) {
        (Some(yt), Some(tt)) => {
            sqlx::query(
                "UPDATE songs \
                 SET youtube_ugc_count = ?, tiktok_ugc_count = ?, ugc_last_updated = ? \
                 WHERE id = ?",
            )
            .bind(yt)
            .bind(tt)
            .bind(now)
            .bind(song_id)
            .execute(pool)
            .await?
        }
        (Some(yt), None) => {
            sqlx::query(
                "UPDATE songs SET youtube_ugc_count = ?, ugc_last_updated = ? WHERE id = ?",
            )
            .bind(yt)
            .bind(now)
            .bind(song_id)
            .execute(pool)
            .await?
        }
        (None, Some(tt)) => {
            sqlx::query("UPDATE songs SET tiktok_ugc_count = ?, ugc_last_updated = ? WHERE id = ?")
                .bind(tt)
                .bind(now)
                .bind(song_id)
                .execute(pool)
                .await?
        }
        (None, None) => {
            if youtube_count.is_some() || tiktok_count.is_some() {
                tracing::warn!(song_id, "ignoring non-positive UGC counts");
            }
            return Ok(false);
        }
    };

    Ok(result.rows_affected() > 0)
}

/// Updates the boolean trend tags by `(title, artist)` natural key.
///
/// Returns `false` when neither flag is supplied or no row matched.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the update fails.
pub async fn update_tags(
    pool: &SqlitePool,
    title: &str,
    artist: &str,
    is_trending: Option<bool>,
    is_new_hit: Option<bool>,
) -> Result<bool, DbError> {
    let result = match (is_trending, is_new_hit) {
        (Some(trending), Some(new_hit)) => {
            sqlx::query(
                "UPDATE songs SET is_trending = ?, is_new_hit = ? WHERE title = ? AND artist = ?",
            )
            .bind(trending)
            .bind(new_hit)
            .bind(title)
            .bind(artist)
            .execute(pool)
            .await?
        }
        (Some(trending), None) => {
            sqlx::query("UPDATE songs SET is_trending = ? WHERE title = ? AND artist = ?")
                .bind(trending)
                .bind(title)
                .bind(artist)
                .execute(pool)
                .await?
        }
        (None, Some(new_hit)) => {
            sqlx::query("UPDATE songs SET is_new_hit = ? WHERE title = ? AND artist = ?")
                .bind(new_hit)
                .bind(title)
                .bind(artist)
                .execute(pool)
                .await?
        }
        (None, None) => return Ok(false),
    };

    Ok(result.rows_affected() > 0)
}

/// Returns songs carrying a non-empty platform id for the given platform
/// (`Both` matches either), ordered by id.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_by_platform(
    pool: &SqlitePool,
    platform: Platform,
) -> Result<Vec<SongRow>, DbError> {
    let filter = match platform {
        Platform::Youtube => "youtube_id IS NOT NULL AND youtube_id != ''",
        Platform::Tiktok => "tiktok_id IS NOT NULL AND tiktok_id != ''",
        Platform::Both => {
            "(youtube_id IS NOT NULL AND youtube_id != '') \
             OR (tiktok_id IS NOT NULL AND tiktok_id != '')"
        }
    };
    let sql = format!("SELECT {SONG_COLUMNS} FROM songs WHERE {filter} ORDER BY id");

    let rows = sqlx::query_as::<_, SongRow>(&sql).fetch_all(pool).await?;
    Ok(rows)
}

/// Fetches a single song by id.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_song(pool: &SqlitePool, id: i64) -> Result<Option<SongRow>, DbError> {
    let sql = format!("SELECT {SONG_COLUMNS} FROM songs WHERE id = ?");
    let row = sqlx::query_as::<_, SongRow>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

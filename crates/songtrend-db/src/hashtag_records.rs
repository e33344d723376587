//! Database operations for the `song_hashtags` fact table.

use chrono::NaiveDate;
use sqlx::SqlitePool;

use crate::DbError;

/// A row from the `song_hashtags` table.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct HashtagRecordRow {
    pub id: i64,
    pub song_id: i64,
    pub hashtag: String,
    pub count: i64,
    pub rank: i64,
    pub collected_date: NaiveDate,
}

/// Replaces a song's hashtag set for one collection date.
///
/// Deletes every row for `(song_id, collected_date)` and inserts the given
/// ranked list with rank = 1-based input position, all in one transaction so
/// readers never observe the table mid-replace. Hashtag popularity is
/// re-derived fresh each scrape, so this is a full replace, never a merge;
/// rows for other dates are untouched.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any statement in the transaction fails
/// (including a foreign-key violation for an unknown `song_id`); nothing is
/// committed in that case.
pub async fn replace_top_hashtags(
    pool: &SqlitePool,
    song_id: i64,
    collected_date: NaiveDate,
    ranked: &[(String, i64)],
) -> Result<(), DbError> {
    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM song_hashtags WHERE song_id = ? AND collected_date = ?")
        .bind(song_id)
        .bind(collected_date)
        .execute(&mut *tx)
        .await?;

    for (position, (hashtag, count)) in ranked.iter().enumerate() {
        let rank = i64::try_from(position).unwrap_or(i64::MAX).saturating_add(1);
        sqlx::query(
            "INSERT INTO song_hashtags (song_id, hashtag, count, rank, collected_date) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(song_id)
        .bind(hashtag)
        .bind(count)
        .bind(rank)
        .bind(collected_date)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(())
}

/// Returns a song's hashtag rows for one collection date, ordered by rank.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn hashtags_for_song_on(
    pool: &SqlitePool,
    song_id: i64,
    collected_date: NaiveDate,
) -> Result<Vec<HashtagRecordRow>, DbError> {
    let rows = sqlx::query_as::<_, HashtagRecordRow>(
        "SELECT id, song_id, hashtag, count, rank, collected_date \
         FROM song_hashtags \
         WHERE song_id = ? AND collected_date = ? \
         ORDER BY rank",
    )
    .bind(song_id)
    .bind(collected_date)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

//! Crash-safe progress tracking for long collection runs.
//!
//! A run over a few hundred songs takes hours; the checkpoint file lets a
//! restarted run skip songs that already finished instead of re-scraping
//! them. The file is plain JSON so operators can inspect it.

use std::collections::BTreeSet;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::CollectError;

/// A song whose collection exhausted its retry budget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedSong {
    pub id: i64,
    pub title: String,
    pub artist: String,
    pub error: String,
}

/// On-disk progress record for one collection run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Checkpoint {
    #[serde(rename = "completed_songs", default)]
    pub completed_song_ids: BTreeSet<i64>,
    #[serde(default)]
    pub failed_songs: Vec<FailedSong>,
    #[serde(default)]
    pub last_update: Option<DateTime<Utc>>,
}

impl Checkpoint {
    /// Loads the checkpoint at `path`.
    ///
    /// A missing file is a fresh run and an unreadable or corrupt file is
    /// treated the same way after a warning, so a damaged checkpoint can
    /// never wedge collection.
    #[must_use]
    pub fn load(path: &Path) -> Self {
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == ErrorKind::NotFound => return Self::default(),
            Err(err) => {
                warn!(path = %path.display(), error = %err, "could not read checkpoint, starting fresh");
                return Self::default();
            }
        };

        match serde_json::from_str(&raw) {
            Ok(checkpoint) => checkpoint,
            Err(err) => {
                warn!(path = %path.display(), error = %err, "corrupt checkpoint, starting fresh");
                Self::default()
            }
        }
    }

    /// Writes the checkpoint atomically: serialize to a sibling temp file,
    /// then rename over the target so a crash mid-write leaves the previous
    /// checkpoint intact.
    ///
    /// # Errors
    ///
    /// Returns [`CollectError::Checkpoint`] if the directory cannot be
    /// created or the write or rename fails.
    pub fn save(&mut self, path: &Path) -> Result<(), CollectError> {
        self.last_update = Some(Utc::now());

        let io_err = |source: std::io::Error| CollectError::Checkpoint {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_err)?;
        }

        let json = serde_json::to_string_pretty(self).map_err(|err| CollectError::Checkpoint {
            path: path.to_path_buf(),
            source: std::io::Error::new(ErrorKind::InvalidData, err),
        })?;

        let tmp = temp_path(path);
        fs::write(&tmp, json).map_err(io_err)?;
        fs::rename(&tmp, path).map_err(io_err)?;
        Ok(())
    }

    /// Deletes the checkpoint file; a file that is already gone is fine.
    ///
    /// # Errors
    ///
    /// Returns [`CollectError::Checkpoint`] on any other I/O failure.
    pub fn remove(path: &Path) -> Result<(), CollectError> {
        match fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(source) => Err(CollectError::Checkpoint {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    pub fn mark_completed(&mut self, song_id: i64) {
        self.completed_song_ids.insert(song_id);
        self.failed_songs.retain(|f| f.id != song_id);
    }

    pub fn record_failure(&mut self, song: &songtrend_db::SongRow, error: &CollectError) {
        self.failed_songs.retain(|f| f.id != song.id);
        self.failed_songs.push(FailedSong {
            id: song.id,
            title: song.title.clone(),
            artist: song.artist.clone(),
            error: error.to_string(),
        });
    }

    #[must_use]
    pub fn is_completed(&self, song_id: i64) -> bool {
        self.completed_song_ids.contains(&song_id)
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map_or_else(
        || std::ffi::OsString::from("checkpoint"),
        std::ffi::OsStr::to_os_string,
    );
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_loads_as_fresh_run() {
        let dir = tempfile::tempdir().unwrap();
        let checkpoint = Checkpoint::load(&dir.path().join("nope.json"));

        assert!(checkpoint.completed_song_ids.is_empty());
        assert!(checkpoint.failed_songs.is_empty());
    }

    #[test]
    fn corrupt_file_loads_as_fresh_run() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("progress.json");
        fs::write(&path, "{not json").unwrap();

        let checkpoint = Checkpoint::load(&path);
        assert!(checkpoint.completed_song_ids.is_empty());
    }

    #[test]
    fn save_and_reload_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data").join("progress.json");

        let mut checkpoint = Checkpoint::default();
        checkpoint.mark_completed(3);
        checkpoint.mark_completed(7);
        checkpoint.save(&path).unwrap();

        let reloaded = Checkpoint::load(&path);
        assert!(reloaded.is_completed(3));
        assert!(reloaded.is_completed(7));
        assert!(!reloaded.is_completed(4));
        assert!(reloaded.last_update.is_some());
    }

    #[test]
    fn completing_a_song_clears_its_earlier_failure() {
        let song = songtrend_db::SongRow {
            id: 5,
            title: "Song".to_owned(),
            artist: "Artist".to_owned(),
            thumbnail_url: None,
            youtube_id: None,
            tiktok_id: None,
            is_approved: false,
            youtube_ugc_count: None,
            tiktok_ugc_count: None,
            ugc_last_updated: None,
            is_trending: false,
            is_new_hit: false,
            created_at: Utc::now(),
        };

        let mut checkpoint = Checkpoint::default();
        checkpoint.record_failure(&song, &CollectError::Timeout { secs: 180 });
        assert_eq!(checkpoint.failed_songs.len(), 1);

        checkpoint.mark_completed(5);
        assert!(checkpoint.failed_songs.is_empty());
    }

    #[test]
    fn json_field_names_stay_operator_friendly() {
        let mut checkpoint = Checkpoint::default();
        checkpoint.mark_completed(1);
        let json = serde_json::to_value(&checkpoint).unwrap();

        assert!(json.get("completed_songs").is_some());
        assert!(json.get("failed_songs").is_some());
        assert!(json.get("last_update").is_some());
    }

    #[test]
    fn remove_tolerates_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        Checkpoint::remove(&dir.path().join("gone.json")).unwrap();
    }
}

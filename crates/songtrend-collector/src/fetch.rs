//! The fetch seam between the batch controller and whatever actually scrapes.
//!
//! Production runs drive a headless-browser subprocess through
//! [`CommandFetcher`]; tests plug in stub [`SongFetcher`] impls.

use std::future::Future;
use std::pin::Pin;
use std::process::Stdio;

use serde::Deserialize;
use songtrend_core::Platform;
use songtrend_db::SongRow;
use tokio::process::Command;

use crate::error::CollectError;

/// One song's scrape outcome, as reported by the fetch side.
///
/// `hashtags` holds every raw occurrence the scraper saw, duplicates and
/// `#` prefixes included; tallying and ranking happen on this side. An empty
/// list is normal for platforms without hashtag data.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FetchResult {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub video_count: i64,
    #[serde(default)]
    pub hashtags: Vec<String>,
    #[serde(default)]
    pub error_message: Option<String>,
}

impl FetchResult {
    #[must_use]
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            video_count: 0,
            hashtags: Vec::new(),
            error_message: Some(message.into()),
        }
    }
}

pub type FetchFuture<'a> = Pin<Box<dyn Future<Output = Result<FetchResult, CollectError>> + Send + 'a>>;

/// Fetches engagement metrics for one song.
pub trait SongFetcher: Send + Sync {
    fn fetch<'a>(&'a self, song: &'a SongRow) -> FetchFuture<'a>;
}

/// Builds the public page URL for a song on a platform, if the song carries
/// the matching platform id.
///
/// `Both` prefers TikTok when the song has a TikTok id and falls back to
/// YouTube otherwise.
#[must_use]
pub fn song_platform_url(song: &SongRow, platform: Platform) -> Option<String> {
    let tiktok = song
        .tiktok_id
        .as_deref()
        .filter(|id| !id.is_empty())
        .map(|id| format!("https://www.tiktok.com/music/x-{id}"));
    let youtube = song
        .youtube_id
        .as_deref()
        .filter(|id| !id.is_empty())
        .map(|id| format!("https://www.youtube.com/source/{id}/shorts"));

    match platform {
        Platform::Tiktok => tiktok,
        Platform::Youtube => youtube,
        Platform::Both => tiktok.or(youtube),
    }
}

/// Runs an external scraper process per song and parses its stdout as a JSON
/// [`FetchResult`].
///
/// Contract with the scraper: the page URL is appended as the final argument,
/// a zero exit status means stdout holds the result JSON, and a non-zero exit
/// status is a scrape failure with the diagnostic on stderr.
#[derive(Debug, Clone)]
pub struct CommandFetcher {
    program: String,
    args: Vec<String>,
    platform: Platform,
}

impl CommandFetcher {
    /// Splits a configured command line (`SONGTREND_FETCH_COMMAND`) into
    /// program and arguments. Returns `None` for a blank command line.
    #[must_use]
    pub fn from_command_line(command_line: &str, platform: Platform) -> Option<Self> {
        let mut parts = command_line.split_whitespace().map(str::to_owned);
        let program = parts.next()?;
        Some(Self {
            program,
            args: parts.collect(),
            platform,
        })
    }

    async fn run(&self, song: &SongRow) -> Result<FetchResult, CollectError> {
        let Some(url) = song_platform_url(song, self.platform) else {
            return Err(CollectError::Fetch {
                message: format!("song {} has no {} id", song.id, self.platform),
            });
        };

        let output = Command::new(&self.program)
            .args(&self.args)
            .arg(&url)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| CollectError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Ok(FetchResult::failure(stderr.trim().to_owned()));
        }

        serde_json::from_slice(&output.stdout).map_err(|err| CollectError::Output {
            reason: err.to_string(),
        })
    }
}

impl SongFetcher for CommandFetcher {
    fn fetch<'a>(&'a self, song: &'a SongRow) -> FetchFuture<'a> {
        Box::pin(self.run(song))
    }
}

//! Hashtag occurrence tallying and ranking.
//!
//! The scrape side reports every raw hashtag occurrence it saw on a sound
//! page; this module turns that into the ranked top-N list the storage
//! layer persists as the day's snapshot.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

/// How many ranked hashtags are kept per song per day.
pub const TOP_HASHTAG_LIMIT: usize = 10;

/// Generic discovery tags that say nothing about the song itself.
pub const DEFAULT_NOISE_TAGS: &[&str] = &["fyp", "foryou", "foryoupage", "추천"];

/// Tallies raw hashtag occurrences and returns the top `top_n` as
/// `(tag, count)` pairs, counts descending, ties broken by first-seen order.
///
/// Tags are normalized by trimming whitespace, stripping a leading `#`, and
/// lowercasing; empty tags and anything in `noise_tags` are discarded.
#[must_use]
pub fn rank_hashtags<'a, I>(occurrences: I, noise_tags: &[&str], top_n: usize) -> Vec<(String, i64)>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut first_seen: Vec<String> = Vec::new();
    let mut counts: HashMap<String, i64> = HashMap::new();

    for raw in occurrences {
        let tag = raw.trim().trim_start_matches('#').to_lowercase();
        if tag.is_empty() || noise_tags.contains(&tag.as_str()) {
            continue;
        }
        match counts.entry(tag) {
            Entry::Occupied(mut entry) => *entry.get_mut() += 1,
            Entry::Vacant(entry) => {
                first_seen.push(entry.key().clone());
                entry.insert(1);
            }
        }
    }

    let mut ranked: Vec<(String, i64)> = first_seen
        .into_iter()
        .map(|tag| {
            let count = counts[&tag];
            (tag, count)
        })
        .collect();
    // Stable sort keeps first-seen order among equal counts.
    ranked.sort_by_key(|&(_, count)| std::cmp::Reverse(count));
    ranked.truncate(top_n);
    ranked
}

//! Chart-position heuristics for tagging new entries and risers.

/// Sentinel the chart export uses when a song was not ranked yesterday.
pub const NO_PREVIOUS_RANK: &str = "n/a";

/// Thresholds for the trend tags. These are inherited product heuristics,
/// not derived values — keep them configurable and expect product owners to
/// revisit them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChartTagPolicy {
    /// Minimum rank improvement (positions climbed since yesterday) that
    /// marks a song as trending.
    pub trending_rank_jump: i64,
}

impl Default for ChartTagPolicy {
    fn default() -> Self {
        Self {
            trending_rank_jump: 5,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChartTags {
    pub is_trending: bool,
    pub is_new_hit: bool,
}

impl ChartTags {
    #[must_use]
    pub fn any(self) -> bool {
        self.is_trending || self.is_new_hit
    }
}

/// Derives trend tags from a song's current and previous chart rank.
///
/// A previous rank of `"n/a"` marks a new chart entry; a numeric previous
/// rank that improved by at least `policy.trending_rank_jump` positions
/// marks the song as trending. Unparseable previous ranks yield no tags.
#[must_use]
pub fn analyze_chart_position(
    current_rank: i64,
    previous_rank: &str,
    policy: ChartTagPolicy,
) -> ChartTags {
    let previous_rank = previous_rank.trim();
    let mut tags = ChartTags::default();

    if previous_rank.eq_ignore_ascii_case(NO_PREVIOUS_RANK) {
        tags.is_new_hit = true;
        return tags;
    }

    if let Ok(previous) = previous_rank.parse::<i64>() {
        // Lower rank number means higher chart position.
        if previous - current_rank >= policy.trending_rank_jump {
            tags.is_trending = true;
        }
    }

    tags
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_previous_rank_is_a_new_hit() {
        let tags = analyze_chart_position(12, "n/a", ChartTagPolicy::default());
        assert!(tags.is_new_hit);
        assert!(!tags.is_trending);
    }

    #[test]
    fn five_position_climb_is_trending_by_default() {
        let tags = analyze_chart_position(5, "10", ChartTagPolicy::default());
        assert!(tags.is_trending);
        assert!(!tags.is_new_hit);
    }

    #[test]
    fn four_position_climb_is_not_trending_by_default() {
        let tags = analyze_chart_position(6, "10", ChartTagPolicy::default());
        assert!(!tags.any());
    }

    #[test]
    fn falling_rank_is_never_trending() {
        let tags = analyze_chart_position(10, "3", ChartTagPolicy::default());
        assert!(!tags.any());
    }

    #[test]
    fn policy_threshold_is_respected() {
        let policy = ChartTagPolicy {
            trending_rank_jump: 2,
        };
        assert!(analyze_chart_position(8, "10", policy).is_trending);
        assert!(!analyze_chart_position(9, "10", policy).is_trending);
    }

    #[test]
    fn unparseable_previous_rank_yields_no_tags() {
        let tags = analyze_chart_position(3, "???", ChartTagPolicy::default());
        assert!(!tags.any());
    }
}

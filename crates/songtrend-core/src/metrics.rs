//! Parsing of locale-formatted magnitude strings scraped from trend pages.
//!
//! Remote pages render counts as "1.2M", "1,400", "12만개", and similar.
//! Parsing never fails hard: anything unusable degrades to `None` with a
//! warning so a single garbled field cannot abort a song's ingestion.

use tracing::warn;

/// Values the remote pages use when a metric is unavailable.
const UNKNOWN_SENTINELS: &[&str] = &["unknown", "unknown metrics", "n/a"];

/// Count words platforms append after the number ("1.4M videos", "12만개").
const COUNT_SUFFIXES: &[&str] = &["videos", "video", "개"];

/// Magnitude units as (suffix char, multiplier). English K/M/B and the
/// Korean units TikTok's Korean locale renders.
const MAGNITUDES: &[(char, i64)] = &[
    ('k', 1_000),
    ('m', 1_000_000),
    ('b', 1_000_000_000),
    ('십', 10),
    ('백', 100),
    ('천', 1_000),
    ('만', 10_000),
    ('억', 100_000_000),
];

/// Converts a magnitude string into an integer count.
///
/// Returns `None` for empty strings and known "unknown" sentinels (silently),
/// and for unparseable input (with a warning). Decimal magnitudes truncate
/// toward zero: `"1.2345K"` is 1_234, never 1_235.
#[must_use]
pub fn parse_metric(raw: &str) -> Option<i64> {
    let mut s = raw.trim().to_lowercase();
    if s.is_empty() || UNKNOWN_SENTINELS.contains(&s.as_str()) {
        return None;
    }
    s.retain(|c| c != ',');

    for suffix in COUNT_SUFFIXES {
        if let Some(stripped) = s.strip_suffix(suffix) {
            s = stripped.trim_end().to_owned();
            break;
        }
    }

    let mut multiplier = 1_i64;
    for &(unit, mult) in MAGNITUDES {
        if let Some(stripped) = s.strip_suffix(unit) {
            multiplier = mult;
            s = stripped.trim_end().to_owned();
            break;
        }
    }

    match scale_decimal(&s, multiplier) {
        Some(value) => Some(value),
        None => {
            warn!(raw, "could not parse metric value");
            None
        }
    }
}

/// Multiplies a non-negative decimal string by `multiplier` using integer
/// arithmetic, truncating any sub-unit remainder. Avoids float rounding so
/// "1.2M" is exactly 1_200_000.
fn scale_decimal(s: &str, multiplier: i64) -> Option<i64> {
    let (int_part, frac_part) = s.split_once('.').unwrap_or((s, ""));
    if int_part.is_empty() && frac_part.is_empty() {
        return None;
    }

    // Counts are non-negative; a sign means we misread the field.
    if !int_part.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let int: i64 = if int_part.is_empty() {
        0
    } else {
        int_part.parse().ok()?
    };

    // Truncate the fraction to 9 digits; beyond that it cannot move the
    // integer result for any supported multiplier.
    let frac_digits: String = frac_part.chars().take(9).collect();
    if !frac_digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let frac_contribution = if frac_digits.is_empty() {
        0
    } else {
        let frac: i64 = frac_digits.parse().ok()?;
        let scale = 10_i64.checked_pow(u32::try_from(frac_digits.len()).ok()?)?;
        i64::try_from(i128::from(frac) * i128::from(multiplier) / i128::from(scale)).ok()?
    };

    int.checked_mul(multiplier)?.checked_add(frac_contribution)
}

//! Utility functions for text cleanup, URL canonicalization and pacing.
//!
//! This module provides helper functions used throughout the application:
//! - Whitespace normalization for scraped text
//! - Link canonicalization (resolve relative links, drop query and fragment)
//! - String truncation for logging
//! - Randomized pauses between requests to the same family of sites

use rand::{Rng, rng};
use std::time::Duration;
use tokio::time::sleep;
use tracing::debug;
use url::Url;

/// Collapse all runs of whitespace into single spaces and trim the ends.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(clean_text("  a \n\t b "), "a b");
/// ```
pub fn clean_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Canonicalize a scraped link.
///
/// Root-relative links are resolved against `base`. The query string and
/// fragment are always removed, since they only carry tracking parameters.
///
/// # Arguments
///
/// * `url` - The raw `href` value
/// * `base` - Origin used for relative links (e.g. `https://mx.indeed.com`)
///
/// # Returns
///
/// The canonical link, or an empty string when `url` is empty.
pub fn clean_url(url: &str, base: &str) -> String {
    let url = url.trim();
    if url.is_empty() {
        return String::new();
    }

    let resolved = match Url::parse(url) {
        Ok(parsed) => Some(parsed),
        Err(url::ParseError::RelativeUrlWithoutBase) => Url::parse(base)
            .ok()
            .and_then(|base| base.join(url).ok()),
        Err(_) => None,
    };

    match resolved {
        Some(mut parsed) => {
            parsed.set_query(None);
            parsed.set_fragment(None);
            parsed.to_string()
        }
        None => url
            .split(['?', '#'])
            .next()
            .unwrap_or_default()
            .to_string(),
    }
}

/// Truncate a string for logging purposes.
///
/// Long strings are cut at a character boundary at or before `max` bytes and
/// get an ellipsis plus the number of dropped bytes appended.
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut cut = max;
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}…(+{} bytes)", &s[..cut], s.len() - cut)
}

/// Pick a uniformly random duration in `min..=max`.
///
/// A reversed range is treated as `max..=min`.
pub fn random_between(min: Duration, max: Duration) -> Duration {
    let (lo, hi) = if min <= max { (min, max) } else { (max, min) };
    let lo_ms = lo.as_millis() as u64;
    let hi_ms = hi.as_millis() as u64;
    Duration::from_millis(rng().random_range(lo_ms..=hi_ms))
}

/// Sleep for a random duration in `min..=max` to avoid bursty request patterns.
pub async fn polite_pause(min: Duration, max: Duration) {
    let pause = random_between(min, max);
    if pause.is_zero() {
        return;
    }
    debug!(pause_ms = pause.as_millis() as u64, "Pausing between sources");
    sleep(pause).await;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_text() {
        assert_eq!(clean_text("  Ingeniero \n\t Mecánico  "), "Ingeniero Mecánico");
        assert_eq!(clean_text(""), "");
        assert_eq!(clean_text("   "), "");
    }

    #[test]
    fn test_clean_url_strips_query_and_fragment() {
        assert_eq!(
            clean_url("https://mx.linkedin.com/jobs/view/42?refId=x&trk=y#frag", ""),
            "https://mx.linkedin.com/jobs/view/42"
        );
    }

    #[test]
    fn test_clean_url_resolves_relative_links() {
        assert_eq!(
            clean_url("/rc/clk?jk=abc123", "https://mx.indeed.com"),
            "https://mx.indeed.com/rc/clk"
        );
    }

    #[test]
    fn test_clean_url_without_usable_base() {
        assert_eq!(clean_url("/jobs/1?x=1", ""), "/jobs/1");
        assert_eq!(clean_url("", "https://mx.indeed.com"), "");
    }

    #[test]
    fn test_truncate_for_log_short_string() {
        let s = "Hello, world!";
        assert_eq!(truncate_for_log(s, 100), "Hello, world!");
    }

    #[test]
    fn test_truncate_for_log_long_string() {
        let s = "a".repeat(500);
        let result = truncate_for_log(&s, 100);
        assert!(result.starts_with(&"a".repeat(100)));
        assert!(result.contains("…(+400 bytes)"));
    }

    #[test]
    fn test_truncate_for_log_respects_char_boundaries() {
        let result = truncate_for_log("ñññ", 3);
        assert_eq!(result, "ñ…(+4 bytes)");
    }

    #[test]
    fn test_random_between_stays_in_range() {
        let min = Duration::from_millis(500);
        let max = Duration::from_millis(1000);
        for _ in 0..50 {
            let d = random_between(min, max);
            assert!(d >= min && d <= max);
        }
        assert_eq!(random_between(Duration::ZERO, Duration::ZERO), Duration::ZERO);
        let swapped = random_between(max, min);
        assert!(swapped >= min && swapped <= max);
    }
}

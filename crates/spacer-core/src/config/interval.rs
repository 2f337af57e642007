//! Backup interval parsing
//!
//! Accepted forms are `"<N>h"` and `"<N>m"`. Anything else falls back to
//! [`DEFAULT_INTERVAL`].

use std::time::Duration;
use tracing::warn;

/// Interval used when the configured string is not an hour or minute value
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(5);

/// Parse an interval string such as `"2h"` or `"30m"`.
///
/// Hours win over minutes: a string containing `h` is read as hours using
/// the number before the first `h`. A number that cannot be parsed yields
/// the default as well.
pub fn parse_interval(raw: &str) -> Duration {
    let raw = raw.trim();

    if let Some(idx) = raw.find('h') {
        return leading_count(raw, &raw[..idx])
            .and_then(|hours| scaled(raw, hours, 3600))
            .unwrap_or(DEFAULT_INTERVAL);
    }

    if let Some(idx) = raw.find('m') {
        return leading_count(raw, &raw[..idx])
            .and_then(|minutes| scaled(raw, minutes, 60))
            .unwrap_or(DEFAULT_INTERVAL);
    }

    DEFAULT_INTERVAL
}

fn leading_count(raw: &str, digits: &str) -> Option<u64> {
    match digits.trim().parse::<u64>() {
        Ok(count) => Some(count),
        Err(e) => {
            warn!(
                "Unparsable interval {:?} ({}), using {:?}",
                raw, e, DEFAULT_INTERVAL
            );
            None
        }
    }
}

fn scaled(raw: &str, count: u64, unit_secs: u64) -> Option<Duration> {
    match count.checked_mul(unit_secs) {
        Some(secs) => Some(Duration::from_secs(secs)),
        None => {
            warn!(
                "Interval {:?} is out of range, using {:?}",
                raw, DEFAULT_INTERVAL
            );
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hours() {
        assert_eq!(parse_interval("2h"), Duration::from_secs(2 * 3600));
        assert_eq!(parse_interval("24h"), Duration::from_secs(24 * 3600));
    }

    #[test]
    fn test_parse_minutes() {
        assert_eq!(parse_interval("30m"), Duration::from_secs(30 * 60));
        assert_eq!(parse_interval(" 1m "), Duration::from_secs(60));
    }

    #[test]
    fn test_parse_garbage_defaults() {
        assert_eq!(parse_interval("garbage"), DEFAULT_INTERVAL);
        assert_eq!(parse_interval(""), DEFAULT_INTERVAL);
        assert_eq!(parse_interval("10s"), DEFAULT_INTERVAL);
        assert_eq!(parse_interval("3d"), DEFAULT_INTERVAL);
    }

    #[test]
    fn test_parse_unparsable_count_defaults() {
        assert_eq!(parse_interval("xh"), DEFAULT_INTERVAL);
        assert_eq!(parse_interval("-5m"), DEFAULT_INTERVAL);
    }

    #[test]
    fn test_out_of_range_count_defaults() {
        assert_eq!(parse_interval("99999999999999999h"), DEFAULT_INTERVAL);
        assert_eq!(parse_interval("999999999999999999m"), DEFAULT_INTERVAL);
        assert_eq!(
            parse_interval("5124095576030431h"),
            Duration::from_secs(5124095576030431 * 3600)
        );
    }

    #[test]
    fn test_hours_take_precedence() {
        assert_eq!(parse_interval("1h30m"), Duration::from_secs(3600));
    }
}

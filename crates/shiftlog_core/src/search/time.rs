//! Time expression resolver.
//!
//! # Responsibility
//! - Parse a search-parameter value into either an absolute instant or a
//!   relative duration anchored at `now`.
//! - Own the canonical millisecond-precision timestamp format used at the
//!   store query boundary.
//!
//! # Invariants
//! - Resolution is pure: the caller supplies `now`, nothing here reads
//!   the clock.
//! - Unrecognized expressions fail with `TimeParseError`; the caller must
//!   surface this as a client-input fault, not retry.

use chrono::{DateTime, NaiveDateTime, TimeDelta, TimeZone, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Canonical millisecond-precision timestamp format (UTC).
pub const CANONICAL_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

static RELATIVE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^\s*(\d+)\s*(s|sec|secs|second|seconds|min|mins|minute|minutes|h|hour|hours|d|day|days|w|week|weeks)\s*$",
    )
    .expect("valid relative time regex")
});

/// Error for time expressions that are neither absolute nor relative.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeParseError {
    /// The offending raw expression.
    pub raw: String,
}

impl Display for TimeParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "unrecognized time expression `{}`; expected `{CANONICAL_FORMAT}` or `<count> <unit>`",
            self.raw
        )
    }
}

impl Error for TimeParseError {}

/// Resolves a raw time expression against the provided `now`.
///
/// Accepted forms:
/// - canonical absolute timestamps (`2021-01-20 12:00:00.123`, fraction
///   optional), interpreted as UTC;
/// - `now`;
/// - `<count> <unit>` relative durations (`2 hours`, `30 mins`, `1 w`),
///   resolved to `now - duration`.
pub fn resolve(raw: &str, now: DateTime<Utc>) -> Result<DateTime<Utc>, TimeParseError> {
    let trimmed = raw.trim();

    if trimmed.eq_ignore_ascii_case("now") {
        return Ok(now);
    }

    if let Some(instant) = parse_absolute(trimmed) {
        return Ok(instant);
    }

    if let Some(caps) = RELATIVE_RE.captures(trimmed) {
        let count: i64 = caps[1].parse().map_err(|_| TimeParseError {
            raw: trimmed.to_string(),
        })?;
        let delta = unit_delta(&caps[2], count).ok_or_else(|| TimeParseError {
            raw: trimmed.to_string(),
        })?;
        return now.checked_sub_signed(delta).ok_or_else(|| TimeParseError {
            raw: trimmed.to_string(),
        });
    }

    Err(TimeParseError {
        raw: trimmed.to_string(),
    })
}

/// Formats an instant in the canonical millisecond-precision format.
pub fn format_canonical(instant: DateTime<Utc>) -> String {
    instant.format(CANONICAL_FORMAT).to_string()
}

/// Parses a canonical timestamp into epoch milliseconds.
///
/// Used at the store boundary; returns `None` for anything that is not
/// already canonical.
pub fn parse_canonical(value: &str) -> Option<i64> {
    parse_absolute(value.trim()).map(|instant| instant.timestamp_millis())
}

fn parse_absolute(value: &str) -> Option<DateTime<Utc>> {
    let naive = NaiveDateTime::parse_from_str(value, CANONICAL_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S"))
        .ok()?;
    Some(Utc.from_utc_datetime(&naive))
}

fn unit_delta(unit: &str, count: i64) -> Option<TimeDelta> {
    match unit.to_ascii_lowercase().as_str() {
        "s" | "sec" | "secs" | "second" | "seconds" => TimeDelta::try_seconds(count),
        "min" | "mins" | "minute" | "minutes" => TimeDelta::try_minutes(count),
        "h" | "hour" | "hours" => TimeDelta::try_hours(count),
        "d" | "day" | "days" => TimeDelta::try_days(count),
        "w" | "week" | "weeks" => TimeDelta::try_weeks(count),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::{format_canonical, parse_canonical, resolve, TimeParseError};
    use chrono::{TimeDelta, TimeZone, Utc};

    fn fixed_now() -> chrono::DateTime<Utc> {
        Utc.with_ymd_and_hms(2021, 1, 20, 12, 0, 0).unwrap()
    }

    #[test]
    fn absolute_expression_ignores_now() {
        let resolved = resolve("2021-01-20 12:00:00.123", fixed_now()).unwrap();
        assert_eq!(format_canonical(resolved), "2021-01-20 12:00:00.123");
    }

    #[test]
    fn absolute_expression_accepts_missing_fraction() {
        let resolved = resolve("2020-06-01 08:30:15", fixed_now()).unwrap();
        assert_eq!(format_canonical(resolved), "2020-06-01 08:30:15.000");
    }

    #[test]
    fn relative_expression_is_anchored_at_now() {
        let now = fixed_now();
        let resolved = resolve("2 hours", now).unwrap();
        assert_eq!(resolved, now - TimeDelta::try_hours(2).unwrap());

        let resolved = resolve("3 days", now).unwrap();
        assert_eq!(resolved, now - TimeDelta::try_days(3).unwrap());
    }

    #[test]
    fn relative_units_accept_short_forms_and_case() {
        let now = fixed_now();
        assert_eq!(
            resolve("30 MINS", now).unwrap(),
            now - TimeDelta::try_minutes(30).unwrap()
        );
        assert_eq!(
            resolve("1w", now).unwrap(),
            now - TimeDelta::try_weeks(1).unwrap()
        );
    }

    #[test]
    fn now_resolves_to_now() {
        assert_eq!(resolve("now", fixed_now()).unwrap(), fixed_now());
        assert_eq!(resolve(" NOW ", fixed_now()).unwrap(), fixed_now());
    }

    #[test]
    fn garbage_fails_with_parse_error() {
        let err = resolve("yesterday-ish", fixed_now()).unwrap_err();
        assert_eq!(
            err,
            TimeParseError {
                raw: "yesterday-ish".to_string()
            }
        );
    }

    #[test]
    fn canonical_round_trip_preserves_millis() {
        let now = fixed_now() + TimeDelta::try_milliseconds(123).unwrap();
        let text = format_canonical(now);
        assert_eq!(parse_canonical(&text), Some(now.timestamp_millis()));
    }

    #[test]
    fn parse_canonical_rejects_relative_expressions() {
        assert_eq!(parse_canonical("2 days"), None);
    }
}

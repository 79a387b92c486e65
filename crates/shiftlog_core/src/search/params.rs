//! Search parameter translation.
//!
//! # Responsibility
//! - Rewrite the reserved time-bound keys of a search parameter map into
//!   canonical timestamps before the map reaches the entity store.
//!
//! # Invariants
//! - Only keys named `start`/`end` (case-insensitive) are touched; all
//!   other keys pass through untouched.
//! - After a successful rewrite the map contains no relative expressions.

use crate::repo::entry_repo::SearchParams;
use crate::search::time::{format_canonical, resolve, TimeParseError};
use chrono::{DateTime, Utc};

/// Returns whether a parameter key denotes a reserved time bound.
pub fn is_time_bound_key(key: &str) -> bool {
    key.eq_ignore_ascii_case("start") || key.eq_ignore_ascii_case("end")
}

/// Rewrites time-bound values to canonical timestamps anchored at `now`.
///
/// For each time-bound key the first value is resolved and becomes the
/// key's single value, mirroring the original query contract. Keys with
/// no values are left alone.
pub fn rewrite_time_bounds(
    params: &SearchParams,
    now: DateTime<Utc>,
) -> Result<SearchParams, TimeParseError> {
    let mut rewritten = SearchParams::new();
    for (key, values) in params {
        if is_time_bound_key(key) {
            if let Some(raw) = values.first() {
                let instant = resolve(raw, now)?;
                rewritten.insert(key.clone(), vec![format_canonical(instant)]);
                continue;
            }
        }
        rewritten.insert(key.clone(), values.clone());
    }
    Ok(rewritten)
}

#[cfg(test)]
mod tests {
    use super::{is_time_bound_key, rewrite_time_bounds};
    use crate::repo::entry_repo::SearchParams;
    use crate::search::time::format_canonical;
    use chrono::{TimeDelta, TimeZone, Utc};

    fn fixed_now() -> chrono::DateTime<Utc> {
        Utc.with_ymd_and_hms(2021, 1, 20, 12, 0, 0).unwrap()
    }

    #[test]
    fn recognizes_reserved_keys_case_insensitively() {
        assert!(is_time_bound_key("start"));
        assert!(is_time_bound_key("Start"));
        assert!(is_time_bound_key("END"));
        assert!(!is_time_bound_key("startle"));
        assert!(!is_time_bound_key("owner"));
    }

    #[test]
    fn rewrites_relative_bounds_and_passes_other_keys_through() {
        let mut params = SearchParams::new();
        params.insert("start".to_string(), vec!["2 days".to_string()]);
        params.insert("owner".to_string(), vec!["alice".to_string()]);

        let now = fixed_now();
        let rewritten = rewrite_time_bounds(&params, now).unwrap();

        let expected = format_canonical(now - TimeDelta::try_hours(48).unwrap());
        assert_eq!(rewritten["start"], vec![expected]);
        assert_eq!(rewritten["owner"], vec!["alice".to_string()]);
    }

    #[test]
    fn only_first_value_of_a_time_bound_survives() {
        let mut params = SearchParams::new();
        params.insert(
            "End".to_string(),
            vec!["now".to_string(), "ignored".to_string()],
        );

        let rewritten = rewrite_time_bounds(&params, fixed_now()).unwrap();
        assert_eq!(rewritten["End"], vec![format_canonical(fixed_now())]);
    }

    #[test]
    fn bad_expression_surfaces_parse_error() {
        let mut params = SearchParams::new();
        params.insert("start".to_string(), vec!["whenever".to_string()]);
        assert!(rewrite_time_bounds(&params, fixed_now()).is_err());
    }

    #[test]
    fn empty_time_bound_values_are_left_alone() {
        let mut params = SearchParams::new();
        params.insert("start".to_string(), Vec::new());
        let rewritten = rewrite_time_bounds(&params, fixed_now()).unwrap();
        assert!(rewritten["start"].is_empty());
    }
}

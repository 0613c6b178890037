//! Client-side parameter validation.
//!
//! Pure checks run before any network call. Each returns a
//! [`ValyuError::Validation`] naming the offending parameter; services turn
//! that into a `success: false` response.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::errors::{ValyuError, ValyuResult};

/// Maximum length of free-text system instructions, after trimming.
pub const MAX_SYSTEM_INSTRUCTIONS_LEN: usize = 2000;

/// Allowed range for `max_num_results`.
pub const MAX_NUM_RESULTS_RANGE: std::ops::RangeInclusive<u32> = 1..=100;

/// Maximum URLs per contents request.
pub const MAX_CONTENTS_URLS: usize = 10;

/// Maximum tasks per batch submission.
pub const MAX_BATCH_TASKS: usize = 100;

#[allow(clippy::expect_used)]
static DATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]{4}-[0-9]{2}-[0-9]{2}$").expect("date pattern compiles"));

#[allow(clippy::expect_used)]
static DOMAIN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^[a-zA-Z0-9]([a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(\.[a-zA-Z0-9]([a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)+(/.+)?$",
    )
    .expect("domain pattern compiles")
});

#[allow(clippy::expect_used)]
static TOKEN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z0-9_-]+$").expect("token pattern compiles"));

/// Returns true for `YYYY-MM-DD`. Calendar validity is left to the server.
pub fn is_valid_date(date: &str) -> bool {
    DATE_RE.is_match(date)
}

/// Returns true if `source` is a URL, a dotted domain (optionally with a
/// path), or a `provider/dataset` pair.
pub fn is_valid_source(source: &str) -> bool {
    if source.starts_with("http://") || source.starts_with("https://") {
        return true;
    }

    if source.contains('.') && DOMAIN_RE.is_match(source) {
        return true;
    }

    let mut parts = source.split('/');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(provider), Some(dataset), None) => {
            TOKEN_RE.is_match(provider) && TOKEN_RE.is_match(dataset)
        }
        _ => false,
    }
}

/// Checks an optional date parameter.
pub fn validate_date(param: &str, value: Option<&str>) -> ValyuResult<()> {
    match value {
        Some(date) if !date.is_empty() && !is_valid_date(date) => {
            Err(ValyuError::validation_param(
                format!("Invalid {} format. Must be YYYY-MM-DD", param),
                param,
                Some(date.to_string()),
            ))
        }
        _ => Ok(()),
    }
}

/// Checks every entry of a source list.
pub fn validate_sources(param: &str, sources: &[String]) -> ValyuResult<()> {
    match sources.iter().find(|s| !is_valid_source(s)) {
        Some(invalid) => Err(ValyuError::validation_param(
            format!("Invalid {} format. Invalid source: {}", param, invalid),
            param,
            Some(invalid.clone()),
        )),
        None => Ok(()),
    }
}

/// Checks that a required string is non-blank.
pub fn validate_required(param: &str, value: &str) -> ValyuResult<()> {
    if value.trim().is_empty() {
        return Err(ValyuError::validation_param(
            format!("{} is required and must be a non-empty string", param),
            param,
            None,
        ));
    }
    Ok(())
}

/// Checks that an integer lies in an inclusive range.
pub fn validate_range(
    param: &str,
    value: u32,
    range: std::ops::RangeInclusive<u32>,
) -> ValyuResult<()> {
    if !range.contains(&value) {
        return Err(ValyuError::validation_param(
            format!(
                "{} must be between {} and {}",
                param,
                range.start(),
                range.end()
            ),
            param,
            Some(value.to_string()),
        ));
    }
    Ok(())
}

/// Checks that an optional price is not negative.
pub fn validate_non_negative(param: &str, value: Option<f64>) -> ValyuResult<()> {
    match value {
        Some(v) if v < 0.0 || v.is_nan() => Err(ValyuError::validation_param(
            format!("{} must be a positive number", param),
            param,
            Some(v.to_string()),
        )),
        _ => Ok(()),
    }
}

/// Checks optional free text: non-blank when present and at most `max`
/// characters after trimming.
pub fn validate_instructions(param: &str, value: Option<&str>, max: usize) -> ValyuResult<()> {
    let Some(text) = value else {
        return Ok(());
    };

    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(ValyuError::validation_param(
            format!("{} cannot be empty when provided", param),
            param,
            None,
        ));
    }

    if trimmed.chars().count() > max {
        return Err(ValyuError::validation_param(
            format!("{} must be {} characters or less", param, max),
            param,
            None,
        ));
    }

    Ok(())
}

/// Checks a country code: `ALL` or two uppercase ASCII letters.
pub fn validate_country_code(value: Option<&str>) -> ValyuResult<()> {
    match value {
        Some(code)
            if code != "ALL"
                && !(code.len() == 2 && code.bytes().all(|b| b.is_ascii_uppercase())) =>
        {
            Err(ValyuError::validation_param(
                "country_code must be 'ALL' or an ISO 3166-1 alpha-2 code",
                "country_code",
                Some(code.to_string()),
            ))
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;
    use tokio_test::{assert_err, assert_ok};

    #[test_case("2024-01-01", true ; "iso date")]
    #[test_case("2024/01/01", false ; "slashes")]
    #[test_case("24-01-01", false ; "short year")]
    #[test_case("2024-1-1", false ; "unpadded")]
    #[test_case("2024-01-01T00:00:00", false ; "timestamp")]
    fn test_date_format(date: &str, expected: bool) {
        assert_eq!(is_valid_date(date), expected);
    }

    #[test_case("valyu/valyu-arxiv", true ; "provider dataset")]
    #[test_case("https://example.com/x", true ; "https url")]
    #[test_case("http://example.com", true ; "http url")]
    #[test_case("example.com", true ; "bare domain")]
    #[test_case("arxiv.org/abs", true ; "domain with path")]
    #[test_case("not a source!!", false ; "free text")]
    #[test_case("a/b/c", false ; "three segments")]
    #[test_case("valyu/", false ; "empty dataset")]
    #[test_case("-bad.com", false ; "leading hyphen")]
    fn test_source_format(source: &str, expected: bool) {
        assert_eq!(is_valid_source(source), expected);
    }

    #[test]
    fn test_validate_date_messages() {
        assert_ok!(validate_date("start_date", Some("2024-01-01")));
        assert_ok!(validate_date("start_date", None));
        assert_ok!(validate_date("start_date", Some("")));

        let err = assert_err!(validate_date("start_date", Some("2024/01/01")));
        assert_eq!(err.message(), "Invalid start_date format. Must be YYYY-MM-DD");
    }

    #[test]
    fn test_validate_range_bounds() {
        assert!(validate_range("max_num_results", 0, MAX_NUM_RESULTS_RANGE).is_err());
        assert!(validate_range("max_num_results", 1, MAX_NUM_RESULTS_RANGE).is_ok());
        assert!(validate_range("max_num_results", 100, MAX_NUM_RESULTS_RANGE).is_ok());
        assert!(validate_range("max_num_results", 101, MAX_NUM_RESULTS_RANGE).is_err());
    }

    #[test]
    fn test_validate_sources_names_offender() {
        let sources = vec!["valyu/valyu-arxiv".to_string(), "bad source".to_string()];
        let err = validate_sources("included_sources", &sources).unwrap_err();
        assert_eq!(
            err.message(),
            "Invalid included_sources format. Invalid source: bad source"
        );
    }

    #[test]
    fn test_validate_instructions() {
        assert!(validate_instructions("system_instructions", None, 10).is_ok());
        assert!(validate_instructions("system_instructions", Some("  ok  "), 2).is_ok());
        assert!(validate_instructions("system_instructions", Some("   "), 10).is_err());

        let long = "x".repeat(MAX_SYSTEM_INSTRUCTIONS_LEN + 1);
        assert!(validate_instructions(
            "system_instructions",
            Some(&long),
            MAX_SYSTEM_INSTRUCTIONS_LEN
        )
        .is_err());
    }

    #[test]
    fn test_validate_non_negative() {
        assert!(validate_non_negative("data_max_price", Some(0.0)).is_ok());
        assert!(validate_non_negative("data_max_price", Some(-1.0)).is_err());
        assert!(validate_non_negative("data_max_price", None).is_ok());
    }

    #[test]
    fn test_validate_country_code() {
        assert!(validate_country_code(Some("US")).is_ok());
        assert!(validate_country_code(Some("ALL")).is_ok());
        assert!(validate_country_code(Some("usa")).is_err());
        assert!(validate_country_code(None).is_ok());
    }

    #[test]
    fn test_validate_required() {
        assert!(validate_required("query", "rag").is_ok());
        assert!(validate_required("query", "  ").is_err());
    }
}

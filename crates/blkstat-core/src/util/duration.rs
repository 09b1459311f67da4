//! Duration parser for CLI arguments.
//!
//! Unit forms (`500ms`, `1m30s`, `2h`, ...) are parsed by `humantime`. On top
//! of that a bare integer means seconds (`5`) and a leading sign is accepted
//! (`-1s`, `+2s`).

use std::time::Duration;

use thiserror::Error;

/// Error type for duration parsing failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("failed to parse duration '{input}': {message}")]
pub struct DurationParseError {
    pub input: String,
    pub message: String,
}

impl DurationParseError {
    fn new(input: &str, message: impl Into<String>) -> Self {
        Self {
            input: input.to_string(),
            message: message.into(),
        }
    }
}

/// Parses a duration string into signed nanoseconds.
///
/// # Examples
///
/// ```
/// use blkstat_core::util::parse_duration_nanos;
///
/// assert_eq!(parse_duration_nanos("1m30s").unwrap(), 90_000_000_000);
/// assert_eq!(parse_duration_nanos("-250ms").unwrap(), -250_000_000);
/// assert_eq!(parse_duration_nanos("2").unwrap(), 2_000_000_000);
/// ```
pub fn parse_duration_nanos(input: &str) -> Result<i128, DurationParseError> {
    let trimmed = input.trim();
    let (negative, rest) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };

    if rest.is_empty() {
        return Err(DurationParseError::new(input, "empty duration"));
    }

    let duration = if rest.bytes().all(|b| b.is_ascii_digit()) {
        let secs: u64 = rest
            .parse()
            .map_err(|_| DurationParseError::new(input, "number out of range"))?;
        Duration::from_secs(secs)
    } else {
        humantime::parse_duration(rest)
            .map_err(|e| DurationParseError::new(input, e.to_string()))?
    };

    let nanos = i128::try_from(duration.as_nanos())
        .map_err(|_| DurationParseError::new(input, "duration overflow"))?;
    Ok(if negative { -nanos } else { nanos })
}

/// Parses a duration that must be strictly positive to be usable.
///
/// Returns `Ok(None)` for zero or negative durations so callers can apply
/// their default.
pub fn parse_positive_duration(input: &str) -> Result<Option<Duration>, DurationParseError> {
    let nanos = parse_duration_nanos(input)?;
    if nanos <= 0 {
        return Ok(None);
    }
    let nanos = u64::try_from(nanos)
        .map_err(|_| DurationParseError::new(input, "duration overflow"))?;
    Ok(Some(Duration::from_nanos(nanos)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_seconds() {
        assert_eq!(parse_duration_nanos("1").unwrap(), 1_000_000_000);
        assert_eq!(parse_duration_nanos(" 10 ").unwrap(), 10_000_000_000);
        assert_eq!(parse_duration_nanos("0").unwrap(), 0);
    }

    #[test]
    fn test_units() {
        assert_eq!(parse_duration_nanos("15ns").unwrap(), 15);
        assert_eq!(parse_duration_nanos("3us").unwrap(), 3_000);
        assert_eq!(parse_duration_nanos("500ms").unwrap(), 500_000_000);
        assert_eq!(parse_duration_nanos("2s").unwrap(), 2_000_000_000);
        assert_eq!(parse_duration_nanos("5m").unwrap(), 300_000_000_000);
        assert_eq!(parse_duration_nanos("1h").unwrap(), 3_600_000_000_000);
    }

    #[test]
    fn test_compound() {
        assert_eq!(parse_duration_nanos("1m30s").unwrap(), 90_000_000_000);
        assert_eq!(parse_duration_nanos("1m 30s").unwrap(), 90_000_000_000);
        assert_eq!(parse_duration_nanos("1h2m3s4ms").unwrap(), 3_723_004_000_000);
    }

    #[test]
    fn test_unit_forms_match_humantime() {
        for input in ["500ms", "1m30s", "1s", "2h", "1h2m3s4ms", "15ns", "3us"] {
            let expected = humantime::parse_duration(input).unwrap().as_nanos() as i128;
            assert_eq!(parse_duration_nanos(input).unwrap(), expected, "{input}");
            assert_eq!(parse_duration_nanos(&format!("-{input}")).unwrap(), -expected);
        }
    }

    #[test]
    fn test_signs() {
        assert_eq!(parse_duration_nanos("-1s").unwrap(), -1_000_000_000);
        assert_eq!(parse_duration_nanos("+1s").unwrap(), 1_000_000_000);
        assert_eq!(parse_duration_nanos("-3").unwrap(), -3_000_000_000);
    }

    #[test]
    fn test_invalid_formats() {
        for input in ["", " ", "-", "+", "s", "1x", "abc", "--1s"] {
            assert!(parse_duration_nanos(input).is_err(), "{input} should fail");
        }
        let err = parse_duration_nanos("5 fortnights").unwrap_err();
        assert_eq!(err.input, "5 fortnights");
        assert!(!err.message.is_empty());
        assert!(err.to_string().starts_with("failed to parse duration '5 fortnights'"));
    }

    #[test]
    fn test_positive_duration() {
        assert_eq!(
            parse_positive_duration("250ms").unwrap(),
            Some(Duration::from_millis(250))
        );
        assert_eq!(parse_positive_duration("0s").unwrap(), None);
        assert_eq!(parse_positive_duration("-5s").unwrap(), None);
        assert!(parse_positive_duration("soon").is_err());
    }
}

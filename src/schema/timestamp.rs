//! Timestamp parsing for classification exports
//!
//! Exports mix several timestamp layouts (`created_at` is written by the
//! database, `started_at` / `finished_at` by the browser). A
//! [`TimestampParser`] tries an explicit, ordered list of strategies and
//! reports every failure when none of them match.

use chrono::{DateTime, NaiveDateTime, Utc};

use crate::error::SessionError;

/// A single way of reading a timestamp string
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseStrategy {
    /// `2016-02-10T17:59:45.500Z`, `2016-02-10T17:59:45+00:00`
    Rfc3339,
    /// `2016-02-10 18:00:00 UTC`
    UtcSuffix,
    /// `2016-02-10 17:59:45.500` or `2016-02-10 17:59:45`, read as UTC.
    /// A `T` separator and a trailing `Z` are accepted.
    NaiveUtc,
}

impl ParseStrategy {
    pub const ALL: [ParseStrategy; 3] = [
        ParseStrategy::Rfc3339,
        ParseStrategy::UtcSuffix,
        ParseStrategy::NaiveUtc,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ParseStrategy::Rfc3339 => "rfc3339",
            ParseStrategy::UtcSuffix => "'%Y-%m-%d %H:%M:%S UTC'",
            ParseStrategy::NaiveUtc => "'%Y-%m-%d %H:%M:%S%.f'",
        }
    }

    pub fn parse(&self, raw: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
        match self {
            ParseStrategy::Rfc3339 => {
                DateTime::parse_from_rfc3339(raw).map(|dt| dt.with_timezone(&Utc))
            }
            ParseStrategy::UtcSuffix => {
                NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S UTC").map(|n| n.and_utc())
            }
            ParseStrategy::NaiveUtc => {
                let normalized = raw.replacen('T', " ", 1);
                let normalized = normalized.strip_suffix('Z').unwrap_or(&normalized);
                NaiveDateTime::parse_from_str(normalized, "%Y-%m-%d %H:%M:%S%.f")
                    .map(|n| n.and_utc())
            }
        }
    }
}

/// Ordered list of parse strategies; the first match wins
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimestampParser {
    strategies: Vec<ParseStrategy>,
}

impl Default for TimestampParser {
    fn default() -> Self {
        Self {
            strategies: ParseStrategy::ALL.to_vec(),
        }
    }
}

impl TimestampParser {
    /// Use a custom strategy order
    pub fn with_strategies(strategies: Vec<ParseStrategy>) -> Self {
        Self { strategies }
    }

    pub fn strategies(&self) -> &[ParseStrategy] {
        &self.strategies
    }

    /// Parse a timestamp, or fail listing why each strategy rejected it
    pub fn parse(&self, raw: &str) -> Result<DateTime<Utc>, SessionError> {
        let trimmed = raw.trim();
        let mut failures = Vec::with_capacity(self.strategies.len());

        for strategy in &self.strategies {
            match strategy.parse(trimmed) {
                Ok(timestamp) => return Ok(timestamp),
                Err(e) => failures.push(format!("{}: {}", strategy.name(), e)),
            }
        }

        Err(SessionError::DateParseError(format!(
            "'{}' matched no timestamp format ({})",
            trimmed,
            failures.join("; ")
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Timelike};

    #[test]
    fn test_rfc3339_with_millis() {
        let parsed = TimestampParser::default()
            .parse("2016-02-10T17:59:45.500Z")
            .unwrap();
        assert_eq!(parsed.nanosecond(), 500_000_000);
        assert_eq!(parsed.second(), 45);
    }

    #[test]
    fn test_rfc3339_with_offset_converts_to_utc() {
        let parsed = TimestampParser::default()
            .parse("2016-02-10T19:00:00+01:00")
            .unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2016, 2, 10, 18, 0, 0).unwrap());
    }

    #[test]
    fn test_database_format() {
        let parsed = TimestampParser::default()
            .parse("2016-02-10 18:00:00 UTC")
            .unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2016, 2, 10, 18, 0, 0).unwrap());
    }

    #[test]
    fn test_naive_formats() {
        let parser = TimestampParser::default();
        let expected = Utc.with_ymd_and_hms(2016, 2, 10, 18, 0, 0).unwrap();

        assert_eq!(parser.parse("2016-02-10 18:00:00").unwrap(), expected);
        assert_eq!(parser.parse("2016-02-10T18:00:00").unwrap(), expected);
        assert_eq!(
            parser.parse(" 2016-02-10 18:00:00.250 ").unwrap(),
            expected + chrono::Duration::milliseconds(250)
        );
    }

    #[test]
    fn test_all_strategies_reported_on_failure() {
        let err = TimestampParser::default().parse("last tuesday").unwrap_err();
        let message = err.to_string();
        assert!(message.contains("last tuesday"));
        for strategy in ParseStrategy::ALL {
            assert!(message.contains(strategy.name()));
        }
    }

    #[test]
    fn test_custom_strategy_order_limits_formats() {
        let parser = TimestampParser::with_strategies(vec![ParseStrategy::Rfc3339]);
        assert!(parser.parse("2016-02-10 18:00:00 UTC").is_err());
        assert_eq!(parser.strategies(), &[ParseStrategy::Rfc3339]);
    }
}

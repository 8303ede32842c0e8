//! Symbolic time ranges and time-series bucket keys.
//!
//! A [`TimeRange`] is the window token clients pass to the analytics API
//! (`24h`, `7d`, `30d`, `90d`, `1y`). It resolves to an absolute start
//! timestamp and to the [`TimeBucket`] granularity used when grouping a
//! time series over that window.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// The symbolic time window an analytics report covers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimeRange {
    /// Trailing 24 hours.
    #[serde(rename = "24h")]
    Day,
    /// Trailing 7 days.
    #[serde(rename = "7d")]
    Week,
    /// Trailing 30 days.
    #[default]
    #[serde(rename = "30d")]
    Month,
    /// Trailing 90 days.
    #[serde(rename = "90d")]
    Quarter,
    /// Trailing 365 days.
    #[serde(rename = "1y")]
    Year,
}

impl TimeRange {
    /// Parses a range token. Unrecognized tokens fall back to `30d`, a
    /// leniency policy rather than an error.
    #[must_use]
    pub fn parse(token: &str) -> Self {
        match token {
            "24h" => Self::Day,
            "7d" => Self::Week,
            "90d" => Self::Quarter,
            "1y" => Self::Year,
            _ => Self::Month,
        }
    }

    /// Returns the wire token for this range.
    #[must_use]
    pub const fn token(self) -> &'static str {
        match self {
            Self::Day => "24h",
            Self::Week => "7d",
            Self::Month => "30d",
            Self::Quarter => "90d",
            Self::Year => "1y",
        }
    }

    /// Returns the absolute start of this window, measured back from `now`.
    #[must_use]
    pub fn start_from(self, now: DateTime<Utc>) -> DateTime<Utc> {
        let span = match self {
            Self::Day => Duration::try_hours(24),
            Self::Week => Duration::try_days(7),
            Self::Month => Duration::try_days(30),
            Self::Quarter => Duration::try_days(90),
            Self::Year => Duration::try_days(365),
        };
        now - span.expect("constant fits in Duration")
    }

    /// Returns the bucket granularity used for time series over this window.
    #[must_use]
    pub const fn bucket(self) -> TimeBucket {
        match self {
            Self::Day => TimeBucket::Hourly,
            Self::Week | Self::Month | Self::Quarter => TimeBucket::Daily,
            Self::Year => TimeBucket::Monthly,
        }
    }
}

impl std::fmt::Display for TimeRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.token())
    }
}

/// Grouping granularity for time-series buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeBucket {
    /// One bucket per hour (`2025-08-25T14:00`).
    Hourly,
    /// One bucket per day (`2025-08-25`).
    Daily,
    /// One bucket per month (`2025-08`).
    Monthly,
}

impl TimeBucket {
    /// Renders the grouping key for a timestamp at this granularity.
    ///
    /// Keys sort chronologically when compared as strings.
    #[must_use]
    pub fn key(self, ts: DateTime<Utc>) -> String {
        match self {
            Self::Hourly => ts.format("%Y-%m-%dT%H:00").to_string(),
            Self::Daily => ts.format("%Y-%m-%d").to_string(),
            Self::Monthly => ts.format("%Y-%m").to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone as _;

    #[test]
    fn parses_known_tokens() {
        assert_eq!(TimeRange::parse("24h"), TimeRange::Day);
        assert_eq!(TimeRange::parse("7d"), TimeRange::Week);
        assert_eq!(TimeRange::parse("30d"), TimeRange::Month);
        assert_eq!(TimeRange::parse("90d"), TimeRange::Quarter);
        assert_eq!(TimeRange::parse("1y"), TimeRange::Year);
    }

    #[test]
    fn unknown_token_falls_back_to_month() {
        assert_eq!(TimeRange::parse("6h"), TimeRange::Month);
        assert_eq!(TimeRange::parse(""), TimeRange::Month);
        assert_eq!(TimeRange::parse("all"), TimeRange::Month);
    }

    #[test]
    fn bucket_granularity_per_range() {
        assert_eq!(TimeRange::Day.bucket(), TimeBucket::Hourly);
        assert_eq!(TimeRange::Week.bucket(), TimeBucket::Daily);
        assert_eq!(TimeRange::Month.bucket(), TimeBucket::Daily);
        assert_eq!(TimeRange::Quarter.bucket(), TimeBucket::Daily);
        assert_eq!(TimeRange::Year.bucket(), TimeBucket::Monthly);
    }

    #[test]
    fn start_subtracts_window_span() {
        let now = Utc.with_ymd_and_hms(2025, 8, 25, 12, 0, 0).unwrap();
        assert_eq!(
            TimeRange::Day.start_from(now),
            Utc.with_ymd_and_hms(2025, 8, 24, 12, 0, 0).unwrap()
        );
        assert_eq!(
            TimeRange::Week.start_from(now),
            Utc.with_ymd_and_hms(2025, 8, 18, 12, 0, 0).unwrap()
        );
        assert_eq!(
            TimeRange::Year.start_from(now),
            Utc.with_ymd_and_hms(2024, 8, 25, 12, 0, 0).unwrap()
        );
    }

    #[test]
    fn bucket_keys_render_expected_formats() {
        let ts = Utc.with_ymd_and_hms(2025, 8, 5, 14, 37, 9).unwrap();
        assert_eq!(TimeBucket::Hourly.key(ts), "2025-08-05T14:00");
        assert_eq!(TimeBucket::Daily.key(ts), "2025-08-05");
        assert_eq!(TimeBucket::Monthly.key(ts), "2025-08");
    }

    #[test]
    fn range_serializes_as_token() {
        assert_eq!(serde_json::to_string(&TimeRange::Day).unwrap(), "\"24h\"");
        assert_eq!(serde_json::to_string(&TimeRange::Year).unwrap(), "\"1y\"");
        let parsed: TimeRange = serde_json::from_str("\"90d\"").unwrap();
        assert_eq!(parsed, TimeRange::Quarter);
    }
}

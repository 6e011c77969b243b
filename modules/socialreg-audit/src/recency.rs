// Timestamp parsing and posting-recency buckets.

use std::fmt;

use chrono::{DateTime, TimeDelta, Utc};

/// How long ago an account last posted, relative to when it was fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RecencyCategory {
    Within24Hours,
    WithinWeek,
    WithinMonth,
    WithinYear,
    MoreThanYear,
}

impl RecencyCategory {
    pub const ALL: [RecencyCategory; 5] = [
        RecencyCategory::Within24Hours,
        RecencyCategory::WithinWeek,
        RecencyCategory::WithinMonth,
        RecencyCategory::WithinYear,
        RecencyCategory::MoreThanYear,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            RecencyCategory::Within24Hours => "within last 24 hours",
            RecencyCategory::WithinWeek => "within last week",
            RecencyCategory::WithinMonth => "within last month",
            RecencyCategory::WithinYear => "within last year",
            RecencyCategory::MoreThanYear => "more than a year ago",
        }
    }

    /// Bucket an elapsed duration. Each threshold is exclusive, so exactly
    /// 24 hours lands in `WithinWeek`.
    pub fn from_elapsed(elapsed: TimeDelta) -> Self {
        if elapsed < TimeDelta::hours(24) {
            RecencyCategory::Within24Hours
        } else if elapsed < TimeDelta::days(7) {
            RecencyCategory::WithinWeek
        } else if elapsed < TimeDelta::days(30) {
            RecencyCategory::WithinMonth
        } else if elapsed < TimeDelta::days(365) {
            RecencyCategory::WithinYear
        } else {
            RecencyCategory::MoreThanYear
        }
    }

    pub(crate) fn index(&self) -> usize {
        *self as usize
    }
}

impl fmt::Display for RecencyCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Category for a post made at `posted_at`, as seen from `as_of`.
pub fn categorize(
    as_of: DateTime<Utc>,
    posted_at: Option<DateTime<Utc>>,
) -> Option<RecencyCategory> {
    posted_at.map(|posted| RecencyCategory::from_elapsed(as_of - posted))
}

/// Parse the timestamp shapes the registry and platforms emit: RFC 3339,
/// Twitter's `Wed Oct 10 20:19:24 +0000 2018` and Graph's
/// `2017-06-01T12:00:00+0000`. Anything else is `None`.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    DateTime::parse_from_rfc3339(raw)
        .or_else(|_| DateTime::parse_from_str(raw, "%a %b %d %H:%M:%S %z %Y"))
        .or_else(|_| DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%z"))
        .or_else(|_| DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f%z"))
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, mo: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, 0, 0).unwrap()
    }

    #[test]
    fn boundaries_fall_into_older_bucket() {
        assert_eq!(
            RecencyCategory::from_elapsed(TimeDelta::hours(24)),
            RecencyCategory::WithinWeek
        );
        assert_eq!(
            RecencyCategory::from_elapsed(TimeDelta::days(7)),
            RecencyCategory::WithinMonth
        );
        assert_eq!(
            RecencyCategory::from_elapsed(TimeDelta::days(30)),
            RecencyCategory::WithinYear
        );
        assert_eq!(
            RecencyCategory::from_elapsed(TimeDelta::days(365)),
            RecencyCategory::MoreThanYear
        );
    }

    #[test]
    fn just_under_boundaries_stay_in_newer_bucket() {
        let second = TimeDelta::seconds(1);
        assert_eq!(
            RecencyCategory::from_elapsed(TimeDelta::hours(24) - second),
            RecencyCategory::Within24Hours
        );
        assert_eq!(
            RecencyCategory::from_elapsed(TimeDelta::days(7) - second),
            RecencyCategory::WithinWeek
        );
    }

    #[test]
    fn absent_timestamp_has_no_category() {
        assert_eq!(categorize(at(2018, 10, 11, 0), None), None);
    }

    #[test]
    fn categorize_uses_as_of_not_wall_clock() {
        let posted = at(2018, 10, 10, 20);
        assert_eq!(
            categorize(at(2018, 10, 11, 8), Some(posted)),
            Some(RecencyCategory::Within24Hours)
        );
        assert_eq!(
            categorize(at(2020, 1, 1, 0), Some(posted)),
            Some(RecencyCategory::MoreThanYear)
        );
    }

    #[test]
    fn parses_platform_formats() {
        let expected = Utc.with_ymd_and_hms(2018, 10, 10, 20, 19, 24).unwrap();
        assert_eq!(parse_timestamp("Wed Oct 10 20:19:24 +0000 2018"), Some(expected));
        assert_eq!(parse_timestamp("2018-10-10T20:19:24+0000"), Some(expected));
        assert_eq!(parse_timestamp("2018-10-10T15:19:24.000-05:00"), Some(expected));
    }

    #[test]
    fn malformed_timestamp_is_none() {
        assert_eq!(parse_timestamp("yesterday-ish"), None);
        assert_eq!(parse_timestamp(""), None);
    }
}

// Summary statistics over merged and deduplicated rows, rendered as a
// two-column TWITTER / FACEBOOK report.

use std::collections::HashSet;
use std::fmt;

use crate::platforms::Platform;
use crate::recency::RecencyCategory;
use crate::reconcile::MergedRow;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlatformStats {
    /// Distinct registry ids among merged rows.
    pub registry_records: usize,
    /// Distinct handles on the registry side.
    pub unique_handles: usize,
    /// Distinct platform ids found by the API. Facebook counts valid pages only.
    pub matched_ids: usize,
    pub verified: usize,
    /// Counts per [`RecencyCategory`], in `RecencyCategory::ALL` order.
    pub recency: [usize; 5],
}

impl PlatformStats {
    pub fn compute(platform: Platform, merged: &[MergedRow], deduped: &[MergedRow]) -> Self {
        let registry_records = merged
            .iter()
            .filter_map(MergedRow::registry_id)
            .collect::<HashSet<_>>()
            .len();
        let unique_handles = merged
            .iter()
            .filter_map(MergedRow::handle)
            .collect::<HashSet<_>>()
            .len();
        let matched_ids = merged
            .iter()
            .filter(|row| platform == Platform::Twitter || row.is_valid())
            .filter_map(MergedRow::platform_id)
            .collect::<HashSet<_>>()
            .len();

        let mut recency = [0; 5];
        for category in deduped.iter().filter_map(|row| row.recency) {
            recency[category.index()] += 1;
        }

        Self {
            registry_records,
            unique_handles,
            matched_ids,
            verified: deduped.iter().filter(|row| row.is_verified()).count(),
            recency,
        }
    }

    pub fn match_rate(&self) -> f64 {
        ratio(self.matched_ids, self.unique_handles)
    }

    pub fn verified_fraction(&self) -> f64 {
        ratio(self.verified, self.matched_ids)
    }

    pub fn recency_count(&self, category: RecencyCategory) -> usize {
        self.recency[category.index()]
    }

    pub fn recency_fraction(&self, category: RecencyCategory) -> f64 {
        ratio(self.recency_count(category), self.matched_ids)
    }
}

/// `numerator / denominator`, NaN when the denominator is zero.
pub fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        f64::NAN
    } else {
        numerator as f64 / denominator as f64
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatsReport {
    pub twitter: PlatformStats,
    pub facebook: PlatformStats,
}

fn recency_heading(category: RecencyCategory) -> &'static str {
    match category {
        RecencyCategory::Within24Hours => "Less than 24 hours ago:",
        RecencyCategory::WithinWeek => "Within the last week:",
        RecencyCategory::WithinMonth => "Within the last month:",
        RecencyCategory::WithinYear => "Within the last year:",
        RecencyCategory::MoreThanYear => "More than a year ago:",
    }
}

impl fmt::Display for StatsReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (t, fb) = (&self.twitter, &self.facebook);

        row(f, "", "TWITTER", "FACEBOOK")?;
        counts(f, "Total registry records:", t.registry_records, fb.registry_records)?;
        counts(f, "Unique usernames:", t.unique_handles, fb.unique_handles)?;
        counts(f, "Accounts found using APIs:", t.matched_ids, fb.matched_ids)?;
        percents(f, "   % of unique screen names:", t.match_rate(), fb.match_rate())?;
        counts(f, "Verified (with checkmark):", t.verified, fb.verified)?;
        percents(f, "   % of accounts found in API:", t.verified_fraction(), fb.verified_fraction())?;

        writeln!(f)?;
        row(f, "MOST RECENT POST BY CATEGORY", "TWITTER", "FACEBOOK")?;
        for category in RecencyCategory::ALL {
            counts(
                f,
                recency_heading(category),
                t.recency_count(category),
                fb.recency_count(category),
            )?;
            percents(
                f,
                "   % of accounts found in API:",
                t.recency_fraction(category),
                fb.recency_fraction(category),
            )?;
        }
        Ok(())
    }
}

fn row(f: &mut fmt::Formatter<'_>, label: &str, a: &str, b: &str) -> fmt::Result {
    writeln!(f, "{label:<30} {a:>10} {b:>10}")
}

fn counts(f: &mut fmt::Formatter<'_>, label: &str, a: usize, b: usize) -> fmt::Result {
    row(f, label, &thousands(a), &thousands(b))
}

fn percents(f: &mut fmt::Formatter<'_>, label: &str, a: f64, b: f64) -> fmt::Result {
    row(f, label, &percent(a), &percent(b))
}

/// `1234567` → `1,234,567`.
pub fn thousands(n: usize) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// `0.123` → `12.3%`; NaN stays `NaN`.
pub fn percent(fraction: f64) -> String {
    if fraction.is_nan() {
        "NaN".to_string()
    } else {
        format!("{:.1}%", fraction * 100.0)
    }
}

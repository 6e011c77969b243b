// Reconciliation: registry records → normalized rows → data-quality errors,
// and the outer join of rows with platform profiles.

use std::collections::{HashMap, HashSet};
use std::fmt;

use chrono::{DateTime, Utc};

use registry_client::RegistryRecord;

use crate::platforms::{Platform, PlatformProfile};
use crate::recency::{categorize, parse_timestamp, RecencyCategory};
use crate::username;

/// A registry record with its parsed timestamps and derived handle.
#[derive(Debug, Clone, PartialEq)]
pub struct RegistryRow {
    pub record: RegistryRecord,
    pub platform: Platform,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub handle: Option<String>,
    pub profile_url: Option<String>,
}

impl RegistryRow {
    pub fn new(record: RegistryRecord, platform: Platform) -> Self {
        let handle = username::extract(record.service_url(), platform);
        let profile_url = handle
            .as_deref()
            .map(|h| username::profile_url(h, platform));
        Self {
            created_at: record.created_at.as_deref().and_then(parse_timestamp),
            updated_at: record.updated_at.as_deref().and_then(parse_timestamp),
            record,
            platform,
            handle,
            profile_url,
        }
    }

    /// Twitter joins on handle, Facebook on canonical profile URL.
    pub fn join_key(&self) -> Option<&str> {
        match self.platform {
            Platform::Twitter => self.handle.as_deref(),
            Platform::Facebook => self.profile_url.as_deref(),
        }
    }
}

/// Registry rows split by platform. Services without a fetcher are only
/// counted.
#[derive(Debug, Clone, Default)]
pub struct RegistryPartitions {
    pub twitter: Vec<RegistryRow>,
    pub facebook: Vec<RegistryRow>,
    pub other: usize,
}

impl RegistryPartitions {
    pub fn rows(&self, platform: Platform) -> &[RegistryRow] {
        match platform {
            Platform::Twitter => &self.twitter,
            Platform::Facebook => &self.facebook,
        }
    }

    /// Distinct lookup identifiers for a platform: handles for Twitter,
    /// profile URLs for Facebook.
    pub fn lookup_ids(&self, platform: Platform) -> Vec<String> {
        let mut seen = HashSet::new();
        self.rows(platform)
            .iter()
            .filter_map(RegistryRow::join_key)
            .filter(|key| seen.insert(*key))
            .map(str::to_string)
            .collect()
    }
}

pub fn normalize(records: &[RegistryRecord]) -> RegistryPartitions {
    let mut partitions = RegistryPartitions::default();
    for record in records {
        match Platform::from_service_key(&record.service_key) {
            Some(Platform::Twitter) => partitions
                .twitter
                .push(RegistryRow::new(record.clone(), Platform::Twitter)),
            Some(Platform::Facebook) => partitions
                .facebook
                .push(RegistryRow::new(record.clone(), Platform::Facebook)),
            None => partitions.other += 1,
        }
    }
    partitions
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MismatchReason {
    /// The URL names the right service but no handle could be read from it.
    MissingScreenName,
    ServiceKeyMismatch,
}

impl MismatchReason {
    pub fn detail(&self) -> &'static str {
        match self {
            MismatchReason::MissingScreenName => "missing screen name (check service_url for errors)",
            MismatchReason::ServiceKeyMismatch => "service_key does not match service_url",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    DuplicateHandle,
    MissingDeclaredAccount,
    HandleUrlMismatch(MismatchReason),
    PlatformLookupFailed,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::DuplicateHandle => "duplicate_handle",
            ErrorKind::MissingDeclaredAccount => "missing_declared_account",
            ErrorKind::HandleUrlMismatch(_) => "handle_url_mismatch",
            ErrorKind::PlatformLookupFailed => "platform_lookup_failed",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub const DUPLICATE_DETAIL: &str = "screen name is not unique";
pub const MISSING_ACCOUNT_DETAIL: &str = "missing account field (use screen_name if available)";

/// A data-quality finding about one registry record.
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorRecord {
    pub source: RegistryRecord,
    pub kind: ErrorKind,
    pub detail: String,
}

impl ErrorRecord {
    fn new(row: &RegistryRow, kind: ErrorKind, detail: impl Into<String>) -> Self {
        Self {
            source: row.record.clone(),
            kind,
            detail: detail.into(),
        }
    }
}

/// Registry-side errors for one platform's rows, grouped in table order:
/// handle/URL mismatches, then missing accounts, then duplicates.
pub fn registry_errors(rows: &[RegistryRow]) -> Vec<ErrorRecord> {
    let mut errors = Vec::new();

    for row in rows.iter().filter(|r| r.handle.is_none()) {
        let reason = if row
            .record
            .service_url()
            .contains(row.record.service_key.as_str())
        {
            MismatchReason::MissingScreenName
        } else {
            MismatchReason::ServiceKeyMismatch
        };
        errors.push(ErrorRecord::new(
            row,
            ErrorKind::HandleUrlMismatch(reason),
            reason.detail(),
        ));
    }

    for row in rows.iter().filter(|r| r.record.declared_account().is_none()) {
        errors.push(ErrorRecord::new(
            row,
            ErrorKind::MissingDeclaredAccount,
            MISSING_ACCOUNT_DETAIL,
        ));
    }

    let mut counts: HashMap<&str, usize> = HashMap::new();
    for handle in rows.iter().filter_map(|r| r.handle.as_deref()) {
        *counts.entry(handle).or_default() += 1;
    }
    for row in rows {
        let duplicated = row
            .handle
            .as_deref()
            .is_some_and(|h| counts.get(h).copied().unwrap_or(0) > 1);
        if duplicated {
            errors.push(ErrorRecord::new(row, ErrorKind::DuplicateHandle, DUPLICATE_DETAIL));
        }
    }

    errors
}

/// `platform_lookup_failed` for every row whose join key the platform
/// rejected or did not return.
pub fn lookup_errors(rows: &[RegistryRow], failures: &HashMap<String, String>) -> Vec<ErrorRecord> {
    rows.iter()
        .filter_map(|row| {
            let reason = failures.get(row.join_key()?)?;
            Some(ErrorRecord::new(row, ErrorKind::PlatformLookupFailed, reason.clone()))
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Join
// ---------------------------------------------------------------------------

/// One row of the outer join. At least one side is always present.
#[derive(Debug, Clone, PartialEq)]
pub struct MergedRow {
    pub registry: Option<RegistryRow>,
    pub profile: Option<PlatformProfile>,
    pub recency: Option<RecencyCategory>,
}

impl MergedRow {
    pub fn join_key(&self) -> Option<&str> {
        self.registry
            .as_ref()
            .and_then(RegistryRow::join_key)
            .or_else(|| self.profile.as_ref()?.join_key.as_deref())
    }

    pub fn platform_id(&self) -> Option<&str> {
        self.profile.as_ref()?.platform_id.as_deref()
    }

    pub fn registry_id(&self) -> Option<i64> {
        self.registry.as_ref().map(|r| r.record.id)
    }

    pub fn handle(&self) -> Option<&str> {
        self.registry.as_ref()?.handle.as_deref()
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.registry.as_ref()?.created_at
    }

    pub fn is_verified(&self) -> bool {
        self.profile.as_ref().is_some_and(|p| p.verified)
    }

    pub fn is_valid(&self) -> bool {
        self.profile.as_ref().is_some_and(|p| p.valid)
    }
}

/// Full outer join of registry rows with profiles on join key. Absent keys
/// never match. Output is ordered by join key with unkeyed rows last.
pub fn merge(
    rows: &[RegistryRow],
    profiles: &[PlatformProfile],
    as_of: DateTime<Utc>,
) -> Vec<MergedRow> {
    let mut by_key: HashMap<&str, Vec<usize>> = HashMap::new();
    for (i, profile) in profiles.iter().enumerate() {
        if let Some(key) = profile.join_key.as_deref() {
            by_key.entry(key).or_default().push(i);
        }
    }

    let recency = |profile: Option<&PlatformProfile>| {
        categorize(as_of, profile.and_then(|p| p.last_posted_at))
    };

    let mut matched = vec![false; profiles.len()];
    let mut merged = Vec::with_capacity(rows.len() + profiles.len());

    for row in rows {
        let hits = row.join_key().and_then(|key| by_key.get(key));
        match hits {
            Some(indices) => {
                for &i in indices {
                    matched[i] = true;
                    merged.push(MergedRow {
                        registry: Some(row.clone()),
                        profile: Some(profiles[i].clone()),
                        recency: recency(Some(&profiles[i])),
                    });
                }
            }
            None => merged.push(MergedRow {
                registry: Some(row.clone()),
                profile: None,
                recency: None,
            }),
        }
    }

    for (profile, _) in profiles.iter().zip(&matched).filter(|(_, m)| !**m) {
        merged.push(MergedRow {
            registry: None,
            profile: Some(profile.clone()),
            recency: recency(Some(profile)),
        });
    }

    merged.sort_by(|a, b| {
        let (a, b) = (a.join_key(), b.join_key());
        a.is_none().cmp(&b.is_none()).then_with(|| a.cmp(&b))
    });
    merged
}

/// One row per platform id, preferring the most recently created registry
/// entry. Rows without a platform id are dropped.
pub fn dedupe_by_platform_id(merged: &[MergedRow]) -> Vec<MergedRow> {
    let mut candidates: Vec<&MergedRow> = merged
        .iter()
        .filter(|row| row.platform_id().is_some())
        .collect();
    candidates.sort_by_key(|row| std::cmp::Reverse(row.created_at()));

    let mut seen = HashSet::new();
    candidates
        .into_iter()
        .filter(|row| row.platform_id().is_some_and(|id| seen.insert(id.to_string())))
        .cloned()
        .collect()
}

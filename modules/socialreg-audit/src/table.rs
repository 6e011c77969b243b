// Printable tables for dashboard consumers.

use serde::Serialize;

use crate::reconcile::{ErrorRecord, MergedRow};

/// Rows that can be flattened into printable cells.
pub trait Tabular {
    const COLUMNS: &'static [&'static str];

    /// One cell per column, in `COLUMNS` order. Absent values are empty.
    fn cells(&self) -> Vec<String>;
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn from_rows<T: Tabular>(items: &[T]) -> Self {
        Self {
            columns: T::COLUMNS.iter().map(|c| c.to_string()).collect(),
            rows: items.iter().map(Tabular::cells).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Cell at `row` under the named column.
    pub fn cell(&self, row: usize, column: &str) -> Option<&str> {
        let col = self.columns.iter().position(|c| c == column)?;
        self.rows.get(row)?.get(col).map(String::as_str)
    }
}

fn opt<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

impl Tabular for MergedRow {
    const COLUMNS: &'static [&'static str] = &[
        "id_registry",
        "service_key",
        "service_url",
        "account",
        "handle",
        "profile_url",
        "created_at_registry",
        "id_api",
        "screen_name",
        "name",
        "verified",
        "valid",
        "last_posted_at",
        "last_posted_category",
        "error",
    ];

    fn cells(&self) -> Vec<String> {
        let registry = self.registry.as_ref();
        let profile = self.profile.as_ref();
        vec![
            opt(self.registry_id()),
            opt(registry.map(|r| r.record.service_key.as_str())),
            opt(registry.and_then(|r| r.record.service_url.as_deref())),
            opt(registry.and_then(|r| r.record.declared_account())),
            opt(self.handle()),
            opt(registry.and_then(|r| r.profile_url.as_deref())),
            opt(self.created_at().map(|t| t.to_rfc3339())),
            opt(self.platform_id()),
            opt(profile.and_then(|p| p.screen_name.as_deref())),
            opt(profile.and_then(|p| p.display_name.as_deref())),
            opt(profile.map(|p| p.verified)),
            opt(profile.map(|p| p.valid)),
            opt(profile.and_then(|p| p.last_posted_at).map(|t| t.to_rfc3339())),
            opt(self.recency),
            opt(profile.and_then(|p| p.error.as_deref())),
        ]
    }
}

impl Tabular for ErrorRecord {
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "service_key",
        "service_url",
        "account",
        "error_kind",
        "detail",
    ];

    fn cells(&self) -> Vec<String> {
        vec![
            self.source.id.to_string(),
            self.source.service_key.to_string(),
            self.source.service_url().to_string(),
            opt(self.source.declared_account()),
            self.kind.to_string(),
            self.detail.clone(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reconcile::{merge, normalize, registry_errors};
    use crate::testing::registry_record;

    #[test]
    fn merged_rows_without_platform_match_have_empty_cells() {
        let rows = normalize(&[registry_record(7, "twitter", "twitter.com/NASA", Some("NASA"))]).twitter;
        let merged = merge(&rows, &[], chrono::Utc::now());
        let table = Table::from_rows(&merged);

        assert_eq!(table.columns.len(), MergedRow::COLUMNS.len());
        assert_eq!(table.cell(0, "id_registry"), Some("7"));
        assert_eq!(table.cell(0, "handle"), Some("nasa"));
        assert_eq!(table.cell(0, "profile_url"), Some("https://www.twitter.com/nasa"));
        assert_eq!(table.cell(0, "id_api"), Some(""));
        assert_eq!(table.cell(0, "verified"), Some(""));
    }

    #[test]
    fn error_rows_carry_kind_and_detail() {
        let rows = normalize(&[registry_record(3, "twitter", "example.com/foo", None)]).twitter;
        let table = Table::from_rows(&registry_errors(&rows));

        assert_eq!(table.len(), 2);
        assert_eq!(table.cell(0, "error_kind"), Some("handle_url_mismatch"));
        assert_eq!(table.cell(0, "detail"), Some("service_key does not match service_url"));
        assert_eq!(table.cell(1, "error_kind"), Some("missing_declared_account"));
        assert_eq!(table.cell(1, "account"), Some(""));
    }
}

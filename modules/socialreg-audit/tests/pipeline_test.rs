use std::sync::Arc;

use chrono::{TimeZone, Utc};

use platform_client::REASON_ALIAS_MISSING;
use registry_client::RegistryRecord;
use socialreg_audit::chunked::NOT_RETURNED;
use socialreg_audit::recency::RecencyCategory;
use socialreg_audit::testing::{
    graph_object, page_details, registry_record, twitter_user, FixedClock, MockFacebook,
    MockRegistry, MockTwitter,
};
use socialreg_audit::{
    AuditError, AuditPipeline, ErrorKind, MergedRow, SnapshotError, SnapshotKind, SnapshotStore,
    StageModes, Table,
};
use socialreg_common::SnapshotMode;

fn dated(mut record: RegistryRecord, created_at: &str) -> RegistryRecord {
    record.created_at = Some(created_at.to_string());
    record
}

fn registry() -> MockRegistry {
    MockRegistry::new(vec![
        vec![
            dated(
                registry_record(1, "twitter", "https://twitter.com/@NASA", Some("NASA")),
                "2015-01-01T00:00:00Z",
            ),
            dated(
                registry_record(2, "twitter", "twitter.com/nasa/", Some("NASA")),
                "2017-01-01T00:00:00Z",
            ),
            registry_record(3, "twitter", "https://twitter.com/ghostuser", Some("ghost")),
            registry_record(4, "twitter", "example.com/foo", Some("foo")),
        ],
        vec![
            registry_record(5, "facebook", "https://facebook.com/GSA", Some("GSA")),
            registry_record(6, "facebook", "https://www.facebook.com/gone", Some("gone")),
            registry_record(7, "youtube", "https://youtube.com/gsa", Some("gsa")),
        ],
    ])
}

fn clock() -> Arc<FixedClock> {
    Arc::new(FixedClock::at(Utc.with_ymd_and_hms(2018, 10, 11, 0, 0, 0).unwrap()))
}

fn fetching_pipeline(store: SnapshotStore) -> AuditPipeline {
    let twitter = MockTwitter::new().with_user(twitter_user(
        "NASA",
        "11348282",
        true,
        Some("Wed Oct 10 20:19:24 +0000 2018"),
    ));
    let facebook = MockFacebook::new()
        .with_url("https://www.facebook.com/gsa", graph_object("100", Some("GSA")))
        .with_details(
            "100",
            page_details("100", "U.S. General Services Administration", false, Some("2018-10-01T12:00:00+0000")),
        )
        .rejecting_alias("https://www.facebook.com/gone");

    AuditPipeline::new(store, clock())
        .with_registry_source(Arc::new(registry()))
        .with_twitter_api(Arc::new(twitter))
        .with_facebook_api(Arc::new(facebook))
}

#[tokio::test]
async fn full_fetch_run_reconciles_both_platforms() {
    let dir = tempfile::tempdir().unwrap();
    let store = SnapshotStore::new(dir.path());

    let report = fetching_pipeline(store.clone())
        .run(StageModes::all(SnapshotMode::Fetch))
        .await
        .unwrap();

    for kind in [
        SnapshotKind::Registry,
        SnapshotKind::TwitterApi,
        SnapshotKind::FacebookUrl,
        SnapshotKind::FacebookId,
    ] {
        assert!(store.exists(kind), "{kind} snapshot missing");
    }

    // Errors: mismatch, duplicates, then lookup failures per platform.
    let errors: Vec<(i64, ErrorKind)> = report.errors.iter().map(|e| (e.source.id, e.kind)).collect();
    assert_eq!(errors.len(), 5);
    assert_eq!(errors[0].0, 4);
    assert_eq!(errors[0].1.as_str(), "handle_url_mismatch");
    assert_eq!(errors[1], (1, ErrorKind::DuplicateHandle));
    assert_eq!(errors[2], (2, ErrorKind::DuplicateHandle));
    assert_eq!(errors[3], (3, ErrorKind::PlatformLookupFailed));
    assert_eq!(report.errors[3].detail, NOT_RETURNED);
    assert_eq!(errors[4], (6, ErrorKind::PlatformLookupFailed));
    assert_eq!(report.errors[4].detail, REASON_ALIAS_MISSING);

    // Twitter: every registry row is kept, one deduped row per account.
    assert_eq!(report.twitter.merged.len(), 4);
    assert_eq!(report.twitter.deduped.len(), 1);
    assert_eq!(report.twitter.deduped[0].registry_id(), Some(2));
    assert_eq!(
        report.twitter.deduped[0].recency,
        Some(RecencyCategory::Within24Hours)
    );

    let tw = &report.stats.twitter;
    assert_eq!(tw.registry_records, 4);
    assert_eq!(tw.unique_handles, 2);
    assert_eq!(tw.matched_ids, 1);
    assert_eq!(tw.verified, 1);
    assert_eq!(tw.match_rate(), 0.5);

    // Facebook: the rejected URL joins as an invalid profile.
    let gone = report
        .facebook
        .merged
        .iter()
        .find(|row| row.registry_id() == Some(6))
        .unwrap();
    assert!(!gone.is_valid());

    let fb = &report.stats.facebook;
    assert_eq!(fb.registry_records, 2);
    assert_eq!(fb.matched_ids, 1);
    assert_eq!(fb.recency_count(RecencyCategory::WithinMonth), 1);
}

#[tokio::test]
async fn load_run_reproduces_fetch_run() {
    let dir = tempfile::tempdir().unwrap();
    let store = SnapshotStore::new(dir.path());

    let fetched = fetching_pipeline(store.clone())
        .run(StageModes::all(SnapshotMode::Fetch))
        .await
        .unwrap();

    // A later clock must not change recency: it comes from the snapshots.
    let later = Arc::new(FixedClock::at(Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap()));
    let loaded = AuditPipeline::new(store, later)
        .run(StageModes::default())
        .await
        .unwrap();

    assert_eq!(loaded.stats, fetched.stats);
    assert_eq!(loaded.errors, fetched.errors);
    assert_eq!(loaded.twitter.merged, fetched.twitter.merged);
}

#[tokio::test]
async fn fetch_mode_without_collaborator_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = AuditPipeline::new(SnapshotStore::new(dir.path()), clock());

    let err = pipeline
        .run(StageModes::all(SnapshotMode::Fetch))
        .await
        .unwrap_err();
    assert!(matches!(err, AuditError::MissingCollaborator(_)));
}

#[tokio::test]
async fn load_mode_without_snapshots_reports_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = AuditPipeline::new(SnapshotStore::new(dir.path()), clock());

    let err = pipeline.run(StageModes::default()).await.unwrap_err();
    assert!(matches!(
        err,
        AuditError::Snapshot(SnapshotError::NotFound {
            kind: SnapshotKind::Registry,
            ..
        })
    ));
}

#[tokio::test]
async fn registry_fetch_with_platform_load_needs_platform_snapshots() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = AuditPipeline::new(SnapshotStore::new(dir.path()), clock())
        .with_registry_source(Arc::new(registry()));

    let modes = StageModes {
        registry: SnapshotMode::Fetch,
        ..StageModes::default()
    };
    let err = pipeline.run(modes).await.unwrap_err();
    assert!(err.to_string().contains("twitter api"));
}

#[tokio::test]
async fn report_tables_flatten_rows() {
    let dir = tempfile::tempdir().unwrap();
    let report = fetching_pipeline(SnapshotStore::new(dir.path()))
        .run(StageModes::all(SnapshotMode::Fetch))
        .await
        .unwrap();

    let merged = Table::from_rows(&report.twitter.merged);
    assert_eq!(merged.columns.len(), <MergedRow as socialreg_audit::Tabular>::COLUMNS.len());
    assert_eq!(merged.len(), 4);
    // Sorted by handle: ghostuser, nasa, nasa, then the unkeyed row.
    assert_eq!(merged.cell(0, "handle"), Some("ghostuser"));
    assert_eq!(merged.cell(0, "id_api"), Some(""));
    assert_eq!(merged.cell(1, "handle"), Some("nasa"));
    assert_eq!(merged.cell(1, "id_api"), Some("11348282"));
    assert_eq!(merged.cell(3, "handle"), Some(""));

    let errors = Table::from_rows(&report.errors);
    assert_eq!(errors.cell(0, "error_kind"), Some("handle_url_mismatch"));
}

#[tokio::test]
async fn snapshots_without_fetch_time_measure_recency_from_clock() {
    let dir = tempfile::tempdir().unwrap();
    let store = SnapshotStore::new(dir.path());
    let nasa = r#"{"id":1,"service_key":"twitter","service_url":"https://twitter.com/NASA","account":"NASA"}"#;
    let files = [
        (SnapshotKind::Registry, format!("[{nasa},{nasa},{nasa}]")),
        (
            SnapshotKind::TwitterApi,
            r#"{"records":{"nasa":{"id_str":"11348282","screen_name":"NASA","status":{"created_at":"Wed Oct 10 20:19:24 +0000 2018"}}}}"#
                .to_string(),
        ),
        (SnapshotKind::FacebookUrl, "{}".to_string()),
        (SnapshotKind::FacebookId, "{}".to_string()),
    ];
    for (kind, body) in files {
        std::fs::write(store.path(kind), body).unwrap();
    }

    let report = AuditPipeline::new(store, clock())
        .run(StageModes::default())
        .await
        .unwrap();

    let duplicates = report
        .errors
        .iter()
        .filter(|e| e.kind == ErrorKind::DuplicateHandle)
        .count();
    assert_eq!(duplicates, 3);
    assert_eq!(report.twitter.deduped.len(), 1);
    assert_eq!(
        report.twitter.deduped[0].recency,
        Some(RecencyCategory::Within24Hours)
    );
    assert_eq!(report.stats.facebook.registry_records, 0);
}

// AuditPipeline: registry → normalize → errors → platform snapshots → join
// → dedupe → stats. Each stage either fetches from its upstream API or loads
// the last snapshot, as selected by `StageModes`.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use registry_client::RegistryRecord;
use socialreg_common::{Config, SnapshotMode};

use crate::error::{AuditError, Result};
use crate::platforms::facebook::{self, FacebookService, FacebookSnapshots};
use crate::platforms::twitter::{self, TwitterService, TwitterSnapshot};
use crate::platforms::{Platform, PlatformProfile};
use crate::reconcile::{
    dedupe_by_platform_id, lookup_errors, merge, normalize, registry_errors, ErrorRecord,
    MergedRow, RegistryRow,
};
use crate::registry::{self, RegistryService};
use crate::snapshot::SnapshotStore;
use crate::stats::{PlatformStats, StatsReport};
use crate::traits::{Clock, FacebookApi, RegistrySource, TwitterApi};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StageModes {
    pub registry: SnapshotMode,
    pub twitter: SnapshotMode,
    pub facebook: SnapshotMode,
}

impl StageModes {
    pub fn all(mode: SnapshotMode) -> Self {
        Self {
            registry: mode,
            twitter: mode,
            facebook: mode,
        }
    }
}

impl From<&Config> for StageModes {
    fn from(config: &Config) -> Self {
        Self {
            registry: config.registry_source,
            twitter: config.twitter_source,
            facebook: config.facebook_source,
        }
    }
}

/// Joined and deduplicated rows for one platform.
#[derive(Debug, Clone, Default)]
pub struct PlatformReport {
    pub merged: Vec<MergedRow>,
    pub deduped: Vec<MergedRow>,
}

#[derive(Debug, Clone, Default)]
pub struct AuditReport {
    pub twitter: PlatformReport,
    pub facebook: PlatformReport,
    pub errors: Vec<ErrorRecord>,
    pub stats: StatsReport,
}

pub struct AuditPipeline {
    store: SnapshotStore,
    clock: Arc<dyn Clock>,
    registry: Option<Arc<dyn RegistrySource>>,
    twitter: Option<Arc<dyn TwitterApi>>,
    facebook: Option<Arc<dyn FacebookApi>>,
}

impl AuditPipeline {
    /// A pipeline that can only load snapshots. Attach API collaborators for
    /// the stages that should fetch.
    pub fn new(store: SnapshotStore, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            registry: None,
            twitter: None,
            facebook: None,
        }
    }

    pub fn with_registry_source(mut self, source: Arc<dyn RegistrySource>) -> Self {
        self.registry = Some(source);
        self
    }

    pub fn with_twitter_api(mut self, api: Arc<dyn TwitterApi>) -> Self {
        self.twitter = Some(api);
        self
    }

    pub fn with_facebook_api(mut self, api: Arc<dyn FacebookApi>) -> Self {
        self.facebook = Some(api);
        self
    }

    pub async fn registry_records(&self, mode: SnapshotMode) -> Result<Vec<RegistryRecord>> {
        match mode {
            SnapshotMode::Fetch => {
                let source = self
                    .registry
                    .clone()
                    .ok_or(AuditError::MissingCollaborator("registry source"))?;
                RegistryService::new(source).fetch(&self.store).await
            }
            SnapshotMode::Load => registry::load(&self.store),
        }
    }

    pub async fn twitter_snapshot(
        &self,
        mode: SnapshotMode,
        handles: &[String],
    ) -> Result<TwitterSnapshot> {
        match mode {
            SnapshotMode::Fetch => {
                let api = self
                    .twitter
                    .clone()
                    .ok_or(AuditError::MissingCollaborator("Twitter API"))?;
                TwitterService::new(api)
                    .fetch(handles, &self.store, self.clock.as_ref())
                    .await
            }
            SnapshotMode::Load => twitter::load(&self.store),
        }
    }

    pub async fn facebook_snapshots(
        &self,
        mode: SnapshotMode,
        urls: &[String],
    ) -> Result<FacebookSnapshots> {
        match mode {
            SnapshotMode::Fetch => {
                let api = self
                    .facebook
                    .clone()
                    .ok_or(AuditError::MissingCollaborator("Facebook API"))?;
                FacebookService::new(api)
                    .fetch(urls, &self.store, self.clock.as_ref())
                    .await
            }
            SnapshotMode::Load => facebook::load(&self.store),
        }
    }

    pub async fn run(&self, modes: StageModes) -> Result<AuditReport> {
        info!(
            registry = %modes.registry,
            twitter = %modes.twitter,
            facebook = %modes.facebook,
            "Starting audit run"
        );

        let records = self.registry_records(modes.registry).await?;
        let partitions = normalize(&records);
        info!(
            twitter = partitions.twitter.len(),
            facebook = partitions.facebook.len(),
            other = partitions.other,
            "Partitioned registry records"
        );

        let mut errors = registry_errors(&partitions.twitter);
        errors.extend(registry_errors(&partitions.facebook));

        let tw = self
            .twitter_snapshot(modes.twitter, &partitions.lookup_ids(Platform::Twitter))
            .await?;
        let fb = self
            .facebook_snapshots(modes.facebook, &partitions.lookup_ids(Platform::Facebook))
            .await?;

        let twitter = self.reconcile(
            Platform::Twitter,
            &partitions.twitter,
            &twitter::profiles(&tw),
            &twitter::lookup_failures(&tw),
            tw.fetched_at,
            &mut errors,
        );
        let facebook = self.reconcile(
            Platform::Facebook,
            &partitions.facebook,
            &facebook::profiles(&fb),
            &facebook::lookup_failures(&fb),
            fb.fetched_at(),
            &mut errors,
        );

        let stats = StatsReport {
            twitter: PlatformStats::compute(Platform::Twitter, &twitter.merged, &twitter.deduped),
            facebook: PlatformStats::compute(
                Platform::Facebook,
                &facebook.merged,
                &facebook.deduped,
            ),
        };

        info!(errors = errors.len(), "Audit run complete");
        Ok(AuditReport {
            twitter,
            facebook,
            errors,
            stats,
        })
    }

    fn reconcile(
        &self,
        platform: Platform,
        rows: &[RegistryRow],
        profiles: &[PlatformProfile],
        failures: &HashMap<String, String>,
        fetched_at: Option<DateTime<Utc>>,
        errors: &mut Vec<ErrorRecord>,
    ) -> PlatformReport {
        let as_of = fetched_at.unwrap_or_else(|| {
            warn!(%platform, "Snapshot has no fetch time; measuring recency from now");
            self.clock.now()
        });

        errors.extend(lookup_errors(rows, failures));

        let merged = merge(rows, profiles, as_of);
        let deduped = dedupe_by_platform_id(&merged);
        info!(
            %platform,
            merged = merged.len(),
            deduped = deduped.len(),
            "Reconciled registry with platform"
        );

        PlatformReport { merged, deduped }
    }
}

use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

use platform_client::{FacebookClient, TwitterClient};
use registry_client::RegistryClient;
use socialreg_audit::traits::SystemClock;
use socialreg_audit::{AuditPipeline, SnapshotStore, StageModes};
use socialreg_common::{Config, SnapshotMode};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("socialreg=info".parse()?))
        .init();

    info!("Social registry audit starting...");

    let config = Config::from_env()?;
    config.log_redacted();

    let modes = StageModes::from(&config);
    let store = SnapshotStore::new(&config.data_dir);
    let mut pipeline = AuditPipeline::new(store, Arc::new(SystemClock));

    if modes.registry == SnapshotMode::Fetch {
        pipeline = pipeline.with_registry_source(Arc::new(RegistryClient::new(
            config.registry_base_url.clone(),
            config.registry_api_key.clone(),
        )));
    }
    if modes.twitter == SnapshotMode::Fetch {
        let token = config.twitter_token()?.to_string();
        pipeline = pipeline.with_twitter_api(Arc::new(TwitterClient::new(token)));
    }
    if modes.facebook == SnapshotMode::Fetch {
        let token = config.facebook_token()?.to_string();
        pipeline = pipeline.with_facebook_api(Arc::new(FacebookClient::new(
            token,
            config.facebook_api_version.clone(),
        )));
    }

    let report = pipeline.run(modes).await?;

    println!("{}", report.stats);

    let mut by_kind: BTreeMap<&str, usize> = BTreeMap::new();
    for error in &report.errors {
        *by_kind.entry(error.kind.as_str()).or_default() += 1;
    }
    println!("{:<30} {:>10}", "REGISTRY ERRORS", report.errors.len());
    for (kind, count) in by_kind {
        println!("{:<30} {:>10}", kind, count);
    }

    Ok(())
}

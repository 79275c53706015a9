use std::sync::Arc;

use anyhow::Result;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use fixture_board::api::{HttpTransport, RequestScheduler};
use fixture_board::config::Config;
use fixture_board::db::CacheStore;
use fixture_board::render::card_line;
use fixture_board::sync::{SyncOrchestrator, SyncSource};
use fixture_board::view::StatusCounts;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "prefetch=info,fixture_board=info,warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    let store = Arc::new(CacheStore::new(&config.database_url, config.cache_expiry).await?);

    let scheduler = RequestScheduler::new(
        HttpTransport::new(config.request_timeout)?,
        config.min_request_spacing,
        config.request_timeout,
    );
    let orchestrator = SyncOrchestrator::new(
        scheduler,
        Arc::clone(&store),
        config.endpoint(),
        config.match_date,
        config.retry_policy(),
    );

    info!(
        "Prefetching {} fixtures for {}",
        config.provider,
        orchestrator.target_date()
    );

    let report = orchestrator.sync(true).await?;

    if let Some(e) = &report.warning {
        warn!("Provider unavailable, cache left as is: {}", e);
    }

    let counts = StatusCounts::of(&report.matches);
    info!(
        "{} fixtures ({} live, {} scheduled, {} finished) from {}",
        report.matches.len(),
        counts.live,
        counts.scheduled,
        counts.finished,
        match report.source {
            SyncSource::Cache => "cache",
            SyncSource::Network => "network",
            SyncSource::StaleFallback => "stale cache",
        }
    );

    for m in &report.matches {
        info!("{}", card_line(m));
    }

    Ok(())
}

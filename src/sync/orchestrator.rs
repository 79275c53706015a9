use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::api::{normalize_batch, with_retry, NormalizedBatch, ProviderEndpoint, ProviderRequest};
use crate::api::{RequestScheduler, Transport};
use crate::db::CacheStore;
use crate::error::{FetchError, SyncError};
use crate::models::{CacheEntry, Match};

/// Where the matches in a [`SyncReport`] came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncSource {
    /// Fresh cache entry, no request made
    Cache,
    /// Fetched from the provider just now
    Network,
    /// Fetch failed; older cached data served instead
    StaleFallback,
}

/// Outcome of a successful sync
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncReport {
    pub matches: Vec<Match>,
    pub fetched_at: DateTime<Utc>,
    pub source: SyncSource,
    /// Why a fallback was needed, if one was
    pub warning: Option<FetchError>,
}

impl SyncReport {
    fn from_entry(entry: CacheEntry, source: SyncSource, warning: Option<FetchError>) -> Self {
        Self {
            matches: entry.matches,
            fetched_at: entry.fetched_at,
            source,
            warning,
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.source == SyncSource::StaleFallback
    }
}

/// Retry parameters for provider fetches
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
}

/// Decides between cache and network, writes the cache, and falls back to
/// stale data when the provider is unreachable.
///
/// Only one sync runs at a time; all requests share the scheduler's gate.
pub struct SyncOrchestrator<T> {
    scheduler: RequestScheduler<T>,
    store: Arc<CacheStore>,
    endpoint: ProviderEndpoint,
    /// Fixed day, or `None` to follow the current UTC date
    date: Option<NaiveDate>,
    retry: RetryPolicy,
    in_flight: Mutex<()>,
    cancel: CancellationToken,
}

impl<T: Transport> SyncOrchestrator<T> {
    pub fn new(
        scheduler: RequestScheduler<T>,
        store: Arc<CacheStore>,
        endpoint: ProviderEndpoint,
        date: Option<NaiveDate>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            scheduler,
            store,
            endpoint,
            date,
            retry,
            in_flight: Mutex::new(()),
            cancel: CancellationToken::new(),
        }
    }

    pub fn scheduler(&self) -> &RequestScheduler<T> {
        &self.scheduler
    }

    /// Day whose fixtures are synced
    pub fn target_date(&self) -> NaiveDate {
        self.date.unwrap_or_else(|| Utc::now().date_naive())
    }

    /// Abort any in-flight request and refuse new ones
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    /// Sync, waiting for any sync already in progress to finish first
    pub async fn sync(&self, force_refresh: bool) -> Result<SyncReport, SyncError> {
        let _guard = self.in_flight.lock().await;
        self.run(force_refresh).await
    }

    /// Sync unless one is already running, in which case `None`
    pub async fn sync_if_idle(&self, force_refresh: bool) -> Option<Result<SyncReport, SyncError>> {
        let Ok(_guard) = self.in_flight.try_lock() else {
            info!("Sync already in flight, coalescing");
            return None;
        };
        Some(self.run(force_refresh).await)
    }

    async fn run(&self, force_refresh: bool) -> Result<SyncReport, SyncError> {
        let provider = self.endpoint.kind;
        let date = self.target_date();
        let cached = self.store.get().await;

        if !force_refresh {
            if let Some(entry) = cached.as_ref() {
                if entry.covers(provider, date) && self.store.is_fresh(entry, Utc::now()) {
                    debug!("Cache hit: {} matches for {}", entry.matches.len(), date);
                    return Ok(SyncReport::from_entry(entry.clone(), SyncSource::Cache, None));
                }
            }
            debug!("Cache miss or stale for {}", date);
        }

        info!("Fetching {} fixtures for {}", provider, date);
        let request = self.endpoint.request_for(date);

        let outcome = with_retry(
            || self.fetch_batch(&request),
            self.retry.max_retries,
            self.retry.base_delay,
            &self.cancel,
        )
        .await;

        match outcome {
            Ok(batch) => {
                let entry = CacheEntry {
                    provider,
                    date,
                    matches: batch.matches,
                    fetched_at: Utc::now(),
                };

                if let Err(e) = self.store.put(&entry).await {
                    error!("Failed to cache fixtures: {}", e);
                }

                info!(
                    "Synced {} matches for {} ({} records skipped)",
                    entry.matches.len(),
                    date,
                    batch.skipped
                );
                Ok(SyncReport::from_entry(entry, SyncSource::Network, None))
            }
            Err(FetchError::Cancelled) => Err(SyncError::Fetch(FetchError::Cancelled)),
            Err(e) => match cached.filter(|entry| entry.date == date) {
                Some(entry) => {
                    warn!(
                        "Fetch failed ({}), serving cached data from {}",
                        e, entry.fetched_at
                    );
                    Ok(SyncReport::from_entry(entry, SyncSource::StaleFallback, Some(e)))
                }
                None => {
                    error!("Fetch failed with nothing cached for {}: {}", date, e);
                    Err(SyncError::NoDataAvailable { source: e })
                }
            },
        }
    }

    async fn fetch_batch(&self, request: &ProviderRequest) -> Result<NormalizedBatch, FetchError> {
        let body = self.scheduler.fetch(request, &self.cancel).await?;
        normalize_batch(&body, self.endpoint.kind)
    }
}

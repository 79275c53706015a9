use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use crate::api::Transport;
use crate::app::state::{App, Effect};
use crate::db::CacheStore;
use crate::models::AppEvent;
use crate::render::Renderer;
use crate::sync::SyncOrchestrator;

const EVENT_CHANNEL_CAPACITY: usize = 100;

/// Drives an [`App`]: feeds it events, executes its effects and renders
/// after every step. Syncs run as background tasks and report back through
/// the event channel, so filter input stays responsive during a fetch.
pub struct Dashboard<T, R> {
    app: App,
    orchestrator: Arc<SyncOrchestrator<T>>,
    store: Arc<CacheStore>,
    renderer: R,
    events_tx: mpsc::Sender<AppEvent>,
    events_rx: mpsc::Receiver<AppEvent>,
    visibility_tx: watch::Sender<bool>,
    startup: Vec<Effect>,
}

impl<T, R> Dashboard<T, R>
where
    T: Transport + 'static,
    R: Renderer,
{
    /// Restore saved filters and prepare the initial sync
    pub async fn new(orchestrator: Arc<SyncOrchestrator<T>>, store: Arc<CacheStore>, renderer: R) -> Self {
        let filters = store.load_filters().await;
        info!(
            "Restored filters: search '{}', league '{}'",
            filters.search_term, filters.selected_league
        );

        let (app, startup) = App::start(filters);
        let (events_tx, events_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let (visibility_tx, _) = watch::channel(true);

        Self {
            app,
            orchestrator,
            store,
            renderer,
            events_tx,
            events_rx,
            visibility_tx,
            startup,
        }
    }

    /// Sender for user, timer and host events
    pub fn events(&self) -> mpsc::Sender<AppEvent> {
        self.events_tx.clone()
    }

    /// Foreground state, for the refresh timer
    pub fn visibility(&self) -> watch::Receiver<bool> {
        self.visibility_tx.subscribe()
    }

    /// Run until the task is dropped
    pub async fn run(mut self) {
        info!("Dashboard started");

        let startup = std::mem::take(&mut self.startup);
        self.execute(startup).await;
        self.renderer.render(&self.app.frame());

        while let Some(event) = self.events_rx.recv().await {
            self.step(event).await;
        }

        warn!("Dashboard event channel closed");
    }

    /// Process one event
    pub async fn step(&mut self, event: AppEvent) {
        debug!("Event: {}", event_name(&event));

        if let AppEvent::VisibilityChanged { visible } = event {
            self.visibility_tx.send_replace(visible);
        }

        let effects = self.app.handle(event);
        self.execute(effects).await;
        self.renderer.render(&self.app.frame());
    }

    async fn execute(&self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::Sync {
                    force_refresh,
                    coalesce,
                    trigger,
                } => {
                    debug!("Starting sync ({:?}, force: {})", trigger, force_refresh);
                    self.spawn_sync(force_refresh, coalesce);
                }
                Effect::SaveFilters(filters) => {
                    if let Err(e) = self.store.save_filters(&filters).await {
                        warn!("Failed to save filters: {}", e);
                    }
                }
            }
        }
    }

    fn spawn_sync(&self, force_refresh: bool, coalesce: bool) {
        let orchestrator = Arc::clone(&self.orchestrator);
        let events_tx = self.events_tx.clone();

        tokio::spawn(async move {
            let event = if coalesce {
                match orchestrator.sync_if_idle(force_refresh).await {
                    Some(result) => AppEvent::SyncFinished(result),
                    None => AppEvent::SyncSkipped,
                }
            } else {
                AppEvent::SyncFinished(orchestrator.sync(force_refresh).await)
            };

            if let Err(e) = events_tx.send(event).await {
                warn!("Dropping sync result, dashboard gone: {}", event_name(&e.0));
            }
        });
    }
}

fn event_name(event: &AppEvent) -> &'static str {
    match event {
        AppEvent::SearchChanged(_) => "search_changed",
        AppEvent::LeagueChanged(_) => "league_changed",
        AppEvent::RefreshRequested => "refresh_requested",
        AppEvent::TimerTick => "timer_tick",
        AppEvent::VisibilityChanged { .. } => "visibility_changed",
        AppEvent::ConnectivityChanged { .. } => "connectivity_changed",
        AppEvent::SyncFinished(_) => "sync_finished",
        AppEvent::SyncSkipped => "sync_skipped",
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde_json::json;
    use tokio::sync::mpsc::UnboundedSender;
    use tokio::time::timeout;

    use super::*;
    use crate::api::scheduler::testing::FakeTransport;
    use crate::api::{ProviderEndpoint, RequestScheduler};
    use crate::app::RenderFrame;
    use crate::models::{MatchStatus, ProviderKind};
    use crate::sync::RetryPolicy;

    struct ChannelRenderer(UnboundedSender<RenderFrame>);

    impl Renderer for ChannelRenderer {
        fn render(&mut self, frame: &RenderFrame) {
            let _ = self.0.send(frame.clone());
        }
    }

    fn body() -> String {
        json!({
            "response": [
                {
                    "fixture": { "id": 10, "status": { "short": "NS" } },
                    "league": { "name": "Serie A" },
                    "teams": { "home": { "name": "Napoli" }, "away": { "name": "Roma" } }
                },
                {
                    "fixture": { "id": 11, "status": { "short": "2H" } },
                    "league": { "name": "La Liga" },
                    "teams": { "home": { "name": "Sevilla" }, "away": { "name": "Betis" } },
                    "goals": { "home": 1, "away": null }
                }
            ]
        })
        .to_string()
    }

    async fn next_matching(
        frames: &mut mpsc::UnboundedReceiver<RenderFrame>,
        pred: impl Fn(&RenderFrame) -> bool,
    ) -> RenderFrame {
        loop {
            let frame = timeout(Duration::from_secs(5), frames.recv())
                .await
                .expect("timed out waiting for frame")
                .expect("renderer dropped");
            if pred(&frame) {
                return frame;
            }
        }
    }

    #[tokio::test]
    async fn test_dashboard_loads_filters_and_persists() {
        let store = Arc::new(
            CacheStore::new("sqlite::memory:", Duration::from_secs(300))
                .await
                .unwrap(),
        );
        let scheduler = RequestScheduler::new(
            FakeTransport::always(Ok(body())),
            Duration::ZERO,
            Duration::from_secs(10),
        );
        let orchestrator = Arc::new(SyncOrchestrator::new(
            scheduler,
            Arc::clone(&store),
            ProviderEndpoint::new(ProviderKind::ApiFootball, "https://provider.test", None),
            None,
            RetryPolicy {
                max_retries: 1,
                base_delay: Duration::from_millis(1),
            },
        ));

        let (frames_tx, mut frames) = mpsc::unbounded_channel();
        let dashboard = Dashboard::new(
            Arc::clone(&orchestrator),
            Arc::clone(&store),
            ChannelRenderer(frames_tx),
        )
        .await;
        let events = dashboard.events();
        let mut visibility = dashboard.visibility();
        tokio::spawn(dashboard.run());

        let loaded = next_matching(&mut frames, |f| !f.is_loading && !f.matches.is_empty()).await;
        let ids: Vec<_> = loaded.matches.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["11", "10"]);
        assert_eq!(loaded.matches[0].status, MatchStatus::Live);
        assert_eq!(loaded.matches[1].status, MatchStatus::Scheduled);
        assert_eq!(loaded.leagues, vec!["La Liga", "Serie A"]);

        events
            .send(AppEvent::SearchChanged("napoli".to_string()))
            .await
            .unwrap();
        let searched = next_matching(&mut frames, |f| f.search_term == "napoli").await;
        assert_eq!(searched.matches.len(), 1);
        assert_eq!(store.load_filters().await.search_term, "napoli");

        events
            .send(AppEvent::VisibilityChanged { visible: false })
            .await
            .unwrap();
        timeout(Duration::from_secs(5), visibility.changed())
            .await
            .unwrap()
            .unwrap();
        assert!(!*visibility.borrow());

        orchestrator.shutdown();
    }
}

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::error::SyncError;
use crate::models::{AppEvent, FilterState, Match};
use crate::sync::SyncReport;
use crate::view::{leagues, StatusCounts, ViewState};

/// Why a sync was asked for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncTrigger {
    Startup,
    User,
    Timer,
    Foreground,
    Reconnect,
}

/// Work the runtime must perform after an event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Run a sync; report back with [`AppEvent::SyncFinished`] or [`AppEvent::SyncSkipped`]
    Sync {
        force_refresh: bool,
        /// Skip instead of waiting when another sync is running
        coalesce: bool,
        trigger: SyncTrigger,
    },
    /// Persist the filter inputs
    SaveFilters(FilterState),
}

/// Everything the dashboard knows. Owned by one [`App`]; no globals.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Full batch from the last successful sync, in provider order
    pub matches: Vec<Match>,
    pub fetched_at: Option<DateTime<Utc>>,
    pub view: ViewState,
    pub error: Option<String>,
    pub warning: Option<String>,
    pub visible: bool,
    pub online: bool,
    syncs_in_flight: usize,
    /// League restored from disk, checked once the first data arrives
    pending_league_check: bool,
}

impl AppState {
    fn new(filters: FilterState) -> Self {
        Self {
            matches: Vec::new(),
            fetched_at: None,
            view: ViewState::project(&[], &filters),
            error: None,
            warning: None,
            visible: true,
            online: true,
            syncs_in_flight: 0,
            pending_league_check: !filters.selected_league.is_empty(),
        }
    }

    pub fn is_loading(&self) -> bool {
        self.syncs_in_flight > 0
    }
}

/// What the render collaborator receives
#[derive(Debug, Clone, PartialEq)]
pub struct RenderFrame {
    pub matches: Vec<Match>,
    pub is_loading: bool,
    pub error: Option<String>,
    pub warning: Option<String>,
    pub fetched_at: Option<DateTime<Utc>>,
    pub counts: StatusCounts,
    pub leagues: Vec<String>,
    pub search_term: String,
    pub selected_league: String,
}

/// Event-driven dashboard core. `handle` is synchronous and free of I/O;
/// side effects come back as [`Effect`]s for the runtime to execute.
pub struct App {
    state: AppState,
}

impl App {
    /// Start with restored filters; the returned effects load the first data
    pub fn start(filters: FilterState) -> (Self, Vec<Effect>) {
        let mut app = Self {
            state: AppState::new(filters),
        };
        let effects = app.request_sync(false, false, SyncTrigger::Startup);
        (app, effects)
    }

    pub fn handle(&mut self, event: AppEvent) -> Vec<Effect> {
        match event {
            AppEvent::SearchChanged(term) => {
                let mut filters = self.state.view.filters();
                filters.search_term = term;
                self.apply_filters(filters)
            }
            AppEvent::LeagueChanged(league) => {
                let mut filters = self.state.view.filters();
                filters.selected_league = league;
                self.state.pending_league_check = false;
                self.apply_filters(filters)
            }
            AppEvent::RefreshRequested => {
                if !self.state.online {
                    self.state.warning = Some("Offline: showing cached fixtures".to_string());
                    return Vec::new();
                }
                self.request_sync(true, false, SyncTrigger::User)
            }
            AppEvent::TimerTick => {
                if !self.state.visible || !self.state.online {
                    debug!("Ignoring timer tick while hidden or offline");
                    return Vec::new();
                }
                if self.state.is_loading() {
                    info!("Timer tick during sync, coalescing");
                    return Vec::new();
                }
                self.request_sync(false, true, SyncTrigger::Timer)
            }
            AppEvent::VisibilityChanged { visible } => {
                let resumed = visible && !self.state.visible;
                self.state.visible = visible;
                if resumed && self.state.online {
                    self.request_sync(false, true, SyncTrigger::Foreground)
                } else {
                    Vec::new()
                }
            }
            AppEvent::ConnectivityChanged { online } => {
                let reconnected = online && !self.state.online;
                self.state.online = online;
                if !online {
                    warn!("Connection lost");
                    self.state.warning = Some("Offline: showing cached fixtures".to_string());
                    Vec::new()
                } else if reconnected && self.state.visible {
                    self.state.warning = None;
                    self.request_sync(false, true, SyncTrigger::Reconnect)
                } else {
                    Vec::new()
                }
            }
            AppEvent::SyncFinished(result) => {
                self.finish_sync();
                match result {
                    Ok(report) => self.apply_report(report),
                    Err(e) => {
                        self.apply_failure(e);
                        Vec::new()
                    }
                }
            }
            AppEvent::SyncSkipped => {
                self.finish_sync();
                Vec::new()
            }
        }
    }

    /// Snapshot for the render collaborator
    pub fn frame(&self) -> RenderFrame {
        let view = &self.state.view;
        RenderFrame {
            matches: view.filtered_matches.clone(),
            is_loading: self.state.is_loading(),
            error: self.state.error.clone(),
            warning: self.state.warning.clone(),
            fetched_at: self.state.fetched_at,
            counts: StatusCounts::of(&view.filtered_matches),
            leagues: leagues(&self.state.matches),
            search_term: view.search_term.clone(),
            selected_league: view.selected_league.clone(),
        }
    }

    fn request_sync(&mut self, force_refresh: bool, coalesce: bool, trigger: SyncTrigger) -> Vec<Effect> {
        self.state.syncs_in_flight += 1;
        vec![Effect::Sync {
            force_refresh,
            coalesce,
            trigger,
        }]
    }

    fn finish_sync(&mut self) {
        self.state.syncs_in_flight = self.state.syncs_in_flight.saturating_sub(1);
    }

    fn apply_filters(&mut self, filters: FilterState) -> Vec<Effect> {
        self.rebuild_view(&filters);
        vec![Effect::SaveFilters(filters)]
    }

    /// Adopt a synced batch; persists the filters if a restored league had to be dropped
    fn apply_report(&mut self, report: SyncReport) -> Vec<Effect> {
        self.state.warning = report
            .warning
            .as_ref()
            .map(|e| format!("Live update failed ({}); showing data from {}", e, report.fetched_at));
        self.state.error = None;
        self.state.matches = report.matches;
        self.state.fetched_at = Some(report.fetched_at);

        let mut filters = self.state.view.filters();
        if self.state.pending_league_check {
            self.state.pending_league_check = false;
            if !leagues(&self.state.matches).contains(&filters.selected_league) {
                info!("Saved league '{}' not in today's fixtures, clearing", filters.selected_league);
                filters.selected_league.clear();
                return self.apply_filters(filters);
            }
        }
        self.rebuild_view(&filters);
        Vec::new()
    }

    fn apply_failure(&mut self, error: SyncError) {
        warn!("Sync failed: {}", error);
        self.state.error = Some(error.to_string());
    }

    fn rebuild_view(&mut self, filters: &FilterState) {
        self.state.view = ViewState::project(&self.state.matches, filters);
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::error::FetchError;
    use crate::models::{Kickoff, League, MatchParts, MatchStatus, Score, StatusSignal, Team};
    use crate::sync::SyncSource;

    fn fixture(id: &str, home: &str, league: &str, live: bool) -> Match {
        MatchParts {
            id: id.to_string(),
            home_team: Team::new("", home, None),
            away_team: Team::new("", "Rival", None),
            league: League::new("", league, None, None),
            score: Score::default(),
            signal: StatusSignal { completed: false, in_progress: live },
            kickoff: Kickoff::new(NaiveDate::from_ymd_opt(2024, 5, 1), None),
            venue: None,
        }
        .into()
    }

    fn report(matches: Vec<Match>, source: SyncSource, warning: Option<FetchError>) -> SyncReport {
        SyncReport {
            matches,
            fetched_at: Utc::now(),
            source,
            warning,
        }
    }

    fn loaded_app() -> App {
        let (mut app, _) = App::start(FilterState::default());
        app.handle(AppEvent::SyncFinished(Ok(report(
            vec![
                fixture("1", "Arsenal", "Premier League", false),
                fixture("2", "Ajax", "Eredivisie", true),
            ],
            SyncSource::Network,
            None,
        ))));
        app
    }

    #[test]
    fn test_startup_requests_cached_sync() {
        let (app, effects) = App::start(FilterState::default());
        assert_eq!(
            effects,
            vec![Effect::Sync { force_refresh: false, coalesce: false, trigger: SyncTrigger::Startup }]
        );
        assert!(app.frame().is_loading);
    }

    #[test]
    fn test_sync_result_rebuilds_view() {
        let app = loaded_app();
        let frame = app.frame();
        assert!(!frame.is_loading);
        let ids: Vec<_> = frame.matches.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["2", "1"]);
        assert_eq!(frame.counts.live, 1);
        assert_eq!(frame.leagues, vec!["Eredivisie", "Premier League"]);
    }

    #[test]
    fn test_filter_changes_persist_and_reproject() {
        let mut app = loaded_app();

        let effects = app.handle(AppEvent::SearchChanged("ARS".to_string()));
        assert_eq!(
            effects,
            vec![Effect::SaveFilters(FilterState {
                search_term: "ARS".to_string(),
                selected_league: String::new(),
            })]
        );
        assert_eq!(app.frame().matches.len(), 1);

        app.handle(AppEvent::SearchChanged(String::new()));
        app.handle(AppEvent::LeagueChanged("Eredivisie".to_string()));
        let frame = app.frame();
        assert_eq!(frame.matches.len(), 1);
        assert_eq!(frame.matches[0].league.name, "Eredivisie");
    }

    #[test]
    fn test_timer_tick_coalesced_while_loading() {
        let mut app = loaded_app();

        let effects = app.handle(AppEvent::RefreshRequested);
        assert!(matches!(effects[0], Effect::Sync { force_refresh: true, coalesce: false, .. }));

        assert!(app.handle(AppEvent::TimerTick).is_empty());

        app.handle(AppEvent::SyncFinished(Ok(report(Vec::new(), SyncSource::Network, None))));
        let effects = app.handle(AppEvent::TimerTick);
        assert_eq!(
            effects,
            vec![Effect::Sync { force_refresh: false, coalesce: true, trigger: SyncTrigger::Timer }]
        );
    }

    #[test]
    fn test_hidden_dashboard_ignores_ticks_and_checks_on_return() {
        let mut app = loaded_app();

        assert!(app.handle(AppEvent::VisibilityChanged { visible: false }).is_empty());
        assert!(app.handle(AppEvent::TimerTick).is_empty());

        let effects = app.handle(AppEvent::VisibilityChanged { visible: true });
        assert_eq!(
            effects,
            vec![Effect::Sync { force_refresh: false, coalesce: true, trigger: SyncTrigger::Foreground }]
        );

        // Already visible: no duplicate check
        app.handle(AppEvent::SyncSkipped);
        assert!(app.handle(AppEvent::VisibilityChanged { visible: true }).is_empty());
    }

    #[test]
    fn test_offline_then_reconnect() {
        let mut app = loaded_app();

        assert!(app.handle(AppEvent::ConnectivityChanged { online: false }).is_empty());
        assert!(app.frame().warning.is_some());
        assert!(app.handle(AppEvent::TimerTick).is_empty());
        assert!(app.handle(AppEvent::RefreshRequested).is_empty());

        let effects = app.handle(AppEvent::ConnectivityChanged { online: true });
        assert!(matches!(effects[0], Effect::Sync { trigger: SyncTrigger::Reconnect, .. }));
        assert!(app.frame().warning.is_none());
    }

    #[test]
    fn test_degraded_report_sets_warning() {
        let mut app = loaded_app();
        app.handle(AppEvent::RefreshRequested);
        app.handle(AppEvent::SyncFinished(Ok(report(
            vec![fixture("1", "Arsenal", "Premier League", false)],
            SyncSource::StaleFallback,
            Some(FetchError::Network("down".into())),
        ))));

        let frame = app.frame();
        assert!(frame.error.is_none());
        assert!(frame.warning.as_deref().unwrap_or_default().contains("down"));
        assert_eq!(frame.matches.len(), 1);
    }

    #[test]
    fn test_failure_keeps_previous_matches() {
        let mut app = loaded_app();
        app.handle(AppEvent::RefreshRequested);
        app.handle(AppEvent::SyncFinished(Err(SyncError::NoDataAvailable {
            source: FetchError::Timeout(std::time::Duration::from_secs(10)),
        })));

        let frame = app.frame();
        assert!(frame.error.is_some());
        assert_eq!(frame.matches.len(), 2);
    }

    #[test]
    fn test_restored_league_cleared_when_missing() {
        let filters = FilterState {
            search_term: String::new(),
            selected_league: "Bundesliga".to_string(),
        };
        let (mut app, _) = App::start(filters);
        let effects = app.handle(AppEvent::SyncFinished(Ok(report(
            vec![fixture("1", "Arsenal", "Premier League", false)],
            SyncSource::Cache,
            None,
        ))));
        assert_eq!(effects, vec![Effect::SaveFilters(FilterState::default())]);

        let frame = app.frame();
        assert_eq!(frame.selected_league, "");
        assert_eq!(frame.matches.len(), 1);
        assert_eq!(frame.matches[0].status, MatchStatus::Scheduled);

        // Checked once; later batches leave the filter alone
        app.handle(AppEvent::LeagueChanged("Eredivisie".to_string()));
        let effects = app.handle(AppEvent::SyncFinished(Ok(report(
            vec![fixture("1", "Arsenal", "Premier League", false)],
            SyncSource::Network,
            None,
        ))));
        assert!(effects.is_empty());
        assert_eq!(app.frame().selected_league, "Eredivisie");
    }

    #[test]
    fn test_restored_league_kept_when_present() {
        let filters = FilterState {
            search_term: String::new(),
            selected_league: "Premier League".to_string(),
        };
        let (mut app, _) = App::start(filters);
        let effects = app.handle(AppEvent::SyncFinished(Ok(report(
            vec![
                fixture("1", "Arsenal", "Premier League", false),
                fixture("2", "Ajax", "Eredivisie", true),
            ],
            SyncSource::Cache,
            None,
        ))));
        assert!(effects.is_empty());
        assert_eq!(app.frame().matches.len(), 1);
    }
}

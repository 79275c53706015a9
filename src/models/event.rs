use crate::error::SyncError;
use crate::sync::SyncReport;

/// Inputs to the dashboard, from the user, the refresh timer or the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    /// Search box contents changed
    SearchChanged(String),

    /// League dropdown changed (empty string clears the filter)
    LeagueChanged(String),

    /// User asked for fresh data, bypassing the cache
    RefreshRequested,

    /// Periodic tick from the auto-refresh worker
    TimerTick,

    /// Dashboard moved to or from the foreground
    VisibilityChanged { visible: bool },

    /// Network came up or went down
    ConnectivityChanged { online: bool },

    /// A requested sync completed
    SyncFinished(Result<SyncReport, SyncError>),

    /// A requested sync was dropped because another was already running
    SyncSkipped,
}

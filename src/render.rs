use tracing::{error, info, warn};

use crate::app::RenderFrame;
use crate::models::{Match, MatchStatus};

/// Display collaborator: consumes frames, owns all presentation
pub trait Renderer: Send {
    fn render(&mut self, frame: &RenderFrame);
}

/// Writes the dashboard to the log, one line per fixture card
#[derive(Debug, Default)]
pub struct LogRenderer {
    last: Option<RenderFrame>,
}

impl LogRenderer {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Renderer for LogRenderer {
    fn render(&mut self, frame: &RenderFrame) {
        // Frames repeat when an event changes nothing visible
        if self.last.as_ref() == Some(frame) {
            return;
        }

        if frame.is_loading {
            info!("Loading fixtures...");
        }
        if let Some(e) = &frame.error {
            error!("{}", e);
        }
        if let Some(w) = &frame.warning {
            warn!("{}", w);
        }

        let updated = frame
            .fetched_at
            .map(|t| t.format("%H:%M:%S UTC").to_string())
            .unwrap_or_else(|| "never".to_string());
        info!(
            "{} fixtures | live {} | scheduled {} | finished {} | search '{}' | league '{}' | updated {}",
            frame.matches.len(),
            frame.counts.live,
            frame.counts.scheduled,
            frame.counts.finished,
            frame.search_term,
            frame.selected_league,
            updated
        );

        for m in &frame.matches {
            info!("{}", card_line(m));
        }

        if !frame.leagues.is_empty() {
            info!("Leagues: {}", frame.leagues.join(", "));
        }

        self.last = Some(frame.clone());
    }
}

/// One-line summary of a fixture card
pub fn card_line(m: &Match) -> String {
    let badge = match m.status {
        MatchStatus::Live => "LIVE",
        MatchStatus::Scheduled => "    ",
        MatchStatus::Finished => "FT  ",
    };

    let middle = match (m.score.home, m.score.away) {
        (Some(h), Some(a)) => format!("{} - {}", h, a),
        (Some(h), None) => format!("{} - ?", h),
        (None, Some(a)) => format!("? - {}", a),
        (None, None) => "vs".to_string(),
    };

    let kickoff = m
        .kickoff
        .time
        .map(|t| t.format("%H:%M").to_string())
        .unwrap_or_else(|| "TBD".to_string());

    format!(
        "[{}] {} {} {} {} ({})",
        badge, kickoff, m.home_team.name, middle, m.away_team.name, m.league.name
    )
}

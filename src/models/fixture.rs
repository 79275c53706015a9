use std::cmp::Ordering;

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

const PLACEHOLDER_LOGO_BASE: &str = "https://ui-avatars.com/api/";

/// A single fixture, normalized from whichever provider supplied it.
///
/// Built once through [`MatchParts`] and never patched afterwards; a later
/// fetch produces a new value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Match {
    /// Provider-scoped identifier
    pub id: String,

    pub home_team: Team,

    pub away_team: Team,

    pub league: League,

    /// Goals; both `None` until the provider records them
    pub score: Score,

    pub status: MatchStatus,

    pub kickoff: Kickoff,

    pub venue: Option<String>,
}

/// Team as shown on a fixture card
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    pub id: String,
    pub name: String,
    pub logo_url: String,
}

impl Team {
    /// Build a team, substituting a placeholder logo when the provider has none
    pub fn new(id: impl Into<String>, name: impl Into<String>, logo_url: Option<String>) -> Self {
        let name = name.into();
        let logo_url = non_blank(logo_url).unwrap_or_else(|| placeholder_logo(&name));
        Self {
            id: id.into(),
            name,
            logo_url,
        }
    }
}

/// Competition a fixture belongs to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct League {
    pub id: String,
    pub name: String,
    pub logo_url: String,
    pub country: Option<String>,
}

impl League {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        logo_url: Option<String>,
        country: Option<String>,
    ) -> Self {
        let name = name.into();
        let logo_url = non_blank(logo_url).unwrap_or_else(|| placeholder_logo(&name));
        Self {
            id: id.into(),
            name,
            logo_url,
            country: non_blank(country),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Score {
    pub home: Option<u32>,
    pub away: Option<u32>,
}

impl Score {
    pub fn new(home: Option<u32>, away: Option<u32>) -> Self {
        Self { home, away }
    }

    /// Both sides have a recorded value
    pub fn is_complete(&self) -> bool {
        self.home.is_some() && self.away.is_some()
    }
}

/// Lifecycle of a fixture: `Scheduled -> Live -> Finished`, or straight to
/// `Finished`. Recomputed from the provider payload on every fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    Scheduled,
    Live,
    Finished,
}

/// What the provider's own status vocabulary said about a fixture
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusSignal {
    /// Provider marked the fixture as completed
    pub completed: bool,
    /// Provider marked the fixture as in progress (live, halves, half-time)
    pub in_progress: bool,
}

impl MatchStatus {
    /// Finished wins over live, live over scheduled. A complete score counts
    /// as finished even when the provider still reports it in progress.
    pub fn determine(signal: StatusSignal, score: &Score) -> Self {
        if signal.completed || score.is_complete() {
            MatchStatus::Finished
        } else if signal.in_progress {
            MatchStatus::Live
        } else {
            MatchStatus::Scheduled
        }
    }

    /// Display rank: live first, finished last
    pub fn rank(&self) -> u8 {
        match self {
            MatchStatus::Live => 0,
            MatchStatus::Scheduled => 1,
            MatchStatus::Finished => 2,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MatchStatus::Scheduled => "scheduled",
            MatchStatus::Live => "live",
            MatchStatus::Finished => "finished",
        }
    }
}

/// Kickoff date and time of day. Either half may be undetermined when the
/// provider omits it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Kickoff {
    pub date: Option<NaiveDate>,
    pub time: Option<NaiveTime>,
}

impl Kickoff {
    pub fn new(date: Option<NaiveDate>, time: Option<NaiveTime>) -> Self {
        Self { date, time }
    }
}

impl PartialOrd for Kickoff {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

// Undetermined parts sort after known ones.
impl Ord for Kickoff {
    fn cmp(&self, other: &Self) -> Ordering {
        let key = |k: &Kickoff| (k.date.is_none(), k.date, k.time.is_none(), k.time);
        key(self).cmp(&key(other))
    }
}

/// Everything an adapter extracted from one raw record
#[derive(Debug, Clone)]
pub struct MatchParts {
    pub id: String,
    pub home_team: Team,
    pub away_team: Team,
    pub league: League,
    pub score: Score,
    pub signal: StatusSignal,
    pub kickoff: Kickoff,
    pub venue: Option<String>,
}

impl From<MatchParts> for Match {
    fn from(parts: MatchParts) -> Self {
        let status = MatchStatus::determine(parts.signal, &parts.score);

        // A scheduled fixture never carries a score
        let score = if status == MatchStatus::Scheduled {
            Score::default()
        } else {
            parts.score
        };

        Match {
            id: parts.id,
            home_team: parts.home_team,
            away_team: parts.away_team,
            league: parts.league,
            score,
            status,
            kickoff: parts.kickoff,
            venue: non_blank(parts.venue),
        }
    }
}

/// Deterministic avatar URL derived from a display name
pub fn placeholder_logo(name: &str) -> String {
    let label = if name.trim().is_empty() { "?" } else { name.trim() };
    format!(
        "{}?name={}&background=random",
        PLACEHOLDER_LOGO_BASE,
        urlencoding::encode(label)
    )
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

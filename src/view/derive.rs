use std::collections::BTreeSet;

use crate::models::{Match, MatchStatus};

/// Filter and order matches for display.
///
/// `search_term` is a case-insensitive substring tested against both team
/// names and the league name; `selected_league` must equal the league name
/// exactly unless empty. Output is live, then scheduled, then finished, each
/// group by kickoff, with remaining ties kept in input order.
pub fn derive(matches: &[Match], search_term: &str, selected_league: &str) -> Vec<Match> {
    let needle = search_term.to_lowercase();

    let mut view: Vec<Match> = matches
        .iter()
        .filter(|m| selected_league.is_empty() || m.league.name == selected_league)
        .filter(|m| needle.is_empty() || matches_search(m, &needle))
        .cloned()
        .collect();

    // sort_by is stable
    view.sort_by(|a, b| {
        a.status
            .rank()
            .cmp(&b.status.rank())
            .then_with(|| a.kickoff.cmp(&b.kickoff))
    });

    view
}

fn matches_search(m: &Match, needle: &str) -> bool {
    [&m.home_team.name, &m.away_team.name, &m.league.name]
        .iter()
        .any(|field| field.to_lowercase().contains(needle))
}

/// Distinct league names, alphabetical
pub fn leagues(matches: &[Match]) -> Vec<String> {
    matches
        .iter()
        .map(|m| m.league.name.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Per-status totals for a match list
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusCounts {
    pub live: usize,
    pub scheduled: usize,
    pub finished: usize,
}

impl StatusCounts {
    pub fn of(matches: &[Match]) -> Self {
        matches.iter().fold(Self::default(), |mut counts, m| {
            match m.status {
                MatchStatus::Live => counts.live += 1,
                MatchStatus::Scheduled => counts.scheduled += 1,
                MatchStatus::Finished => counts.finished += 1,
            }
            counts
        })
    }
}

use crate::models::{FilterState, Match};
use crate::view::derive::derive;

/// What the dashboard currently shows. Rebuilt from scratch whenever the
/// matches or either filter input change.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewState {
    pub search_term: String,
    pub selected_league: String,
    pub filtered_matches: Vec<Match>,
}

impl ViewState {
    pub fn project(matches: &[Match], filters: &FilterState) -> Self {
        Self {
            search_term: filters.search_term.clone(),
            selected_league: filters.selected_league.clone(),
            filtered_matches: derive(matches, &filters.search_term, &filters.selected_league),
        }
    }

    pub fn filters(&self) -> FilterState {
        FilterState {
            search_term: self.search_term.clone(),
            selected_league: self.selected_league.clone(),
        }
    }
}

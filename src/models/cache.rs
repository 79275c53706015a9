use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{Match, ProviderKind};

/// Last successful fetch, replaced wholesale by the next one
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Provider the batch came from
    pub provider: ProviderKind,

    /// Day the fixtures were requested for
    pub date: NaiveDate,

    pub matches: Vec<Match>,

    pub fetched_at: DateTime<Utc>,
}

impl CacheEntry {
    /// Whether this entry answers a request for `provider` on `date`
    pub fn covers(&self, provider: ProviderKind, date: NaiveDate) -> bool {
        self.provider == provider && self.date == date
    }
}

/// Filter inputs restored across restarts
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterState {
    #[serde(default)]
    pub search_term: String,

    /// Exact league name; empty means all leagues
    #[serde(default)]
    pub selected_league: String,
}

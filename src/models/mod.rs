pub mod cache;
pub mod event;
pub mod fixture;
pub mod provider;

pub use cache::{CacheEntry, FilterState};
pub use event::AppEvent;
pub use fixture::{Kickoff, League, Match, MatchParts, MatchStatus, Score, StatusSignal, Team};
pub use provider::ProviderKind;

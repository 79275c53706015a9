use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Upstream fixture provider. A fetched batch always comes from exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProviderKind {
    /// API-Football v3 (primary)
    ApiFootball,
    /// TheSportsDB v1 (fallback)
    #[serde(rename = "sportsdb")]
    SportsDb,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::ApiFootball => "api-football",
            ProviderKind::SportsDb => "sportsdb",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "api-football" | "apifootball" | "api_football" => Ok(ProviderKind::ApiFootball),
            "sportsdb" | "thesportsdb" => Ok(ProviderKind::SportsDb),
            other => Err(format!("unknown provider '{}'", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_provider_names() {
        assert_eq!("api-football".parse(), Ok(ProviderKind::ApiFootball));
        assert_eq!(" TheSportsDB ".parse(), Ok(ProviderKind::SportsDb));
        assert!("espn".parse::<ProviderKind>().is_err());
    }

    #[test]
    fn test_serde_matches_display() {
        for kind in [ProviderKind::ApiFootball, ProviderKind::SportsDb] {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind));
            assert_eq!(serde_json::from_str::<ProviderKind>(&json).unwrap(), kind);
        }
    }
}

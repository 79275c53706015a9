use std::env;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use chrono::NaiveDate;

use crate::api::ProviderEndpoint;
use crate::models::ProviderKind;
use crate::sync::RetryPolicy;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Which upstream schema to use
    pub provider: ProviderKind,

    /// API-Football base URL
    pub api_football_url: String,

    /// API-Football key, sent as a header when set
    pub api_football_key: Option<String>,

    /// TheSportsDB base URL (public key included in the path)
    pub sportsdb_url: String,

    /// Fixed day to show; `None` follows today (UTC)
    pub match_date: Option<NaiveDate>,

    /// How long a cached batch counts as fresh
    pub cache_expiry: Duration,

    /// Minimum gap between provider requests
    pub min_request_spacing: Duration,

    /// Hard timeout per request
    pub request_timeout: Duration,

    /// Retries after the first failed attempt
    pub max_retries: u32,

    /// Linear backoff base
    pub retry_base_delay: Duration,

    /// Auto-refresh period while visible
    pub refresh_interval: Duration,

    /// SQLite database path
    pub database_url: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let provider = env::var("FIXTURE_PROVIDER")
            .unwrap_or_else(|_| "api-football".to_string())
            .parse::<ProviderKind>()
            .map_err(|e| anyhow!(e))
            .context("FIXTURE_PROVIDER must be api-football or sportsdb")?;

        let match_date = match env::var("MATCH_DATE") {
            Ok(raw) if !raw.trim().is_empty() => Some(
                NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
                    .context("MATCH_DATE must be YYYY-MM-DD")?,
            ),
            _ => None,
        };

        Ok(Config {
            provider,

            api_football_url: env::var("API_FOOTBALL_URL")
                .unwrap_or_else(|_| "https://v3.football.api-sports.io".to_string()),

            api_football_key: env::var("API_FOOTBALL_KEY")
                .ok()
                .filter(|k| !k.trim().is_empty()),

            sportsdb_url: env::var("SPORTSDB_URL")
                .unwrap_or_else(|_| "https://www.thesportsdb.com/api/v1/json/3".to_string()),

            match_date,

            cache_expiry: Duration::from_secs(number("CACHE_EXPIRY_SECS", 300)?),

            min_request_spacing: Duration::from_millis(number("MIN_REQUEST_SPACING_MS", 1000)?),

            request_timeout: Duration::from_secs(number("REQUEST_TIMEOUT_SECS", 10)?),

            max_retries: number("MAX_RETRIES", 3)?,

            retry_base_delay: Duration::from_millis(number("RETRY_BASE_DELAY_MS", 1000)?),

            refresh_interval: Duration::from_secs(number("REFRESH_INTERVAL_SECS", 300)?),

            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite:data/fixtures.db".to_string()),
        })
    }

    /// Endpoint for the configured provider
    pub fn endpoint(&self) -> ProviderEndpoint {
        match self.provider {
            ProviderKind::ApiFootball => ProviderEndpoint::new(
                ProviderKind::ApiFootball,
                &self.api_football_url,
                self.api_football_key.clone(),
            ),
            ProviderKind::SportsDb => {
                ProviderEndpoint::new(ProviderKind::SportsDb, &self.sportsdb_url, None)
            }
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            base_delay: self.retry_base_delay,
        }
    }
}

/// Read a numeric variable, falling back to `default` when unset
fn number<N>(name: &str, default: N) -> Result<N>
where
    N: FromStr,
    N::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{} must be a valid number", name)),
        Err(_) => Ok(default),
    }
}

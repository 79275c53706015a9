use std::collections::HashSet;

use chrono::NaiveDate;
use serde_json::Value;
use tracing::{debug, warn};

use crate::api::scheduler::ProviderRequest;
use crate::api::{api_football, sports_db};
use crate::error::FetchError;
use crate::models::{Match, ProviderKind};

/// Result of normalizing one raw provider record
#[derive(Debug, Clone, PartialEq)]
pub enum RecordOutcome {
    Parsed(Match),
    /// Record was malformed; the rest of the batch is unaffected
    Unparseable { reason: String },
}

/// Matches normalized from one response, in provider order
#[derive(Debug, Clone, Default)]
pub struct NormalizedBatch {
    pub matches: Vec<Match>,
    /// Records dropped as unparseable or duplicate
    pub skipped: usize,
}

/// Where and how to ask one provider for a day of fixtures
#[derive(Debug, Clone)]
pub struct ProviderEndpoint {
    pub kind: ProviderKind,
    pub base_url: String,
    pub api_key: Option<String>,
}

impl ProviderEndpoint {
    pub fn new(kind: ProviderKind, base_url: &str, api_key: Option<String>) -> Self {
        Self {
            kind,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
        }
    }

    /// Build the GET request for all fixtures on `date`
    pub fn request_for(&self, date: NaiveDate) -> ProviderRequest {
        match self.kind {
            ProviderKind::ApiFootball => {
                api_football::request_for(&self.base_url, self.api_key.as_deref(), date)
            }
            ProviderKind::SportsDb => sports_db::request_for(&self.base_url, date),
        }
    }
}

/// Normalize one raw record with the adapter for `provider`. Never panics.
pub fn normalize(raw: &Value, provider: ProviderKind) -> RecordOutcome {
    let parsed = match provider {
        ProviderKind::ApiFootball => api_football::normalize(raw),
        ProviderKind::SportsDb => sports_db::normalize(raw),
    };

    match parsed {
        Ok(m) => RecordOutcome::Parsed(m),
        Err(reason) => RecordOutcome::Unparseable { reason },
    }
}

/// Parse a whole response body and normalize every record in it.
///
/// Fails only when the body itself is unreadable; bad individual records are
/// logged and skipped, as are repeated ids.
pub fn normalize_batch(body: &str, provider: ProviderKind) -> Result<NormalizedBatch, FetchError> {
    let payload: Value = serde_json::from_str(body)
        .map_err(|e| FetchError::Payload(format!("{} response is not JSON: {}", provider, e)))?;

    let records = match provider {
        ProviderKind::ApiFootball => api_football::records(&payload)?,
        ProviderKind::SportsDb => sports_db::records(&payload)?,
    };

    let mut batch = NormalizedBatch::default();
    let mut seen = HashSet::new();

    for (index, raw) in records.iter().enumerate() {
        match normalize(raw, provider) {
            RecordOutcome::Parsed(m) => {
                if seen.insert(m.id.clone()) {
                    batch.matches.push(m);
                } else {
                    warn!("Dropping duplicate {} record id {}", provider, m.id);
                    batch.skipped += 1;
                }
            }
            RecordOutcome::Unparseable { reason } => {
                warn!("Skipping {} record #{}: {}", provider, index, reason);
                batch.skipped += 1;
            }
        }
    }

    debug!(
        "Normalized {} {} records ({} skipped)",
        batch.matches.len(),
        provider,
        batch.skipped
    );

    Ok(batch)
}

/// Provider ids arrive as numbers or strings
pub(crate) fn id_string(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Goal counts arrive as numbers, numeric strings or null; negatives are noise
pub(crate) fn goal_count(value: Option<&Value>) -> Option<u32> {
    let n = match value? {
        Value::Number(n) => n.as_i64()?,
        Value::String(s) => s.trim().parse::<i64>().ok()?,
        _ => return None,
    };
    u32::try_from(n).ok()
}

pub(crate) fn text(value: Option<&Value>) -> Option<String> {
    value
        .and_then(|v| v.as_str())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MatchStatus;
    use serde_json::json;

    #[test]
    fn test_goal_count_rejects_negative_and_garbage() {
        assert_eq!(goal_count(Some(&json!(3))), Some(3));
        assert_eq!(goal_count(Some(&json!("2"))), Some(2));
        assert_eq!(goal_count(Some(&json!(-1))), None);
        assert_eq!(goal_count(Some(&json!("x"))), None);
        assert_eq!(goal_count(Some(&Value::Null)), None);
        assert_eq!(goal_count(None), None);
    }

    #[test]
    fn test_batch_skips_bad_records_and_duplicates() {
        let body = json!({
            "response": [
                {
                    "fixture": { "id": 1, "status": { "short": "FT" } },
                    "teams": { "home": { "id": 1, "name": "A" }, "away": { "id": 2, "name": "B" } },
                    "goals": { "home": 2, "away": 1 }
                },
                { "fixture": "garbage" },
                {
                    "fixture": { "id": 1, "status": { "short": "NS" } },
                    "teams": { "home": { "name": "A" }, "away": { "name": "B" } }
                },
                {
                    "fixture": { "id": 2, "status": { "short": "2H" } },
                    "teams": { "home": { "name": "C" }, "away": { "name": "D" } },
                    "goals": { "home": 0, "away": null }
                }
            ]
        })
        .to_string();

        let batch = normalize_batch(&body, ProviderKind::ApiFootball).unwrap();
        let ids: Vec<_> = batch.matches.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2"]);
        assert_eq!(batch.skipped, 2);
        assert_eq!(batch.matches[0].status, MatchStatus::Finished);
        assert_eq!(batch.matches[1].status, MatchStatus::Live);
    }

    #[test]
    fn test_batch_rejects_non_json_body() {
        let err = normalize_batch("<html>", ProviderKind::SportsDb).unwrap_err();
        assert!(matches!(err, FetchError::Payload(_)));
    }

    #[test]
    fn test_endpoint_trims_base_url_and_blank_key() {
        let endpoint = ProviderEndpoint::new(ProviderKind::ApiFootball, "https://x.test/", Some(" ".into()));
        assert_eq!(endpoint.base_url, "https://x.test");
        assert_eq!(endpoint.api_key, None);
    }
}

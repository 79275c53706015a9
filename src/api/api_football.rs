use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use serde_json::Value;

use crate::api::provider::{goal_count, id_string};
use crate::api::scheduler::ProviderRequest;
use crate::error::FetchError;
use crate::models::{Kickoff, League, Match, MatchParts, Score, StatusSignal, Team};

const AUTH_HEADER: &str = "x-apisports-key";

/// Short status codes for a completed fixture (abandoned and cancelled included)
const COMPLETED_CODES: &[&str] = &["FT", "AET", "PEN", "AWD", "WO", "ABD", "CANC"];

/// Short status codes for a fixture in play
const IN_PROGRESS_CODES: &[&str] = &["1H", "HT", "2H", "ET", "BT", "P", "SUSP", "INT", "LIVE"];

/// One element of the `response` array
#[derive(Debug, Deserialize)]
struct FixtureRecord {
    #[serde(default)]
    fixture: Option<FixtureInfo>,
    #[serde(default)]
    league: Option<LeagueInfo>,
    #[serde(default)]
    teams: Option<TeamsInfo>,
    #[serde(default)]
    goals: Option<GoalsInfo>,
}

#[derive(Debug, Deserialize)]
struct FixtureInfo {
    #[serde(default)]
    id: Option<Value>,
    #[serde(default)]
    date: Option<String>,
    #[serde(default)]
    timestamp: Option<i64>,
    #[serde(default)]
    venue: Option<VenueInfo>,
    #[serde(default)]
    status: Option<StatusInfo>,
}

#[derive(Debug, Deserialize)]
struct VenueInfo {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    city: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StatusInfo {
    #[serde(default)]
    short: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LeagueInfo {
    #[serde(default)]
    id: Option<Value>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    country: Option<String>,
    #[serde(default)]
    logo: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TeamsInfo {
    #[serde(default)]
    home: Option<TeamInfo>,
    #[serde(default)]
    away: Option<TeamInfo>,
}

#[derive(Debug, Deserialize)]
struct TeamInfo {
    #[serde(default)]
    id: Option<Value>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    logo: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GoalsInfo {
    #[serde(default)]
    home: Option<Value>,
    #[serde(default)]
    away: Option<Value>,
}

/// `GET {base}/fixtures?date=YYYY-MM-DD`, key sent as a header
pub fn request_for(base_url: &str, api_key: Option<&str>, date: NaiveDate) -> ProviderRequest {
    let url = format!("{}/fixtures?date={}", base_url, date.format("%Y-%m-%d"));
    let headers = api_key
        .map(|key| vec![(AUTH_HEADER.to_string(), key.to_string())])
        .unwrap_or_default();
    ProviderRequest { url, headers }
}

/// Pull the record array out of a response envelope.
///
/// The API answers bad keys and quota errors with HTTP 200 and a non-empty
/// `errors` member, which is not worth retrying.
pub fn records(payload: &Value) -> Result<Vec<Value>, FetchError> {
    let has_errors = match payload.get("errors") {
        Some(Value::Object(map)) => !map.is_empty(),
        Some(Value::Array(list)) => !list.is_empty(),
        _ => false,
    };
    if has_errors {
        let detail = payload.get("errors").map(|e| e.to_string()).unwrap_or_default();
        return Err(FetchError::InvalidRequest(format!(
            "api-football rejected request: {}",
            detail
        )));
    }

    match payload.get("response") {
        Some(Value::Array(items)) => Ok(items.clone()),
        Some(Value::Null) | None => Ok(Vec::new()),
        Some(_) => Err(FetchError::Payload(
            "api-football `response` is not an array".to_string(),
        )),
    }
}

/// Convert one raw fixture into a [`Match`]
pub fn normalize(raw: &Value) -> Result<Match, String> {
    let record: FixtureRecord =
        serde_json::from_value(raw.clone()).map_err(|e| format!("malformed fixture: {}", e))?;

    let fixture = record.fixture.ok_or("missing `fixture` block")?;
    let id = id_string(fixture.id.as_ref()).ok_or("missing fixture id")?;

    let teams = record.teams.unwrap_or(TeamsInfo { home: None, away: None });
    let home_team = convert_team(teams.home, "Home");
    let away_team = convert_team(teams.away, "Away");

    let league = match record.league {
        Some(l) => League::new(
            id_string(l.id.as_ref()).unwrap_or_default(),
            l.name.filter(|n| !n.trim().is_empty()).unwrap_or_else(|| "Unknown league".to_string()),
            l.logo,
            l.country,
        ),
        None => League::new("", "Unknown league", None, None),
    };

    let score = record
        .goals
        .map(|g| Score::new(goal_count(g.home.as_ref()), goal_count(g.away.as_ref())))
        .unwrap_or_default();

    let code = fixture
        .status
        .and_then(|s| s.short)
        .map(|s| s.trim().to_ascii_uppercase())
        .unwrap_or_default();
    let signal = StatusSignal {
        completed: COMPLETED_CODES.contains(&code.as_str()),
        in_progress: IN_PROGRESS_CODES.contains(&code.as_str()),
    };

    let kickoff = kickoff_from(fixture.date.as_deref(), fixture.timestamp);

    let venue = fixture.venue.and_then(|v| match (v.name, v.city) {
        (Some(name), Some(city)) if !city.trim().is_empty() => Some(format!("{}, {}", name, city)),
        (Some(name), _) => Some(name),
        (None, city) => city,
    });

    Ok(MatchParts {
        id,
        home_team,
        away_team,
        league,
        score,
        signal,
        kickoff,
        venue,
    }
    .into())
}

fn convert_team(info: Option<TeamInfo>, side: &str) -> Team {
    match info {
        Some(t) => {
            let name = t
                .name
                .map(|n| n.trim().to_string())
                .filter(|n| !n.is_empty())
                .unwrap_or_else(|| side.to_string());
            Team::new(id_string(t.id.as_ref()).unwrap_or_default(), name, t.logo)
        }
        None => Team::new("", side, None),
    }
}

/// RFC 3339 date first, unix timestamp as a fallback; both reported in UTC
fn kickoff_from(date: Option<&str>, timestamp: Option<i64>) -> Kickoff {
    let instant = date
        .and_then(|d| DateTime::parse_from_rfc3339(d.trim()).ok())
        .map(|d| d.with_timezone(&Utc))
        .or_else(|| timestamp.and_then(|ts| DateTime::<Utc>::from_timestamp(ts, 0)));

    match instant {
        Some(at) => Kickoff::new(Some(at.date_naive()), Some(at.time())),
        None => Kickoff::default(),
    }
}

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde_json::Value;

use crate::api::provider::{goal_count, id_string, text};
use crate::api::scheduler::ProviderRequest;
use crate::error::FetchError;
use crate::models::{Kickoff, League, Match, MatchParts, Score, StatusSignal, Team};

const SPORT: &str = "Soccer";

const COMPLETED_STATUSES: &[&str] = &[
    "ft",
    "aet",
    "pen",
    "match finished",
    "finished",
    "awarded",
    "abandoned",
    "cancelled",
];

const IN_PROGRESS_STATUSES: &[&str] = &[
    "1h",
    "2h",
    "ht",
    "et",
    "bt",
    "p",
    "live",
    "in progress",
    "first half",
    "second half",
    "half time",
    "halftime",
];

/// `GET {base}/eventsday.php?d=YYYY-MM-DD&s=Soccer`; the key is part of the base path
pub fn request_for(base_url: &str, date: NaiveDate) -> ProviderRequest {
    ProviderRequest {
        url: format!(
            "{}/eventsday.php?d={}&s={}",
            base_url,
            date.format("%Y-%m-%d"),
            SPORT
        ),
        headers: Vec::new(),
    }
}

/// `events` is `null` on days without fixtures
pub fn records(payload: &Value) -> Result<Vec<Value>, FetchError> {
    match payload.get("events") {
        Some(Value::Array(items)) => Ok(items.clone()),
        Some(Value::Null) | None => Ok(Vec::new()),
        Some(_) => Err(FetchError::Payload(
            "sportsdb `events` is not an array".to_string(),
        )),
    }
}

/// Convert one TheSportsDB event into a [`Match`]
pub fn normalize(raw: &Value) -> Result<Match, String> {
    if !raw.is_object() {
        return Err("event is not an object".to_string());
    }

    let id = id_string(raw.get("idEvent")).ok_or("missing idEvent")?;

    let home_team = Team::new(
        id_string(raw.get("idHomeTeam")).unwrap_or_default(),
        text(raw.get("strHomeTeam")).unwrap_or_else(|| "Home".to_string()),
        text(raw.get("strHomeTeamBadge")),
    );
    let away_team = Team::new(
        id_string(raw.get("idAwayTeam")).unwrap_or_default(),
        text(raw.get("strAwayTeam")).unwrap_or_else(|| "Away".to_string()),
        text(raw.get("strAwayTeamBadge")),
    );

    let league = League::new(
        id_string(raw.get("idLeague")).unwrap_or_default(),
        text(raw.get("strLeague")).unwrap_or_else(|| "Unknown league".to_string()),
        text(raw.get("strLeagueBadge")),
        text(raw.get("strCountry")),
    );

    let score = Score::new(
        goal_count(raw.get("intHomeScore")),
        goal_count(raw.get("intAwayScore")),
    );

    let status = text(raw.get("strStatus"))
        .map(|s| s.to_ascii_lowercase())
        .unwrap_or_default();
    let signal = StatusSignal {
        completed: COMPLETED_STATUSES.contains(&status.as_str()),
        in_progress: IN_PROGRESS_STATUSES.contains(&status.as_str()),
    };

    Ok(MatchParts {
        id,
        home_team,
        away_team,
        league,
        score,
        signal,
        kickoff: kickoff_from(raw),
        venue: text(raw.get("strVenue")),
    }
    .into())
}

/// `strTimestamp` gives both halves; otherwise `dateEvent` and `strTime` are
/// read independently and either may stay undetermined.
fn kickoff_from(raw: &Value) -> Kickoff {
    if let Some(ts) = text(raw.get("strTimestamp")) {
        if let Some(at) = parse_timestamp(&ts) {
            return Kickoff::new(Some(at.date_naive()), Some(at.time()));
        }
    }

    let date = text(raw.get("dateEvent"))
        .and_then(|d| NaiveDate::parse_from_str(&d, "%Y-%m-%d").ok());
    let time = text(raw.get("strTime")).and_then(|t| parse_time(&t));

    Kickoff::new(date, time)
}

fn parse_timestamp(ts: &str) -> Option<DateTime<Utc>> {
    if let Ok(at) = DateTime::parse_from_rfc3339(ts) {
        return Some(at.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(ts, "%Y-%m-%dT%H:%M:%S")
        .ok()
        .map(|naive| naive.and_utc())
}

/// Accepts `19:45:00`, `19:45:00+00:00` and `19:45`
fn parse_time(raw: &str) -> Option<NaiveTime> {
    let clock = raw.get(..8).unwrap_or(raw);
    NaiveTime::parse_from_str(clock, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(raw.get(..5).unwrap_or(raw), "%H:%M"))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MatchStatus;
    use serde_json::json;

    #[test]
    fn test_normalize_event() {
        let raw = json!({
            "idEvent": "2052711",
            "strHomeTeam": "Barcelona",
            "strAwayTeam": "Valencia",
            "idHomeTeam": "133739",
            "idAwayTeam": "134221",
            "strLeague": "Spanish La Liga",
            "idLeague": "4335",
            "strCountry": "Spain",
            "intHomeScore": "3",
            "intAwayScore": "0",
            "strStatus": "Match Finished",
            "dateEvent": "2024-04-29",
            "strTime": "19:00:00",
            "strVenue": "Estadi Olimpic Lluis Companys",
            "strHomeTeamBadge": "https://r2.thesportsdb.com/badge/barca.png"
        });

        let m = normalize(&raw).unwrap();
        assert_eq!(m.id, "2052711");
        assert_eq!(m.status, MatchStatus::Finished);
        assert_eq!(m.score, Score::new(Some(3), Some(0)));
        assert_eq!(m.home_team.logo_url, "https://r2.thesportsdb.com/badge/barca.png");
        assert!(m.away_team.logo_url.contains("name=Valencia"));
        assert_eq!(m.kickoff.date, NaiveDate::from_ymd_opt(2024, 4, 29));
        assert_eq!(m.kickoff.time, NaiveTime::from_hms_opt(19, 0, 0));
    }

    #[test]
    fn test_missing_time_is_undetermined() {
        let raw = json!({
            "idEvent": 9,
            "strStatus": "Not Started",
            "dateEvent": "2024-04-29",
            "strTime": null,
            "intHomeScore": null
        });

        let m = normalize(&raw).unwrap();
        assert_eq!(m.status, MatchStatus::Scheduled);
        assert_eq!(m.kickoff.date, NaiveDate::from_ymd_opt(2024, 4, 29));
        assert_eq!(m.kickoff.time, None);
        assert_eq!(m.home_team.name, "Home");
    }

    #[test]
    fn test_timestamp_takes_priority() {
        let raw = json!({
            "idEvent": "1",
            "strStatus": "2H",
            "strTimestamp": "2024-04-29T18:30:00",
            "dateEvent": "2024-04-28",
            "strTime": "09:00"
        });

        let m = normalize(&raw).unwrap();
        assert_eq!(m.status, MatchStatus::Live);
        assert_eq!(m.kickoff.date, NaiveDate::from_ymd_opt(2024, 4, 29));
        assert_eq!(m.kickoff.time, NaiveTime::from_hms_opt(18, 30, 0));
    }

    #[test]
    fn test_short_time_format() {
        assert_eq!(parse_time("09:15"), NaiveTime::from_hms_opt(9, 15, 0));
        assert_eq!(parse_time("20:00:00+00:00"), NaiveTime::from_hms_opt(20, 0, 0));
        assert_eq!(parse_time("TBD"), None);
    }

    #[test]
    fn test_null_events_is_empty_day() {
        assert!(records(&json!({ "events": null })).unwrap().is_empty());
        assert!(records(&json!({ "events": "x" })).is_err());
        assert!(normalize(&json!(["idEvent"])).is_err());
    }
}

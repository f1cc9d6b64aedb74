use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::FeedError;

/// Status text the API uses for fixtures that have not started yet.
pub const UPCOMING_STATUS: &str = "Match not started";

/// Shown in place of `t1img`/`t2img` when the feed omits a logo.
pub const DEFAULT_TEAM_LOGO: &str = "https://h.cricapi.com/img/icon512.png";

/// One row of the `cricScore` feed. Read-only for everything downstream of
/// the poller.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Match {
    #[serde(default, deserialize_with = "de_opt_id")]
    pub id: Option<String>,
    #[serde(default)]
    pub series: String,
    #[serde(default)]
    pub match_type: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub t1: String,
    #[serde(default)]
    pub t2: String,
    #[serde(default)]
    pub t1img: Option<String>,
    #[serde(default)]
    pub t2img: Option<String>,
    #[serde(default)]
    pub t1s: Option<String>,
    #[serde(default)]
    pub t2s: Option<String>,
    #[serde(default, rename = "dateTimeGMT")]
    pub date_time_gmt: Option<String>,
    #[serde(default)]
    pub venue: Option<String>,
    #[serde(default)]
    pub toss: Option<String>,
}

impl Match {
    /// Identity used for bookmarks and live tracking. Falls back to the row's
    /// position in the feed when the API sent no id.
    pub fn key(&self, position: usize) -> MatchKey {
        match self.id.as_deref().map(str::trim).filter(|id| !id.is_empty()) {
            Some(id) => MatchKey(id.to_string()),
            None => MatchKey(format!("#{position}")),
        }
    }

    pub fn is_upcoming(&self) -> bool {
        self.status
            .as_deref()
            .is_some_and(|s| s.trim().eq_ignore_ascii_case(UPCOMING_STATUS))
    }

    /// Present, non-empty and not the upcoming sentinel.
    pub fn is_ongoing(&self) -> bool {
        self.status
            .as_deref()
            .is_some_and(|s| !s.trim().is_empty())
            && !self.is_upcoming()
    }

    pub fn t1_logo(&self) -> &str {
        logo_or_default(self.t1img.as_deref())
    }

    pub fn t2_logo(&self) -> &str {
        logo_or_default(self.t2img.as_deref())
    }

    /// Scheduled start as unix seconds, if `dateTimeGMT` parses.
    pub fn start_timestamp(&self) -> Option<i64> {
        parse_gmt_timestamp(self.date_time_gmt.as_deref()?)
    }

    pub fn start_date(&self) -> Option<NaiveDate> {
        let ts = self.start_timestamp()?;
        DateTime::from_timestamp(ts, 0).map(|dt| dt.date_naive())
    }
}

/// Stable identity of a match within and across polls.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MatchKey(pub String);

impl MatchKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for MatchKey {
    fn from(value: &str) -> Self {
        MatchKey(value.to_string())
    }
}

impl std::fmt::Display for MatchKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Outcome of exactly one fetch attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchResult {
    Success(Vec<Match>),
    /// The API answered but without a usable `data` list.
    EmptyOrMalformed,
    Failure(FeedError),
}

impl FetchResult {
    pub fn is_success(&self) -> bool {
        matches!(self, FetchResult::Success(_))
    }
}

fn logo_or_default(img: Option<&str>) -> &str {
    match img.map(str::trim) {
        Some(url) if !url.is_empty() => url,
        _ => DEFAULT_TEAM_LOGO,
    }
}

/// Accepts RFC 3339, the feed's zone-less `YYYY-MM-DDTHH:MM:SS` (treated as
/// UTC) and bare dates.
pub fn parse_gmt_timestamp(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.timestamp());
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(dt.and_utc().timestamp());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc().timestamp())
}

fn de_opt_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Int(i64),
        Float(f64),
    }

    Ok(match Option::<RawId>::deserialize(deserializer)? {
        Some(RawId::Text(s)) => Some(s),
        Some(RawId::Int(n)) => Some(n.to_string()),
        Some(RawId::Float(n)) => Some(n.to_string()),
        None => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_ids_become_strings() {
        let m: Match = serde_json::from_str(r#"{"id": 42, "status": "Live"}"#).unwrap();
        assert_eq!(m.id.as_deref(), Some("42"));
        assert_eq!(m.key(3).as_str(), "42");
    }

    #[test]
    fn missing_id_falls_back_to_position() {
        let m: Match = serde_json::from_str(r#"{"t1": "India"}"#).unwrap();
        assert_eq!(m.key(7).as_str(), "#7");
    }

    #[test]
    fn zoneless_timestamps_are_utc() {
        assert_eq!(parse_gmt_timestamp("1970-01-01T00:01:00"), Some(60));
        assert_eq!(parse_gmt_timestamp("1970-01-02"), Some(86_400));
        assert_eq!(parse_gmt_timestamp("soon"), None);
    }

    #[test]
    fn blank_logo_uses_placeholder() {
        let m = Match {
            t1img: Some("  ".to_string()),
            t2img: Some("https://x/logo.png".to_string()),
            ..Match::default()
        };
        assert_eq!(m.t1_logo(), DEFAULT_TEAM_LOGO);
        assert_eq!(m.t2_logo(), "https://x/logo.png");
    }
}

//! The scoring API data source and response classification.
//!
//! `tracing` events here are diagnostics for an embedding application that
//! installs a subscriber. Everything the user must see travels as a
//! [`FetchResult`] and ends up in the console through `apply_delta`.

use reqwest::Url;
use serde_json::Value;
use tracing::{debug, instrument, warn};

use crate::error::FeedError;
use crate::http_client::get_text;
use crate::model::{FetchResult, Match};

const GENERIC_REJECTION: &str = "request rejected by the scoring API";

/// Anything that can produce one snapshot of the match feed.
///
/// `fetch` never panics and never returns partial data: every call yields
/// exactly one [`FetchResult`].
pub trait DataSource: Send {
    fn fetch(&mut self, search: &str) -> FetchResult;

    /// Human-readable name for the console.
    fn name(&self) -> &str;
}

/// The public `cricScore` endpoint.
pub struct CricApiSource {
    endpoint: String,
    api_key: String,
}

impl CricApiSource {
    pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            api_key: api_key.into(),
        }
    }
}

impl DataSource for CricApiSource {
    #[instrument(skip(self))]
    fn fetch(&mut self, search: &str) -> FetchResult {
        let url = match build_feed_url(&self.endpoint, &self.api_key, search) {
            Ok(url) => url,
            Err(err) => return FetchResult::Failure(err),
        };
        match get_text(&url) {
            Ok(body) => parse_feed_json(&body),
            Err(err) => {
                warn!(%err, "feed request failed");
                FetchResult::Failure(err)
            }
        }
    }

    fn name(&self) -> &str {
        "cricapi"
    }
}

/// `endpoint?apikey=..[&search=..]`, the search term URL-encoded and left out
/// entirely when blank.
pub fn build_feed_url(endpoint: &str, api_key: &str, search: &str) -> Result<Url, FeedError> {
    let search = search.trim();
    let mut params = vec![("apikey", api_key)];
    if !search.is_empty() {
        params.push(("search", search));
    }
    Url::parse_with_params(endpoint, &params)
        .map_err(|err| FeedError::MalformedResponse(format!("invalid endpoint {endpoint}: {err}")))
}

/// Classifies one response body.
///
/// * `status: "failure"` becomes [`FeedError::Rejected`] with the payload's
///   `reason`/`message`.
/// * a list-shaped `data` becomes `Success`, order preserved.
/// * anything else that is valid JSON is `EmptyOrMalformed`.
pub fn parse_feed_json(raw: &str) -> FetchResult {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return FetchResult::EmptyOrMalformed;
    }

    let root: Value = match serde_json::from_str(trimmed) {
        Ok(root) => root,
        Err(err) => {
            return FetchResult::Failure(FeedError::MalformedResponse(format!(
                "invalid feed json: {err}"
            )));
        }
    };
    let Some(obj) = root.as_object() else {
        return FetchResult::EmptyOrMalformed;
    };

    let status = obj.get("status").and_then(Value::as_str).map(str::trim);
    if status.is_some_and(|s| s.eq_ignore_ascii_case("failure")) {
        let reason = ["reason", "message", "error"]
            .iter()
            .filter_map(|key| obj.get(*key).and_then(Value::as_str))
            .map(str::trim)
            .find(|text| !text.is_empty())
            .unwrap_or(GENERIC_REJECTION)
            .to_string();
        return FetchResult::Failure(FeedError::Rejected { reason });
    }

    match obj.get("data") {
        Some(data @ Value::Array(_)) => match serde_json::from_value::<Vec<Match>>(data.clone()) {
            Ok(matches) => FetchResult::Success(matches),
            Err(err) => {
                debug!(%err, "feed data rows did not decode");
                FetchResult::EmptyOrMalformed
            }
        },
        _ => FetchResult::EmptyOrMalformed,
    }
}

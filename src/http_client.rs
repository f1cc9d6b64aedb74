use std::time::Duration;

use anyhow::{Context, Result};
use once_cell::sync::OnceCell;
use reqwest::Url;
use reqwest::blocking::Client;
use tracing::debug;

use crate::error::FeedError;

const REQUEST_TIMEOUT_SECS: u64 = 10;
const USER_AGENT: &str = concat!("cricscore_terminal/", env!("CARGO_PKG_VERSION"));

static CLIENT: OnceCell<Client> = OnceCell::new();

pub fn http_client() -> Result<&'static Client> {
    CLIENT.get_or_try_init(|| {
        Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .user_agent(USER_AGENT)
            .build()
            .context("failed to build http client")
    })
}

/// GETs `url` and returns the body of a 2xx response.
///
/// Transport errors carry no status, which is what marks the session
/// offline. Non-2xx answers keep their status code. Error text never
/// includes the URL, since the query string holds the API key.
pub fn get_text(url: &Url) -> std::result::Result<String, FeedError> {
    let client = http_client().map_err(|err| FeedError::NetworkFailure {
        status: None,
        reason: format!("{err:#}"),
    })?;
    debug!(host = url.host_str().unwrap_or_default(), "GET");

    let resp = client
        .get(url.clone())
        .send()
        .map_err(|err| FeedError::NetworkFailure {
            status: None,
            reason: err.without_url().to_string(),
        })?;
    let status = resp.status();
    if !status.is_success() {
        return Err(FeedError::NetworkFailure {
            status: Some(status.as_u16()),
            reason: format!("http {status}"),
        });
    }
    resp.text().map_err(|err| FeedError::NetworkFailure {
        status: Some(status.as_u16()),
        reason: format!("failed reading body: {}", err.without_url()),
    })
}

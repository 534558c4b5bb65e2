use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeDelta, TimeZone, Utc};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::{Client, StatusCode};

use super::search_repo_api_response::GetRepoResponse;
use super::search_repo_query::build_request_body;
use crate::crawler_utils::{FetchOutcome, PageFetcher, PaginationCursor};
use crate::error::CrawlerError;
use crate::settings::CrawlerSettings;

const REQUEST_TIMEOUT_SECS: u64 = 60;

/// Creates the standard github api request headers:
/// 1. **authorization**, bearer token from *GITHUB_ACCESS_TOKEN*.
/// 2. **user-agent**, github rejects requests without one.
/// 3. **accept**, json.
fn get_requests_headers(settings: &CrawlerSettings) -> Result<HeaderMap, CrawlerError> {
    let mut headers = HeaderMap::new();
    let mut bearer = HeaderValue::from_str(&format!("Bearer {}", settings.token))
        .map_err(|_| CrawlerError::settings("access token contains invalid header characters"))?;
    bearer.set_sensitive(true);
    headers.insert(AUTHORIZATION, bearer);
    headers.insert(
        USER_AGENT,
        HeaderValue::from_str(&settings.user_agent)
            .map_err(|_| CrawlerError::settings("user agent contains invalid header characters"))?,
    );
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    Ok(headers)
}

fn header_as<T: std::str::FromStr>(headers: &HeaderMap, name: &str) -> Option<T> {
    headers.get(name)?.to_str().ok()?.trim().parse::<T>().ok()
}

/// How long github asks us to back off, if it says so.
/// `retry-after` is in seconds (secondary limits), `x-ratelimit-reset` is the epoch
/// second the primary limit resets at; one extra second is added to the latter.
pub(crate) fn rate_limit_wait(headers: &HeaderMap) -> Option<Duration> {
    if let Some(secs) = header_as::<u64>(headers, "retry-after") {
        return Some(Duration::from_secs(secs));
    }
    if header_as::<u32>(headers, "x-ratelimit-remaining")? > 0 {
        return None;
    }
    let reset_timestamp = header_as::<i64>(headers, "x-ratelimit-reset")?;
    let reset = Utc.timestamp_opt(reset_timestamp, 0).single()?;
    let wait = (reset - Utc::now()).checked_add(&TimeDelta::try_seconds(1)?)?;
    // reset already in the past
    Some(wait.to_std().unwrap_or(Duration::from_secs(1)))
}

fn short_body(body: &str) -> String {
    let trimmed = body.trim();
    match trimmed.char_indices().nth(200) {
        Some((idx, _)) => format!("{}...", &trimmed[..idx]),
        None => trimmed.to_owned(),
    }
}

/// Sorts a github reply into the outcomes the fetch loop knows how to handle.
pub fn classify_response(status: StatusCode, headers: &HeaderMap, body: &str) -> FetchOutcome {
    if status == StatusCode::UNAUTHORIZED {
        return FetchOutcome::AuthError(format!("{status}: {}", short_body(body)));
    }

    if status == StatusCode::FORBIDDEN || status == StatusCode::TOO_MANY_REQUESTS {
        let limit_exhausted = header_as::<u32>(headers, "x-ratelimit-remaining") == Some(0);
        let mentions_limit = body.to_ascii_lowercase().contains("rate limit");
        if status == StatusCode::TOO_MANY_REQUESTS
            || limit_exhausted
            || headers.contains_key("retry-after")
            || mentions_limit
        {
            return FetchOutcome::RateLimited {
                retry_after: rate_limit_wait(headers),
            };
        }
        return FetchOutcome::AuthError(format!("{status}: {}", short_body(body)));
    }

    if !status.is_success() {
        return FetchOutcome::TransientError(format!(
            "Request failed: {status}: {}",
            short_body(body)
        ));
    }

    let response: GetRepoResponse = match serde_json::from_str(body) {
        Ok(response) => response,
        Err(err) => {
            return FetchOutcome::TransientError(format!("Couldn't decode response: {err}"))
        }
    };

    if response
        .errors
        .iter()
        .any(|e| e.kind.as_deref() == Some("RATE_LIMITED"))
    {
        return FetchOutcome::RateLimited {
            retry_after: rate_limit_wait(headers),
        };
    }

    let messages = response
        .errors
        .iter()
        .map(|e| e.message.as_str())
        .collect::<Vec<_>>()
        .join("; ");

    match response.data.and_then(|data| data.search) {
        Some(page) => {
            if !messages.is_empty() {
                // partial data, usually submodules with odd names; failed nodes stay null
                warn!("Page returned with GraphQL errors: {messages}");
            }
            FetchOutcome::Success(page)
        }
        None if !messages.is_empty() => {
            FetchOutcome::TransientError(format!("GraphQL errors: {messages}"))
        }
        None => FetchOutcome::TransientError("Response carries no data".to_owned()),
    }
}

/// Fetches search pages from the github GraphQL endpoint.
pub struct GithubGraphqlFetcher {
    client: Client,
    headers: HeaderMap,
    settings: CrawlerSettings,
}

impl GithubGraphqlFetcher {
    pub fn new(settings: &CrawlerSettings) -> Result<GithubGraphqlFetcher, CrawlerError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;
        Self::with_client(client, settings)
    }

    pub fn with_client(
        client: Client,
        settings: &CrawlerSettings,
    ) -> Result<GithubGraphqlFetcher, CrawlerError> {
        Ok(GithubGraphqlFetcher {
            client,
            headers: get_requests_headers(settings)?,
            settings: settings.clone(),
        })
    }
}

#[async_trait]
impl PageFetcher for GithubGraphqlFetcher {
    async fn fetch_page(&self, cursor: &PaginationCursor) -> FetchOutcome {
        let body = build_request_body(&self.settings, cursor.after.as_deref());
        let response = match self
            .client
            .post(&self.settings.endpoint)
            .headers(self.headers.clone())
            .json(&body)
            .send()
            .await
        {
            Ok(response) => response,
            Err(err) => return FetchOutcome::TransientError(format!("Request failed: {err}")),
        };

        let status = response.status();
        let headers = response.headers().clone();
        debug!("Page #{} answered with {}", cursor.page_index, status);
        match response.text().await {
            Ok(text) => classify_response(status, &headers, &text),
            Err(err) => FetchOutcome::TransientError(format!("Couldn't read response body: {err}")),
        }
    }
}

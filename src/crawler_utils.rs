use std::time::Duration;

use async_trait::async_trait;

use crate::github_api_utils::search_repo_api_response::SearchPage;

/// Result of a single page request.
#[derive(Debug)]
pub enum FetchOutcome {
    Success(SearchPage),
    /// Retried. `retry_after` is github's hint, if it gave one.
    RateLimited { retry_after: Option<Duration> },
    /// Not retried, the crawl stops.
    AuthError(String),
    /// Network blips, 5xx, undecodable bodies. Retried.
    TransientError(String),
}

/// Where the crawl currently is: the cursor to resume after and the index of the
/// page about to be fetched. `after` is `None` for the first page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PaginationCursor {
    pub after: Option<String>,
    pub page_index: usize,
}

impl PaginationCursor {
    pub fn start() -> PaginationCursor {
        PaginationCursor::default()
    }

    pub fn advance(&self, end_cursor: String) -> PaginationCursor {
        PaginationCursor {
            after: Some(end_cursor),
            page_index: self.page_index + 1,
        }
    }
}

#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// A single attempt, retrying is up to the caller.
    async fn fetch_page(&self, cursor: &PaginationCursor) -> FetchOutcome;
}

pub mod crawler_helper;
pub mod page_writer;

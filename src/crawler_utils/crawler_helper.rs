use std::{fs::create_dir_all, time::Duration};

use tokio::time::sleep;

use super::page_writer::write_page;
use super::{FetchOutcome, PageFetcher, PaginationCursor};
use crate::error::CrawlerError;
use crate::github_api_utils::search_repo_api_response::SearchPage;
use crate::settings::CrawlerSettings;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlSummary {
    pub pages_written: usize,
    /// Total matches github reported on the last page. Search never paginates past
    /// 1000 results, so this can be far above what was actually written.
    pub repository_count: u64,
}

/// Fetches one page, retrying rate limits and transient failures forever.
/// Transient failures wait exactly `retry_delay`, rate limits wait at least that
/// and at least as long as github asked.
async fn fetch_page_with_retry<F>(
    fetcher: &F,
    cursor: &PaginationCursor,
    retry_delay: Duration,
) -> Result<SearchPage, CrawlerError>
where
    F: PageFetcher + ?Sized,
{
    let mut attempt: u32 = 1;
    loop {
        let wait = match fetcher.fetch_page(cursor).await {
            FetchOutcome::Success(page) => return Ok(page),
            FetchOutcome::AuthError(msg) => {
                error!("Authentication failed getting Page #{}", cursor.page_index);
                return Err(CrawlerError::Auth(msg));
            }
            FetchOutcome::RateLimited { retry_after } => {
                warn!("Rate limited getting Page #{}", cursor.page_index);
                retry_after.map_or(retry_delay, |hint| hint.max(retry_delay))
            }
            FetchOutcome::TransientError(msg) => {
                error!("Error Getting Page #{} (attempt {attempt})", cursor.page_index);
                error!("{msg}");
                retry_delay
            }
        };
        info!("Sleeping for {} ms", wait.as_millis());
        sleep(wait).await;
        attempt += 1;
        info!("Retrying Page #{}", cursor.page_index);
    }
}

/// Walks the search result pages from the start until github reports no next page,
/// writing each page to `settings.output_dir` before asking for the next one.
pub async fn crawl_all_pages<F>(
    fetcher: &F,
    settings: &CrawlerSettings,
) -> Result<CrawlSummary, CrawlerError>
where
    F: PageFetcher + ?Sized,
{
    create_dir_all(&settings.output_dir).map_err(|source| CrawlerError::Io {
        path: settings.output_dir.clone(),
        source,
    })?;

    let mut cursor = PaginationCursor::start();
    loop {
        info!("Getting Page #{}", cursor.page_index);
        let page = fetch_page_with_retry(fetcher, &cursor, settings.retry_delay).await?;
        info!(
            "Got Page #{} of {} Repositories",
            cursor.page_index, page.repository_count
        );

        let path = write_page(&settings.output_dir, cursor.page_index, &page.edges)?;
        info!("Wrote Page #{} to {}", cursor.page_index, path.display());

        if !page.page_info.has_next_page {
            let summary = CrawlSummary {
                pages_written: cursor.page_index + 1,
                repository_count: page.repository_count,
            };
            info!(
                "Wrote {} Repo Data Files to {}",
                summary.pages_written,
                settings.output_dir.display()
            );
            return Ok(summary);
        }

        let end_cursor = page.page_info.end_cursor.ok_or(CrawlerError::MissingCursor {
            page_index: cursor.page_index,
        })?;
        cursor = cursor.advance(end_cursor);
    }
}

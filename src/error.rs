use std::path::PathBuf;

use thiserror::Error;

/// Errors that end a crawl. Rate limits and transient fetch failures never
/// show up here: the fetch loop retries those itself.
#[derive(Debug, Error)]
pub enum CrawlerError {
    #[error("Github access token not found, set 'GITHUB_ACCESS_TOKEN' in the .env")]
    MissingToken,

    #[error("invalid settings: {message}")]
    Settings { message: String },

    #[error("Github rejected the access token: {0}")]
    Auth(String),

    #[error("page #{page_index} reports more results but carries no end cursor")]
    MissingCursor { page_index: usize },

    #[error("couldn't write {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("couldn't serialize page: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("couldn't build http client: {0}")]
    Http(#[from] reqwest::Error),
}

impl CrawlerError {
    pub(crate) fn settings(message: impl Into<String>) -> Self {
        CrawlerError::Settings {
            message: message.into(),
        }
    }
}

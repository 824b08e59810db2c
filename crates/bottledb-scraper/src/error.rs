use thiserror::Error;

/// Failure to obtain a page's markup from a [`crate::PageSource`].
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("not authorized to fetch {url} (HTTP {status}); the session cookie is missing or expired")]
    Unauthorized { url: String, status: u16 },

    #[error("rate limited fetching {url} (retry after {retry_after_secs}s)")]
    RateLimited { url: String, retry_after_secs: u64 },

    #[error("page not found: {url}")]
    NotFound { url: String },

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("invalid URL \"{url}\": {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("I/O error for {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl FetchError {
    /// `true` when no further page can succeed either, so the whole run
    /// must stop instead of skipping one record.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, FetchError::Unauthorized { .. })
    }
}

/// Failure to turn a parsed page into a record.
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("{url} does not look like a bottle detail page")]
    NotADetailPage { url: String },

    #[error("invalid base URL \"{url}\": {reason}")]
    InvalidBaseUrl { url: String, reason: String },
}

/// The aggregate rating payload could not be used.
#[derive(Debug, Error)]
pub enum RatingError {
    #[error("no script block contains the aggregate rating payload")]
    PayloadMissing,

    #[error("aggregate rating payload is not valid JSON: {0}")]
    PayloadUnparseable(#[source] serde_json::Error),
}

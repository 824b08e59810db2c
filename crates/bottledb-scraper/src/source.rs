//! Where page markup comes from.
//!
//! The run only needs "give me the HTML for this URL"; whether that comes
//! from the network, saved fixtures, or the on-disk cache is decided once at
//! startup.

use std::future::Future;
use std::path::{Path, PathBuf};

use crate::error::FetchError;

/// Anything that can produce a page's markup for a URL.
pub trait PageSource: Send + Sync {
    fn fetch(&self, url: &str) -> impl Future<Output = Result<String, FetchError>> + Send;
}

/// Serves saved pages from a data directory: the listing URL maps to
/// `bottles.html`, every other URL to `bottle.html`.
#[derive(Debug, Clone)]
pub struct LocalPageSource {
    listing_url: String,
    data_dir: PathBuf,
}

impl LocalPageSource {
    #[must_use]
    pub fn new(listing_url: impl Into<String>, data_dir: impl Into<PathBuf>) -> Self {
        Self {
            listing_url: listing_url.into(),
            data_dir: data_dir.into(),
        }
    }

    /// The fixture file that stands in for `url`.
    #[must_use]
    pub fn path_for(&self, url: &str) -> PathBuf {
        let file = if url == self.listing_url {
            "bottles.html"
        } else {
            "bottle.html"
        };
        self.data_dir.join(file)
    }
}

impl PageSource for LocalPageSource {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let path = self.path_for(url);
        tracing::debug!(url, path = %path.display(), "reading local page");
        read_page(&path).await
    }
}

pub(crate) async fn read_page(path: &Path) -> Result<String, FetchError> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|source| FetchError::Io {
            path: path.display().to_string(),
            source,
        })
}

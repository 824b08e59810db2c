//! On-disk page cache keyed by URL.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use crate::error::FetchError;
use crate::source::{read_page, PageSource};

/// File name for a cached page: SHA-256 of the URL, hex-encoded, plus
/// `.html`. Distinct URLs never share a file.
#[must_use]
pub fn cache_key(url: &str) -> String {
    let digest = Sha256::digest(url.as_bytes());
    let hex: String = digest.iter().map(|b| format!("{b:02x}")).collect();
    format!("{hex}.html")
}

/// Wraps another source with a get-or-fetch cache.
///
/// With `use_cache`, a page already on disk is returned without touching the
/// inner source. With `store_html`, pages fetched from the inner source are
/// written back. A cache write failure is logged and otherwise ignored.
#[derive(Debug, Clone)]
pub struct CachedPageSource<S> {
    inner: S,
    cache_dir: PathBuf,
    use_cache: bool,
    store_html: bool,
}

impl<S: PageSource> CachedPageSource<S> {
    pub fn new(inner: S, cache_dir: impl Into<PathBuf>, use_cache: bool, store_html: bool) -> Self {
        Self {
            inner,
            cache_dir: cache_dir.into(),
            use_cache,
            store_html,
        }
    }

    #[must_use]
    pub fn path_for(&self, url: &str) -> PathBuf {
        self.cache_dir.join(cache_key(url))
    }

    async fn read_cached(&self, url: &str, path: &Path) -> Option<String> {
        match read_page(path).await {
            Ok(markup) => {
                tracing::debug!(url, path = %path.display(), "cache hit");
                Some(markup)
            }
            Err(FetchError::Io { source, .. }) if source.kind() == ErrorKind::NotFound => None,
            Err(e) => {
                tracing::warn!(url, error = %e, "unreadable cache entry; fetching instead");
                None
            }
        }
    }

    async fn store(&self, url: &str, path: &Path, markup: &str) {
        let result = async {
            tokio::fs::create_dir_all(&self.cache_dir).await?;
            tokio::fs::write(path, markup).await
        }
        .await;
        match result {
            Ok(()) => tracing::debug!(url, path = %path.display(), "stored page in cache"),
            Err(e) => tracing::warn!(url, path = %path.display(), error = %e, "failed to store page in cache"),
        }
    }
}

impl<S: PageSource> PageSource for CachedPageSource<S> {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let path = self.path_for(url);
        if self.use_cache {
            if let Some(markup) = self.read_cached(url, &path).await {
                return Ok(markup);
            }
        }

        let markup = self.inner.fetch(url).await?;
        if self.store_html {
            self.store(url, &path, &markup).await;
        }
        Ok(markup)
    }
}

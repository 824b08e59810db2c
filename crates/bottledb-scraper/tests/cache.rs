//! Integration tests for `CachedPageSource` over real temp directories.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use bottledb_scraper::{cache_key, CachedPageSource, FetchError, LocalPageSource, PageSource};

/// Counts fetches and returns a fixed body.
#[derive(Clone)]
struct CountingSource {
    calls: Arc<AtomicU32>,
    body: &'static str,
}

impl CountingSource {
    fn new(body: &'static str) -> Self {
        Self {
            calls: Arc::new(AtomicU32::new(0)),
            body,
        }
    }

    fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

impl PageSource for CountingSource {
    async fn fetch(&self, _url: &str) -> Result<String, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.body.to_string())
    }
}

#[tokio::test]
async fn stored_page_is_served_from_cache() {
    let dir = tempfile::tempdir().unwrap();
    let inner = CountingSource::new("<html>fresh</html>");
    let cached = CachedPageSource::new(inner.clone(), dir.path(), true, true);

    let first = cached.fetch("https://flaviar.com/oban").await.unwrap();
    let second = cached.fetch("https://flaviar.com/oban").await.unwrap();

    assert_eq!(first, "<html>fresh</html>");
    assert_eq!(second, first);
    assert_eq!(inner.calls(), 1);
    assert!(dir
        .path()
        .join(cache_key("https://flaviar.com/oban"))
        .is_file());
}

#[tokio::test]
async fn existing_cache_file_wins_over_inner_source() {
    let dir = tempfile::tempdir().unwrap();
    let url = "https://flaviar.com/lagavulin";
    std::fs::write(dir.path().join(cache_key(url)), "<html>cached</html>").unwrap();

    let inner = CountingSource::new("<html>fresh</html>");
    let cached = CachedPageSource::new(inner.clone(), dir.path(), true, false);

    assert_eq!(cached.fetch(url).await.unwrap(), "<html>cached</html>");
    assert_eq!(inner.calls(), 0);
}

#[tokio::test]
async fn cache_disabled_always_fetches() {
    let dir = tempfile::tempdir().unwrap();
    let url = "https://flaviar.com/lagavulin";
    std::fs::write(dir.path().join(cache_key(url)), "<html>stale</html>").unwrap();

    let inner = CountingSource::new("<html>fresh</html>");
    let cached = CachedPageSource::new(inner.clone(), dir.path(), false, false);

    assert_eq!(cached.fetch(url).await.unwrap(), "<html>fresh</html>");
    assert_eq!(inner.calls(), 1);
}

#[tokio::test]
async fn store_disabled_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let inner = CountingSource::new("<html>fresh</html>");
    let cached = CachedPageSource::new(inner.clone(), dir.path().join("pages"), true, false);

    cached.fetch("https://flaviar.com/oban").await.unwrap();
    cached.fetch("https://flaviar.com/oban").await.unwrap();

    assert_eq!(inner.calls(), 2);
    assert!(!dir.path().join("pages").exists());
}

#[tokio::test]
async fn missing_cache_dir_is_created_on_store() {
    let dir = tempfile::tempdir().unwrap();
    let cache_dir = dir.path().join("nested").join("cache");
    let cached = CachedPageSource::new(CountingSource::new("<p/>"), &cache_dir, true, true);

    cached.fetch("https://flaviar.com/").await.unwrap();
    assert!(cache_dir.join(cache_key("https://flaviar.com/")).is_file());
}

#[tokio::test]
async fn local_source_reads_fixture_files() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("bottles.html"), "<html>listing</html>").unwrap();
    std::fs::write(dir.path().join("bottle.html"), "<html>detail</html>").unwrap();

    let local = LocalPageSource::new("https://flaviar.com/", dir.path());
    assert_eq!(
        local.fetch("https://flaviar.com/").await.unwrap(),
        "<html>listing</html>"
    );
    assert_eq!(
        local.fetch("https://flaviar.com/anything").await.unwrap(),
        "<html>detail</html>"
    );
}

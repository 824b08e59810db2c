//! One scrape run: listing page, limit, per-bottle detail enrichment.

use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use bottledb_core::{AppConfig, BasicBottleRecord, DetailBottleRecord};
use bottledb_scraper::{
    extract_detail_with_diagnostics, extract_listing, CachedPageSource, DetailExtraction,
    ExtractionError, FetchError, HttpPageSource, LocalPageSource, PageSource, ParsedDocument,
};
use futures::stream::{self, StreamExt};

use crate::output::{self, Delimiter};

/// The page source chosen at startup.
pub(crate) enum Source {
    Local(LocalPageSource),
    Http(HttpPageSource),
}

impl PageSource for Source {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        match self {
            Source::Local(source) => source.fetch(url).await,
            Source::Http(source) => source.fetch(url).await,
        }
    }
}

/// Builds the cached source described by `config`: fixtures in local mode,
/// HTTP otherwise.
pub(crate) fn build_source(config: &AppConfig) -> anyhow::Result<CachedPageSource<Source>> {
    let inner = if config.run.local_mode {
        tracing::info!(data_dir = %config.data_dir.display(), "local mode; reading saved pages");
        Source::Local(LocalPageSource::new(
            config.listing_url.clone(),
            config.data_dir.clone(),
        ))
    } else {
        let client = HttpPageSource::new(
            config.request_timeout_secs,
            &config.user_agent,
            config.max_retries,
            config.retry_backoff_base_secs,
        )
        .context("failed to build HTTP client")?
        .with_session_cookie(config.session_cookie.clone())
        .with_inter_request_delay(Duration::from_millis(config.inter_request_delay_ms));
        Source::Http(client)
    };

    Ok(CachedPageSource::new(
        inner,
        config.cache_dir.clone(),
        config.run.use_cache,
        config.run.store_html,
    ))
}

/// Records produced by a run and how many bottles were skipped.
///
/// `aborted` holds the authorization failure that stopped the run early;
/// `records` still carries everything extracted before it.
#[derive(Debug)]
pub(crate) struct RunOutcome {
    pub records: Vec<DetailBottleRecord>,
    pub skipped: usize,
    pub aborted: Option<FetchError>,
}

impl RunOutcome {
    /// Writes the records to every requested output, then reports an early
    /// abort as an error.
    pub(crate) fn persist(
        self,
        json_path: &Path,
        delimited: &[(&Path, Delimiter)],
    ) -> anyhow::Result<()> {
        output::write_json(json_path, &self.records)?;
        for (path, delimiter) in delimited {
            output::write_delimited_file(path, &self.records, *delimiter)?;
        }

        match self.aborted {
            Some(e) => {
                let done = self.records.len() + self.skipped;
                Err(anyhow::Error::new(e).context(format!(
                    "run aborted after {done} bottles; {} records saved",
                    self.records.len()
                )))
            }
            None => Ok(()),
        }
    }
}

enum RecordOutcome {
    Extracted(DetailBottleRecord),
    Skipped,
    Fatal(FetchError),
}

/// Executes a full run against `source`.
///
/// A bottle whose page cannot be fetched or extracted is logged and skipped.
/// An authorization failure stops fetching; the records extracted so far are
/// returned with the failure in [`RunOutcome::aborted`].
pub(crate) async fn run_scrape<S: PageSource>(
    config: &AppConfig,
    source: &S,
) -> anyhow::Result<RunOutcome> {
    let listing_markup = source
        .fetch(&config.listing_url)
        .await
        .with_context(|| format!("failed to fetch listing page {}", config.listing_url))?;
    let basics = parse_listing(&listing_markup, &config.base_url)?;
    let found = basics.len();
    let basics = config.run.num_bottles.apply(basics);
    tracing::info!(
        found,
        selected = basics.len(),
        limit = %config.run.num_bottles,
        "parsed listing page"
    );

    if config.run.write_intermediate_json {
        output::write_json(&config.output_dir.join("basic.json"), &basics)?;
    }

    let total = basics.len();
    let mut outcomes = stream::iter(basics)
        .map(|basic| scrape_one(source, basic))
        .buffered(config.max_concurrent_fetches.max(1));

    let mut records = Vec::with_capacity(total);
    let mut skipped = 0usize;
    let mut aborted = None;
    while let Some(outcome) = outcomes.next().await {
        match outcome {
            RecordOutcome::Extracted(record) => {
                records.push(record);
                tracing::info!(done = records.len() + skipped, total, "bottle processed");
            }
            RecordOutcome::Skipped => skipped += 1,
            RecordOutcome::Fatal(e) => {
                tracing::error!(
                    error = %e,
                    done = records.len() + skipped,
                    total,
                    "aborting run; keeping records extracted so far"
                );
                aborted = Some(e);
                break;
            }
        }
    }

    if skipped > 0 {
        tracing::warn!(skipped, total, "some bottles were skipped");
    }
    Ok(RunOutcome {
        records,
        skipped,
        aborted,
    })
}

async fn scrape_one<S: PageSource>(source: &S, basic: BasicBottleRecord) -> RecordOutcome {
    let href = basic.href.clone();
    let markup = match source.fetch(&href).await {
        Ok(markup) => markup,
        Err(e) if e.is_fatal() => return RecordOutcome::Fatal(e),
        Err(e) => {
            tracing::warn!(url = %href, error = %e, "failed to fetch detail page; skipping");
            return RecordOutcome::Skipped;
        }
    };

    match extract_from_markup(&markup, basic) {
        Ok(extraction) => RecordOutcome::Extracted(extraction.record),
        Err(e) => {
            tracing::warn!(url = %href, error = %e, "failed to extract detail page; skipping");
            RecordOutcome::Skipped
        }
    }
}

/// Parses and extracts synchronously; the parsed document never lives across
/// an `.await`.
pub(crate) fn extract_from_markup(
    markup: &str,
    basic: BasicBottleRecord,
) -> Result<DetailExtraction, ExtractionError> {
    let doc = ParsedDocument::parse(markup);
    extract_detail_with_diagnostics(&doc, basic)
}

pub(crate) fn parse_listing(
    markup: &str,
    base_url: &str,
) -> Result<Vec<BasicBottleRecord>, ExtractionError> {
    let doc = ParsedDocument::parse(markup);
    extract_listing(&doc, base_url)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::path::Path;

    use bottledb_core::{BottleLimit, RunConfig};

    use super::*;

    const LISTING: &str = r#"<html><body>
        <div class="col-lg-3"><a href="/oban"><div class="name">Oban</div><div class="edition">Oban 14</div><div class="type">Scotch</div><div class="price">$74.99</div></a></div>
        <div class="col-lg-3"><a href="/login-wall"><div class="name">Locked</div><div class="edition">Locked</div><div class="type">Rum</div><div class="price">$10</div></a></div>
        <div class="col-lg-3"><a href="/broken"><div class="name">Broken</div><div class="edition">Broken</div><div class="type">Gin</div><div class="price">$20</div></a></div>
        <div class="col-lg-3"><a href="/lagavulin"><div class="name">Lagavulin</div><div class="edition">Lagavulin 16</div><div class="type">Scotch</div><div class="price">$99</div></a></div>
    </body></html>"#;

    fn detail_page(style: &str) -> String {
        format!(
            r#"<html><body><div class="title">Style</div><div class="value">{style}</div></body></html>"#
        )
    }

    /// Serves pages from a map; unknown URLs are 404s and `/login-wall`
    /// answers as an expired session would.
    struct MapSource {
        pages: HashMap<String, String>,
    }

    impl PageSource for MapSource {
        async fn fetch(&self, url: &str) -> Result<String, FetchError> {
            if url.ends_with("/login-wall") {
                return Err(FetchError::Unauthorized {
                    url: url.to_owned(),
                    status: 401,
                });
            }
            self.pages
                .get(url)
                .cloned()
                .ok_or_else(|| FetchError::NotFound {
                    url: url.to_owned(),
                })
        }
    }

    fn config(output_dir: &Path, run: RunConfig, max_concurrent_fetches: usize) -> AppConfig {
        AppConfig {
            run,
            base_url: "https://flaviar.test".into(),
            listing_url: "https://flaviar.test/".into(),
            session_cookie: None,
            data_dir: output_dir.join("data"),
            cache_dir: output_dir.join("cache"),
            output_dir: output_dir.to_path_buf(),
            log_level: "info".into(),
            request_timeout_secs: 5,
            user_agent: "bottledb-test".into(),
            max_concurrent_fetches,
            inter_request_delay_ms: 0,
            max_retries: 0,
            retry_backoff_base_secs: 0,
        }
    }

    fn source(listing: &str) -> MapSource {
        let mut pages = HashMap::new();
        pages.insert("https://flaviar.test/".to_owned(), listing.to_owned());
        pages.insert("https://flaviar.test/oban".to_owned(), detail_page("Single Malt"));
        pages.insert("https://flaviar.test/lagavulin".to_owned(), detail_page("Islay"));
        pages.insert(
            "https://flaviar.test/broken".to_owned(),
            "<html><body><p>Gone</p></body></html>".to_owned(),
        );
        MapSource { pages }
    }

    fn listing_without_login_wall() -> String {
        LISTING
            .lines()
            .filter(|line| !line.contains("/login-wall"))
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[tokio::test]
    async fn failed_bottles_are_skipped_and_order_is_kept() {
        let dir = tempfile::tempdir().unwrap();
        let listing = listing_without_login_wall();
        for concurrency in [1, 3] {
            let cfg = config(dir.path(), RunConfig::default(), concurrency);
            let outcome = run_scrape(&cfg, &source(&listing)).await.unwrap();

            assert_eq!(outcome.skipped, 1, "concurrency {concurrency}");
            let styles: Vec<_> = outcome
                .records
                .iter()
                .map(|r| r.style.as_deref().unwrap_or_default())
                .collect();
            assert_eq!(styles, vec!["Single Malt", "Islay"], "concurrency {concurrency}");
            assert_eq!(outcome.records[1].basic.href, "https://flaviar.test/lagavulin");
        }
    }

    #[tokio::test]
    async fn unauthorized_stops_the_run_but_keeps_extracted_records() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config(dir.path(), RunConfig::default(), 1);
        let outcome = run_scrape(&cfg, &source(LISTING)).await.unwrap();

        assert!(matches!(
            outcome.aborted,
            Some(FetchError::Unauthorized { .. })
        ));
        assert_eq!(outcome.records.len(), 1);
        assert_eq!(outcome.records[0].basic.brand, "Oban");
    }

    #[tokio::test]
    async fn aborted_run_still_writes_its_records() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config(dir.path(), RunConfig::default(), 1);
        let outcome = run_scrape(&cfg, &source(LISTING)).await.unwrap();

        let json_path = dir.path().join("output.json");
        let csv_path = dir.path().join("output.csv");
        let err = outcome
            .persist(&json_path, &[(csv_path.as_path(), Delimiter::Csv)])
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<FetchError>(),
            Some(FetchError::Unauthorized { .. })
        ));

        let text = std::fs::read_to_string(&json_path).unwrap();
        let saved: Vec<DetailBottleRecord> = serde_json::from_str(&text).unwrap();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].basic.href, "https://flaviar.test/oban");
        assert_eq!(saved[0].style.as_deref(), Some("Single Malt"));
        assert_eq!(std::fs::read_to_string(&csv_path).unwrap().lines().count(), 2);
    }

    #[tokio::test]
    async fn completed_run_persists_without_error() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config(dir.path(), RunConfig::default(), 2);
        let outcome = run_scrape(&cfg, &source(&listing_without_login_wall()))
            .await
            .unwrap();
        assert!(outcome.aborted.is_none());

        let json_path = dir.path().join("out").join("output.json");
        outcome.persist(&json_path, &[]).unwrap();
        assert!(json_path.is_file());
    }

    #[tokio::test]
    async fn limit_applies_in_listing_order() {
        let dir = tempfile::tempdir().unwrap();
        let run = RunConfig {
            num_bottles: BottleLimit::AtMost(1),
            ..RunConfig::default()
        };
        let cfg = config(dir.path(), run, 1);
        let outcome = run_scrape(&cfg, &source(LISTING)).await.unwrap();
        assert_eq!(outcome.records.len(), 1);
        assert_eq!(outcome.records[0].basic.brand, "Oban");
    }

    #[tokio::test]
    async fn intermediate_json_is_written_when_enabled() {
        let dir = tempfile::tempdir().unwrap();
        let run = RunConfig {
            num_bottles: BottleLimit::AtMost(1),
            write_intermediate_json: true,
            ..RunConfig::default()
        };
        let cfg = config(dir.path(), run, 1);
        run_scrape(&cfg, &source(LISTING)).await.unwrap();

        let text = std::fs::read_to_string(dir.path().join("basic.json")).unwrap();
        let basics: Vec<BasicBottleRecord> = serde_json::from_str(&text).unwrap();
        assert_eq!(basics.len(), 1);
        assert_eq!(basics[0].href, "https://flaviar.test/oban");
    }

    #[tokio::test]
    async fn missing_listing_page_fails_the_run() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config(dir.path(), RunConfig::default(), 1);
        let empty = MapSource {
            pages: HashMap::new(),
        };
        assert!(run_scrape(&cfg, &empty).await.is_err());
    }

    #[tokio::test]
    async fn local_mode_reads_fixture_files() {
        let dir = tempfile::tempdir().unwrap();
        let data = dir.path().join("data");
        std::fs::create_dir_all(&data).unwrap();
        std::fs::write(data.join("bottles.html"), listing_without_login_wall()).unwrap();
        std::fs::write(data.join("bottle.html"), detail_page("Single Malt")).unwrap();

        let run = RunConfig {
            local_mode: true,
            use_cache: false,
            ..RunConfig::default()
        };
        let cfg = config(dir.path(), run, 1);
        let source = build_source(&cfg).unwrap();

        let outcome = run_scrape(&cfg, &source).await.unwrap();
        assert_eq!(outcome.records.len(), 3);
        assert_eq!(outcome.skipped, 0);
        assert!(outcome
            .records
            .iter()
            .all(|r| r.style.as_deref() == Some("Single Malt")));
    }
}

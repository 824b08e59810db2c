use std::path::PathBuf;

/// How many listing records a run should enrich.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BottleLimit {
    Unbounded,
    AtMost(usize),
}

impl BottleLimit {
    /// Truncates `items` to the limit, keeping listing order.
    #[must_use]
    pub fn apply<T>(self, mut items: Vec<T>) -> Vec<T> {
        if let BottleLimit::AtMost(n) = self {
            items.truncate(n);
        }
        items
    }
}

impl std::fmt::Display for BottleLimit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BottleLimit::Unbounded => write!(f, "all"),
            BottleLimit::AtMost(n) => write!(f, "{n}"),
        }
    }
}

/// Options that shape a single scrape run. Built once, then passed by
/// reference into the run; nothing reads these from the environment later.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    /// Read pages from the fixture files in `data_dir` instead of the network.
    pub local_mode: bool,
    /// Serve pages from the on-disk cache when a cached copy exists.
    pub use_cache: bool,
    /// Write every fetched page into the on-disk cache.
    pub store_html: bool,
    pub num_bottles: BottleLimit,
    /// Persist the basic listing records before detail enrichment starts.
    pub write_intermediate_json: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            local_mode: false,
            use_cache: true,
            store_html: false,
            num_bottles: BottleLimit::Unbounded,
            write_intermediate_json: false,
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub run: RunConfig,
    pub base_url: String,
    pub listing_url: String,
    /// Cookie header value for an already-authenticated storefront session.
    pub session_cookie: Option<String>,
    pub data_dir: PathBuf,
    pub cache_dir: PathBuf,
    pub output_dir: PathBuf,
    pub log_level: String,
    pub request_timeout_secs: u64,
    pub user_agent: String,
    pub max_concurrent_fetches: usize,
    pub inter_request_delay_ms: u64,
    pub max_retries: u32,
    pub retry_backoff_base_secs: u64,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("run", &self.run)
            .field("base_url", &self.base_url)
            .field("listing_url", &self.listing_url)
            .field(
                "session_cookie",
                &self.session_cookie.as_ref().map(|_| "[redacted]"),
            )
            .field("data_dir", &self.data_dir)
            .field("cache_dir", &self.cache_dir)
            .field("output_dir", &self.output_dir)
            .field("log_level", &self.log_level)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("user_agent", &self.user_agent)
            .field("max_concurrent_fetches", &self.max_concurrent_fetches)
            .field("inter_request_delay_ms", &self.inter_request_delay_ms)
            .field("max_retries", &self.max_retries)
            .field("retry_backoff_base_secs", &self.retry_backoff_base_secs)
            .finish()
    }
}

use std::time::{Duration, Instant};

use reqwest::{header, Client, StatusCode, Url};
use tokio::sync::Mutex;

use crate::error::FetchError;
use crate::rate_limit::retry_with_backoff;
use crate::source::PageSource;

/// Seconds to wait after a 429 that carries no usable `Retry-After`.
const DEFAULT_RETRY_AFTER_SECS: u64 = 60;

/// Fetches storefront pages over HTTP.
///
/// Authentication is not performed here: an already-authenticated session
/// cookie can be supplied and is sent with every request. A 401/403, or a
/// redirect that lands on the login page, is reported as
/// [`FetchError::Unauthorized`] so the run can stop instead of scraping login
/// forms.
///
/// Transient errors (429, 5xx, network failures) are retried with
/// exponential backoff up to `max_retries` additional attempts. Requests are
/// spaced at least `inter_request_delay` apart.
pub struct HttpPageSource {
    client: Client,
    max_retries: u32,
    backoff_base_secs: u64,
    session_cookie: Option<String>,
    inter_request_delay: Duration,
    last_request: Mutex<Option<Instant>>,
}

impl HttpPageSource {
    /// Creates a source with the given timeout, `User-Agent` and retry policy.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(
        timeout_secs: u64,
        user_agent: &str,
        max_retries: u32,
        backoff_base_secs: u64,
    ) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;
        Ok(Self {
            client,
            max_retries,
            backoff_base_secs,
            session_cookie: None,
            inter_request_delay: Duration::ZERO,
            last_request: Mutex::new(None),
        })
    }

    /// Sends `cookie` as the `Cookie` header on every request.
    #[must_use]
    pub fn with_session_cookie(mut self, cookie: Option<String>) -> Self {
        self.session_cookie = cookie;
        self
    }

    #[must_use]
    pub fn with_inter_request_delay(mut self, delay: Duration) -> Self {
        self.inter_request_delay = delay;
        self
    }

    async fn throttle(&self) {
        let mut last = self.last_request.lock().await;
        if let Some(previous) = *last {
            let elapsed = previous.elapsed();
            if elapsed < self.inter_request_delay {
                tokio::time::sleep(self.inter_request_delay - elapsed).await;
            }
        }
        *last = Some(Instant::now());
    }

    async fn fetch_once(&self, url: &str) -> Result<String, FetchError> {
        self.throttle().await;

        let mut request = self.client.get(url);
        if let Some(cookie) = &self.session_cookie {
            request = request.header(header::COOKIE, cookie.as_str());
        }
        let response = request.send().await?;
        let status = response.status();

        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                return Err(FetchError::Unauthorized {
                    url: url.to_owned(),
                    status: status.as_u16(),
                });
            }
            StatusCode::TOO_MANY_REQUESTS => {
                let retry_after_secs = response
                    .headers()
                    .get(header::RETRY_AFTER)
                    .and_then(|v| v.to_str().ok())
                    .and_then(|s| s.trim().parse::<u64>().ok())
                    .unwrap_or(DEFAULT_RETRY_AFTER_SECS);
                return Err(FetchError::RateLimited {
                    url: url.to_owned(),
                    retry_after_secs,
                });
            }
            StatusCode::NOT_FOUND => {
                return Err(FetchError::NotFound {
                    url: url.to_owned(),
                });
            }
            s if !s.is_success() => {
                return Err(FetchError::UnexpectedStatus {
                    status: s.as_u16(),
                    url: url.to_owned(),
                });
            }
            _ => {}
        }

        if response.url().path().starts_with("/login") {
            tracing::error!(url, landed_on = %response.url(), "redirected to login page");
            return Err(FetchError::Unauthorized {
                url: url.to_owned(),
                status: status.as_u16(),
            });
        }

        Ok(response.text().await?)
    }
}

impl PageSource for HttpPageSource {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        Url::parse(url).map_err(|e| FetchError::InvalidUrl {
            url: url.to_owned(),
            reason: e.to_string(),
        })?;

        tracing::debug!(url, "fetching page");
        retry_with_backoff(self.max_retries, self.backoff_base_secs, || {
            self.fetch_once(url)
        })
        .await
    }
}

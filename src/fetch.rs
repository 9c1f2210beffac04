use std::time::{Duration, Instant};

use anyhow::{anyhow, Context, Result};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, USER_AGENT};
use reqwest::StatusCode;
use tracing::{debug, warn};

const MAX_RETRIES: u32 = 3;
const BASE_BACKOFF_MS: u64 = 500;
const TIMEOUT_SECS: u64 = 30;

// Wikipedia answers bare clients with 403s, so look like a browser.
const BROWSER_UA: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
const ACCEPT_HTML: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";

#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub user_agent: String,
    pub timeout: Duration,
    /// Pause after every successful request.
    pub sleep: Duration,
    pub max_retries: u32,
    pub base_backoff: Duration,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: BROWSER_UA.to_string(),
            timeout: Duration::from_secs(TIMEOUT_SECS),
            sleep: Duration::ZERO,
            max_retries: MAX_RETRIES,
            base_backoff: Duration::from_millis(BASE_BACKOFF_MS),
        }
    }
}

impl FetchConfig {
    fn backoff(&self, attempt: u32) -> Duration {
        self.base_backoff * 2u32.saturating_pow(attempt)
    }
}

/// Outcome of a single GET.
enum Attempt {
    Body(String),
    Retry(String),
    Fail(anyhow::Error),
}

/// Sequential page fetcher. One request in flight at a time.
pub struct Fetcher {
    client: reqwest::Client,
    config: FetchConfig,
}

impl Fetcher {
    pub fn new(config: FetchConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&config.user_agent).context("Invalid User-Agent")?,
        );
        headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_HTML));
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self { client, config })
    }

    /// GET `url` and return the body, retrying rate limits, server errors
    /// and transport failures with exponential backoff.
    pub async fn fetch(&self, url: &str) -> Result<String> {
        let mut attempt = 0;
        loop {
            let reason = match self.fetch_once(url).await {
                Attempt::Body(body) => {
                    if !self.config.sleep.is_zero() {
                        tokio::time::sleep(self.config.sleep).await;
                    }
                    return Ok(body);
                }
                Attempt::Fail(e) => return Err(e),
                Attempt::Retry(reason) => reason,
            };

            if attempt >= self.config.max_retries {
                return Err(anyhow!(
                    "GET {} failed after {} attempts: {}",
                    url,
                    attempt + 1,
                    reason
                ));
            }

            let backoff = self.config.backoff(attempt);
            warn!(
                "{} on {} (attempt {}/{}), backing off {:.1}s",
                reason,
                url,
                attempt + 1,
                self.config.max_retries,
                backoff.as_secs_f64()
            );
            tokio::time::sleep(backoff).await;
            attempt += 1;
        }
    }

    async fn fetch_once(&self, url: &str) -> Attempt {
        debug!("[fetch] GET {}", url);
        let start = Instant::now();

        let resp = match self.client.get(url).send().await {
            Ok(resp) => resp,
            Err(e) if is_transient(&e) => return Attempt::Retry(e.to_string()),
            Err(e) => return Attempt::Fail(anyhow!(e).context(format!("GET {}", url))),
        };

        let status = resp.status();
        if should_retry(status) {
            return Attempt::Retry(format!("HTTP {}", status));
        }
        if !status.is_success() {
            return Attempt::Fail(anyhow!("GET {} returned HTTP {}", url, status));
        }

        match resp.text().await {
            Ok(body) => {
                debug!(
                    "[fetch] {} bytes in {}ms",
                    body.len(),
                    start.elapsed().as_millis()
                );
                Attempt::Body(body)
            }
            Err(e) if is_transient(&e) => Attempt::Retry(e.to_string()),
            Err(e) => Attempt::Fail(anyhow!(e).context(format!("Reading body of {}", url))),
        }
    }
}

fn should_retry(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

fn is_transient(e: &reqwest::Error) -> bool {
    e.is_timeout() || e.is_connect() || e.is_request() || e.is_body()
}

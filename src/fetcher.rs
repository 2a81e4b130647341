//! HTTP page fetching with a single retry.

use async_trait::async_trait;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, HeaderMap, HeaderValue};
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tokio::time::sleep;
use url::Url;

use crate::config::Config;
use crate::error::{AppError, Result};

/// Anything that can turn a URL into page content.
///
/// A failed fetch is `None`, never an error: callers treat a missing page as
/// missing data and carry on.
#[async_trait]
pub(crate) trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &Url) -> Option<String>;
}

/// Immutable request settings handed to [`HttpFetcher`] at construction.
#[derive(Debug, Clone)]
pub(crate) struct FetchSettings {
    pub user_agent: String,
    pub accept_language: String,
    pub timeout: Duration,
    pub max_attempts: u32,
    pub retry_delay: Duration,
}

impl From<&Config> for FetchSettings {
    fn from(config: &Config) -> Self {
        FetchSettings {
            user_agent: config.user_agent.clone(),
            accept_language: config.accept_language.clone(),
            timeout: config.request_timeout,
            max_attempts: config.max_fetch_attempts.max(1),
            retry_delay: config.retry_delay,
        }
    }
}

/// `reqwest`-backed fetcher sending browser-like headers.
#[derive(Debug, Clone)]
pub(crate) struct HttpFetcher {
    client: Client,
    settings: FetchSettings,
}

impl HttpFetcher {
    pub(crate) fn new(settings: FetchSettings) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("text/html,application/xhtml+xml;q=0.9,*/*;q=0.8"),
        );
        headers.insert(
            ACCEPT_LANGUAGE,
            HeaderValue::from_str(&settings.accept_language).map_err(|e| {
                AppError::Config(format!(
                    "Invalid accept-language '{}': {}",
                    settings.accept_language, e
                ))
            })?,
        );

        let client = Client::builder()
            .user_agent(&settings.user_agent)
            .default_headers(headers)
            .timeout(settings.timeout)
            .build()?;

        Ok(Self { client, settings })
    }

    async fn attempt(&self, url: &Url) -> std::result::Result<String, String> {
        let response = self
            .client
            .get(url.clone())
            .timeout(self.settings.timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    format!("timeout: {}", e)
                } else {
                    format!("request error: {}", e)
                }
            })?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(format!("status {}", status));
        }

        response
            .text()
            .await
            .map_err(|e| format!("failed to read body: {}", e))
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &Url) -> Option<String> {
        for attempt in 1..=self.settings.max_attempts {
            tracing::debug!(target: "fetch_task", "GET {} (attempt {})", url, attempt);
            match self.attempt(url).await {
                Ok(body) => return Some(body),
                Err(reason) => {
                    tracing::debug!(target: "fetch_task", "GET {} failed on attempt {}: {}", url, attempt, reason);
                    if attempt < self.settings.max_attempts {
                        sleep(self.settings.retry_delay).await;
                    } else {
                        tracing::warn!(target: "fetch_task", "Giving up on {}: {}", url, reason);
                    }
                }
            }
        }
        None
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use std::net::SocketAddr;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use warp::Filter;

    fn settings() -> FetchSettings {
        FetchSettings {
            user_agent: "Mozilla/5.0 test".to_string(),
            accept_language: "pt-BR,pt;q=0.9".to_string(),
            timeout: Duration::from_secs(5),
            max_attempts: 2,
            retry_delay: Duration::from_millis(10),
        }
    }

    /// Serves `/flaky` (500 on first hit, then 200), `/broken` (always 500)
    /// and `/headers` (echoes identity headers).
    fn spawn_server(hits: Arc<AtomicUsize>) -> SocketAddr {
        let flaky_hits = hits.clone();
        let flaky = warp::path("flaky").map(move || {
            let n = flaky_hits.fetch_add(1, Ordering::SeqCst);
            if n == 0 {
                warp::reply::with_status("down".to_string(), warp::http::StatusCode::INTERNAL_SERVER_ERROR)
            } else {
                warp::reply::with_status("<html>ok</html>".to_string(), warp::http::StatusCode::OK)
            }
        });
        let broken_hits = hits;
        let broken = warp::path("broken").map(move || {
            broken_hits.fetch_add(1, Ordering::SeqCst);
            warp::reply::with_status("nope", warp::http::StatusCode::SERVICE_UNAVAILABLE)
        });
        let headers = warp::path("headers")
            .and(warp::header::<String>("user-agent"))
            .and(warp::header::<String>("accept-language"))
            .map(|ua: String, lang: String| format!("{}|{}", ua, lang));

        let (addr, server) =
            warp::serve(flaky.or(broken).or(headers)).bind_ephemeral(([127, 0, 0, 1], 0));
        tokio::spawn(server);
        addr
    }

    #[tokio::test]
    async fn test_fetch_retries_once_then_succeeds() {
        let hits = Arc::new(AtomicUsize::new(0));
        let addr = spawn_server(hits.clone());
        let fetcher = HttpFetcher::new(settings()).unwrap();

        let url = Url::parse(&format!("http://{}/flaky", addr)).unwrap();
        let body = fetcher.fetch(&url).await;

        assert_eq!(body.as_deref(), Some("<html>ok</html>"));
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_fetch_gives_up_after_two_attempts() {
        let hits = Arc::new(AtomicUsize::new(0));
        let addr = spawn_server(hits.clone());
        let fetcher = HttpFetcher::new(settings()).unwrap();

        let url = Url::parse(&format!("http://{}/broken", addr)).unwrap();
        assert!(fetcher.fetch(&url).await.is_none());
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_fetch_sends_identity_headers() {
        let addr = spawn_server(Arc::new(AtomicUsize::new(0)));
        let fetcher = HttpFetcher::new(settings()).unwrap();

        let url = Url::parse(&format!("http://{}/headers", addr)).unwrap();
        let body = fetcher.fetch(&url).await.unwrap();
        assert_eq!(body, "Mozilla/5.0 test|pt-BR,pt;q=0.9");
    }

    #[tokio::test]
    async fn test_unreachable_host_is_absent() {
        let fetcher = HttpFetcher::new(FetchSettings {
            timeout: Duration::from_millis(500),
            ..settings()
        })
        .unwrap();
        let url = Url::parse("http://127.0.0.1:9/nothing").unwrap();
        assert!(fetcher.fetch(&url).await.is_none());
    }
}

use crate::scraper::{Result, ScraperError, provider::HttpFetcher, url::UrlEntry};
use async_trait::async_trait;
use parking_lot::Mutex;
use reqwest::{Client, header};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// reqwest-backed fetcher for scraper URL entries
pub struct HttpClient {
    client: Client,
    cancel: Mutex<CancellationToken>,
}

impl HttpClient {
    /// Create a new HTTP client
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .gzip(true)
            .build()?;

        Ok(Self {
            client,
            cancel: Mutex::new(CancellationToken::new()),
        })
    }

    /// Get the underlying reqwest client
    #[must_use]
    pub const fn inner(&self) -> &Client {
        &self.client
    }

    fn build_request(&self, entry: &UrlEntry) -> reqwest::RequestBuilder {
        let mut request = if entry.post {
            let (target, body) = split_post(&entry.url);
            self.client
                .post(target)
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(body.to_string())
        } else {
            self.client.get(&entry.url)
        };

        // gzip is negotiated by the client for every request, so entry.gzip needs no header
        if let Some(ref spoof) = entry.spoof {
            request = request.header(header::REFERER, spoof.as_str());
        }
        request
    }

    async fn send(&self, entry: &UrlEntry) -> Result<String> {
        let response = self.build_request(entry).send().await?;
        let status = response.status();

        if !status.is_success() {
            debug!("GET {} returned {}", entry.url, status);
            return Err(ScraperError::Aborted);
        }

        // text() decodes using the charset the server reports
        Ok(response.text().await?)
    }
}

#[async_trait]
impl HttpFetcher for HttpClient {
    async fn fetch(&self, entry: &UrlEntry) -> Result<String> {
        let token = self.cancel.lock().clone();
        if token.is_cancelled() {
            return Err(ScraperError::Cancelled);
        }

        tokio::select! {
            () = token.cancelled() => {
                debug!("Request to {} cancelled", entry.url);
                Err(ScraperError::Cancelled)
            }
            result = self.send(entry) => result,
        }
    }

    fn cancel(&self) {
        self.cancel.lock().cancel();
    }

    fn reset(&self) {
        *self.cancel.lock() = CancellationToken::new();
    }
}

/// Split `http://host/path?query` into the target and the POST body
fn split_post(url: &str) -> (&str, &str) {
    match url.split_once('?') {
        Some((target, body)) => (target, body),
        None => (url, ""),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_post() {
        assert_eq!(
            split_post("http://x/api?title=alien&y=1979"),
            ("http://x/api", "title=alien&y=1979")
        );
        assert_eq!(split_post("http://x/api"), ("http://x/api", ""));
    }

    #[tokio::test]
    async fn test_cancelled_client_refuses_fetch() {
        let client = HttpClient::new("scrapechain-test", Duration::from_secs(1)).unwrap();
        client.cancel();

        let result = client.fetch(&UrlEntry::new("http://127.0.0.1:9/")).await;
        assert!(matches!(result, Err(ScraperError::Cancelled)));

        client.reset();
        assert!(!client.cancel.lock().is_cancelled());
    }
}

//! HTTP plumbing shared by directory providers

use reqwest::{Client, RequestBuilder, Response, StatusCode};
use std::future::Future;
use std::time::Duration;
use tracing::debug;

use dirsync_core::{DirsyncError, Result};

/// Backoff schedule: `base_delay * 2^(attempt - 1)` before each retry
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    fn delay_before(&self, attempt: u32) -> Duration {
        self.base_delay * 2u32.saturating_pow(attempt.saturating_sub(1))
    }
}

/// Throttling and server-side failures are worth another attempt
fn is_retryable(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

/// reqwest client that retries transient directory failures
#[derive(Clone)]
pub struct RetryingClient {
    client: Client,
    policy: RetryPolicy,
}

impl RetryingClient {
    pub fn new(timeout: Duration, policy: RetryPolicy) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                DirsyncError::internal_error(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self { client, policy })
    }

    pub fn get(&self, url: impl reqwest::IntoUrl) -> RequestBuilder {
        self.client.get(url)
    }

    /// Send `request`, retrying transport errors, 5xx and 429
    ///
    /// Any other non-success status fails at once as a directory error.
    pub async fn send(&self, request: RequestBuilder) -> Result<Response> {
        let mut last_failure = String::new();

        for attempt in 0..=self.policy.max_retries {
            if attempt > 0 {
                let delay = self.policy.delay_before(attempt);
                debug!(attempt, ?delay, "Retrying directory request: {}", last_failure);
                tokio::time::sleep(delay).await;
            }

            let attempt_request = request
                .try_clone()
                .ok_or_else(|| DirsyncError::internal_error("Request body cannot be replayed"))?;

            match attempt_request.send().await {
                Ok(response) if response.status().is_success() => return Ok(response),
                Ok(response) if is_retryable(response.status()) => {
                    last_failure = format!("HTTP {}", response.status());
                }
                Ok(response) => {
                    let status = response.status();
                    let body = response.text().await.unwrap_or_default();
                    return Err(DirsyncError::directory(format!("HTTP {} - {}", status, body)));
                }
                Err(e) => last_failure = e.to_string(),
            }
        }

        Err(DirsyncError::directory(format!(
            "Giving up after {} retries: {}",
            self.policy.max_retries, last_failure
        )))
    }
}

/// One page of a numbered listing
#[derive(Debug)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next_page: Option<u32>,
}

/// Walk a numbered listing from page 1 until no next page is advertised
pub async fn collect_pages<T, F, Fut>(fetch_page: F) -> Result<Vec<T>>
where
    F: Fn(u32) -> Fut,
    Fut: Future<Output = Result<Page<T>>>,
{
    let mut items = Vec::new();
    let mut next = Some(1);

    while let Some(page) = next {
        let fetched = fetch_page(page).await?;
        items.extend(fetched.items);
        // Guard against a server echoing the current page back
        next = fetched.next_page.filter(|n| *n > page);
    }

    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_doubles() {
        let policy = RetryPolicy {
            max_retries: 3,
            base_delay: Duration::from_millis(100),
        };
        assert_eq!(policy.delay_before(1), Duration::from_millis(100));
        assert_eq!(policy.delay_before(2), Duration::from_millis(200));
        assert_eq!(policy.delay_before(3), Duration::from_millis(400));
    }

    #[test]
    fn test_retryable_statuses() {
        assert!(is_retryable(StatusCode::TOO_MANY_REQUESTS));
        assert!(is_retryable(StatusCode::BAD_GATEWAY));
        assert!(!is_retryable(StatusCode::NOT_FOUND));
        assert!(!is_retryable(StatusCode::UNAUTHORIZED));
    }

    #[tokio::test]
    async fn test_collect_pages_follows_next_page() {
        let items = collect_pages(|page| async move {
            Ok(Page {
                items: vec![page],
                next_page: (page < 3).then_some(page + 1),
            })
        })
        .await
        .unwrap();

        assert_eq!(items, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_collect_pages_stops_on_repeated_page() {
        let items = collect_pages(|page| async move {
            Ok(Page {
                items: vec![page],
                next_page: Some(page),
            })
        })
        .await
        .unwrap();

        assert_eq!(items, vec![1]);
    }
}

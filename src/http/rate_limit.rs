use async_trait::async_trait;
use http::{Request, Response, StatusCode};
use rand::Rng;
use std::time::Duration;
use tracing::warn;

use crate::http_client::{HttpClient, HttpClientError, copy_request};

pub const DEFAULT_INITIAL_INTERVAL: Duration = Duration::from_millis(100);
pub const DEFAULT_MAX_INTERVAL: Duration = Duration::from_millis(1000);
pub const DEFAULT_JITTER: f64 = 0.2;

/// Exponential backoff with jitter. The jitter is applied after capping the delay, so a single
/// delay may exceed `max` by up to `max * jitter`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Backoff {
    initial: Duration,
    max: Duration,
    jitter: f64,
}

impl Default for Backoff {
    fn default() -> Self {
        Self::new(DEFAULT_INITIAL_INTERVAL, DEFAULT_MAX_INTERVAL, DEFAULT_JITTER)
    }
}

impl Backoff {
    /// `jitter` is a ratio of the computed delay and is clamped to `[0, 1]`.
    pub fn new(initial: Duration, max: Duration, jitter: f64) -> Self {
        Self {
            initial,
            max,
            jitter: if jitter.is_finite() {
                jitter.clamp(0.0, 1.0)
            } else {
                0.0
            },
        }
    }

    /// Delay before the retry number `attempt`, starting at 0.
    pub fn delay(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt);
        let delay = self.initial.saturating_mul(factor).min(self.max);
        if self.jitter == 0.0 {
            return delay;
        }
        let ratio = rand::thread_rng().gen_range((1.0 - self.jitter)..=(1.0 + self.jitter));
        Duration::try_from_secs_f64(delay.as_secs_f64() * ratio).unwrap_or(Duration::MAX)
    }
}

/// Decorates an [`HttpClient`] retrying requests answered with `429 Too Many Requests`.
///
/// Any other status, and transport errors, are returned as they are. Once the retries are
/// exhausted the last response is returned unchanged.
#[derive(Debug, Clone)]
pub struct RateLimitRetry<C> {
    inner: C,
    max_retries: u32,
    backoff: Backoff,
}

impl<C> RateLimitRetry<C> {
    pub fn new(inner: C, max_retries: u32) -> Self {
        Self {
            inner,
            max_retries,
            backoff: Backoff::default(),
        }
    }

    pub fn with_backoff(self, backoff: Backoff) -> Self {
        Self { backoff, ..self }
    }

    /// Returns the delay to wait before retrying, or `None` if the response must be returned.
    fn next_delay(&self, response: &Response<Vec<u8>>, attempt: u32) -> Option<Duration> {
        if response.status() != StatusCode::TOO_MANY_REQUESTS || attempt >= self.max_retries {
            return None;
        }
        let delay = self.backoff.delay(attempt);
        warn!(
            attempt = attempt + 1,
            max_retries = self.max_retries,
            delay_ms = delay.as_millis() as u64,
            "request rate limited, retrying"
        );
        Some(delay)
    }
}

#[async_trait]
impl<C> HttpClient for RateLimitRetry<C>
where
    C: HttpClient,
{
    fn send(&self, req: Request<Vec<u8>>) -> Result<Response<Vec<u8>>, HttpClientError> {
        let mut attempt = 0;
        loop {
            let response = self.inner.send(copy_request(&req))?;
            match self.next_delay(&response, attempt) {
                Some(delay) => std::thread::sleep(delay),
                None => return Ok(response),
            }
            attempt += 1;
        }
    }

    async fn send_async(
        &self,
        req: Request<Vec<u8>>,
    ) -> Result<Response<Vec<u8>>, HttpClientError> {
        let mut attempt = 0;
        loop {
            let response = self.inner.send_async(copy_request(&req)).await?;
            match self.next_delay(&response, attempt) {
                Some(delay) => tokio::time::sleep(delay).await,
                None => return Ok(response),
            }
            attempt += 1;
        }
    }
}

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use url::Url;

/// Outbound HTTP behaviour shared by every remote lookup of a run.
///
/// Retries apply to idempotent GETs only: a response with one of
/// `retry_statuses`, a timeout or a connection failure is retried up to
/// `max_retries` times, sleeping `backoff_factor * 2^(n-1)` before retry `n`.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportConfig {
    pub timeout: Duration,
    pub max_retries: u32,
    pub backoff_factor: Duration,
    pub retry_statuses: Vec<u16>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            max_retries: 5,
            backoff_factor: Duration::from_secs(1),
            retry_statuses: vec![429, 500, 502, 503, 504],
        }
    }
}

impl TransportConfig {
    pub fn backoff(&self, retry: u32) -> Duration {
        self.backoff_factor
            .saturating_mul(2u32.saturating_pow(retry.saturating_sub(1)))
    }

    pub fn is_retryable_status(&self, status: u16) -> bool {
        self.retry_statuses.contains(&status)
    }
}

#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// GET `url` and parse the body as JSON. Non-success statuses are errors.
    async fn get_json(&self, url: Url) -> Result<Value>;
}

pub struct RetryingClient {
    client: reqwest::Client,
    config: TransportConfig,
}

impl RetryingClient {
    pub fn new(config: TransportConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .context("build http client")?;
        Ok(Self { client, config })
    }

    async fn attempt(&self, url: &Url) -> Attempt {
        let response = match self.client.get(url.clone()).send().await {
            Ok(response) => response,
            Err(err) if err.is_timeout() || err.is_connect() => {
                return Attempt::Retry(anyhow!(err).context(format!("GET {url}")))
            }
            Err(err) => return Attempt::Fail(anyhow!(err).context(format!("GET {url}"))),
        };
        let status = response.status();
        if status.is_success() {
            let parsed = match response.text().await {
                Ok(body) => serde_json::from_str::<Value>(&body)
                    .with_context(|| format!("invalid JSON from {url}")),
                Err(err) => Err(anyhow!(err).context(format!("reading body of {url}"))),
            };
            return match parsed {
                Ok(value) => Attempt::Done(value),
                Err(err) => Attempt::Fail(err),
            };
        }
        let err = anyhow!("GET {url} returned {status}");
        if self.config.is_retryable_status(status.as_u16()) {
            Attempt::Retry(err)
        } else {
            Attempt::Fail(err)
        }
    }
}

enum Attempt {
    Done(Value),
    Retry(anyhow::Error),
    Fail(anyhow::Error),
}

#[async_trait]
impl HttpTransport for RetryingClient {
    async fn get_json(&self, url: Url) -> Result<Value> {
        let mut retries = 0;
        loop {
            match self.attempt(&url).await {
                Attempt::Done(value) => return Ok(value),
                Attempt::Fail(err) => return Err(err),
                Attempt::Retry(err) => {
                    retries += 1;
                    if retries > self.config.max_retries {
                        return Err(err);
                    }
                    let wait = self.config.backoff(retries);
                    tracing::debug!(
                        "failed http request attempt {} with error {:#} - trying again in {:?}",
                        retries,
                        err,
                        wait
                    );
                    tokio::time::sleep(wait).await;
                }
            }
        }
    }
}

use std::thread;
use std::time::{Duration, Instant};

use log::{debug, info, trace, warn};
use ureq::Agent;

use crate::data::overpass::OverpassResponse;
use crate::errors::QueryError;

use super::query::QueryRequest;

/// Sends one query to an Overpass API interpreter and returns the raw body.
///
/// Implementations classify failures: HTTP 429 becomes [`QueryError::RateLimited`],
/// everything else that prevents a 2xx body becomes [`QueryError::Transport`].
pub trait Transport {
    fn post_query(&mut self, url: &str, query: &str) -> Result<String, QueryError>;
}

pub struct UreqTransport {
    agent: Agent,
}

impl UreqTransport {
    pub fn new() -> Self {
        let config = Agent::config_builder()
            .http_status_as_error(false)
            .build();
        UreqTransport {
            agent: config.into(),
        }
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        UreqTransport::new()
    }
}

impl Transport for UreqTransport {
    fn post_query(&mut self, url: &str, query: &str) -> Result<String, QueryError> {
        let mut response = self.agent.post(url).send_form([("data", query)])?;
        let status = response.status().as_u16();
        if status == 429 {
            return Err(QueryError::RateLimited);
        }

        // Result documents easily exceed ureq's default body limit.
        let body = response.body_mut()
            .with_config()
            .limit(u64::MAX)
            .read_to_string()?;

        if (200..300).contains(&status) {
            Ok(body)
        } else {
            Err(QueryError::Transport {
                message: format!("HTTP status {}", status),
                status: Some(status),
                body: Some(body),
            })
        }
    }
}

/// Delay before the next attempt, keyed by the failure of the previous one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Backoff {
    pub short: Duration,
    pub rate_limited: Duration,
}

impl Default for Backoff {
    fn default() -> Self {
        Backoff {
            short: Duration::from_millis(100),
            rate_limited: Duration::from_secs(20),
        }
    }
}

impl Backoff {
    pub fn delay_after(&self, err: &QueryError) -> Duration {
        match err {
            QueryError::RateLimited => self.rate_limited,
            _ => self.short,
        }
    }
}

pub struct QueryExecutor<T: Transport> {
    transport: T,
    url: String,
    max_retries: u32,
    backoff: Backoff,
}

impl<T: Transport> QueryExecutor<T> {
    /// `endpoint` is the API base such as `https://overpass-api.de/api/`.
    pub fn new(transport: T, endpoint: &str, max_retries: u32, backoff: Backoff) -> Self {
        QueryExecutor {
            transport,
            url: format!("{}/interpreter", endpoint.trim_end_matches('/')),
            max_retries,
            backoff,
        }
    }

    fn attempt(&mut self, request: &QueryRequest) -> Result<OverpassResponse, QueryError> {
        let body = self.transport.post_query(&self.url, &request.query_text)?;
        let response: OverpassResponse = serde_json::from_str(&body)?;
        match response.remark {
            Some(remark) => Err(QueryError::Remark(remark)),
            None => Ok(response),
        }
    }

    /// Runs up to `max_retries + 1` attempts and returns the first complete response.
    pub fn execute(&mut self, request: &QueryRequest) -> Result<OverpassResponse, QueryError> {
        let attempts = self.max_retries.saturating_add(1);
        let mut attempt = 1;
        loop {
            if attempt > 1 {
                debug!(attempt = attempt; "Retry {} of {}", attempt - 1, self.max_retries);
            }

            let start = Instant::now();
            let result = self.attempt(request);
            let elapsed = start.elapsed().as_secs_f64();

            let err = match result {
                Ok(response) => {
                    info!(seconds = elapsed; "Overpass API query took {:.1} seconds", elapsed);
                    return Ok(response);
                },
                Err(err) => err,
            };

            match &err {
                QueryError::Transport { status, body, .. } => {
                    warn!(err = err.to_string(); "Overpass API request failed");
                    if let Some(body) = body {
                        trace!(status = status.unwrap_or_default(); "Error response body:\n{}", body);
                    }
                },
                QueryError::RateLimited => {
                    warn!("Too many requests, delaying next request");
                },
                QueryError::Remark(remark) => {
                    warn!(remark = remark.as_str(); "Remark from Overpass API");
                },
                _ => {
                    warn!(err = err.to_string(); "Overpass API request failed");
                },
            }
            warn!(attempt = attempt, attempts = attempts, seconds = elapsed;
                "Querying Overpass API failed in try {}/{} after {:.1} seconds", attempt, attempts, elapsed);

            if attempt >= attempts {
                return Err(QueryError::ExhaustedRetries {
                    attempts,
                    last: Box::new(err),
                });
            }

            thread::sleep(self.backoff.delay_after(&err));
            attempt += 1;
        }
    }

    #[cfg(test)]
    pub fn transport(&self) -> &T {
        &self.transport
    }
}

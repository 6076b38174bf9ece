// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Retry logic with exponential backoff for Kubernetes and Uptime Kuma API calls.
//!
//! Transient failures (HTTP 429, 5xx, transport errors) are retried with
//! jittered exponential backoff; permanent failures are returned immediately.

use rand::Rng;
use reqwest::StatusCode;
use std::fmt::Display;
use std::future::Future;
use std::time::{Duration, Instant};
use tracing::{debug, error, warn};

/// Maximum total time to spend retrying Kubernetes calls (5 minutes)
const KUBE_MAX_ELAPSED_TIME_SECS: u64 = 300;

/// Initial Kubernetes retry interval (100ms)
const KUBE_INITIAL_INTERVAL_MILLIS: u64 = 100;

/// Maximum interval between Kubernetes retries (30 seconds)
const KUBE_MAX_INTERVAL_SECS: u64 = 30;

/// HTTP retry initial interval (50ms)
const HTTP_INITIAL_INTERVAL_MILLIS: u64 = 50;

/// HTTP retry maximum interval (10 seconds)
const HTTP_MAX_INTERVAL_SECS: u64 = 10;

/// HTTP retry maximum elapsed time (2 minutes)
const HTTP_MAX_ELAPSED_TIME_SECS: u64 = 120;

/// Backoff multiplier (exponential growth factor)
const BACKOFF_MULTIPLIER: f64 = 2.0;

/// Randomization factor to prevent thundering herd (±10%)
const RANDOMIZATION_FACTOR: f64 = 0.1;

/// Simple exponential backoff with jitter.
#[derive(Debug, Clone)]
pub struct ExponentialBackoff {
    /// Interval returned by the next call to [`Self::next_backoff`], before jitter
    pub current_interval: Duration,
    /// Interval the backoff started from
    pub initial_interval: Duration,
    /// Cap on a single interval
    pub max_interval: Duration,
    /// Cap on the total time spent backing off, `None` for unbounded
    pub max_elapsed_time: Option<Duration>,
    /// Growth factor applied after every interval
    pub multiplier: f64,
    /// Jitter as a fraction of the interval (0.1 = ±10%)
    pub randomization_factor: f64,
    start_time: Instant,
}

impl ExponentialBackoff {
    /// Create a new exponential backoff with specified parameters.
    #[must_use]
    pub fn new(
        initial_interval: Duration,
        max_interval: Duration,
        max_elapsed_time: Option<Duration>,
        multiplier: f64,
        randomization_factor: f64,
    ) -> Self {
        Self {
            current_interval: initial_interval,
            initial_interval,
            max_interval,
            max_elapsed_time,
            multiplier,
            randomization_factor,
            start_time: Instant::now(),
        }
    }

    /// Get the next backoff interval, or `None` once the elapsed budget is spent.
    pub fn next_backoff(&mut self) -> Option<Duration> {
        if let Some(max_elapsed) = self.max_elapsed_time {
            if self.start_time.elapsed() >= max_elapsed {
                return None;
            }
        }

        let interval = self.current_interval;
        let jittered = self.apply_jitter(interval);

        let next = interval.as_secs_f64() * self.multiplier;
        self.current_interval = Duration::from_secs_f64(next).min(self.max_interval);

        Some(jittered)
    }

    fn apply_jitter(&self, interval: Duration) -> Duration {
        if self.randomization_factor == 0.0 {
            return interval;
        }

        let secs = interval.as_secs_f64();
        let delta = secs * self.randomization_factor;
        let jittered = rand::thread_rng().gen_range((secs - delta)..=(secs + delta));

        Duration::from_secs_f64(jittered.max(0.0))
    }
}

/// Backoff profile for Kubernetes API calls.
///
/// 100ms initial, doubling up to 30s per attempt, 5 minutes in total.
#[must_use]
pub fn kube_backoff() -> ExponentialBackoff {
    ExponentialBackoff::new(
        Duration::from_millis(KUBE_INITIAL_INTERVAL_MILLIS),
        Duration::from_secs(KUBE_MAX_INTERVAL_SECS),
        Some(Duration::from_secs(KUBE_MAX_ELAPSED_TIME_SECS)),
        BACKOFF_MULTIPLIER,
        RANDOMIZATION_FACTOR,
    )
}

/// Backoff profile for Uptime Kuma HTTP API calls.
///
/// 50ms initial, doubling up to 10s per attempt, 2 minutes in total.
#[must_use]
pub fn http_backoff() -> ExponentialBackoff {
    ExponentialBackoff::new(
        Duration::from_millis(HTTP_INITIAL_INTERVAL_MILLIS),
        Duration::from_secs(HTTP_MAX_INTERVAL_SECS),
        Some(Duration::from_secs(HTTP_MAX_ELAPSED_TIME_SECS)),
        BACKOFF_MULTIPLIER,
        RANDOMIZATION_FACTOR,
    )
}

/// Determine if an HTTP status code is retryable (429, 500, 502, 503, 504).
#[must_use]
pub fn is_retryable_http_status(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::TOO_MANY_REQUESTS
            | StatusCode::INTERNAL_SERVER_ERROR
            | StatusCode::BAD_GATEWAY
            | StatusCode::SERVICE_UNAVAILABLE
            | StatusCode::GATEWAY_TIMEOUT
    )
}

/// Determine if a Kubernetes error is retryable.
///
/// Rate limiting (429), server errors (5xx) and transport errors are transient.
#[must_use]
pub fn is_retryable_kube_error(err: &kube::Error) -> bool {
    match err {
        kube::Error::Api(api_err) => api_err.code == 429 || (500..600).contains(&api_err.code),
        kube::Error::Service(_) => true,
        _ => false,
    }
}

/// Outcome of [`retry_with_backoff`] when the operation never succeeded.
#[derive(Debug)]
pub enum RetryError<E> {
    /// The operation failed with an error classified as permanent.
    Permanent(E),
    /// The backoff budget ran out while the error was still transient.
    Exhausted {
        /// Number of attempts made
        attempts: u32,
        /// Last error observed
        last_error: E,
    },
}

impl<E> RetryError<E> {
    /// Extract the last observed error.
    pub fn into_inner(self) -> E {
        match self {
            Self::Permanent(e) | Self::Exhausted { last_error: e, .. } => e,
        }
    }
}

/// Run `operation` until it succeeds, fails permanently, or the backoff is exhausted.
///
/// # Errors
///
/// Returns [`RetryError::Permanent`] for errors `is_retryable` rejects and
/// [`RetryError::Exhausted`] when the backoff gives up.
pub async fn retry_with_backoff<T, E, F, Fut>(
    mut backoff: ExponentialBackoff,
    operation_name: &str,
    is_retryable: impl Fn(&E) -> bool,
    mut operation: F,
) -> Result<T, RetryError<E>>
where
    E: Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let start_time = Instant::now();
    let mut attempt: u32 = 0;

    loop {
        attempt += 1;

        match operation().await {
            Ok(value) => {
                if attempt > 1 {
                    debug!(
                        operation = operation_name,
                        attempt = attempt,
                        elapsed = ?start_time.elapsed(),
                        "API call succeeded after retries"
                    );
                }
                return Ok(value);
            }
            Err(e) if !is_retryable(&e) => {
                debug!(
                    operation = operation_name,
                    error = %e,
                    "Non-retryable API error, failing immediately"
                );
                return Err(RetryError::Permanent(e));
            }
            Err(e) => {
                if let Some(duration) = backoff.next_backoff() {
                    warn!(
                        operation = operation_name,
                        attempt = attempt,
                        retry_after = ?duration,
                        error = %e,
                        "Retryable API error, will retry"
                    );
                    tokio::time::sleep(duration).await;
                } else {
                    error!(
                        operation = operation_name,
                        attempt = attempt,
                        elapsed = ?start_time.elapsed(),
                        error = %e,
                        "Backoff exhausted, giving up"
                    );
                    return Err(RetryError::Exhausted {
                        attempts: attempt,
                        last_error: e,
                    });
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "retry_tests.rs"]
mod retry_tests;

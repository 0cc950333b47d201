// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Retry classification and backoff for cloud API calls.
//!
//! The request loop in [`ApiClient`](super::ApiClient) is built from two
//! pure pieces that live here:
//!
//! - [`classify`] maps an HTTP status to a [`StatusClass`].
//! - [`RetryPolicy`] turns a retryable [`Failure`] and the attempt number
//!   into a [`RetryDecision`].
//!
//! Randomness is injected, so decisions are reproducible with a seeded RNG.

use std::time::Duration;

use rand::Rng;
use reqwest::StatusCode;

/// Total attempts made for one request (first try included).
pub const MAX_ATTEMPTS: u32 = 3;

/// Outcome class of an HTTP status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
    /// 2xx: the body is the result.
    Success,
    /// 401/403: the credential was refused. Never retried in place.
    Unauthorized,
    /// 429: retried, honoring the server's `Retry-After` hint.
    RateLimited,
    /// 5xx: retried with exponential backoff.
    ServerError,
    /// Anything else: failed immediately.
    Fatal,
}

/// Classifies an HTTP status.
///
/// # Examples
///
/// ```
/// use reqwest::StatusCode;
/// use smartcocoon_lib::protocol::retry::{classify, StatusClass};
///
/// assert_eq!(classify(StatusCode::OK), StatusClass::Success);
/// assert_eq!(classify(StatusCode::FORBIDDEN), StatusClass::Unauthorized);
/// assert_eq!(classify(StatusCode::SERVICE_UNAVAILABLE), StatusClass::ServerError);
/// assert_eq!(classify(StatusCode::NOT_FOUND), StatusClass::Fatal);
/// ```
#[must_use]
pub fn classify(status: StatusCode) -> StatusClass {
    match status {
        s if s.is_success() => StatusClass::Success,
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => StatusClass::Unauthorized,
        StatusCode::TOO_MANY_REQUESTS => StatusClass::RateLimited,
        s if s.is_server_error() => StatusClass::ServerError,
        _ => StatusClass::Fatal,
    }
}

/// A retryable failure of one attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Failure {
    /// HTTP 429, with the raw `Retry-After` header if the server sent one.
    RateLimited {
        /// Raw `Retry-After` value.
        retry_after: Option<String>,
    },
    /// HTTP 5xx.
    ServerError,
    /// Connection failure or per-attempt timeout.
    Transport,
}

/// Whether to try again, and after how long.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryDecision {
    /// `false` once attempts are exhausted.
    pub should_retry: bool,
    /// Time to wait before the next attempt.
    pub wait: Duration,
}

impl RetryDecision {
    /// Decision to stop retrying.
    pub const GIVE_UP: Self = Self {
        should_retry: false,
        wait: Duration::ZERO,
    };

    /// Decision to retry after `wait`.
    #[must_use]
    pub const fn after(wait: Duration) -> Self {
        Self {
            should_retry: true,
            wait,
        }
    }
}

/// Bounded retry policy with exponential backoff.
///
/// Backoff for attempt `n` is `2^(n-1)` units; the unit defaults to one
/// second.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use rand::SeedableRng;
/// use rand::rngs::StdRng;
/// use smartcocoon_lib::protocol::RetryPolicy;
///
/// let policy = RetryPolicy::new();
/// let mut rng = StdRng::seed_from_u64(7);
///
/// // A numeric server hint wins
/// assert_eq!(policy.compute_delay(2, Some("5"), &mut rng), Duration::from_secs(5));
///
/// // Otherwise 2^(n-1) seconds plus up to 50% jitter
/// let delay = policy.compute_delay(3, None, &mut rng);
/// assert!(delay >= Duration::from_secs(4) && delay <= Duration::from_secs(6));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    unit: Duration,
}

impl RetryPolicy {
    /// Default backoff unit.
    pub const DEFAULT_UNIT: Duration = Duration::from_secs(1);

    /// Creates the default policy: 3 attempts, 1 second unit.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            max_attempts: MAX_ATTEMPTS,
            unit: Self::DEFAULT_UNIT,
        }
    }

    /// Sets the backoff unit.
    #[must_use]
    pub const fn with_unit(mut self, unit: Duration) -> Self {
        self.unit = unit;
        self
    }

    /// Returns the total number of attempts.
    #[must_use]
    pub const fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Returns the backoff unit.
    #[must_use]
    pub const fn unit(&self) -> Duration {
        self.unit
    }

    /// Exponential backoff without jitter: `2^(attempt-1)` units.
    #[must_use]
    pub fn backoff(&self, attempt: u32) -> Duration {
        scale(self.unit, exponent_base(attempt))
    }

    /// Delay before retrying a rate-limited attempt.
    ///
    /// A hint made only of ASCII digits is taken as whole seconds and
    /// returned unchanged. Any other hint, or none, gives
    /// `base + uniform(0, base / 2)` with `base = 2^(attempt-1)` units.
    pub fn compute_delay<R: Rng>(
        &self,
        attempt: u32,
        server_hint: Option<&str>,
        rng: &mut R,
    ) -> Duration {
        if let Some(seconds) = server_hint.and_then(parse_retry_after) {
            return Duration::from_secs(seconds);
        }
        let base = exponent_base(attempt);
        if !base.is_finite() {
            return Duration::MAX;
        }
        let jitter = rng.gen_range(0.0..=0.5 * base);
        scale(self.unit, base + jitter)
    }

    /// Decides what to do after a retryable failure of `attempt`.
    pub fn decide<R: Rng>(
        &self,
        attempt: u32,
        failure: &Failure,
        rng: &mut R,
    ) -> RetryDecision {
        if attempt >= self.max_attempts {
            return RetryDecision::GIVE_UP;
        }
        let wait = match failure {
            Failure::RateLimited { retry_after } => {
                self.compute_delay(attempt, retry_after.as_deref(), rng)
            }
            Failure::ServerError | Failure::Transport => self.backoff(attempt),
        };
        RetryDecision::after(wait)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new()
    }
}

/// Parses a `Retry-After` value given in whole seconds.
fn parse_retry_after(hint: &str) -> Option<u64> {
    if hint.is_empty() || !hint.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    hint.parse().ok()
}

fn exponent_base(attempt: u32) -> f64 {
    let exponent = i32::try_from(attempt.saturating_sub(1)).unwrap_or(i32::MAX);
    2f64.powi(exponent)
}

fn scale(unit: Duration, factor: f64) -> Duration {
    Duration::try_from_secs_f64(unit.as_secs_f64() * factor).unwrap_or(Duration::MAX)
}

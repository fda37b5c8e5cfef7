//! Retry policy for transient QRadar API failures.

use std::time::Duration;

use reqwest::Method;

/// Status codes the console returns while overloaded or restarting.
pub const RETRY_STATUS_CODES: [u16; 5] = [429, 500, 502, 503, 504];

/// Methods that are safe to resend. POST creates searches and notes on the
/// console, so it is never repeated.
pub fn idempotent_methods() -> Vec<Method> {
    vec![
        Method::GET,
        Method::HEAD,
        Method::PUT,
        Method::DELETE,
        Method::OPTIONS,
    ]
}

/// How long to wait before retry number `n`.
#[derive(Debug, Clone, PartialEq)]
pub enum Backoff {
    /// Retry immediately.
    None,
    /// Same delay before every retry.
    Constant(Duration),
    /// `initial * multiplier^n`, capped at `max`.
    Exponential {
        initial: Duration,
        max: Duration,
        multiplier: f64,
    },
}

impl Backoff {
    /// Delay before the retry following `attempt` (0-indexed).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        match self {
            Self::None => Duration::ZERO,
            Self::Constant(d) => *d,
            Self::Exponential {
                initial,
                max,
                multiplier,
            } => {
                let factor = multiplier.powi(attempt as i32);
                let millis = (initial.as_millis() as f64 * factor) as u64;
                Duration::from_millis(millis).min(*max)
            }
        }
    }
}

/// Bounded retry on rate limiting, server errors and connection failures.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: u32,
    pub backoff: Backoff,
    pub retry_status_codes: Vec<u16>,
    pub retry_on_connection_error: bool,
    pub retry_methods: Vec<Method>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            backoff: Backoff::Exponential {
                initial: Duration::from_secs(1),
                max: Duration::from_secs(30),
                multiplier: 2.0,
            },
            retry_status_codes: RETRY_STATUS_CODES.to_vec(),
            retry_on_connection_error: true,
            retry_methods: idempotent_methods(),
        }
    }
}

impl RetryPolicy {
    /// Default status codes with the given retry count.
    pub fn with_max_retries(max_retries: u32) -> Self {
        Self {
            max_retries,
            ..Default::default()
        }
    }

    /// Retries without any delay (tests, local consoles).
    pub fn immediate(max_retries: u32) -> Self {
        Self {
            max_retries,
            backoff: Backoff::None,
            ..Default::default()
        }
    }

    /// Never retry.
    pub fn disabled() -> Self {
        Self {
            max_retries: 0,
            ..Default::default()
        }
    }

    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        self.backoff.delay_for_attempt(attempt)
    }

    pub fn allows_method(&self, method: &Method) -> bool {
        self.retry_methods.contains(method)
    }

    pub fn should_retry_status(&self, attempt: u32, status: u16) -> bool {
        attempt < self.max_retries && self.retry_status_codes.contains(&status)
    }

    pub fn should_retry_connection(&self, attempt: u32) -> bool {
        attempt < self.max_retries && self.retry_on_connection_error
    }
}

//! Progress reporting for long-running searches.
//!
//! Keeps the search engine independent of the MCP transport. MCP calls build
//! an `McpProgressReporter` from the request meta; the CLI and tests use
//! [`NoopProgressReporter`].

use std::sync::Arc;

use async_trait::async_trait;

/// Receives progress updates from a polling search.
///
/// `current` runs from 0.0 to `total`. Implementations must never fail the
/// caller.
#[async_trait]
pub trait ProgressReporter: Send + Sync {
    async fn report(&self, current: f64, total: f64, message: Option<String>);
}

/// Discards all progress.
pub struct NoopProgressReporter;

#[async_trait]
impl ProgressReporter for NoopProgressReporter {
    async fn report(&self, _current: f64, _total: f64, _message: Option<String>) {}
}

/// Shorthand for a shared no-op reporter.
pub fn noop_progress() -> Arc<dyn ProgressReporter> {
    Arc::new(NoopProgressReporter)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingReporter {
        count: AtomicUsize,
    }

    #[async_trait]
    impl ProgressReporter for CountingReporter {
        async fn report(&self, _current: f64, _total: f64, _message: Option<String>) {
            self.count.fetch_add(1, Ordering::Relaxed);
        }
    }

    #[tokio::test]
    async fn test_noop_reporter_does_nothing() {
        let reporter = noop_progress();
        reporter.report(0.5, 1.0, Some("polling".into())).await;
    }

    #[tokio::test]
    async fn test_counting_reporter() {
        let reporter = CountingReporter {
            count: AtomicUsize::new(0),
        };
        reporter.report(0.0, 1.0, None).await;
        reporter.report(1.0, 1.0, Some("done".into())).await;
        assert_eq!(reporter.count.load(Ordering::Relaxed), 2);
    }
}

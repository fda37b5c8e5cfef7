use std::sync::Arc;

use serde_json::Value;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use super::{Dataset, SearchHandle, SearchOptions, SearchResult, SearchStatus};
use crate::client::normalize_list;
use crate::progress::{noop_progress, ProgressReporter};
use crate::transport::{ApiRequest, Transport};
use crate::QRadarError;

/// Per-call hooks for a search: caller cancellation and progress sink.
#[derive(Clone)]
pub struct SearchContext {
    pub cancel: CancellationToken,
    pub progress: Arc<dyn ProgressReporter>,
}

impl SearchContext {
    pub fn new(cancel: CancellationToken, progress: Arc<dyn ProgressReporter>) -> Self {
        Self { cancel, progress }
    }
}

impl Default for SearchContext {
    fn default() -> Self {
        Self {
            cancel: CancellationToken::new(),
            progress: noop_progress(),
        }
    }
}

/// Runs Ariel searches to completion.
///
/// Each call owns its search handle; concurrent calls share nothing but the
/// transport.
#[derive(Clone)]
pub struct SearchEngine {
    transport: Arc<dyn Transport>,
}

/// `SELECT <fields> FROM events ORDER BY starttime DESC LIMIT <limit>`.
pub fn recent_events_query(limit: u32, fields: Option<&[String]>) -> String {
    let columns = match fields {
        Some(fields) if !fields.is_empty() => fields.join(", "),
        _ => "*".to_string(),
    };
    format!(
        "SELECT {} FROM events ORDER BY starttime DESC LIMIT {}",
        columns, limit
    )
}

impl SearchEngine {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Submit `query`, poll until a terminal status and fetch its records.
    ///
    /// The wait budget is checked before every status poll and is measured
    /// from submission. Results are never fetched for a search that did not
    /// complete.
    #[instrument(name = "search.execute", skip_all, fields(dataset = %dataset))]
    pub async fn execute_query(
        &self,
        query: &str,
        dataset: Dataset,
        options: &SearchOptions,
        ctx: &SearchContext,
    ) -> Result<SearchResult, QRadarError> {
        let mut handle = self.submit(query).await?;
        let started = Instant::now();
        info!(search_id = %handle.id, "Search submitted");

        let polls = self
            .wait_for_completion(&mut handle, options, ctx, started)
            .await?;

        let records = self.fetch_results(&handle, dataset, options).await?;
        info!(
            search_id = %handle.id,
            polls,
            records = records.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Search completed"
        );
        ctx.progress
            .report(1.0, 1.0, Some(format!("Fetched {} records", records.len())))
            .await;

        Ok(SearchResult::new(handle.id, dataset, records))
    }

    /// Latest events, newest first.
    pub async fn recent_events(
        &self,
        limit: u32,
        fields: Option<&[String]>,
        options: &SearchOptions,
        ctx: &SearchContext,
    ) -> Result<SearchResult, QRadarError> {
        let query = recent_events_query(limit, fields);
        self.execute_query(&query, Dataset::Events, options, ctx).await
    }

    async fn submit(&self, query: &str) -> Result<SearchHandle, QRadarError> {
        let body = self
            .transport
            .send(ApiRequest::post("/ariel/searches").param("query_expression", query))
            .await?;

        let search_id = match body.get("search_id") {
            Some(Value::String(id)) if !id.trim().is_empty() => id.clone(),
            Some(Value::Number(n)) => n.to_string(),
            _ => return Err(QRadarError::Submission),
        };

        let mut handle = SearchHandle::new(search_id, query);
        if let Some(status) = body.get("status").and_then(Value::as_str) {
            handle.advance(SearchStatus::parse(status));
        }
        Ok(handle)
    }

    /// Poll until the search reaches a terminal status. Returns the number of
    /// status polls made.
    async fn wait_for_completion(
        &self,
        handle: &mut SearchHandle,
        options: &SearchOptions,
        ctx: &SearchContext,
        started: Instant,
    ) -> Result<u32, QRadarError> {
        let mut polls = 0u32;

        loop {
            if started.elapsed() > options.max_wait {
                warn!(
                    search_id = %handle.id,
                    max_wait_secs = options.max_wait.as_secs(),
                    "Search exceeded its wait budget"
                );
                self.abandon(handle, options).await;
                return Err(QRadarError::QueryTimeout {
                    search_id: handle.id.clone(),
                    max_wait: options.max_wait,
                });
            }

            let request = ApiRequest::get("/ariel/searches")
                .segment(&handle.id)
                .timeout(options.per_poll_timeout);
            let body = tokio::select! {
                body = self.transport.send(request) => body?,
                _ = ctx.cancel.cancelled() => return Err(self.cancelled(handle, options).await),
            };
            polls += 1;

            let status =
                SearchStatus::parse(body.get("status").and_then(Value::as_str).unwrap_or(""));
            if handle.advance(status.clone()) {
                debug!(search_id = %handle.id, status = %status, "Search status changed");
            }

            let fraction = (started.elapsed().as_secs_f64()
                / options.max_wait.as_secs_f64().max(1.0))
            .min(0.99);
            ctx.progress
                .report(
                    fraction,
                    1.0,
                    Some(format!("Search {} is {}", handle.id, status)),
                )
                .await;

            match status {
                SearchStatus::Completed => return Ok(polls),
                SearchStatus::Error => {
                    return Err(QRadarError::QueryExecution {
                        search_id: handle.id.clone(),
                        messages: error_messages(&body),
                    })
                }
                SearchStatus::Canceled => {
                    return Err(QRadarError::QueryCanceled {
                        search_id: handle.id.clone(),
                        reason: "canceled on the QRadar console".to_string(),
                    })
                }
                _ => {}
            }

            tokio::select! {
                _ = tokio::time::sleep(options.poll_interval) => {}
                _ = ctx.cancel.cancelled() => return Err(self.cancelled(handle, options).await),
            }
        }
    }

    async fn fetch_results(
        &self,
        handle: &SearchHandle,
        dataset: Dataset,
        options: &SearchOptions,
    ) -> Result<Vec<Value>, QRadarError> {
        let body = self
            .transport
            .send(
                ApiRequest::get("/ariel/searches")
                    .segment(&handle.id)
                    .segment("results")
                    .timeout(options.per_poll_timeout),
            )
            .await?;
        Ok(normalize_list(
            body.get(dataset.results_key()).cloned().unwrap_or(Value::Null),
        ))
    }

    async fn cancelled(&self, handle: &SearchHandle, options: &SearchOptions) -> QRadarError {
        info!(search_id = %handle.id, "Search cancelled by caller");
        self.abandon(handle, options).await;
        QRadarError::QueryCanceled {
            search_id: handle.id.clone(),
            reason: "cancelled by caller".to_string(),
        }
    }

    /// Best-effort remote cancel of a search we stopped waiting for.
    async fn abandon(&self, handle: &SearchHandle, options: &SearchOptions) {
        if !options.cancel_remote {
            return;
        }
        let request = ApiRequest::delete("/ariel/searches")
            .segment(&handle.id)
            .timeout(options.per_poll_timeout);
        match self.transport.send(request).await {
            Ok(_) => debug!(search_id = %handle.id, "Remote search cancelled"),
            Err(e) => warn!(search_id = %handle.id, error = %e, "Failed to cancel remote search"),
        }
    }
}

/// `error_messages` entries are either plain strings or objects with a
/// `message` field.
fn error_messages(body: &Value) -> Vec<String> {
    body.get("error_messages")
        .and_then(Value::as_array)
        .map(|entries| {
            entries
                .iter()
                .map(|entry| match entry {
                    Value::String(s) => s.clone(),
                    Value::Object(obj) => obj
                        .get("message")
                        .and_then(Value::as_str)
                        .map(String::from)
                        .unwrap_or_else(|| entry.to_string()),
                    other => other.to_string(),
                })
                .collect()
        })
        .unwrap_or_default()
}

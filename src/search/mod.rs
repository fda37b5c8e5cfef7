//! Ariel search execution: submit, poll until terminal, fetch results.

mod engine;

pub use engine::{recent_events_query, SearchContext, SearchEngine};

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

/// Ariel database a search reads from; selects the results payload key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dataset {
    Events,
    Flows,
}

impl Dataset {
    /// Key holding the records in `/ariel/searches/{id}/results`.
    pub fn results_key(&self) -> &'static str {
        match self {
            Dataset::Events => "events",
            Dataset::Flows => "flows",
        }
    }
}

impl fmt::Display for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.results_key())
    }
}

/// Remote search status.
///
/// Statuses the console reports that are not listed here (`WAIT`,
/// `SORTING`, ...) are kept as `Unknown` and polled through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchStatus {
    Created,
    Running,
    Completed,
    Error,
    Canceled,
    Unknown(String),
}

impl SearchStatus {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_uppercase().as_str() {
            "CREATED" => SearchStatus::Created,
            "RUNNING" => SearchStatus::Running,
            "COMPLETED" => SearchStatus::Completed,
            "ERROR" => SearchStatus::Error,
            "CANCELED" | "CANCELLED" => SearchStatus::Canceled,
            _ => SearchStatus::Unknown(raw.to_string()),
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SearchStatus::Completed | SearchStatus::Error | SearchStatus::Canceled
        )
    }

    pub fn as_str(&self) -> &str {
        match self {
            SearchStatus::Created => "CREATED",
            SearchStatus::Running => "RUNNING",
            SearchStatus::Completed => "COMPLETED",
            SearchStatus::Error => "ERROR",
            SearchStatus::Canceled => "CANCELED",
            SearchStatus::Unknown(raw) => raw,
        }
    }

    fn rank(&self) -> u8 {
        match self {
            SearchStatus::Created => 0,
            SearchStatus::Running | SearchStatus::Unknown(_) => 1,
            SearchStatus::Completed | SearchStatus::Error | SearchStatus::Canceled => 2,
        }
    }
}

impl fmt::Display for SearchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for SearchStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// One in-flight search, owned by the call that submitted it.
#[derive(Debug, Clone)]
pub struct SearchHandle {
    pub id: String,
    status: SearchStatus,
    pub submitted_query: String,
    pub started_at: DateTime<Utc>,
}

impl SearchHandle {
    pub fn new(id: impl Into<String>, query: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            status: SearchStatus::Created,
            submitted_query: query.into(),
            started_at: Utc::now(),
        }
    }

    pub fn status(&self) -> &SearchStatus {
        &self.status
    }

    /// Move to `next` if that is a forward transition.
    ///
    /// Terminal statuses are final and non-terminal statuses never move
    /// backwards. Returns whether the status changed.
    pub fn advance(&mut self, next: SearchStatus) -> bool {
        if self.status.is_terminal() || next.rank() < self.status.rank() || next == self.status {
            return false;
        }
        self.status = next;
        true
    }
}

/// Timing knobs for one search.
#[derive(Debug, Clone)]
pub struct SearchOptions {
    /// Timeout for each individual status/results request.
    pub per_poll_timeout: Duration,
    /// Hard ceiling on time spent polling after submission.
    pub max_wait: Duration,
    pub poll_interval: Duration,
    /// Issue `DELETE /ariel/searches/{id}` when the wait is abandoned.
    pub cancel_remote: bool,
}

pub const DEFAULT_POLL_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_MAX_WAIT_SECS: u64 = 300;
pub const POLL_INTERVAL: Duration = Duration::from_secs(2);

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            per_poll_timeout: Duration::from_secs(DEFAULT_POLL_TIMEOUT_SECS),
            max_wait: Duration::from_secs(DEFAULT_MAX_WAIT_SECS),
            poll_interval: POLL_INTERVAL,
            cancel_remote: true,
        }
    }
}

impl SearchOptions {
    pub fn from_secs(per_poll_timeout: u64, max_wait: u64) -> Self {
        Self {
            per_poll_timeout: Duration::from_secs(per_poll_timeout),
            max_wait: Duration::from_secs(max_wait),
            ..Default::default()
        }
    }
}

/// Completed search with its records.
///
/// `record_count` always equals `records.len()`; the only constructor
/// computes it.
#[derive(Debug, Clone, Serialize)]
pub struct SearchResult {
    search_id: String,
    status: SearchStatus,
    dataset: Dataset,
    records: Vec<Value>,
    record_count: usize,
}

impl SearchResult {
    pub fn new(search_id: impl Into<String>, dataset: Dataset, records: Vec<Value>) -> Self {
        let record_count = records.len();
        Self {
            search_id: search_id.into(),
            status: SearchStatus::Completed,
            dataset,
            records,
            record_count,
        }
    }

    pub fn search_id(&self) -> &str {
        &self.search_id
    }

    pub fn status(&self) -> &SearchStatus {
        &self.status
    }

    pub fn dataset(&self) -> Dataset {
        self.dataset
    }

    pub fn records(&self) -> &[Value] {
        &self.records
    }

    pub fn record_count(&self) -> usize {
        self.record_count
    }

    pub fn into_records(self) -> Vec<Value> {
        self.records
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_parse_accepts_both_cancel_spellings() {
        assert_eq!(SearchStatus::parse("CANCELED"), SearchStatus::Canceled);
        assert_eq!(SearchStatus::parse("CANCELLED"), SearchStatus::Canceled);
        assert_eq!(
            SearchStatus::parse("SORTING"),
            SearchStatus::Unknown("SORTING".into())
        );
        assert!(!SearchStatus::parse("WAIT").is_terminal());
    }

    #[test]
    fn test_handle_is_monotonic() {
        let mut handle = SearchHandle::new("s1", "SELECT * FROM events");
        assert!(handle.advance(SearchStatus::Running));
        assert!(!handle.advance(SearchStatus::Created));
        assert_eq!(handle.status(), &SearchStatus::Running);
        assert!(handle.advance(SearchStatus::Completed));
        assert!(!handle.advance(SearchStatus::Error));
        assert!(!handle.advance(SearchStatus::Running));
        assert_eq!(handle.status(), &SearchStatus::Completed);
    }

    #[test]
    fn test_result_serializes_status_as_string() {
        let result = SearchResult::new("s1", Dataset::Flows, vec![serde_json::json!({"a": 1})]);
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["status"], "COMPLETED");
        assert_eq!(json["dataset"], "flows");
        assert_eq!(json["record_count"], 1);
    }

    proptest! {
        #[test]
        fn prop_record_count_matches_records(n in 0usize..200) {
            let records = (0..n).map(|i| serde_json::json!({"i": i})).collect();
            let result = SearchResult::new("s", Dataset::Events, records);
            prop_assert_eq!(result.record_count(), result.records().len());
            prop_assert_eq!(result.record_count(), n);
        }
    }
}

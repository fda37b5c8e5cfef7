use serde_json::Value;

use super::QRadarClient;
use crate::search::{Dataset, SearchContext, SearchOptions, SearchResult};
use crate::transport::ApiRequest;
use crate::QRadarError;

/// Categories whose `name` contains `term`, ignoring case.
pub(crate) fn filter_categories(categories: Vec<Value>, term: &str) -> Vec<Value> {
    let needle = term.to_lowercase();
    categories
        .into_iter()
        .filter(|category| {
            category
                .get("name")
                .and_then(Value::as_str)
                .is_some_and(|name| name.to_lowercase().contains(&needle))
        })
        .collect()
}

impl QRadarClient {
    pub async fn search_events(
        &self,
        query: &str,
        options: &SearchOptions,
        ctx: &SearchContext,
    ) -> Result<SearchResult, QRadarError> {
        self.engine
            .execute_query(query, Dataset::Events, options, ctx)
            .await
    }

    pub async fn search_flows(
        &self,
        query: &str,
        options: &SearchOptions,
        ctx: &SearchContext,
    ) -> Result<SearchResult, QRadarError> {
        self.engine
            .execute_query(query, Dataset::Flows, options, ctx)
            .await
    }

    pub async fn recent_events(
        &self,
        limit: u32,
        fields: Option<&[String]>,
        options: &SearchOptions,
        ctx: &SearchContext,
    ) -> Result<SearchResult, QRadarError> {
        self.engine.recent_events(limit, fields, options, ctx).await
    }

    pub async fn saved_searches(&self) -> Result<Vec<Value>, QRadarError> {
        self.list(ApiRequest::get("/ariel/saved_searches")).await
    }

    pub async fn saved_search(&self, search_id: &str) -> Result<Value, QRadarError> {
        self.get(ApiRequest::get("/ariel/saved_searches").segment(search_id))
            .await
    }

    /// Run a saved search's stored AQL against the events database.
    ///
    /// Fails with [`QRadarError::MissingQuery`] before submitting anything
    /// when the saved search carries no AQL.
    pub async fn execute_saved_search(
        &self,
        search_id: &str,
        options: &SearchOptions,
        ctx: &SearchContext,
    ) -> Result<SearchResult, QRadarError> {
        let saved = self.saved_search(search_id).await?;
        let query = saved
            .get("aql")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|aql| !aql.is_empty())
            .ok_or_else(|| QRadarError::MissingQuery {
                search_id: search_id.to_string(),
            })?;
        self.search_events(query, options, ctx).await
    }

    pub async fn ariel_databases(&self) -> Result<Vec<Value>, QRadarError> {
        self.list(ApiRequest::get("/ariel/databases")).await
    }

    pub async fn ariel_fields(&self, database: &str) -> Result<Vec<Value>, QRadarError> {
        self.list(
            ApiRequest::get("/ariel/databases")
                .segment(database)
                .segment("fields"),
        )
        .await
    }

    /// QID records, which carry the event category names.
    pub async fn event_categories(&self) -> Result<Vec<Value>, QRadarError> {
        self.list(ApiRequest::get("/data_classification/qid_records"))
            .await
    }

    pub async fn search_event_categories(&self, term: &str) -> Result<Vec<Value>, QRadarError> {
        Ok(filter_categories(self.event_categories().await?, term))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_filter_categories_is_case_insensitive() {
        let categories = vec![
            json!({"id": 1, "name": "Firewall Deny"}),
            json!({"id": 2, "name": "Authentication Failure"}),
            json!({"id": 3}),
            json!({"id": 4, "name": "FIREWALL permit"}),
        ];
        let matched = filter_categories(categories, "firewall");
        let ids: Vec<_> = matched.iter().map(|c| c["id"].clone()).collect();
        assert_eq!(ids, vec![json!(1), json!(4)]);
    }
}

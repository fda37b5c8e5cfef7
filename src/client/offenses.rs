use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{ListFilter, QRadarClient};
use crate::transport::ApiRequest;
use crate::QRadarError;

/// Offense workflow status accepted by the console.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum OffenseStatus {
    Open,
    Hidden,
    Closed,
}

impl OffenseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OffenseStatus::Open => "OPEN",
            OffenseStatus::Hidden => "HIDDEN",
            OffenseStatus::Closed => "CLOSED",
        }
    }
}

impl fmt::Display for OffenseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl QRadarClient {
    /// List offenses. `range` (e.g. `"0-49"`) is sent as
    /// `Range: items=<range>` on this request only.
    pub async fn offenses(
        &self,
        filter: &ListFilter,
        range: Option<&str>,
    ) -> Result<Vec<Value>, QRadarError> {
        let mut request = filter.apply(ApiRequest::get("/siem/offenses"));
        if let Some(range) = range {
            request = request.header("Range", format!("items={}", range));
        }
        self.list(request).await
    }

    pub async fn offense(&self, offense_id: u64) -> Result<Value, QRadarError> {
        self.get(ApiRequest::get("/siem/offenses").segment(offense_id))
            .await
    }

    pub async fn offense_notes(&self, offense_id: u64) -> Result<Vec<Value>, QRadarError> {
        self.list(
            ApiRequest::get("/siem/offenses")
                .segment(offense_id)
                .segment("notes"),
        )
        .await
    }

    pub async fn add_offense_note(
        &self,
        offense_id: u64,
        note_text: &str,
    ) -> Result<Value, QRadarError> {
        self.get(
            ApiRequest::post("/siem/offenses")
                .segment(offense_id)
                .segment("notes")
                .param("note_text", note_text),
        )
        .await
    }

    /// Change an offense's status. The console rejects `CLOSED` without a
    /// closing reason; callers validate that before getting here.
    pub async fn update_offense_status(
        &self,
        offense_id: u64,
        status: OffenseStatus,
        closing_reason_id: Option<u64>,
    ) -> Result<Value, QRadarError> {
        self.get(
            ApiRequest::post("/siem/offenses")
                .segment(offense_id)
                .param("status", status)
                .param_opt("closing_reason_id", closing_reason_id),
        )
        .await
    }

    pub async fn assign_offense(
        &self,
        offense_id: u64,
        assigned_to: &str,
    ) -> Result<Value, QRadarError> {
        self.get(
            ApiRequest::post("/siem/offenses")
                .segment(offense_id)
                .param("assigned_to", assigned_to),
        )
        .await
    }

    pub async fn closing_reasons(&self) -> Result<Vec<Value>, QRadarError> {
        self.list(ApiRequest::get("/siem/offense_closing_reasons"))
            .await
    }
}

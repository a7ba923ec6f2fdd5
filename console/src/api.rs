use std::future::Future;

use async_trait::async_trait;
use log::warn;
use serde_json::Value;
use thiserror::Error;

use crate::duplicate::{LookupError, SimilarityLookup};
use crate::events::{Event, EventState};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("unexpected response: {0}")]
    Unexpected(String),
}

/// Mirrors the server-side cap; checked here so an oversized selection never
/// leaves the client.
pub const BULK_ACTION_LIMIT: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BulkOutcome {
    Applied,
    /// Selection exceeded the limit; the caller shows a warning and nothing
    /// was mutated.
    TooManySelected,
}

/// Applies a state change to a selection through the injected operation.
/// Above the limit nothing runs; otherwise the operation runs exactly once
/// and its own error handling applies.
pub async fn bulk_moderate<F, Fut, E>(
    selected: &[i64],
    state: EventState,
    apply: F,
) -> Result<BulkOutcome, E>
where
    F: FnOnce(Vec<i64>, EventState) -> Fut,
    Fut: Future<Output = Result<(), E>>,
{
    if selected.len() > BULK_ACTION_LIMIT {
        warn!(
            "Bulk moderation refused: {} events selected, limit is {}",
            selected.len(),
            BULK_ACTION_LIMIT
        );
        return Ok(BulkOutcome::TooManySelected);
    }

    apply(selected.to_vec(), state).await?;
    Ok(BulkOutcome::Applied)
}

#[derive(Debug, Clone)]
pub struct ConsolePage {
    pub events: Vec<Event>,
    pub page: u32,
    pub total: i64,
    pub total_pages: i64,
}

/// Thin client for the backend API. Admin routes need the staff key; the
/// public routes work without one.
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    admin_key: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            admin_key: None,
        }
    }

    pub fn with_admin_key(base_url: &str, admin_key: &str) -> Self {
        Self {
            admin_key: Some(admin_key.to_string()),
            ..Self::new(base_url)
        }
    }

    fn admin_request(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.admin_key {
            Some(key) => request.header("X-Admin-Key", key),
            None => request,
        }
    }

    fn parse_events(&self, body: &Value) -> Vec<Event> {
        body.get("events")
            .and_then(Value::as_array)
            .map(|entries| {
                entries
                    .iter()
                    .filter_map(|entry| match Event::from_wire(entry) {
                        Some(event) => Some(event),
                        None => {
                            warn!("Dropping malformed event row from response");
                            None
                        }
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// One page of the moderation console, split by tab and future/past.
    pub async fn fetch_console_page(
        &self,
        tab: EventState,
        future: bool,
        page: u32,
    ) -> Result<ConsolePage, ApiError> {
        let segment = if future { "future" } else { "past" };
        let url = format!("{}/admin/events/{}", self.base_url, segment);

        let response = self
            .admin_request(self.http.get(url))
            .query(&[("state", tab.as_str()), ("page", &page.to_string())])
            .send()
            .await?;

        let status = response.status();
        let body: Value = response.json().await?;

        if !status.is_success() {
            return Err(ApiError::Unexpected(format!(
                "HTTP {}: {}",
                status,
                body.get("message").and_then(Value::as_str).unwrap_or("")
            )));
        }

        Ok(ConsolePage {
            events: self.parse_events(&body),
            page,
            total: body.get("total").and_then(Value::as_i64).unwrap_or(0),
            total_pages: body.get("totalPages").and_then(Value::as_i64).unwrap_or(0),
        })
    }

    pub async fn set_event_state(&self, event_id: i64, state: EventState) -> Result<(), ApiError> {
        let url = format!("{}/admin/events/{}/state", self.base_url, event_id);

        let response = self
            .admin_request(self.http.put(url))
            .json(&serde_json::json!({ "state": state }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Unexpected(format!("HTTP {}", status)));
        }
        Ok(())
    }

    pub async fn bulk_set_event_state(
        &self,
        event_ids: Vec<i64>,
        state: EventState,
    ) -> Result<(), ApiError> {
        let url = format!("{}/admin/events/state", self.base_url);

        let response = self
            .admin_request(self.http.put(url))
            .json(&serde_json::json!({ "eventIds": event_ids, "state": state }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Unexpected(format!("HTTP {}", status)));
        }
        Ok(())
    }
}

#[async_trait]
impl SimilarityLookup for ApiClient {
    async fn search_similar(
        &self,
        name: &str,
        region: &str,
        city: &str,
    ) -> Result<Vec<Event>, LookupError> {
        let url = format!("{}/events/similar", self.base_url);

        let response = self
            .http
            .get(url)
            .query(&[("name", name), ("region", region), ("city", city)])
            .send()
            .await
            .map_err(|e| LookupError::Failed(e.to_string()))?;

        let status = response.status();
        let body: Value = response
            .json()
            .await
            .map_err(|e| LookupError::Failed(e.to_string()))?;

        if !status.is_success() {
            return Err(LookupError::Failed(format!("HTTP {}", status)));
        }

        Ok(self.parse_events(&body))
    }
}

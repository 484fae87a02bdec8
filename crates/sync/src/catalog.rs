//! Course search and the course assistant. Read-only, so not guarded by the store.

use std::sync::Arc;

use tracing::debug;

use schedule_core::api::AskRequest;
use schedule_core::model::{Answer, CourseEvent};
use schedule_core::validation::ValidationError;

use crate::error::SyncError;
use crate::response::{decode, decode_value, expect, failure};
use crate::transport::{ApiRequest, Method, Transport};

pub struct Catalog<T> {
    transport: Arc<T>,
}

impl<T: Transport> Catalog<T> {
    pub fn new(transport: Arc<T>) -> Self {
        Self { transport }
    }

    /// Catalog sections matching `query`. Anything but a JSON array counts as no hits.
    pub async fn search(&self, query: &str) -> Result<Vec<CourseEvent>, SyncError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(ValidationError::EmptyQuery.into());
        }
        let req = ApiRequest::primary(Method::Get, ["api", "courses", "search"]).query("query", query);
        let resp = self.transport.send(req).await?;
        if !resp.is_success() {
            return Err(failure(&resp, None));
        }
        let value: serde_json::Value = decode(&resp)?;
        if !value.is_array() {
            debug!(query, "search returned a non-array body");
            return Ok(Vec::new());
        }
        decode_value(&resp, value)
    }

    pub async fn ask(&self, question: &str) -> Result<Answer, SyncError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(ValidationError::EmptyQuestion.into());
        }
        let req = ApiRequest::primary(Method::Post, ["api", "ai", "ask"]).json(&AskRequest {
            question: question.to_string(),
        })?;
        let resp = self.transport.send(req).await?;
        expect(&resp, None)
    }
}

//! Async client for the Shlink REST API.
//!
//! # Design
//! `ShlinkApiClient` holds only its transport. Each operation builds an
//! `HttpRequest` with the matching `requests::build_*` function, dispatches
//! it exactly once and unwraps the payload with `requests::parse_*`.
//! Transport failures are returned as-is; there are no retries, no caching
//! and no shared mutable state, so concurrent calls are independent.

use serde::Serialize;
use serde_json::Value;

use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse};
use crate::requests;
use crate::transport::Transport;
use crate::types::{HealthStatus, ShortUrl, ShortUrlsQuery, VisitsPage};

/// Client for one configured Shlink backend.
#[derive(Debug, Clone)]
pub struct ShlinkApiClient<T> {
    transport: T,
}

impl<T: Transport> ShlinkApiClient<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    async fn dispatch(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        tracing::debug!(method = %request.method, path = %request.path, "dispatching request");
        Ok(self.transport.send(request).await?)
    }

    /// List short URLs. Returns `data.shortUrls` untouched.
    pub async fn list_short_urls(&self) -> Result<Value, ApiError> {
        let response = self.dispatch(requests::build_list_short_urls()).await?;
        requests::parse_list_short_urls(response)
    }

    /// List short URLs matching `query` (page, search term, tags, ordering).
    pub async fn list_short_urls_with(&self, query: &ShortUrlsQuery) -> Result<Value, ApiError> {
        let response = self
            .dispatch(requests::build_list_short_urls_with(query)?)
            .await?;
        requests::parse_list_short_urls(response)
    }

    /// Create a short URL.
    ///
    /// `options` is any value serializing to a JSON object, typically
    /// [`CreateShortUrl`](crate::types::CreateShortUrl). Null entries are
    /// dropped before sending.
    pub async fn create_short_url<B: Serialize>(&self, options: &B) -> Result<ShortUrl, ApiError> {
        let response = self
            .dispatch(requests::build_create_short_url(options)?)
            .await?;
        requests::parse_create_short_url(response)
    }

    pub async fn get_short_url(&self, short_code: &str) -> Result<ShortUrl, ApiError> {
        let response = self
            .dispatch(requests::build_get_short_url(short_code))
            .await?;
        requests::parse_get_short_url(response)
    }

    /// Fetch visits for `short_code`, filtered by `query`
    /// (e.g. [`VisitsQuery`](crate::types::VisitsQuery) or `json!({})`).
    pub async fn get_short_url_visits<Q: Serialize>(
        &self,
        short_code: &str,
        query: &Q,
    ) -> Result<VisitsPage, ApiError> {
        let response = self
            .dispatch(requests::build_get_short_url_visits(short_code, query)?)
            .await?;
        requests::parse_get_short_url_visits(response)
    }

    /// Replace the tags of `short_code`. Returns the tags the backend stored.
    pub async fn update_short_url_tags(
        &self,
        short_code: &str,
        tags: &[String],
    ) -> Result<Vec<String>, ApiError> {
        let response = self
            .dispatch(requests::build_update_short_url_tags(short_code, tags))
            .await?;
        requests::parse_update_short_url_tags(response)
    }

    pub async fn delete_short_url(&self, short_code: &str) -> Result<(), ApiError> {
        let response = self
            .dispatch(requests::build_delete_short_url(short_code))
            .await?;
        requests::parse_empty(response)
    }

    pub async fn list_tags(&self) -> Result<Vec<String>, ApiError> {
        let response = self.dispatch(requests::build_list_tags()).await?;
        requests::parse_list_tags(response)
    }

    /// Delete `tags` from every short URL. An empty list is a no-op and
    /// sends nothing: the backend would receive a bare `DELETE /tags`.
    pub async fn delete_tags(&self, tags: &[String]) -> Result<(), ApiError> {
        if tags.is_empty() {
            tracing::debug!("no tags to delete, skipping request");
            return Ok(());
        }
        let response = self.dispatch(requests::build_delete_tags(tags)).await?;
        requests::parse_empty(response)
    }

    /// Rename `old_name` to `new_name` on every short URL carrying it.
    pub async fn edit_tag(&self, old_name: &str, new_name: &str) -> Result<(), ApiError> {
        let response = self
            .dispatch(requests::build_edit_tag(old_name, new_name))
            .await?;
        requests::parse_empty(response)
    }

    pub async fn health(&self) -> Result<HealthStatus, ApiError> {
        let response = self.dispatch(requests::build_health()).await?;
        requests::parse_health(response)
    }
}

//! Stateless request builders and response parsers for each API operation.
//!
//! # Design
//! Every operation is split into a `build_*` function that produces an
//! `HttpRequest` and a `parse_*` function that consumes an `HttpResponse`.
//! Nothing here performs I/O, so the mapping between calls, paths and
//! payload shapes can be verified without a transport.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::error::ApiError;
use crate::http::{path_segment, HttpMethod, HttpRequest, HttpResponse};
use crate::types::{HealthStatus, ShortUrl, VisitsPage};

pub fn build_list_short_urls() -> HttpRequest {
    HttpRequest::new(HttpMethod::Get, "/short-urls")
}

pub fn build_list_short_urls_with<Q: Serialize>(query: &Q) -> Result<HttpRequest, ApiError> {
    Ok(build_list_short_urls().with_query(to_map(query)?))
}

pub fn build_create_short_url<B: Serialize>(options: &B) -> Result<HttpRequest, ApiError> {
    Ok(HttpRequest::new(HttpMethod::Post, "/short-urls").with_body(to_map(options)?))
}

pub fn build_get_short_url(short_code: &str) -> HttpRequest {
    HttpRequest::new(HttpMethod::Get, short_url_path(short_code))
}

pub fn build_get_short_url_visits<Q: Serialize>(
    short_code: &str,
    query: &Q,
) -> Result<HttpRequest, ApiError> {
    let path = format!("{}/visits", short_url_path(short_code));
    Ok(HttpRequest::new(HttpMethod::Get, path).with_query(to_map(query)?))
}

pub fn build_update_short_url_tags(short_code: &str, tags: &[String]) -> HttpRequest {
    let path = format!("{}/tags", short_url_path(short_code));
    HttpRequest::new(HttpMethod::Put, path).with_body(object(json!({ "tags": tags })))
}

pub fn build_delete_short_url(short_code: &str) -> HttpRequest {
    HttpRequest::new(HttpMethod::Delete, short_url_path(short_code))
}

pub fn build_list_tags() -> HttpRequest {
    HttpRequest::new(HttpMethod::Get, "/tags")
}

/// Tags travel as repeated `tags[]` query parameters. An empty list encodes
/// to no parameters at all; `ShlinkApiClient::delete_tags` skips the call.
pub fn build_delete_tags(tags: &[String]) -> HttpRequest {
    HttpRequest::new(HttpMethod::Delete, "/tags").with_query(object(json!({ "tags": tags })))
}

pub fn build_edit_tag(old_name: &str, new_name: &str) -> HttpRequest {
    HttpRequest::new(HttpMethod::Put, "/tags")
        .with_body(object(json!({ "oldName": old_name, "newName": new_name })))
}

pub fn build_health() -> HttpRequest {
    HttpRequest::new(HttpMethod::Get, "/health")
}

pub fn parse_list_short_urls(response: HttpResponse) -> Result<Value, ApiError> {
    take(response.data, "/shortUrls")
}

pub fn parse_create_short_url(response: HttpResponse) -> Result<ShortUrl, ApiError> {
    Ok(response.data)
}

pub fn parse_get_short_url(response: HttpResponse) -> Result<ShortUrl, ApiError> {
    Ok(response.data)
}

pub fn parse_get_short_url_visits(response: HttpResponse) -> Result<VisitsPage, ApiError> {
    Ok(VisitsPage {
        data: take_as(response.data, "/visits/data")?,
    })
}

pub fn parse_update_short_url_tags(response: HttpResponse) -> Result<Vec<String>, ApiError> {
    take_as(response.data, "/tags")
}

pub fn parse_list_tags(response: HttpResponse) -> Result<Vec<String>, ApiError> {
    take_as(response.data, "/tags/data")
}

/// Successful deletes and edits carry nothing the caller needs.
pub fn parse_empty(_response: HttpResponse) -> Result<(), ApiError> {
    Ok(())
}

pub fn parse_health(response: HttpResponse) -> Result<HealthStatus, ApiError> {
    Ok(serde_json::from_value(response.data)?)
}

fn short_url_path(short_code: &str) -> String {
    format!("/short-urls/{}", path_segment(short_code))
}

/// Move the value at `pointer` out of `data`.
fn take(mut data: Value, pointer: &str) -> Result<Value, ApiError> {
    data.pointer_mut(pointer)
        .map(Value::take)
        .ok_or_else(|| ApiError::MissingField {
            pointer: pointer.to_string(),
        })
}

fn take_as<T: DeserializeOwned>(data: Value, pointer: &str) -> Result<T, ApiError> {
    Ok(serde_json::from_value(take(data, pointer)?)?)
}

/// Serialize options into a JSON mapping. `null` (a `None` or `()` argument)
/// means no options; any other non-object value is rejected.
fn to_map<T: Serialize>(value: &T) -> Result<Map<String, Value>, ApiError> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map),
        Value::Null => Ok(Map::new()),
        other => Err(ApiError::InvalidOptions {
            found: json_kind(&other),
        }),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

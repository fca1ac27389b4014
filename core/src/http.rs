//! HTTP request and response descriptors exchanged with the transport.
//!
//! # Design
//! These types describe HTTP requests and responses as plain data. The
//! client builds `HttpRequest` values and reads `HttpResponse` values without
//! ever touching the network; the injected transport owns base URL, auth
//! headers, TLS and wire serialization.
//!
//! Paths are relative to the transport's REST base (`/short-urls`, `/tags`).
//! Query parameters and bodies are JSON mappings so array parameters such as
//! `tags` keep their shape until the transport encodes them.

use serde_json::{Map, Value};

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An HTTP request described as plain data.
///
/// Built by the `requests::build_*` functions and handed to a `Transport`.
/// `query` and `body` never contain null values.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub path: String,
    pub query: Map<String, Value>,
    pub body: Option<Map<String, Value>>,
}

impl HttpRequest {
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Map::new(),
            body: None,
        }
    }

    pub fn with_query(mut self, query: Map<String, Value>) -> Self {
        self.query = filter_empty(query);
        self
    }

    pub fn with_body(mut self, body: Map<String, Value>) -> Self {
        self.body = Some(filter_empty(body));
        self
    }

    /// Flatten `query` into `key=value` pairs.
    ///
    /// Arrays are expanded with the bracket convention (`tags[]=a&tags[]=b`)
    /// the backend expects; scalars are rendered without JSON quoting.
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        for (key, value) in &self.query {
            match value {
                Value::Array(items) => {
                    let key = format!("{key}[]");
                    pairs.extend(
                        items
                            .iter()
                            .filter_map(scalar_to_string)
                            .map(|item| (key.clone(), item)),
                    );
                }
                other => {
                    if let Some(item) = scalar_to_string(other) {
                        pairs.push((key.clone(), item));
                    }
                }
            }
        }
        pairs
    }
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        nested => Some(nested.to_string()),
    }
}

/// An HTTP response described as plain data.
///
/// Produced by a `Transport` once the round-trip succeeded. `data` is the
/// decoded JSON body, `Value::Null` when the backend sent no content.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub data: Value,
}

impl HttpResponse {
    /// A 200 response carrying `data`.
    pub fn ok(data: Value) -> Self {
        Self {
            status: 200,
            headers: Vec::new(),
            data,
        }
    }

    pub fn no_content() -> Self {
        Self {
            status: 204,
            headers: Vec::new(),
            data: Value::Null,
        }
    }
}

/// Drop every entry whose value is null.
///
/// Applied to bodies and query strings before dispatch so partial updates
/// never carry placeholder fields.
pub fn filter_empty(map: Map<String, Value>) -> Map<String, Value> {
    map.into_iter().filter(|(_, value)| !value.is_null()).collect()
}

/// Encode `segment` for use as a single path segment.
pub(crate) fn path_segment(segment: &str) -> String {
    url::form_urlencoded::byte_serialize(segment.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn map(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    #[test]
    fn filter_empty_removes_only_nulls() {
        let filtered = filter_empty(map(json!({
            "foo": "bar",
            "empty": null,
            "zero": 0,
            "blank": "",
            "list": [],
        })));
        assert_eq!(
            Value::Object(filtered),
            json!({ "foo": "bar", "zero": 0, "blank": "", "list": [] })
        );
    }

    #[test]
    fn with_body_filters_nulls() {
        let req = HttpRequest::new(HttpMethod::Post, "/short-urls")
            .with_body(map(json!({ "foo": "bar", "anotherEmpty": null })));
        assert_eq!(req.body, Some(map(json!({ "foo": "bar" }))));
    }

    #[test]
    fn new_request_has_no_body_or_query() {
        let req = HttpRequest::new(HttpMethod::Get, "/tags");
        assert!(req.body.is_none());
        assert!(req.query.is_empty());
        assert!(req.query_pairs().is_empty());
    }

    #[test]
    fn query_pairs_expand_arrays_with_brackets() {
        let req = HttpRequest::new(HttpMethod::Delete, "/tags")
            .with_query(map(json!({ "tags": ["foo", "bar"] })));
        assert_eq!(
            req.query_pairs(),
            vec![
                ("tags[]".to_string(), "foo".to_string()),
                ("tags[]".to_string(), "bar".to_string()),
            ]
        );
    }

    #[test]
    fn query_pairs_render_scalars_unquoted() {
        let req = HttpRequest::new(HttpMethod::Get, "/short-urls")
            .with_query(map(json!({ "page": 2, "searchTerm": "rust", "skip": null })));
        let mut pairs = req.query_pairs();
        pairs.sort();
        assert_eq!(
            pairs,
            vec![
                ("page".to_string(), "2".to_string()),
                ("searchTerm".to_string(), "rust".to_string()),
            ]
        );
    }

    #[test]
    fn path_segment_escapes_reserved_characters() {
        assert_eq!(path_segment("abc123"), "abc123");
        assert_eq!(path_segment("a b/c"), "a%20b%2Fc");
    }

    #[test]
    fn method_display_is_uppercase() {
        assert_eq!(HttpMethod::Delete.to_string(), "DELETE");
    }
}

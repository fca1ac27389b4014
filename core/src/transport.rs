//! The injected transport capability and its implementations.
//!
//! # Design
//! `ShlinkApiClient` never performs I/O itself; it hands each `HttpRequest`
//! to a `Transport`. Anything that can execute a request can be plugged in:
//! an async closure through [`transport_fn`], a test double, or
//! [`ReqwestTransport`] for real deployments.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client, Method};
use serde_json::Value;

use crate::config::ServerConfig;
use crate::error::TransportError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};

/// Executes one `HttpRequest` against the backend.
///
/// Implementations own base URL resolution, authentication headers, TLS and
/// serialization. A non-2xx answer must be reported as an error, never as a
/// successful `HttpResponse`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        (**self).send(request).await
    }
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for &T {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        (**self).send(request).await
    }
}

/// Transport backed by an async function. Built with [`transport_fn`].
#[derive(Clone)]
pub struct TransportFn<F> {
    f: F,
}

/// Turn `f` into a `Transport`.
///
/// ```
/// use shlink_core::{transport_fn, HttpResponse, ShlinkApiClient};
///
/// let client = ShlinkApiClient::new(transport_fn(|_req| async {
///     Ok(HttpResponse::ok(serde_json::json!({ "status": "pass", "version": "4.0.0" })))
/// }));
/// # let _ = client;
/// ```
pub fn transport_fn<F, Fut>(f: F) -> TransportFn<F>
where
    F: Fn(HttpRequest) -> Fut + Send + Sync,
    Fut: Future<Output = Result<HttpResponse, TransportError>> + Send,
{
    TransportFn { f }
}

#[async_trait]
impl<F, Fut> Transport for TransportFn<F>
where
    F: Fn(HttpRequest) -> Fut + Send + Sync,
    Fut: Future<Output = Result<HttpResponse, TransportError>> + Send,
{
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        (self.f)(request).await
    }
}

/// Production transport over `reqwest`.
///
/// Resolves paths against `{url}/rest/v{version}`, sends the API key in the
/// `X-Api-Key` header and encodes array query parameters as `key[]=value`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    http: Client,
    base_url: String,
}

impl ReqwestTransport {
    pub fn new(config: &ServerConfig) -> Result<Self, TransportError> {
        let mut headers = HeaderMap::new();
        let api_key = HeaderValue::from_str(&config.api_key).map_err(setup_error)?;
        headers.insert("X-Api-Key", api_key);

        let http = Client::builder()
            .user_agent(format!("shlink-core/{}", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .build()
            .map_err(setup_error)?;

        Ok(Self::with_client(http, config.rest_base()))
    }

    /// Use a preconfigured client. `base_url` must already include the REST
    /// prefix; requests are sent to `base_url + request.path`.
    pub fn with_client(http: Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

/// Failures while constructing the client happen before any request is sent,
/// so they are never `Network`.
fn setup_error<E: std::error::Error + Send + Sync + 'static>(err: E) -> TransportError {
    TransportError::Other(Box::new(err))
}

fn to_reqwest_method(method: HttpMethod) -> Method {
    match method {
        HttpMethod::Get => Method::GET,
        HttpMethod::Post => Method::POST,
        HttpMethod::Put => Method::PUT,
        HttpMethod::Delete => Method::DELETE,
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let url = format!("{}{}", self.base_url, request.path);
        let mut builder = self
            .http
            .request(to_reqwest_method(request.method), &url)
            .query(&request.query_pairs());
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;
        let status = response.status();
        tracing::debug!(method = %request.method, %url, status = status.as_u16(), "response received");

        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let text = response
            .text()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;

        if !status.is_success() {
            return Err(TransportError::Status {
                status: status.as_u16(),
                body: text,
            });
        }

        let data = if text.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&text).map_err(|e| TransportError::Decode(e.to_string()))?
        };

        Ok(HttpResponse {
            status: status.as_u16(),
            headers,
            data,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn transport_fn_forwards_request() {
        let transport = transport_fn(|req: HttpRequest| async move {
            Ok(HttpResponse::ok(json!({ "path": req.path })))
        });
        let response = transport
            .send(HttpRequest::new(HttpMethod::Get, "/health"))
            .await
            .unwrap();
        assert_eq!(response.data, json!({ "path": "/health" }));
    }

    #[tokio::test]
    async fn arc_transport_delegates() {
        let transport = Arc::new(transport_fn(|_req| async {
            Err(TransportError::Network("connection refused".to_string()))
        }));
        let err = transport
            .send(HttpRequest::new(HttpMethod::Get, "/tags"))
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::Network(_)));
    }

    #[test]
    fn reqwest_transport_trims_trailing_slash() {
        let transport = ReqwestTransport::with_client(Client::new(), "http://localhost:8080/rest/v2/");
        assert_eq!(transport.base_url(), "http://localhost:8080/rest/v2");
    }

    #[test]
    fn reqwest_transport_from_config() {
        let config = ServerConfig::new("https://s.test", "secret").unwrap();
        let transport = ReqwestTransport::new(&config).unwrap();
        assert_eq!(transport.base_url(), "https://s.test/rest/v2");
    }

    #[test]
    fn reqwest_transport_rejects_unprintable_api_key() {
        let config = ServerConfig::new("https://s.test", "bad\nkey").unwrap();
        let err = ReqwestTransport::new(&config).unwrap_err();
        assert!(matches!(err, TransportError::Other(_)));
    }

    #[test]
    fn setup_failures_are_not_network_errors() {
        let err = setup_error(std::io::Error::other("tls backend unavailable"));
        assert!(matches!(err, TransportError::Other(_)));
        assert_eq!(err.to_string(), "tls backend unavailable");
    }
}

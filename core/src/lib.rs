//! Async API client core for the Shlink URL shortener.
//!
//! # Overview
//! Maps domain calls (list/create/get/delete short URLs, visits, tags,
//! health) to HTTP request descriptors, dispatches them through an injected
//! `Transport` and reshapes the response payloads into plain return values.
//!
//! # Design
//! - `ShlinkApiClient` holds only its transport; one async method per
//!   operation, each issuing exactly one request.
//! - Each operation is split into `requests::build_*` (produces request) and
//!   `requests::parse_*` (consumes response), so the I/O boundary is explicit
//!   and the mapping is testable without a network.
//! - Null entries in request bodies and query strings are stripped by an
//!   explicit normalization step (`http::filter_empty`).
//! - Transport failures propagate unchanged; the client never retries.

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod requests;
pub mod transport;
pub mod types;

pub use client::ShlinkApiClient;
pub use config::ServerConfig;
pub use error::{ApiError, ConfigError, TransportError};
pub use http::{filter_empty, HttpMethod, HttpRequest, HttpResponse};
pub use transport::{transport_fn, ReqwestTransport, Transport, TransportFn};
pub use types::{CreateShortUrl, HealthStatus, ShortUrl, ShortUrlsQuery, Visit, VisitsPage, VisitsQuery};

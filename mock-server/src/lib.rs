//! In-memory mock of the Shlink REST API.
//!
//! Serves the short URL, visits, tags and health endpoints under
//! `/rest/v2`, plus the public `/{code}` redirect that records visits.
//! Every REST route except health requires the `X-Api-Key` header.

pub mod store;

use std::sync::Arc;

use axum::{
    extract::{Path, RawQuery, Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, put},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};

pub use store::{CreateShortUrl, ShortUrl, Store, StoreError, Visit};
use store::{ListFilter, VisitsFilter};

pub const REST_PREFIX: &str = "/rest/v2";
pub const API_KEY_HEADER: &str = "x-api-key";
pub const SHLINK_VERSION: &str = "4.0.0";

pub type Db = Arc<RwLock<Store>>;

#[derive(Clone)]
pub struct AppState {
    api_key: Arc<str>,
    db: Db,
}

pub fn app(api_key: &str) -> Router {
    let state = AppState {
        api_key: Arc::from(api_key),
        db: Arc::new(RwLock::new(Store::default())),
    };

    let rest = Router::new()
        .route("/short-urls", get(list_short_urls).post(create_short_url))
        .route("/short-urls/{code}", get(get_short_url).delete(delete_short_url))
        .route("/short-urls/{code}/visits", get(short_url_visits))
        .route("/short-urls/{code}/tags", put(update_short_url_tags))
        .route("/tags", get(list_tags).put(edit_tag).delete(delete_tags))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_api_key))
        .route("/health", get(health));

    Router::new()
        .nest(REST_PREFIX, rest)
        .route("/{code}", get(redirect))
        .with_state(state)
}

pub async fn run(listener: TcpListener, api_key: &str) -> Result<(), std::io::Error> {
    axum::serve(listener, app(api_key)).await
}

/// RFC 7807 problem document, the error shape Shlink uses.
#[derive(Debug)]
pub struct Problem {
    status: StatusCode,
    kind: &'static str,
    title: &'static str,
    detail: String,
}

impl Problem {
    fn new(status: StatusCode, kind: &'static str, title: &'static str, detail: String) -> Self {
        Self {
            status,
            kind,
            title,
            detail,
        }
    }

    fn invalid_argument(detail: String) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "INVALID_ARGUMENT", "Invalid data", detail)
    }
}

impl IntoResponse for Problem {
    fn into_response(self) -> Response {
        let body = json!({
            "type": self.kind,
            "title": self.title,
            "status": self.status.as_u16(),
            "detail": self.detail,
        });
        (
            self.status,
            [(header::CONTENT_TYPE, "application/problem+json")],
            Json(body),
        )
            .into_response()
    }
}

impl From<StoreError> for Problem {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::InvalidUrl(url) => {
                Problem::invalid_argument(format!("Provided URL {url} is invalid."))
            }
            StoreError::InvalidSlug(slug) => {
                Problem::invalid_argument(format!("Provided slug \"{slug}\" is invalid."))
            }
            StoreError::NonUniqueSlug(slug) => Problem::new(
                StatusCode::BAD_REQUEST,
                "INVALID_SLUG",
                "Invalid custom slug",
                format!("Provided slug \"{slug}\" is already in use."),
            ),
            StoreError::ShortUrlNotFound(code) => Problem::new(
                StatusCode::NOT_FOUND,
                "INVALID_SHORTCODE",
                "Short URL not found",
                format!("No URL found with short code \"{code}\""),
            ),
            StoreError::TagNotFound(tag) => Problem::new(
                StatusCode::NOT_FOUND,
                "TAG_NOT_FOUND",
                "Tag not found",
                format!("Tag with name \"{tag}\" could not be found"),
            ),
            StoreError::TagConflict(tag) => Problem::new(
                StatusCode::CONFLICT,
                "TAG_CONFLICT",
                "Tag conflict",
                format!("You cannot rename a tag to \"{tag}\", because it already exists"),
            ),
        }
    }
}

async fn require_api_key(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let provided = req
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok());
    if provided != Some(&*state.api_key) {
        tracing::debug!(path = %req.uri().path(), "rejecting request with invalid api key");
        return Problem::new(
            StatusCode::UNAUTHORIZED,
            "INVALID_API_KEY",
            "Invalid API key",
            "Provided API key does not exist or is invalid.".to_string(),
        )
        .into_response();
    }
    next.run(req).await
}

/// Decode a raw query string, keeping repeated keys.
fn query_pairs(raw: Option<String>) -> Vec<(String, String)> {
    raw.map(|q| url::form_urlencoded::parse(q.as_bytes()).into_owned().collect())
        .unwrap_or_default()
}

fn first<'a>(pairs: &'a [(String, String)], key: &str) -> Option<&'a str> {
    pairs.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
}

fn all(pairs: &[(String, String)], key: &str) -> Vec<String> {
    let bracketed = format!("{key}[]");
    pairs
        .iter()
        .filter(|(k, _)| k == key || *k == bracketed)
        .map(|(_, v)| v.clone())
        .collect()
}

fn parse_number(pairs: &[(String, String)], key: &str) -> Result<Option<u32>, Problem> {
    first(pairs, key)
        .map(|v| {
            v.parse()
                .map_err(|_| Problem::invalid_argument(format!("{key} must be a positive number")))
        })
        .transpose()
}

fn parse_date(pairs: &[(String, String)], key: &str) -> Result<Option<DateTime<Utc>>, Problem> {
    first(pairs, key)
        .map(|v| {
            v.parse()
                .map_err(|_| Problem::invalid_argument(format!("{key} must be an ISO-8601 date")))
        })
        .transpose()
}

async fn list_short_urls(
    State(state): State<AppState>,
    RawQuery(raw): RawQuery,
) -> Result<Json<Value>, Problem> {
    let pairs = query_pairs(raw);
    let filter = ListFilter {
        page: parse_number(&pairs, "page")?,
        items_per_page: parse_number(&pairs, "itemsPerPage")?,
        search_term: first(&pairs, "searchTerm").map(str::to_string),
        tags: all(&pairs, "tags"),
        order_by: first(&pairs, "orderBy").map(str::to_string),
    };
    let page = state.db.read().await.list(&filter);
    Ok(Json(json!({ "shortUrls": page })))
}

async fn create_short_url(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(input): Json<CreateShortUrl>,
) -> Result<Json<ShortUrl>, Problem> {
    let host = headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("localhost");
    let origin = format!("http://{host}");
    let short_url = state.db.write().await.create(input, &origin)?;
    Ok(Json(short_url))
}

async fn get_short_url(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<ShortUrl>, Problem> {
    let db = state.db.read().await;
    Ok(Json(db.get(&code)?.clone()))
}

async fn delete_short_url(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<StatusCode, Problem> {
    state.db.write().await.delete(&code)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn short_url_visits(
    State(state): State<AppState>,
    Path(code): Path<String>,
    RawQuery(raw): RawQuery,
) -> Result<Json<Value>, Problem> {
    let pairs = query_pairs(raw);
    let filter = VisitsFilter {
        page: parse_number(&pairs, "page")?,
        items_per_page: parse_number(&pairs, "itemsPerPage")?,
        start_date: parse_date(&pairs, "startDate")?,
        end_date: parse_date(&pairs, "endDate")?,
    };
    let page = state.db.read().await.visits(&code, &filter)?;
    Ok(Json(json!({ "visits": page })))
}

#[derive(Deserialize)]
struct TagsBody {
    tags: Vec<String>,
}

async fn update_short_url_tags(
    State(state): State<AppState>,
    Path(code): Path<String>,
    Json(body): Json<TagsBody>,
) -> Result<Json<Value>, Problem> {
    let tags = state.db.write().await.set_tags(&code, body.tags)?;
    Ok(Json(json!({ "tags": tags })))
}

async fn list_tags(State(state): State<AppState>) -> Json<Value> {
    let tags = state.db.read().await.tags();
    Json(json!({ "tags": { "data": tags } }))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct EditTag {
    old_name: String,
    new_name: String,
}

async fn edit_tag(
    State(state): State<AppState>,
    Json(body): Json<EditTag>,
) -> Result<StatusCode, Problem> {
    state.db.write().await.rename_tag(&body.old_name, &body.new_name)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn delete_tags(State(state): State<AppState>, RawQuery(raw): RawQuery) -> StatusCode {
    let tags = all(&query_pairs(raw), "tags");
    state.db.write().await.delete_tags(&tags);
    StatusCode::NO_CONTENT
}

async fn health() -> Json<Value> {
    Json(json!({
        "status": "pass",
        "version": SHLINK_VERSION,
        "links": {
            "about": "https://shlink.io",
            "project": "https://github.com/shlinkio/shlink",
        },
    }))
}

async fn redirect(
    State(state): State<AppState>,
    Path(code): Path<String>,
    headers: HeaderMap,
) -> Result<Response, Problem> {
    let header_value = |name: header::HeaderName| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string()
    };
    let visit = Visit {
        referer: header_value(header::REFERER),
        date: Utc::now(),
        user_agent: header_value(header::USER_AGENT),
        visit_location: None,
        potential_bot: false,
    };
    let long_url = state.db.write().await.record_visit(&code, visit)?;
    Ok((StatusCode::FOUND, [(header::LOCATION, long_url)]).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(raw: &str) -> Vec<(String, String)> {
        query_pairs(Some(raw.to_string()))
    }

    #[test]
    fn query_pairs_keep_repeated_keys() {
        let pairs = pairs("tags%5B%5D=foo&tags%5B%5D=bar&page=2");
        assert_eq!(all(&pairs, "tags"), vec!["foo", "bar"]);
        assert_eq!(first(&pairs, "page"), Some("2"));
    }

    #[test]
    fn all_accepts_plain_and_bracketed_keys() {
        let pairs = pairs("tags=foo&tags[]=bar");
        assert_eq!(all(&pairs, "tags"), vec!["foo", "bar"]);
    }

    #[test]
    fn parse_number_rejects_garbage() {
        let err = parse_number(&pairs("page=abc"), "page").unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(parse_number(&pairs(""), "page").unwrap(), None);
    }

    #[test]
    fn parse_date_accepts_rfc3339() {
        let date = parse_date(&pairs("startDate=2024-01-01T00:00:00Z"), "startDate").unwrap();
        assert!(date.is_some());
    }

    #[test]
    fn store_errors_map_to_statuses() {
        assert_eq!(Problem::from(StoreError::ShortUrlNotFound("x".into())).status, StatusCode::NOT_FOUND);
        assert_eq!(Problem::from(StoreError::TagConflict("x".into())).status, StatusCode::CONFLICT);
        assert_eq!(Problem::from(StoreError::NonUniqueSlug("x".into())).status, StatusCode::BAD_REQUEST);
    }
}

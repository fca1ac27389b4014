//! Domain DTOs for the Shlink REST API.
//!
//! # Design
//! Short URLs and visits are backend-defined records the client never
//! inspects, so they stay `serde_json::Value`. Only the inputs the client
//! sends and the small health payload are modelled as structs.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A short URL record, passed through verbatim.
pub type ShortUrl = Value;

/// A single visit record, passed through verbatim.
pub type Visit = Value;

/// One page of visits for a short URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisitsPage {
    pub data: Vec<Visit>,
}

/// Result of the backend health check.
///
/// Fields other than `status` and `version` (e.g. `links`) are kept in
/// `extra` so the value serializes back to what the backend sent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub version: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl HealthStatus {
    pub fn is_passing(&self) -> bool {
        self.status == "pass"
    }
}

/// Payload for creating a short URL. Unset fields are not sent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateShortUrl {
    pub long_url: String,
    pub custom_slug: Option<String>,
    pub tags: Option<Vec<String>>,
    pub valid_since: Option<String>,
    pub valid_until: Option<String>,
    pub max_visits: Option<u64>,
    pub find_if_exists: Option<bool>,
}

impl CreateShortUrl {
    pub fn new(long_url: impl Into<String>) -> Self {
        Self {
            long_url: long_url.into(),
            ..Default::default()
        }
    }
}

/// Query options for listing visits.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisitsQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub page: Option<u32>,
    pub items_per_page: Option<u32>,
}

/// Query options for listing short URLs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShortUrlsQuery {
    pub page: Option<u32>,
    pub search_term: Option<String>,
    pub tags: Option<Vec<String>>,
    pub order_by: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn health_keeps_unknown_fields() {
        let raw = json!({
            "status": "pass",
            "version": "1.19.0",
            "links": { "about": "https://shlink.io" },
        });
        let health: HealthStatus = serde_json::from_value(raw.clone()).unwrap();
        assert!(health.is_passing());
        assert_eq!(health.version, "1.19.0");
        assert_eq!(serde_json::to_value(&health).unwrap(), raw);
    }

    #[test]
    fn create_short_url_uses_camel_case() {
        let mut input = CreateShortUrl::new("https://example.com");
        input.custom_slug = Some("ex".to_string());
        let json = serde_json::to_value(&input).unwrap();
        assert_eq!(json["longUrl"], "https://example.com");
        assert_eq!(json["customSlug"], "ex");
        assert!(json["maxVisits"].is_null());
    }

    #[test]
    fn visits_query_defaults_to_no_filters() {
        let json = serde_json::to_value(VisitsQuery::default()).unwrap();
        assert!(json.as_object().unwrap().values().all(Value::is_null));
    }
}

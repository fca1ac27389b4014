//! In-memory state behind the mock Shlink API.
//!
//! Short URLs are kept in creation order, which is also the default listing
//! order. Tags live in their own set so a tag survives until it is deleted
//! explicitly, even when no short URL carries it any more.

use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

const SHORT_CODE_LENGTH: usize = 5;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ShortUrl {
    pub short_code: String,
    pub short_url: String,
    pub long_url: String,
    pub date_created: DateTime<Utc>,
    pub visits_count: u64,
    pub tags: Vec<String>,
    pub meta: Meta,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Meta {
    pub valid_since: Option<DateTime<Utc>>,
    pub valid_until: Option<DateTime<Utc>>,
    pub max_visits: Option<u64>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Visit {
    pub referer: String,
    pub date: DateTime<Utc>,
    pub user_agent: String,
    pub visit_location: Option<Value>,
    pub potential_bot: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateShortUrl {
    pub long_url: String,
    pub custom_slug: Option<String>,
    pub tags: Option<Vec<String>>,
    pub valid_since: Option<DateTime<Utc>>,
    pub valid_until: Option<DateTime<Utc>>,
    pub max_visits: Option<u64>,
    pub find_if_exists: Option<bool>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub current_page: u32,
    pub pages_count: u32,
    pub items_per_page: u32,
    pub items_in_current_page: u32,
    pub total_items: u32,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub pagination: Pagination,
}

/// Filters accepted by the short URL listing.
#[derive(Debug, Default)]
pub struct ListFilter {
    pub page: Option<u32>,
    pub items_per_page: Option<u32>,
    pub search_term: Option<String>,
    pub tags: Vec<String>,
    pub order_by: Option<String>,
}

#[derive(Debug, Default)]
pub struct VisitsFilter {
    pub page: Option<u32>,
    pub items_per_page: Option<u32>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

#[derive(Debug, PartialEq)]
pub enum StoreError {
    InvalidUrl(String),
    InvalidSlug(String),
    NonUniqueSlug(String),
    ShortUrlNotFound(String),
    TagNotFound(String),
    TagConflict(String),
}

#[derive(Debug, Default)]
pub struct Store {
    short_urls: Vec<ShortUrl>,
    visits: HashMap<String, Vec<Visit>>,
    tags: BTreeSet<String>,
}

impl Store {
    pub fn create(&mut self, input: CreateShortUrl, origin: &str) -> Result<ShortUrl, StoreError> {
        url::Url::parse(&input.long_url).map_err(|_| StoreError::InvalidUrl(input.long_url.clone()))?;

        if input.find_if_exists.unwrap_or(false) {
            let existing = self.short_urls.iter().find(|s| {
                s.long_url == input.long_url
                    && input.custom_slug.as_ref().is_none_or(|slug| &s.short_code == slug)
            });
            if let Some(existing) = existing {
                return Ok(existing.clone());
            }
        }

        let short_code = match input.custom_slug {
            Some(slug) => {
                let slug = slug.trim().to_string();
                if slug.is_empty() || slug.contains('/') {
                    return Err(StoreError::InvalidSlug(slug));
                }
                if self.position(&slug).is_some() {
                    return Err(StoreError::NonUniqueSlug(slug));
                }
                slug
            }
            None => self.generate_short_code(),
        };

        let tags = normalize_tags(input.tags.unwrap_or_default());
        self.tags.extend(tags.iter().cloned());

        let short_url = ShortUrl {
            short_url: format!("{}/{}", origin.trim_end_matches('/'), short_code),
            short_code,
            long_url: input.long_url,
            date_created: Utc::now(),
            visits_count: 0,
            tags,
            meta: Meta {
                valid_since: input.valid_since,
                valid_until: input.valid_until,
                max_visits: input.max_visits,
            },
        };
        self.short_urls.push(short_url.clone());
        Ok(short_url)
    }

    pub fn get(&self, short_code: &str) -> Result<&ShortUrl, StoreError> {
        self.position(short_code)
            .map(|i| &self.short_urls[i])
            .ok_or_else(|| StoreError::ShortUrlNotFound(short_code.to_string()))
    }

    pub fn delete(&mut self, short_code: &str) -> Result<(), StoreError> {
        let index = self
            .position(short_code)
            .ok_or_else(|| StoreError::ShortUrlNotFound(short_code.to_string()))?;
        self.short_urls.remove(index);
        self.visits.remove(short_code);
        Ok(())
    }

    pub fn list(&self, filter: &ListFilter) -> Page<ShortUrl> {
        let term = filter.search_term.as_deref().map(str::to_lowercase);
        let mut items: Vec<ShortUrl> = self
            .short_urls
            .iter()
            .filter(|s| match &term {
                Some(term) => {
                    s.long_url.to_lowercase().contains(term)
                        || s.short_code.to_lowercase().contains(term)
                }
                None => true,
            })
            .filter(|s| filter.tags.is_empty() || filter.tags.iter().any(|t| s.tags.contains(t)))
            .cloned()
            .collect();

        if let Some(order_by) = &filter.order_by {
            sort_short_urls(&mut items, order_by);
        }

        paginate(items, filter.page, Some(filter.items_per_page.unwrap_or(10)))
    }

    pub fn visits(&self, short_code: &str, filter: &VisitsFilter) -> Result<Page<Visit>, StoreError> {
        self.get(short_code)?;
        let items: Vec<Visit> = self
            .visits
            .get(short_code)
            .map(|visits| {
                visits
                    .iter()
                    .filter(|v| filter.start_date.is_none_or(|start| v.date >= start))
                    .filter(|v| filter.end_date.is_none_or(|end| v.date <= end))
                    .rev()
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        Ok(paginate(items, filter.page, filter.items_per_page))
    }

    pub fn set_tags(&mut self, short_code: &str, tags: Vec<String>) -> Result<Vec<String>, StoreError> {
        let index = self
            .position(short_code)
            .ok_or_else(|| StoreError::ShortUrlNotFound(short_code.to_string()))?;
        let tags = normalize_tags(tags);
        self.tags.extend(tags.iter().cloned());
        self.short_urls[index].tags = tags.clone();
        Ok(tags)
    }

    pub fn tags(&self) -> Vec<String> {
        self.tags.iter().cloned().collect()
    }

    pub fn rename_tag(&mut self, old_name: &str, new_name: &str) -> Result<(), StoreError> {
        if !self.tags.contains(old_name) {
            return Err(StoreError::TagNotFound(old_name.to_string()));
        }
        if old_name != new_name && self.tags.contains(new_name) {
            return Err(StoreError::TagConflict(new_name.to_string()));
        }
        self.tags.remove(old_name);
        self.tags.insert(new_name.to_string());
        for short_url in &mut self.short_urls {
            for tag in short_url.tags.iter_mut().filter(|t| t.as_str() == old_name) {
                *tag = new_name.to_string();
            }
        }
        Ok(())
    }

    pub fn delete_tags(&mut self, tags: &[String]) {
        for tag in tags {
            self.tags.remove(tag);
        }
        for short_url in &mut self.short_urls {
            short_url.tags.retain(|t| !tags.contains(t));
        }
    }

    /// Record a visit and return the long URL to redirect to. Disabled short
    /// URLs (outside their validity window or out of visits) look missing.
    pub fn record_visit(&mut self, short_code: &str, visit: Visit) -> Result<String, StoreError> {
        let not_found = || StoreError::ShortUrlNotFound(short_code.to_string());
        let index = self.position(short_code).ok_or_else(not_found)?;
        let short_url = &mut self.short_urls[index];
        let meta = &short_url.meta;
        let enabled = meta.valid_since.is_none_or(|since| visit.date >= since)
            && meta.valid_until.is_none_or(|until| visit.date <= until)
            && meta.max_visits.is_none_or(|max| short_url.visits_count < max);
        if !enabled {
            return Err(not_found());
        }
        short_url.visits_count += 1;
        self.visits.entry(short_code.to_string()).or_default().push(visit);
        Ok(short_url.long_url.clone())
    }

    fn position(&self, short_code: &str) -> Option<usize> {
        self.short_urls.iter().position(|s| s.short_code == short_code)
    }

    fn generate_short_code(&self) -> String {
        loop {
            let candidate: String = Uuid::new_v4()
                .simple()
                .to_string()
                .chars()
                .take(SHORT_CODE_LENGTH)
                .collect();
            if self.position(&candidate).is_none() {
                return candidate;
            }
        }
    }
}

/// Trim, drop blanks and de-duplicate while keeping first-seen order.
fn normalize_tags(tags: Vec<String>) -> Vec<String> {
    let mut seen = BTreeSet::new();
    tags.into_iter()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty() && seen.insert(t.clone()))
        .collect()
}

/// `order_by` is `field` or `field-ASC|DESC`; unknown fields keep the order.
fn sort_short_urls(items: &mut [ShortUrl], order_by: &str) {
    let (field, dir) = order_by.split_once('-').unwrap_or((order_by, "ASC"));
    match field {
        "shortCode" => items.sort_by(|a, b| a.short_code.cmp(&b.short_code)),
        "longUrl" => items.sort_by(|a, b| a.long_url.cmp(&b.long_url)),
        "dateCreated" => items.sort_by_key(|s| s.date_created),
        "visits" => items.sort_by_key(|s| s.visits_count),
        _ => return,
    }
    if dir.eq_ignore_ascii_case("DESC") {
        items.reverse();
    }
}

/// Slice `items` into one page. Without `items_per_page` everything is
/// returned on a single page.
fn paginate<T>(items: Vec<T>, page: Option<u32>, items_per_page: Option<u32>) -> Page<T> {
    let total = items.len() as u32;
    let per_page = items_per_page.filter(|n| *n > 0).unwrap_or(total.max(1));
    let pages_count = total.div_ceil(per_page);
    let current_page = page.unwrap_or(1).max(1);
    let data: Vec<T> = items
        .into_iter()
        .skip((current_page - 1).saturating_mul(per_page) as usize)
        .take(per_page as usize)
        .collect();

    Page {
        pagination: Pagination {
            current_page,
            pages_count,
            items_per_page: per_page,
            items_in_current_page: data.len() as u32,
            total_items: total,
        },
        data,
    }
}

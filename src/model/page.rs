//! Page records.

use serde::Serialize;
use serde_json::Value;

use super::PageId;
use super::fields;

/// Page record as it is stored under a namespace's `pages` collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageRecord {
    pub title: String,
    pub author: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<i64>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub deleted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<i64>,
}

impl PageRecord {
    /// Decode a stored value. Returns `None` for anything but an object.
    pub fn from_value(value: &Value) -> Option<Self> {
        let fields = value.as_object()?;
        Some(Self {
            title: fields::string(fields, "title").unwrap_or_default(),
            author: fields::string(fields, "author").unwrap_or_default(),
            slug: fields::string(fields, "slug"),
            created_at: fields::integer(fields, "createdAt"),
            updated_at: fields::integer(fields, "updatedAt"),
            deleted: fields::deleted(fields),
            deleted_at: fields::integer(fields, "deletedAt"),
        })
    }

    /// Not tombstoned and titled: the acceptance test every reader applies.
    pub fn is_live(&self) -> bool {
        !self.deleted && !self.title.is_empty()
    }

    /// Decode `value` and keep it only if it is live.
    pub fn live_from_value(value: &Value) -> Option<Self> {
        Self::from_value(value).filter(Self::is_live)
    }
}

/// Entry of the page index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageSummary {
    pub id: PageId,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    pub author: String,
    pub created_at: Option<i64>,
    pub updated_at: Option<i64>,
}

impl PageSummary {
    pub fn new(id: PageId, record: PageRecord) -> Self {
        Self {
            id,
            title: record.title,
            slug: record.slug,
            author: record.author,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }

    /// Public URL path, preferring the slug.
    pub fn url(&self) -> String {
        page_url(&self.id, self.slug.as_deref())
    }
}

/// `/{slug}` when the page has a slug, `/view/{id}` otherwise.
pub fn page_url(id: &PageId, slug: Option<&str>) -> String {
    match slug {
        Some(slug) if !slug.is_empty() => format!("/{}", slug),
        _ => format!("/view/{}", id),
    }
}

/// Milliseconds since the Unix epoch, as producers stamp records.
pub fn now_millis() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| i64::try_from(d.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::leads::repo_types::Lead;

/// Body of `POST /leads`.
///
/// Numeric and timestamp fields are kept loose because grid forms post them
/// as strings (and blank inputs as `""`); `validate` turns them into typed
/// values. Anything not listed here, `user_id` included, is ignored.
#[derive(Debug, Default, Deserialize)]
pub struct CreateLeadRequest {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub source: Option<String>,
    pub status: Option<String>,
    pub score: Option<Value>,
    pub lead_value: Option<Value>,
    pub last_activity_at: Option<Value>,
    pub is_qualified: Option<bool>,
}

/// Body of `PUT /leads/:id`. Absent fields are left alone; `null` (or `""`)
/// clears a nullable field.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateLeadRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub phone: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub company: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub city: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub state: Option<Option<String>>,
    pub source: Option<String>,
    pub status: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub score: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    pub lead_value: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    pub last_activity_at: Option<Value>,
    pub is_qualified: Option<bool>,
}

/// Distinguishes an explicit `null` from a missing key.
fn present<'de, D, T>(d: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(d).map(Some)
}

/// Raw query string of `GET /leads`. Everything arrives as text so that bad
/// values surface as validation errors with a useful message.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct LeadListParams {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub search: Option<String>,
    pub status: Option<String>,
    pub source: Option<String>,
    pub min_score: Option<String>,
    pub max_score: Option<String>,
    pub is_qualified: Option<String>,
    #[serde(rename = "sortBy")]
    pub sort_by: Option<String>,
    #[serde(rename = "sortOrder")]
    pub sort_order: Option<String>,
}

/// One page of leads plus totals over the whole filtered set.
#[derive(Debug, Serialize)]
pub struct LeadPage {
    pub data: Vec<Lead>,
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    #[serde(rename = "totalPages")]
    pub total_pages: i64,
}

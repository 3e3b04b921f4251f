use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// Where a lead came from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "lead_source", rename_all = "snake_case")]
pub enum LeadSource {
    #[default]
    Website,
    FacebookAds,
    GoogleAds,
    Referral,
    Events,
    Other,
}

impl LeadSource {
    pub const ALL: [LeadSource; 6] = [
        LeadSource::Website,
        LeadSource::FacebookAds,
        LeadSource::GoogleAds,
        LeadSource::Referral,
        LeadSource::Events,
        LeadSource::Other,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            LeadSource::Website => "website",
            LeadSource::FacebookAds => "facebook_ads",
            LeadSource::GoogleAds => "google_ads",
            LeadSource::Referral => "referral",
            LeadSource::Events => "events",
            LeadSource::Other => "other",
        }
    }
}

/// Pipeline stage of a lead.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "lead_status", rename_all = "snake_case")]
pub enum LeadStatus {
    #[default]
    New,
    Contacted,
    Qualified,
    Lost,
    Won,
}

impl LeadStatus {
    pub const ALL: [LeadStatus; 5] = [
        LeadStatus::New,
        LeadStatus::Contacted,
        LeadStatus::Qualified,
        LeadStatus::Lost,
        LeadStatus::Won,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            LeadStatus::New => "new",
            LeadStatus::Contacted => "contacted",
            LeadStatus::Qualified => "qualified",
            LeadStatus::Lost => "lost",
            LeadStatus::Won => "won",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid {kind}: {value}")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

impl FromStr for LeadSource {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LeadSource::ALL
            .into_iter()
            .find(|v| v.as_str() == s)
            .ok_or_else(|| UnknownVariant {
                kind: "source",
                value: s.to_string(),
            })
    }
}

impl FromStr for LeadStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LeadStatus::ALL
            .into_iter()
            .find(|v| v.as_str() == s)
            .ok_or_else(|| UnknownVariant {
                kind: "status",
                value: s.to_string(),
            })
    }
}

/// Lead record in the database.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct Lead {
    pub id: i64,
    pub user_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub source: LeadSource,
    pub status: LeadStatus,
    pub score: Option<i32>,
    pub lead_value: Option<Decimal>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub last_activity_at: Option<OffsetDateTime>,
    pub is_qualified: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Validated data for a new lead. The owner is supplied separately.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewLead {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub source: LeadSource,
    pub status: LeadStatus,
    pub score: Option<i32>,
    pub lead_value: Option<Decimal>,
    pub last_activity_at: Option<OffsetDateTime>,
    pub is_qualified: bool,
}

/// Validated partial update. `None` leaves a column untouched; for nullable
/// columns `Some(None)` clears it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LeadChanges {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<Option<String>>,
    pub company: Option<Option<String>>,
    pub city: Option<Option<String>>,
    pub state: Option<Option<String>>,
    pub source: Option<LeadSource>,
    pub status: Option<LeadStatus>,
    pub score: Option<Option<i32>>,
    pub lead_value: Option<Option<Decimal>>,
    pub last_activity_at: Option<Option<OffsetDateTime>>,
    pub is_qualified: Option<bool>,
}

use std::str::FromStr;

use rust_decimal::Decimal;
use serde_json::Value;
use time::{
    format_description::well_known::Rfc3339, macros::format_description, Date, OffsetDateTime,
    PrimitiveDateTime,
};

use crate::{
    error::AppError,
    leads::{
        dto::{CreateLeadRequest, UpdateLeadRequest},
        repo_types::{LeadChanges, LeadSource, LeadStatus, NewLead},
    },
    validation::{is_valid_email, normalize_email},
};

pub const MIN_SCORE: i32 = 0;
pub const MAX_SCORE: i32 = 100;

/// NUMERIC(10, 2): eight integer digits, two fraction digits.
const MAX_LEAD_VALUE_SCALE: u32 = 2;
const LEAD_VALUE_BOUND: i64 = 100_000_000;

impl TryFrom<CreateLeadRequest> for NewLead {
    type Error = AppError;

    fn try_from(req: CreateLeadRequest) -> Result<Self, Self::Error> {
        Ok(NewLead {
            first_name: required_text("first_name", &req.first_name)?,
            last_name: required_text("last_name", &req.last_name)?,
            email: email(&req.email)?,
            phone: optional_text(req.phone),
            company: optional_text(req.company),
            city: optional_text(req.city),
            state: optional_text(req.state),
            source: req.source.as_deref().map(source).transpose()?.unwrap_or_default(),
            status: req.status.as_deref().map(status).transpose()?.unwrap_or_default(),
            score: req.score.as_ref().map(score).transpose()?.flatten(),
            lead_value: req.lead_value.as_ref().map(lead_value).transpose()?.flatten(),
            last_activity_at: req
                .last_activity_at
                .as_ref()
                .map(timestamp)
                .transpose()?
                .flatten(),
            is_qualified: req.is_qualified.unwrap_or(false),
        })
    }
}

impl TryFrom<UpdateLeadRequest> for LeadChanges {
    type Error = AppError;

    fn try_from(req: UpdateLeadRequest) -> Result<Self, Self::Error> {
        Ok(LeadChanges {
            first_name: req
                .first_name
                .as_deref()
                .map(|v| required_text("first_name", v))
                .transpose()?,
            last_name: req
                .last_name
                .as_deref()
                .map(|v| required_text("last_name", v))
                .transpose()?,
            email: req.email.as_deref().map(email).transpose()?,
            phone: req.phone.map(optional_text),
            company: req.company.map(optional_text),
            city: req.city.map(optional_text),
            state: req.state.map(optional_text),
            source: req.source.as_deref().map(source).transpose()?,
            status: req.status.as_deref().map(status).transpose()?,
            score: req.score.as_ref().map(score).transpose()?,
            lead_value: req.lead_value.as_ref().map(lead_value).transpose()?,
            last_activity_at: req.last_activity_at.as_ref().map(timestamp).transpose()?,
            is_qualified: req.is_qualified,
        })
    }
}

fn required_text(field: &str, value: &str) -> Result<String, AppError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AppError::validation(format!("{field} is required")));
    }
    Ok(value.to_string())
}

fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn email(value: &str) -> Result<String, AppError> {
    let email = normalize_email(value);
    if !is_valid_email(&email) {
        return Err(AppError::validation("Invalid email"));
    }
    Ok(email)
}

pub(crate) fn status(value: &str) -> Result<LeadStatus, AppError> {
    LeadStatus::from_str(value.trim()).map_err(|e| AppError::validation(e.to_string()))
}

pub(crate) fn source(value: &str) -> Result<LeadSource, AppError> {
    LeadSource::from_str(value.trim()).map_err(|e| AppError::validation(e.to_string()))
}

fn blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

/// Out-of-range scores are rejected, never clamped.
fn score(value: &Value) -> Result<Option<i32>, AppError> {
    if blank(value) {
        return Ok(None);
    }
    let n = match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
    .ok_or_else(|| AppError::validation("score must be an integer"))?;

    if n < i64::from(MIN_SCORE) || n > i64::from(MAX_SCORE) {
        return Err(AppError::validation(format!(
            "score must be between {MIN_SCORE} and {MAX_SCORE}"
        )));
    }
    Ok(Some(n as i32))
}

fn lead_value(value: &Value) -> Result<Option<Decimal>, AppError> {
    if blank(value) {
        return Ok(None);
    }
    let raw = match value {
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.trim().to_string(),
        _ => return Err(AppError::validation("lead_value must be a number")),
    };
    let d = Decimal::from_str(&raw)
        .map_err(|_| AppError::validation("lead_value must be a number"))?
        .normalize();

    if d.is_sign_negative() {
        return Err(AppError::validation("lead_value must not be negative"));
    }
    if d.scale() > MAX_LEAD_VALUE_SCALE {
        return Err(AppError::validation(
            "lead_value may have at most 2 decimal places",
        ));
    }
    if d >= Decimal::from(LEAD_VALUE_BOUND) {
        return Err(AppError::validation("lead_value is too large"));
    }
    Ok(Some(d))
}

/// Accepts RFC 3339, `datetime-local` input (`2024-05-01T13:45`, read as UTC)
/// and plain dates.
fn timestamp(value: &Value) -> Result<Option<OffsetDateTime>, AppError> {
    if blank(value) {
        return Ok(None);
    }
    let Value::String(s) = value else {
        return Err(AppError::validation("last_activity_at must be a date string"));
    };
    let s = s.trim();

    if let Ok(ts) = OffsetDateTime::parse(s, &Rfc3339) {
        return Ok(Some(ts));
    }
    let local = format_description!("[year]-[month]-[day]T[hour]:[minute]");
    if let Ok(ts) = PrimitiveDateTime::parse(s, &local) {
        return Ok(Some(ts.assume_utc()));
    }
    let date = format_description!("[year]-[month]-[day]");
    if let Ok(d) = Date::parse(s, &date) {
        return Ok(Some(d.midnight().assume_utc()));
    }
    Err(AppError::validation("last_activity_at must be a date string"))
}

use crate::{
    error::AppError,
    leads::{
        dto::LeadListParams,
        repo_types::{LeadSource, LeadStatus},
        validate,
    },
};

pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_LIMIT: i64 = 20;
pub const MAX_LIMIT: i64 = 100;

/// Columns a lead list can be ordered by.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortField {
    #[default]
    CreatedAt,
    UpdatedAt,
    FirstName,
    LastName,
    Email,
    Phone,
    Company,
    City,
    State,
    Source,
    Status,
    Score,
    LeadValue,
    LastActivityAt,
    IsQualified,
}

impl SortField {
    const ALL: [SortField; 15] = [
        SortField::CreatedAt,
        SortField::UpdatedAt,
        SortField::FirstName,
        SortField::LastName,
        SortField::Email,
        SortField::Phone,
        SortField::Company,
        SortField::City,
        SortField::State,
        SortField::Source,
        SortField::Status,
        SortField::Score,
        SortField::LeadValue,
        SortField::LastActivityAt,
        SortField::IsQualified,
    ];

    /// Column name; also the accepted `sortBy` value.
    pub fn column(self) -> &'static str {
        match self {
            SortField::CreatedAt => "created_at",
            SortField::UpdatedAt => "updated_at",
            SortField::FirstName => "first_name",
            SortField::LastName => "last_name",
            SortField::Email => "email",
            SortField::Phone => "phone",
            SortField::Company => "company",
            SortField::City => "city",
            SortField::State => "state",
            SortField::Source => "source",
            SortField::Status => "status",
            SortField::Score => "score",
            SortField::LeadValue => "lead_value",
            SortField::LastActivityAt => "last_activity_at",
            SortField::IsQualified => "is_qualified",
        }
    }

    fn parse(raw: &str) -> Result<Self, AppError> {
        SortField::ALL
            .into_iter()
            .find(|f| f.column() == raw)
            .ok_or_else(|| AppError::validation(format!("Invalid sortBy: {raw}")))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    pub fn keyword(self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }

    fn parse(raw: &str) -> Result<Self, AppError> {
        if raw.eq_ignore_ascii_case("asc") {
            Ok(SortDirection::Asc)
        } else if raw.eq_ignore_ascii_case("desc") {
            Ok(SortDirection::Desc)
        } else {
            Err(AppError::validation(format!("Invalid sortOrder: {raw}")))
        }
    }
}

/// Conjunctive filters applied on top of the owner restriction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LeadFilter {
    /// Case-insensitive substring of first name, last name, email or company.
    pub search: Option<String>,
    pub status: Option<LeadStatus>,
    pub source: Option<LeadSource>,
    /// Inclusive.
    pub min_score: Option<i32>,
    /// Inclusive.
    pub max_score: Option<i32>,
    pub is_qualified: Option<bool>,
}

/// A validated `GET /leads` request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeadQuery {
    pub page: i64,
    pub limit: i64,
    pub filter: LeadFilter,
    pub sort: SortField,
    pub direction: SortDirection,
}

impl Default for LeadQuery {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
            filter: LeadFilter::default(),
            sort: SortField::default(),
            direction: SortDirection::default(),
        }
    }
}

impl LeadQuery {
    /// Rows to skip. Parsed queries are guaranteed not to overflow here.
    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }
}

pub fn total_pages(total: i64, limit: i64) -> i64 {
    if total <= 0 {
        0
    } else {
        (total + limit - 1) / limit
    }
}

/// Empty strings count as "not supplied"; grids send `?status=` for a cleared filter.
fn supplied(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn int_param(name: &str, value: &Option<String>) -> Result<Option<i64>, AppError> {
    supplied(value)
        .map(|v| {
            v.parse::<i64>()
                .map_err(|_| AppError::validation(format!("{name} must be an integer")))
        })
        .transpose()
}

impl TryFrom<LeadListParams> for LeadQuery {
    type Error = AppError;

    fn try_from(p: LeadListParams) -> Result<Self, Self::Error> {
        let page = int_param("page", &p.page)?.unwrap_or(DEFAULT_PAGE);
        if page < 1 {
            return Err(AppError::validation("page must be at least 1"));
        }
        let limit = int_param("limit", &p.limit)?.unwrap_or(DEFAULT_LIMIT);
        if !(1..=MAX_LIMIT).contains(&limit) {
            return Err(AppError::validation(format!(
                "limit must be between 1 and {MAX_LIMIT}"
            )));
        }
        if (page - 1).checked_mul(limit).is_none() {
            return Err(AppError::validation("page is out of range"));
        }

        let score_bound = |name: &str, v: &Option<String>| -> Result<Option<i32>, AppError> {
            int_param(name, v)?
                .map(|n| {
                    i32::try_from(n)
                        .map_err(|_| AppError::validation(format!("{name} is out of range")))
                })
                .transpose()
        };

        let is_qualified = match supplied(&p.is_qualified) {
            None => None,
            Some("true") => Some(true),
            Some("false") => Some(false),
            Some(other) => {
                return Err(AppError::validation(format!(
                    "is_qualified must be true or false, got {other}"
                )))
            }
        };

        let filter = LeadFilter {
            search: p.search.filter(|v| !v.trim().is_empty()),
            status: supplied(&p.status).map(validate::status).transpose()?,
            source: supplied(&p.source).map(validate::source).transpose()?,
            min_score: score_bound("min_score", &p.min_score)?,
            max_score: score_bound("max_score", &p.max_score)?,
            is_qualified,
        };

        Ok(LeadQuery {
            page,
            limit,
            filter,
            sort: supplied(&p.sort_by)
                .map(SortField::parse)
                .transpose()?
                .unwrap_or_default(),
            direction: supplied(&p.sort_order)
                .map(SortDirection::parse)
                .transpose()?
                .unwrap_or_default(),
        })
    }
}

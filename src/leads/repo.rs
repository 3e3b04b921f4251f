use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{
    error::AppError,
    leads::{
        query::{LeadFilter, LeadQuery},
        repo_types::{Lead, LeadChanges, NewLead},
    },
};

/// Persistence for leads. Every call is scoped to `owner`; rows belonging to
/// someone else behave exactly like rows that do not exist.
#[async_trait]
pub trait LeadStore: Send + Sync {
    /// Fails with `DuplicateEmail` if the email is used by any lead.
    async fn insert(&self, owner: Uuid, lead: &NewLead) -> Result<Lead, AppError>;
    async fn find(&self, owner: Uuid, id: i64) -> Result<Option<Lead>, AppError>;
    /// Returns the requested page and the row count of the whole filtered set.
    async fn list(&self, owner: Uuid, query: &LeadQuery) -> Result<(Vec<Lead>, i64), AppError>;
    /// Applies `changes` and advances `updated_at`. `None` if no such lead.
    async fn update(
        &self,
        owner: Uuid,
        id: i64,
        changes: &LeadChanges,
    ) -> Result<Option<Lead>, AppError>;
    /// Hard delete. `false` if no such lead.
    async fn delete(&self, owner: Uuid, id: i64) -> Result<bool, AppError>;
}

const LEAD_COLUMNS: &str = "id, user_id, first_name, last_name, email, phone, company, city, \
     state, source, status, score, lead_value, last_activity_at, is_qualified, created_at, updated_at";

#[derive(Clone)]
pub struct PgLeadStore {
    db: PgPool,
}

impl PgLeadStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

/// Escapes LIKE metacharacters so search text matches literally.
fn like_pattern(search: &str) -> String {
    let mut escaped = String::with_capacity(search.len() + 2);
    escaped.push('%');
    for c in search.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

/// `WHERE` clause; the owner predicate always comes first.
fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, owner: Uuid, filter: &LeadFilter) {
    qb.push(" WHERE user_id = ").push_bind(owner);

    if let Some(search) = &filter.search {
        let pattern = like_pattern(search);
        qb.push(" AND (first_name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR last_name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR email ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR company ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
    if let Some(status) = filter.status {
        qb.push(" AND status = ").push_bind(status);
    }
    if let Some(source) = filter.source {
        qb.push(" AND source = ").push_bind(source);
    }
    if let Some(min) = filter.min_score {
        qb.push(" AND score >= ").push_bind(min);
    }
    if let Some(max) = filter.max_score {
        qb.push(" AND score <= ").push_bind(max);
    }
    if let Some(q) = filter.is_qualified {
        qb.push(" AND is_qualified = ").push_bind(q);
    }
}

#[async_trait]
impl LeadStore for PgLeadStore {
    async fn insert(&self, owner: Uuid, lead: &NewLead) -> Result<Lead, AppError> {
        let row = sqlx::query_as::<_, Lead>(&format!(
            r#"
            INSERT INTO leads (user_id, first_name, last_name, email, phone, company, city, state,
                               source, status, score, lead_value, last_activity_at, is_qualified)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            RETURNING {LEAD_COLUMNS}
            "#
        ))
        .bind(owner)
        .bind(&lead.first_name)
        .bind(&lead.last_name)
        .bind(&lead.email)
        .bind(&lead.phone)
        .bind(&lead.company)
        .bind(&lead.city)
        .bind(&lead.state)
        .bind(lead.source)
        .bind(lead.status)
        .bind(lead.score)
        .bind(lead.lead_value)
        .bind(lead.last_activity_at)
        .bind(lead.is_qualified)
        .fetch_one(&self.db)
        .await?;
        Ok(row)
    }

    async fn find(&self, owner: Uuid, id: i64) -> Result<Option<Lead>, AppError> {
        let row = sqlx::query_as::<_, Lead>(&format!(
            "SELECT {LEAD_COLUMNS} FROM leads WHERE user_id = $1 AND id = $2"
        ))
        .bind(owner)
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(row)
    }

    async fn list(&self, owner: Uuid, query: &LeadQuery) -> Result<(Vec<Lead>, i64), AppError> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM leads");
        push_filters(&mut count, owner, &query.filter);
        let total: i64 = count.build_query_scalar().fetch_one(&self.db).await?;

        let mut select = QueryBuilder::<Postgres>::new(format!("SELECT {LEAD_COLUMNS} FROM leads"));
        push_filters(&mut select, owner, &query.filter);
        // sort column comes from a closed enum, never from raw input
        select
            .push(" ORDER BY ")
            .push(query.sort.column())
            .push(" ")
            .push(query.direction.keyword())
            .push(" NULLS LAST, id ASC LIMIT ")
            .push_bind(query.limit)
            .push(" OFFSET ")
            .push_bind(query.offset());
        let rows = select
            .build_query_as::<Lead>()
            .fetch_all(&self.db)
            .await?;

        Ok((rows, total))
    }

    async fn update(
        &self,
        owner: Uuid,
        id: i64,
        changes: &LeadChanges,
    ) -> Result<Option<Lead>, AppError> {
        let mut qb = QueryBuilder::<Postgres>::new("UPDATE leads SET ");
        let mut set = qb.separated(", ");
        if let Some(v) = &changes.first_name {
            set.push("first_name = ").push_bind_unseparated(v.clone());
        }
        if let Some(v) = &changes.last_name {
            set.push("last_name = ").push_bind_unseparated(v.clone());
        }
        if let Some(v) = &changes.email {
            set.push("email = ").push_bind_unseparated(v.clone());
        }
        if let Some(v) = &changes.phone {
            set.push("phone = ").push_bind_unseparated(v.clone());
        }
        if let Some(v) = &changes.company {
            set.push("company = ").push_bind_unseparated(v.clone());
        }
        if let Some(v) = &changes.city {
            set.push("city = ").push_bind_unseparated(v.clone());
        }
        if let Some(v) = &changes.state {
            set.push("state = ").push_bind_unseparated(v.clone());
        }
        if let Some(v) = changes.source {
            set.push("source = ").push_bind_unseparated(v);
        }
        if let Some(v) = changes.status {
            set.push("status = ").push_bind_unseparated(v);
        }
        if let Some(v) = changes.score {
            set.push("score = ").push_bind_unseparated(v);
        }
        if let Some(v) = changes.lead_value {
            set.push("lead_value = ").push_bind_unseparated(v);
        }
        if let Some(v) = changes.last_activity_at {
            set.push("last_activity_at = ").push_bind_unseparated(v);
        }
        if let Some(v) = changes.is_qualified {
            set.push("is_qualified = ").push_bind_unseparated(v);
        }
        // strictly increasing even when two writes land in the same clock tick
        set.push("updated_at = GREATEST(now(), updated_at + INTERVAL '1 microsecond')");

        qb.push(" WHERE user_id = ")
            .push_bind(owner)
            .push(" AND id = ")
            .push_bind(id)
            .push(format!(" RETURNING {LEAD_COLUMNS}"));

        let row = qb
            .build_query_as::<Lead>()
            .fetch_optional(&self.db)
            .await?;
        Ok(row)
    }

    async fn delete(&self, owner: Uuid, id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM leads WHERE user_id = $1 AND id = $2")
            .bind(owner)
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

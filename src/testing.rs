//! In-memory stores for unit tests. They mirror the Postgres semantics the
//! services rely on: unique emails, owner scoping, filter/sort/page rules and
//! strictly increasing timestamps.

use std::{cmp::Ordering, collections::HashMap, sync::Mutex};

use async_trait::async_trait;
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use crate::{
    auth::{
        repo::UserStore,
        repo_types::{NewUser, User},
    },
    error::AppError,
    leads::{
        query::{LeadFilter, LeadQuery, SortDirection, SortField},
        repo::LeadStore,
        repo_types::{Lead, LeadChanges, NewLead},
    },
};

#[derive(Default)]
pub struct MemoryUserStore {
    users: Mutex<Vec<User>>,
}

impl MemoryUserStore {
    pub fn len(&self) -> usize {
        self.users.lock().unwrap().len()
    }

    /// Simulates an out-of-band account deletion.
    pub fn remove(&self, id: Uuid) {
        self.users.lock().unwrap().retain(|u| u.id != id);
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.id == id)
            .cloned())
    }

    async fn create(&self, user: &NewUser) -> Result<User, AppError> {
        let mut users = self.users.lock().unwrap();
        if users.iter().any(|u| u.email == user.email) {
            return Err(AppError::DuplicateEmail);
        }
        let row = User {
            id: Uuid::new_v4(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            email: user.email.clone(),
            password_hash: user.password_hash.clone(),
            created_at: OffsetDateTime::now_utc(),
        };
        users.push(row.clone());
        Ok(row)
    }
}

#[derive(Default)]
struct LeadTable {
    rows: HashMap<i64, Lead>,
    next_id: i64,
    last_tick: Option<OffsetDateTime>,
}

impl LeadTable {
    fn tick(&mut self) -> OffsetDateTime {
        let now = OffsetDateTime::now_utc();
        let ts = match self.last_tick {
            Some(prev) if now <= prev => prev + Duration::microseconds(1),
            _ => now,
        };
        self.last_tick = Some(ts);
        ts
    }

    fn email_taken(&self, email: &str, except: Option<i64>) -> bool {
        self.rows
            .values()
            .any(|l| l.email == email && Some(l.id) != except)
    }
}

#[derive(Default)]
pub struct MemoryLeadStore {
    table: Mutex<LeadTable>,
}

impl MemoryLeadStore {
    pub fn len(&self) -> usize {
        self.table.lock().unwrap().rows.len()
    }
}

fn contains_ci(haystack: Option<&str>, needle: &str) -> bool {
    haystack.is_some_and(|h| h.to_lowercase().contains(&needle.to_lowercase()))
}

fn matches_filter(lead: &Lead, f: &LeadFilter) -> bool {
    if let Some(s) = &f.search {
        let hit = contains_ci(Some(lead.first_name.as_str()), s)
            || contains_ci(Some(lead.last_name.as_str()), s)
            || contains_ci(Some(lead.email.as_str()), s)
            || contains_ci(lead.company.as_deref(), s);
        if !hit {
            return false;
        }
    }
    if f.status.is_some_and(|s| s != lead.status) || f.source.is_some_and(|s| s != lead.source) {
        return false;
    }
    // NULL scores never satisfy a bound, as in SQL
    if let Some(min) = f.min_score {
        if !lead.score.is_some_and(|s| s >= min) {
            return false;
        }
    }
    if let Some(max) = f.max_score {
        if !lead.score.is_some_and(|s| s <= max) {
            return false;
        }
    }
    if f.is_qualified.is_some_and(|q| q != lead.is_qualified) {
        return false;
    }
    true
}

/// `Some` sorts before `None` regardless of direction (NULLS LAST).
fn nulls_last<T: Ord>(a: Option<T>, b: Option<T>, dir: SortDirection) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => directed(a.cmp(&b), dir),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn directed(o: Ordering, dir: SortDirection) -> Ordering {
    match dir {
        SortDirection::Asc => o,
        SortDirection::Desc => o.reverse(),
    }
}

fn compare(a: &Lead, b: &Lead, field: SortField, dir: SortDirection) -> Ordering {
    let primary = match field {
        SortField::CreatedAt => directed(a.created_at.cmp(&b.created_at), dir),
        SortField::UpdatedAt => directed(a.updated_at.cmp(&b.updated_at), dir),
        SortField::FirstName => directed(a.first_name.cmp(&b.first_name), dir),
        SortField::LastName => directed(a.last_name.cmp(&b.last_name), dir),
        SortField::Email => directed(a.email.cmp(&b.email), dir),
        SortField::Phone => nulls_last(a.phone.as_ref(), b.phone.as_ref(), dir),
        SortField::Company => nulls_last(a.company.as_ref(), b.company.as_ref(), dir),
        SortField::City => nulls_last(a.city.as_ref(), b.city.as_ref(), dir),
        SortField::State => nulls_last(a.state.as_ref(), b.state.as_ref(), dir),
        // Postgres orders enums by declaration order
        SortField::Source => directed((a.source as u8).cmp(&(b.source as u8)), dir),
        SortField::Status => directed((a.status as u8).cmp(&(b.status as u8)), dir),
        SortField::Score => nulls_last(a.score, b.score, dir),
        SortField::LeadValue => nulls_last(a.lead_value, b.lead_value, dir),
        SortField::LastActivityAt => nulls_last(a.last_activity_at, b.last_activity_at, dir),
        SortField::IsQualified => directed(a.is_qualified.cmp(&b.is_qualified), dir),
    };
    primary.then(a.id.cmp(&b.id))
}

/// Field-by-field equivalent of the partial `UPDATE` in `PgLeadStore`.
fn apply_changes(changes: &LeadChanges, lead: &mut Lead) {
    if let Some(v) = &changes.first_name {
        lead.first_name = v.clone();
    }
    if let Some(v) = &changes.last_name {
        lead.last_name = v.clone();
    }
    if let Some(v) = &changes.email {
        lead.email = v.clone();
    }
    if let Some(v) = &changes.phone {
        lead.phone = v.clone();
    }
    if let Some(v) = &changes.company {
        lead.company = v.clone();
    }
    if let Some(v) = &changes.city {
        lead.city = v.clone();
    }
    if let Some(v) = &changes.state {
        lead.state = v.clone();
    }
    if let Some(v) = changes.source {
        lead.source = v;
    }
    if let Some(v) = changes.status {
        lead.status = v;
    }
    if let Some(v) = changes.score {
        lead.score = v;
    }
    if let Some(v) = changes.lead_value {
        lead.lead_value = v;
    }
    if let Some(v) = changes.last_activity_at {
        lead.last_activity_at = v;
    }
    if let Some(v) = changes.is_qualified {
        lead.is_qualified = v;
    }
}

#[async_trait]
impl LeadStore for MemoryLeadStore {
    async fn insert(&self, owner: Uuid, lead: &NewLead) -> Result<Lead, AppError> {
        let mut table = self.table.lock().unwrap();
        if table.email_taken(&lead.email, None) {
            return Err(AppError::DuplicateEmail);
        }
        table.next_id += 1;
        let now = table.tick();
        let row = Lead {
            id: table.next_id,
            user_id: owner,
            first_name: lead.first_name.clone(),
            last_name: lead.last_name.clone(),
            email: lead.email.clone(),
            phone: lead.phone.clone(),
            company: lead.company.clone(),
            city: lead.city.clone(),
            state: lead.state.clone(),
            source: lead.source,
            status: lead.status,
            score: lead.score,
            lead_value: lead.lead_value,
            last_activity_at: lead.last_activity_at,
            is_qualified: lead.is_qualified,
            created_at: now,
            updated_at: now,
        };
        table.rows.insert(row.id, row.clone());
        Ok(row)
    }

    async fn find(&self, owner: Uuid, id: i64) -> Result<Option<Lead>, AppError> {
        let table = self.table.lock().unwrap();
        Ok(table.rows.get(&id).filter(|l| l.user_id == owner).cloned())
    }

    async fn list(&self, owner: Uuid, query: &LeadQuery) -> Result<(Vec<Lead>, i64), AppError> {
        let table = self.table.lock().unwrap();
        let mut rows: Vec<&Lead> = table
            .rows
            .values()
            .filter(|l| l.user_id == owner)
            .filter(|l| matches_filter(l, &query.filter))
            .collect();
        rows.sort_by(|a, b| compare(a, b, query.sort, query.direction));
        let total = rows.len() as i64;
        let page = rows
            .into_iter()
            .skip(query.offset() as usize)
            .take(query.limit as usize)
            .cloned()
            .collect();
        Ok((page, total))
    }

    async fn update(
        &self,
        owner: Uuid,
        id: i64,
        changes: &LeadChanges,
    ) -> Result<Option<Lead>, AppError> {
        let mut table = self.table.lock().unwrap();
        let Some(current) = table.rows.get(&id).filter(|l| l.user_id == owner).cloned() else {
            return Ok(None);
        };
        if let Some(email) = &changes.email {
            if table.email_taken(email, Some(id)) {
                return Err(AppError::DuplicateEmail);
            }
        }
        let mut updated = current;
        apply_changes(changes, &mut updated);
        updated.updated_at = table.tick();
        table.rows.insert(id, updated.clone());
        Ok(Some(updated))
    }

    async fn delete(&self, owner: Uuid, id: i64) -> Result<bool, AppError> {
        let mut table = self.table.lock().unwrap();
        if table.rows.get(&id).is_some_and(|l| l.user_id == owner) {
            table.rows.remove(&id);
            return Ok(true);
        }
        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_update_clears_only_named_nullable_fields() {
        let store = MemoryLeadStore::default();
        let owner = Uuid::new_v4();
        let lead = store
            .insert(
                owner,
                &NewLead {
                    first_name: "Ann".into(),
                    last_name: "Lee".into(),
                    email: "ann@x.com".into(),
                    phone: Some("555".into()),
                    company: Some("Acme".into()),
                    score: Some(10),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let changes = LeadChanges {
            phone: Some(None),
            score: Some(Some(90)),
            ..Default::default()
        };
        let updated = store.update(owner, lead.id, &changes).await.unwrap().unwrap();
        assert_eq!(updated.phone, None);
        assert_eq!(updated.score, Some(90));
        assert_eq!(updated.company.as_deref(), Some("Acme"));
        assert_eq!(updated.first_name, "Ann");
        assert!(updated.updated_at > lead.updated_at);
    }
}

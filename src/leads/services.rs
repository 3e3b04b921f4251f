use std::sync::Arc;

use axum::extract::FromRef;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    error::AppError,
    leads::{
        dto::{CreateLeadRequest, LeadListParams, LeadPage, UpdateLeadRequest},
        query::{total_pages, LeadQuery},
        repo::LeadStore,
        repo_types::{Lead, LeadChanges, NewLead},
    },
    state::AppState,
};

const NOT_FOUND: AppError = AppError::NotFound("Lead");

/// Owner-scoped lead operations. `owner` always comes from the validated
/// session, never from the request body.
#[derive(Clone)]
pub struct LeadService {
    store: Arc<dyn LeadStore>,
}

impl FromRef<AppState> for LeadService {
    fn from_ref(state: &AppState) -> Self {
        Self::new(state.leads.clone())
    }
}

impl LeadService {
    pub fn new(store: Arc<dyn LeadStore>) -> Self {
        Self { store }
    }

    pub async fn list(&self, owner: Uuid, params: LeadListParams) -> Result<LeadPage, AppError> {
        let query = LeadQuery::try_from(params)
            .inspect_err(|e| warn!(%owner, error = %e, "rejected list query"))?;
        self.list_query(owner, &query).await
    }

    pub async fn list_query(&self, owner: Uuid, query: &LeadQuery) -> Result<LeadPage, AppError> {
        let (data, total) = self.store.list(owner, query).await?;
        debug!(%owner, total, returned = data.len(), "leads listed");
        Ok(LeadPage {
            data,
            page: query.page,
            limit: query.limit,
            total,
            total_pages: total_pages(total, query.limit),
        })
    }

    pub async fn create(&self, owner: Uuid, req: CreateLeadRequest) -> Result<Lead, AppError> {
        let new_lead = NewLead::try_from(req)
            .inspect_err(|e| warn!(%owner, error = %e, "rejected lead"))?;
        self.insert(owner, &new_lead).await
    }

    pub async fn insert(&self, owner: Uuid, new_lead: &NewLead) -> Result<Lead, AppError> {
        let lead = self.store.insert(owner, new_lead).await?;
        info!(%owner, lead_id = lead.id, "lead created");
        Ok(lead)
    }

    pub async fn get(&self, owner: Uuid, id: i64) -> Result<Lead, AppError> {
        self.store.find(owner, id).await?.ok_or(NOT_FOUND)
    }

    pub async fn update(
        &self,
        owner: Uuid,
        id: i64,
        req: UpdateLeadRequest,
    ) -> Result<Lead, AppError> {
        let changes = LeadChanges::try_from(req)
            .inspect_err(|e| warn!(%owner, lead_id = id, error = %e, "rejected lead changes"))?;
        let lead = self
            .store
            .update(owner, id, &changes)
            .await?
            .ok_or(NOT_FOUND)?;
        info!(%owner, lead_id = id, "lead updated");
        Ok(lead)
    }

    pub async fn delete(&self, owner: Uuid, id: i64) -> Result<(), AppError> {
        if !self.store.delete(owner, id).await? {
            return Err(NOT_FOUND);
        }
        info!(%owner, lead_id = id, "lead deleted");
        Ok(())
    }
}

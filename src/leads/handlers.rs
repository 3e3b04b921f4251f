use axum::{
    extract::State,
    http::{header::LOCATION, StatusCode},
    response::IntoResponse,
    routing::get,
    Router,
};
use tracing::instrument;

use crate::{
    auth::extractors::CurrentUser,
    error::AppError,
    extract::{Json, Path, Query},
    leads::{
        dto::{CreateLeadRequest, LeadListParams, LeadPage, UpdateLeadRequest},
        repo_types::Lead,
        services::LeadService,
    },
    state::AppState,
};

// --- public routers ---

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/leads", get(list_leads))
        .route("/leads/:id", get(get_lead))
}

pub fn write_routes() -> Router<AppState> {
    Router::new()
        .route("/leads", axum::routing::post(create_lead))
        .route("/leads/:id", axum::routing::put(update_lead).delete(delete_lead))
}

// --- handlers ---

#[instrument(skip(leads, user), fields(user_id = %user.id))]
pub async fn list_leads(
    State(leads): State<LeadService>,
    CurrentUser(user): CurrentUser,
    Query(params): Query<LeadListParams>,
) -> Result<Json<LeadPage>, AppError> {
    Ok(Json(leads.list(user.id, params).await?))
}

#[instrument(skip(leads, user, body), fields(user_id = %user.id))]
pub async fn create_lead(
    State(leads): State<LeadService>,
    CurrentUser(user): CurrentUser,
    Json(body): Json<CreateLeadRequest>,
) -> Result<impl IntoResponse, AppError> {
    let lead = leads.create(user.id, body).await?;
    let location = format!("/api/leads/{}", lead.id);
    Ok((StatusCode::CREATED, [(LOCATION, location)], Json(lead)))
}

#[instrument(skip(leads, user), fields(user_id = %user.id))]
pub async fn get_lead(
    State(leads): State<LeadService>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<Lead>, AppError> {
    Ok(Json(leads.get(user.id, id).await?))
}

#[instrument(skip(leads, user, body), fields(user_id = %user.id))]
pub async fn update_lead(
    State(leads): State<LeadService>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
    Json(body): Json<UpdateLeadRequest>,
) -> Result<Json<Lead>, AppError> {
    Ok(Json(leads.update(user.id, id, body).await?))
}

#[instrument(skip(leads, user), fields(user_id = %user.id))]
pub async fn delete_lead(
    State(leads): State<LeadService>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    leads.delete(user.id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

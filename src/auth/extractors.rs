use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};

use super::{cookies::token_from_headers, repo_types::User, services::SessionManager};
use crate::{error::AppError, state::AppState};

/// The user behind a valid session; rejects with 401 otherwise.
pub struct CurrentUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = token_from_headers(&parts.headers).ok_or(AppError::Unauthenticated)?;
        let user = SessionManager::from_ref(state).validate(token).await?;
        Ok(CurrentUser(user))
    }
}

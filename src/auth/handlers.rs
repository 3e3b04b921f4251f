use axum::{
    extract::State,
    http::{header::SET_COOKIE, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use tracing::{info, instrument};

use crate::{
    auth::{
        dto::{AuthResponse, LoginRequest, MessageResponse, PublicUser, RegisterRequest},
        extractors::CurrentUser,
        services::SessionManager,
    },
    error::AppError,
    extract::Json,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
        .route("/auth/me", get(me))
}

#[instrument(skip(sessions, payload))]
pub async fn register(
    State(sessions): State<SessionManager>,
    Json(payload): Json<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    let session = sessions
        .register(
            &payload.first_name,
            &payload.last_name,
            &payload.email,
            &payload.password,
        )
        .await?;
    let cookie = sessions.cookie_for(&session);
    Ok((
        StatusCode::CREATED,
        [(SET_COOKIE, cookie)],
        Json(AuthResponse {
            message: "User created successfully",
            user: PublicUser::from(session.user),
        }),
    ))
}

#[instrument(skip(sessions, payload))]
pub async fn login(
    State(sessions): State<SessionManager>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let session = sessions
        .authenticate(&payload.email, &payload.password)
        .await?;
    let cookie = sessions.cookie_for(&session);
    Ok((
        [(SET_COOKIE, cookie)],
        Json(AuthResponse {
            message: "Login successful",
            user: PublicUser::from(session.user),
        }),
    ))
}

#[instrument(skip(sessions))]
pub async fn logout(State(sessions): State<SessionManager>) -> impl IntoResponse {
    info!("session cleared");
    (
        [(SET_COOKIE, sessions.revoke())],
        Json(MessageResponse {
            message: "Logout successful",
        }),
    )
}

#[instrument(skip_all)]
pub async fn me(CurrentUser(user): CurrentUser) -> Json<PublicUser> {
    Json(PublicUser::from(user))
}

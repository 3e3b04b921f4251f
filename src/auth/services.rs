use std::sync::Arc;

use axum::extract::FromRef;
use tracing::{info, warn};

use crate::{
    auth::{
        cookies::{clear_session_cookie, session_cookie},
        jwt::JwtKeys,
        password::{hash_password_blocking, verify_password_blocking},
        repo::UserStore,
        repo_types::{NewUser, User},
    },
    error::AppError,
    state::AppState,
    validation::{is_valid_email, normalize_email},
};

pub const MIN_PASSWORD_LEN: usize = 8;

/// A user together with the token just issued for them.
#[derive(Debug, Clone)]
pub struct Session {
    pub user: User,
    pub token: String,
}

/// Issues, validates and revokes session tokens.
///
/// Tokens are stateless: revoking only tells the browser to drop the cookie,
/// a copied token stays valid until it expires.
#[derive(Clone)]
pub struct SessionManager {
    users: Arc<dyn UserStore>,
    keys: JwtKeys,
    cookie_secure: bool,
}

impl FromRef<AppState> for SessionManager {
    fn from_ref(state: &AppState) -> Self {
        Self::new(
            state.users.clone(),
            JwtKeys::from_ref(state),
            state.config.cookie_secure,
        )
    }
}

impl SessionManager {
    pub fn new(users: Arc<dyn UserStore>, keys: JwtKeys, cookie_secure: bool) -> Self {
        Self {
            users,
            keys,
            cookie_secure,
        }
    }

    pub async fn register(
        &self,
        first_name: &str,
        last_name: &str,
        email: &str,
        password: &str,
    ) -> Result<Session, AppError> {
        let first_name = first_name.trim();
        let last_name = last_name.trim();
        let email = normalize_email(email);

        if first_name.is_empty() || last_name.is_empty() {
            return Err(AppError::validation("First and last name are required"));
        }
        if !is_valid_email(&email) {
            warn!(email = %email, "invalid email");
            return Err(AppError::validation("Invalid email"));
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AppError::validation(format!(
                "Password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }

        if self.users.find_by_email(&email).await?.is_some() {
            warn!(email = %email, "email already registered");
            return Err(AppError::DuplicateEmail);
        }

        let password_hash = hash_password_blocking(password.to_string()).await?;
        // a concurrent registration can still win the race; the unique index reports it
        let user = self
            .users
            .create(&NewUser {
                first_name: first_name.to_string(),
                last_name: last_name.to_string(),
                email,
                password_hash,
            })
            .await?;

        let token = self.keys.sign(user.id, &user.email)?;
        info!(user_id = %user.id, email = %user.email, "user registered");
        Ok(Session { user, token })
    }

    pub async fn authenticate(&self, email: &str, password: &str) -> Result<Session, AppError> {
        let email = normalize_email(email);

        let Some(user) = self.users.find_by_email(&email).await? else {
            warn!(email = %email, "login unknown email");
            return Err(AppError::InvalidCredentials);
        };

        let ok = verify_password_blocking(password.to_string(), user.password_hash.clone()).await?;
        if !ok {
            warn!(user_id = %user.id, "login invalid password");
            return Err(AppError::InvalidCredentials);
        }

        let token = self.keys.sign(user.id, &user.email)?;
        info!(user_id = %user.id, "user logged in");
        Ok(Session { user, token })
    }

    /// Resolves a token to the user it was issued for.
    pub async fn validate(&self, token: &str) -> Result<User, AppError> {
        let claims = self.keys.verify(token).map_err(|e| {
            warn!(error = %e, "invalid or expired token");
            AppError::Unauthenticated
        })?;

        match self.users.find_by_id(claims.sub).await? {
            Some(user) => Ok(user),
            None => {
                warn!(user_id = %claims.sub, "token for unknown user");
                Err(AppError::Unauthenticated)
            }
        }
    }

    /// `Set-Cookie` value that clears the session on the client.
    pub fn revoke(&self) -> String {
        clear_session_cookie(self.cookie_secure)
    }

    /// `Set-Cookie` value delivering `session`'s token.
    pub fn cookie_for(&self, session: &Session) -> String {
        session_cookie(&session.token, self.keys.ttl.as_secs(), self.cookie_secure)
    }
}

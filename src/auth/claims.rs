use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// JWT payload carried in the session cookie.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,     // user ID
    pub email: String, // user email at issue time
    pub iat: usize,    // issued at (unix timestamp)
    pub exp: usize,    // expires at (unix timestamp)
    pub iss: String,
    pub aud: String,
}

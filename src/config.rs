use std::net::SocketAddr;

use anyhow::Context;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_days: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub db_max_connections: u32,
    pub jwt: JwtConfig,
    /// Adds `Secure` to the session cookie.
    pub cookie_secure: bool,
    pub frontend_url: String,
    pub seed_data: bool,
    /// `APP_HOST:APP_PORT`.
    pub listen_addr: SocketAddr,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(var: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let database_url = var("DATABASE_URL").context("DATABASE_URL must be set")?;
        let jwt = JwtConfig {
            secret: var("JWT_SECRET").context("JWT_SECRET must be set")?,
            issuer: var("JWT_ISSUER").unwrap_or_else(|| "leadgrid".into()),
            audience: var("JWT_AUDIENCE").unwrap_or_else(|| "leadgrid-users".into()),
            ttl_days: var("JWT_TTL_DAYS")
                .and_then(|v| v.parse::<i64>().ok())
                .filter(|d| *d > 0)
                .unwrap_or(7),
        };
        let db_max_connections = var("DB_MAX_CONNECTIONS")
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(10);
        let cookie_secure = var("APP_ENV").is_some_and(|v| v.eq_ignore_ascii_case("production"));
        let frontend_url = var("FRONTEND_URL").unwrap_or_else(|| "http://localhost:3000".into());
        let seed_data = var("SEED_DATA").is_some_and(|v| v == "true");
        let host = var("APP_HOST").unwrap_or_else(|| "0.0.0.0".into());
        let port = var("APP_PORT").unwrap_or_else(|| "8080".into());
        let listen_addr = format!("{host}:{port}")
            .parse::<SocketAddr>()
            .with_context(|| format!("invalid APP_HOST/APP_PORT: {host}:{port}"))?;

        Ok(Self {
            database_url,
            db_max_connections,
            jwt,
            cookie_secure,
            frontend_url,
            seed_data,
            listen_addr,
        })
    }
}

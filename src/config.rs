use std::env;

use anyhow::Context;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub jwt: JwtConfig,
    pub cors_allowed_origins: Vec<String>,
}

/// Signing secret and token lifetimes.
#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub access_ttl_hours: i64,
    pub refresh_ttl_days: i64,
}

impl JwtConfig {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            access_ttl_hours: 24 * 30,
            refresh_ttl_days: 30,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = database_url()?;
        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(3000);

        let secret = env::var("JWT_SECRET").context("JWT_SECRET is not set")?;
        let mut jwt = JwtConfig::new(secret);
        if let Some(hours) = env::var("ACCESS_TOKEN_TTL_HOURS")
            .ok()
            .and_then(|v| v.parse::<i64>().ok())
        {
            jwt.access_ttl_hours = hours;
        }
        if let Some(days) = env::var("REFRESH_TOKEN_TTL_DAYS")
            .ok()
            .and_then(|v| v.parse::<i64>().ok())
        {
            jwt.refresh_ttl_days = days;
        }

        let cors_allowed_origins = parse_origins(
            &env::var("CORS_ALLOWED_ORIGINS")
                .unwrap_or_else(|_| "http://localhost:3000,http://127.0.0.1:3000".to_string()),
        );

        Ok(Self {
            port,
            database_url,
            host,
            jwt,
            cors_allowed_origins,
        })
    }
}

/// Just the database connection string, for tools that never serve requests.
pub fn database_url() -> anyhow::Result<String> {
    database_url_from(|key| env::var(key).ok())
}

fn database_url_from(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<String> {
    lookup("DATABASE_URL").context("DATABASE_URL is not set")
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(str::to_string)
        .collect()
}

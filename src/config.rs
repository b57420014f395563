use anyhow::{Context, Result};
use tracing_subscriber::filter::LevelFilter;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    pub jwt_secret: String,
    /// Token and cookie lifetime, in minutes.
    pub jwt_maxage: i64,
    pub port: u16,
    pub cors_origins: Vec<String>,
    pub cookie_secure: bool,
    pub log_level: LevelFilter,
}

fn var_or<T: std::str::FromStr>(name: &str, default: T) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(value) if !value.trim().is_empty() => value
            .trim()
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("{} is invalid: {}", name, e)),
        _ => Ok(default),
    }
}

impl Config {
    pub fn init() -> Result<Config> {
        let jwt_secret = std::env::var("JWT_SECRET_KEY").context("JWT_SECRET_KEY must be set")?;
        let database_url = std::env::var("DATABASE_URL")
            .ok()
            .filter(|url| !url.trim().is_empty());
        let cors_origins = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".to_string())
            .split(',')
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect();

        Ok(Config {
            database_url,
            database_max_connections: var_or("DATABASE_MAX_CONNECTIONS", 10)?,
            jwt_secret,
            jwt_maxage: var_or("JWT_MAXAGE", 1440)?,
            port: var_or("PORT", 8000)?,
            cors_origins,
            cookie_secure: var_or("COOKIE_SECURE", false)?,
            log_level: var_or("LOG_LEVEL", LevelFilter::DEBUG)?,
        })
    }
}

use crate::infrastructure::logging::{LogFormat, LogSettings, DEFAULT_LOG_FILTER};
use anyhow::{bail, Context, Result};
use std::path::PathBuf;

const DEFAULT_HTTP_PORT: u16 = 4000;
const DEFAULT_MAX_CONNECTIONS: u32 = 5;
const DEFAULT_TOKEN_TTL_HOURS: i64 = 24;
const MAX_TOKEN_TTL_HOURS: i64 = 24 * 365;
const DEFAULT_CORS_ORIGINS: &str = "http://localhost:3000,http://127.0.0.1:3000";
const DEFAULT_UPLOAD_DIR: &str = "uploads";

/// Process configuration, read once at startup and shared read-only.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub database_max_connections: u32,
    pub jwt_secret: String,
    pub token_ttl: chrono::Duration,
    pub http_port: u16,
    pub cors_allowed_origins: Vec<String>,
    pub upload_dir: PathBuf,
    pub cookie_secure: bool,
    pub log: LogSettings,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let database_url = required("DATABASE_URL")?;
        let jwt_secret = required("JWT_SECRET")?;

        let database_max_connections =
            parsed("DATABASE_MAX_CONNECTIONS", DEFAULT_MAX_CONNECTIONS)?;
        let token_ttl = ttl_from_hours(parsed("TOKEN_TTL_HOURS", DEFAULT_TOKEN_TTL_HOURS)?)?;
        let http_port = parsed("HTTP_PORT", DEFAULT_HTTP_PORT)?;
        let cookie_secure = parsed("COOKIE_SECURE", true)?;

        // Разрешенные CORS домены через запятую
        let cors_allowed_origins = std::env::var("CORS_ALLOWED_ORIGINS")
            .unwrap_or_else(|_| DEFAULT_CORS_ORIGINS.to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let upload_dir = std::env::var("UPLOAD_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_UPLOAD_DIR));

        let log = LogSettings {
            filter: std::env::var("LOG_FILTER")
                .ok()
                .filter(|f| !f.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string()),
            format: parsed("LOG_FORMAT", LogFormat::Pretty)?,
        };

        Ok(Self {
            database_url,
            database_max_connections,
            jwt_secret,
            token_ttl,
            http_port,
            cors_allowed_origins,
            upload_dir,
            cookie_secure,
            log,
        })
    }

    pub fn http_addr(&self) -> String {
        format!("0.0.0.0:{}", self.http_port)
    }

    pub fn token_ttl(&self) -> chrono::Duration {
        self.token_ttl
    }
}

fn ttl_from_hours(hours: i64) -> Result<chrono::Duration> {
    if !(1..=MAX_TOKEN_TTL_HOURS).contains(&hours) {
        bail!(
            "TOKEN_TTL_HOURS must be between 1 and {}, got {}",
            MAX_TOKEN_TTL_HOURS,
            hours
        );
    }
    chrono::Duration::try_hours(hours).context("TOKEN_TTL_HOURS is out of range")
}

fn required(key: &str) -> Result<String> {
    let value = std::env::var(key).with_context(|| format!("{} must be set", key))?;
    if value.trim().is_empty() {
        bail!("{} must not be empty", key);
    }
    Ok(value)
}

fn parsed<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid value for {}: {} ({})", key, raw, e)),
        Err(_) => Ok(default),
    }
}

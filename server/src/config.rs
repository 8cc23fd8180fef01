//! Server configuration.
//!
//! An `AppConfig` is constructed once in `main` from `MEDIFLOW_*`
//! environment variables and handed to each component explicitly. There
//! is no ambient global settings object.

use anyhow::{Context, Result};

#[derive(Clone, Debug)]
pub struct AppConfig {
    /// Address the HTTP listener binds to.
    pub bind_addr: String,
    pub mongo_uri: String,
    pub mongo_db: String,
    /// Shared secret for signing and verifying bearer tokens.
    pub jwt_secret: String,
    /// Lifetime of issued bearer tokens, in hours.
    pub token_ttl_hours: i64,
    pub smtp: SmtpConfig,
    /// Base URL embedded in verification links, e.g. `http://localhost:3001`.
    pub public_base_url: String,
}

#[derive(Clone, Debug)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    /// From address on outgoing verification mail.
    pub from: String,
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let jwt_secret = std::env::var("MEDIFLOW_JWT_SECRET")
            .context("MEDIFLOW_JWT_SECRET must be set")?;

        let token_ttl_hours = env_or("MEDIFLOW_TOKEN_TTL_HOURS", "24")
            .parse()
            .context("MEDIFLOW_TOKEN_TTL_HOURS must be an integer")?;

        let smtp_port = env_or("MEDIFLOW_SMTP_PORT", "2525")
            .parse()
            .context("MEDIFLOW_SMTP_PORT must be a port number")?;

        Ok(Self {
            bind_addr: env_or("MEDIFLOW_BIND_ADDR", "0.0.0.0:3001"),
            mongo_uri: env_or("MEDIFLOW_MONGO_URI", "mongodb://localhost:27017"),
            mongo_db: env_or("MEDIFLOW_MONGO_DB", "mediflow"),
            jwt_secret,
            token_ttl_hours,
            smtp: SmtpConfig {
                host: env_or("MEDIFLOW_SMTP_HOST", "localhost"),
                port: smtp_port,
                username: std::env::var("MEDIFLOW_SMTP_USER").ok(),
                password: std::env::var("MEDIFLOW_SMTP_PASS").ok(),
                from: env_or("MEDIFLOW_SMTP_FROM", "no-reply@mediflow.local"),
            },
            public_base_url: env_or("MEDIFLOW_PUBLIC_BASE_URL", "http://localhost:3001"),
        })
    }
}
